//! Materialized Path Utilities
//!
//! Pure functions for building, sanitizing, comparing, and decomposing
//! materialized paths. A materialized path encodes a node's full ancestry as a
//! dot-separated sequence of sanitized labels (e.g., `"acme.r_d_team.web"`),
//! which lets the rest of the engine answer ancestor/descendant questions with
//! string prefix tests instead of recursive traversal.
//!
//! Everything in this module is total: no I/O, no errors. Invalid input maps
//! to well-defined fallback values (`"unnamed"`, `None`).
//!
//! # Examples
//!
//! ```rust
//! use pathguard_core::paths;
//!
//! let root = paths::sanitize_name("Acme");
//! assert_eq!(root, "acme");
//!
//! let child = paths::build_child_path(&root, "R&D Team!");
//! assert_eq!(child, "acme.r_d_team");
//!
//! assert!(paths::is_ancestor(&root, &child));
//! assert_eq!(paths::path_depth(&child), 2);
//! ```

/// Path segment separator.
pub const SEPARATOR: char = '.';

/// Fallback label for names that sanitize to nothing (e.g., `"!!!"`).
pub const UNNAMED_LABEL: &str = "unnamed";

/// Sanitize a display name into a path label.
///
/// Rules, applied in order:
///
/// 1. Lower-case the input.
/// 2. Replace every run of characters outside `[a-z0-9_]` with a single `_`.
/// 3. Trim leading and trailing `_`.
/// 4. An empty result becomes `"unnamed"`.
/// 5. A result starting with a digit is prefixed with `"n"` so labels are
///    always identifier-like.
///
/// Sanitization is idempotent: `sanitize_name(sanitize_name(x)) == sanitize_name(x)`.
///
/// # Examples
///
/// ```rust
/// # use pathguard_core::paths::sanitize_name;
/// assert_eq!(sanitize_name("R&D Team!"), "r_d_team");
/// assert_eq!(sanitize_name("  "), "unnamed");
/// assert_eq!(sanitize_name("2nd Floor"), "n2nd_floor");
/// ```
pub fn sanitize_name(name: &str) -> String {
    let mut label = String::with_capacity(name.len());
    let mut last_was_invalid = false;

    for ch in name.to_lowercase().chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_' {
            // '_' is inside the allowed class: literal underscores survive
            label.push(ch);
            last_was_invalid = false;
        } else if !last_was_invalid {
            // Runs of characters outside [a-z0-9_] collapse to one '_'
            label.push('_');
            last_was_invalid = true;
        }
    }

    let trimmed = label.trim_matches('_');
    if trimmed.is_empty() {
        return UNNAMED_LABEL.to_string();
    }

    if trimmed.starts_with(|c: char| c.is_ascii_digit()) {
        format!("n{}", trimmed)
    } else {
        trimmed.to_string()
    }
}

/// Build a child path from a parent path and a raw display name.
///
/// An empty `parent_path` produces a root path (just the sanitized label).
pub fn build_child_path(parent_path: &str, name: &str) -> String {
    let label = sanitize_name(name);
    if parent_path.is_empty() {
        label
    } else {
        format!("{}{}{}", parent_path, SEPARATOR, label)
    }
}

/// Return the parent path (all segments but the last), or `None` for a
/// single-segment (root) path.
pub fn parent_path(path: &str) -> Option<String> {
    path.rfind(SEPARATOR).map(|idx| path[..idx].to_string())
}

/// Return the last segment of a path.
pub fn path_label(path: &str) -> &str {
    match path.rfind(SEPARATOR) {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// True when `descendant` is a strict descendant of `ancestor`.
///
/// A path is never its own ancestor; segment boundaries are respected, so
/// `"acme"` is not an ancestor of `"acme_corp"`.
pub fn is_ancestor(ancestor: &str, descendant: &str) -> bool {
    if ancestor.is_empty() {
        return false;
    }
    descendant.len() > ancestor.len()
        && descendant.starts_with(ancestor)
        && descendant.as_bytes()[ancestor.len()] == SEPARATOR as u8
}

/// True when `child` is a direct child of `parent` (exactly one more segment,
/// with `parent`'s segments as its prefix).
pub fn is_parent(parent: &str, child: &str) -> bool {
    match parent_path(child) {
        Some(actual_parent) => actual_parent == parent,
        None => false,
    }
}

/// Number of segments in a path. An empty path has depth 0.
pub fn path_depth(path: &str) -> usize {
    if path.is_empty() {
        0
    } else {
        path.split(SEPARATOR).count()
    }
}

/// Longest shared segment prefix of two paths, or `None` when the first
/// segments already differ.
pub fn common_ancestor(path1: &str, path2: &str) -> Option<String> {
    let shared: Vec<&str> = path1
        .split(SEPARATOR)
        .zip(path2.split(SEPARATOR))
        .take_while(|(a, b)| a == b)
        .map(|(a, _)| a)
        .collect();

    if shared.is_empty() || path1.is_empty() || path2.is_empty() {
        None
    } else {
        Some(shared.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_basic() {
        assert_eq!(sanitize_name("Acme"), "acme");
        assert_eq!(sanitize_name("Engineering"), "engineering");
        assert_eq!(sanitize_name("already_clean"), "already_clean");
    }

    #[test]
    fn test_sanitize_collapses_invalid_runs() {
        assert_eq!(sanitize_name("R&D Team!"), "r_d_team");
        assert_eq!(sanitize_name("a---b"), "a_b");
        assert_eq!(sanitize_name("a & b & c"), "a_b_c");
    }

    #[test]
    fn test_sanitize_preserves_underscore_runs() {
        // '_' is a kept character; only runs OUTSIDE [a-z0-9_] collapse,
        // so "a__b" and "a_b" stay distinct sibling labels
        assert_eq!(sanitize_name("a__b"), "a__b");
        assert_eq!(sanitize_name("a_!b"), "a__b");
        assert_eq!(sanitize_name("a!_b"), "a__b");
        assert_ne!(sanitize_name("a__b"), sanitize_name("a_b"));
    }

    #[test]
    fn test_sanitize_trims_underscores() {
        assert_eq!(sanitize_name("__core__"), "core");
        assert_eq!(sanitize_name("!leading"), "leading");
        assert_eq!(sanitize_name("trailing!"), "trailing");
    }

    #[test]
    fn test_sanitize_empty_falls_back_to_unnamed() {
        assert_eq!(sanitize_name(""), "unnamed");
        assert_eq!(sanitize_name("   "), "unnamed");
        assert_eq!(sanitize_name("!!!"), "unnamed");
        assert_eq!(sanitize_name("___"), "unnamed");
    }

    #[test]
    fn test_sanitize_digit_prefix() {
        assert_eq!(sanitize_name("2nd Floor"), "n2nd_floor");
        assert_eq!(sanitize_name("99"), "n99");
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        for input in [
            "Acme",
            "R&D Team!",
            "2nd Floor",
            "",
            "!!!",
            "__x__",
            "a__b",
            "a_!b",
            "MiXeD CaSe 123",
        ] {
            let once = sanitize_name(input);
            assert_eq!(sanitize_name(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_build_child_path() {
        assert_eq!(build_child_path("", "Acme"), "acme");
        assert_eq!(build_child_path("acme", "R&D Team!"), "acme.r_d_team");
        assert_eq!(
            build_child_path("acme.r_d_team", "Web"),
            "acme.r_d_team.web"
        );
    }

    #[test]
    fn test_parent_path_and_label() {
        assert_eq!(parent_path("acme"), None);
        assert_eq!(parent_path("acme.eng"), Some("acme".to_string()));
        assert_eq!(parent_path("a.b.c"), Some("a.b".to_string()));

        assert_eq!(path_label("acme"), "acme");
        assert_eq!(path_label("a.b.c"), "c");
    }

    #[test]
    fn test_is_ancestor() {
        assert!(is_ancestor("acme", "acme.eng"));
        assert!(is_ancestor("acme", "acme.eng.web"));
        assert!(!is_ancestor("acme", "acme"));
        assert!(!is_ancestor("acme.eng", "acme"));
        // Segment boundary: "acme" must not match "acme_corp"
        assert!(!is_ancestor("acme", "acme_corp"));
        assert!(!is_ancestor("acme", "acme_corp.eng"));
        assert!(!is_ancestor("", "acme"));
    }

    #[test]
    fn test_is_parent() {
        assert!(is_parent("acme", "acme.eng"));
        assert!(!is_parent("acme", "acme.eng.web"));
        assert!(!is_parent("acme", "acme"));
        assert!(!is_parent("acme.eng", "acme"));
        assert!(!is_parent("acme", "acme_corp.eng"));
    }

    #[test]
    fn test_path_depth() {
        assert_eq!(path_depth(""), 0);
        assert_eq!(path_depth("acme"), 1);
        assert_eq!(path_depth("acme.eng.web"), 3);
    }

    #[test]
    fn test_common_ancestor() {
        assert_eq!(
            common_ancestor("acme.eng.web", "acme.eng.mobile"),
            Some("acme.eng".to_string())
        );
        assert_eq!(
            common_ancestor("acme.eng", "acme.sales"),
            Some("acme".to_string())
        );
        assert_eq!(common_ancestor("acme", "beta"), None);
        assert_eq!(
            common_ancestor("acme.eng", "acme.eng"),
            Some("acme.eng".to_string())
        );
        assert_eq!(common_ancestor("", "acme"), None);
    }
}
