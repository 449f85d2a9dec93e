//! Integration tests for tree CRUD and structural mutation.
//!
//! Exercises NodeService against the in-memory store: path derivation,
//! tree invariants across moves, cascading deletes, and cache consistency
//! after mutations.

use crate::db::MemoryStore;
use crate::models::{CreateNodeParams, Node, NodeUpdate};
use crate::paths;
use crate::services::cache::{AccessCache, CacheConfig, NodeCache};
use crate::services::error::HierarchyError;
use crate::services::node_service::NodeService;
use serde_json::json;
use std::sync::Arc;

fn service() -> NodeService {
    let store = Arc::new(MemoryStore::new());
    NodeService::new(
        store,
        Arc::new(NodeCache::new(CacheConfig::default())),
        Arc::new(AccessCache::new(CacheConfig::default())),
    )
}

fn params(name: &str, node_type: &str, parent_id: Option<&str>) -> CreateNodeParams {
    CreateNodeParams {
        name: name.to_string(),
        node_type: node_type.to_string(),
        parent_id: parent_id.map(String::from),
        metadata: json!({}),
    }
}

async fn create(service: &NodeService, name: &str, parent: Option<&Node>) -> Node {
    service
        .create_node(params(name, "team", parent.map(|p| p.id.as_str())))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_create_root_and_child_paths() {
    let service = service();

    let root = service
        .create_node(params("Acme", "organization", None))
        .await
        .unwrap();
    assert_eq!(root.path, "acme");
    assert!(root.is_root());

    let child = service
        .create_node(params("R&D Team!", "team", Some(&root.id)))
        .await
        .unwrap();
    assert_eq!(child.path, "acme.r_d_team");
    assert_eq!(child.parent_id.as_deref(), Some(root.id.as_str()));
}

#[tokio::test]
async fn test_create_rejects_blank_fields() {
    let service = service();

    let err = service
        .create_node(params("   ", "team", None))
        .await
        .unwrap_err();
    assert!(matches!(err, HierarchyError::Validation { .. }));

    let err = service
        .create_node(params("Acme", "", None))
        .await
        .unwrap_err();
    assert!(matches!(err, HierarchyError::Validation { .. }));
}

#[tokio::test]
async fn test_create_rejects_missing_parent() {
    let service = service();
    let err = service
        .create_node(params("Orphan", "team", Some("no-such-id")))
        .await
        .unwrap_err();
    assert!(matches!(err, HierarchyError::ParentNotFound { .. }));
}

#[tokio::test]
async fn test_create_rejects_colliding_sibling_labels() {
    let service = service();
    let root = create(&service, "Acme", None).await;
    create(&service, "R&D Team", Some(&root)).await;

    // "R&D Team!" sanitizes to the same label as "R&D Team"
    let err = service
        .create_node(params("R&D Team!", "team", Some(&root.id)))
        .await
        .unwrap_err();
    assert!(matches!(err, HierarchyError::Validation { .. }));
}

#[tokio::test]
async fn test_get_absent_node_is_none_not_error() {
    let service = service();
    assert!(service.get_node("missing").await.unwrap().is_none());
    assert!(service.get_node_by_path("no.such.path").await.unwrap().is_none());
}

#[tokio::test]
async fn test_path_invariant_depth_and_ancestry() {
    let service = service();
    let root = create(&service, "Acme", None).await;
    let eng = create(&service, "Engineering", Some(&root)).await;
    let web = create(&service, "Web", Some(&eng)).await;

    for (node, ancestors) in [(&root, 0), (&eng, 1), (&web, 2)] {
        assert_eq!(paths::path_depth(&node.path), ancestors + 1);
    }
    assert!(paths::is_ancestor(&root.path, &eng.path));
    assert!(paths::is_ancestor(&root.path, &web.path));
    assert!(paths::is_parent(&eng.path, &web.path));
}

#[tokio::test]
async fn test_roots_and_children_ordered_by_path() {
    let service = service();
    create(&service, "Beta", None).await;
    let acme = create(&service, "Acme", None).await;
    let zeta = create(&service, "Zeta", Some(&acme)).await;
    let eng = create(&service, "Engineering", Some(&acme)).await;

    let roots = service.get_root_nodes().await.unwrap();
    assert_eq!(
        roots.iter().map(|n| n.path.as_str()).collect::<Vec<_>>(),
        vec!["acme", "beta"]
    );

    let children = service.get_children(&acme.id).await.unwrap();
    assert_eq!(
        children.iter().map(|n| n.id.as_str()).collect::<Vec<_>>(),
        vec![eng.id.as_str(), zeta.id.as_str()]
    );
}

#[tokio::test]
async fn test_children_cache_invalidated_on_create() {
    let service = service();
    let root = create(&service, "Acme", None).await;

    // Prime the children cache, then add a sibling
    assert!(service.get_children(&root.id).await.unwrap().is_empty());
    create(&service, "Engineering", Some(&root)).await;

    let children = service.get_children(&root.id).await.unwrap();
    assert_eq!(children.len(), 1, "stale children list served after create");
}

#[tokio::test]
async fn test_update_changes_fields_but_never_path() {
    let service = service();
    let root = create(&service, "Acme", None).await;
    let team = create(&service, "R&D Team", Some(&root)).await;

    let updated = service
        .update_node(
            &team.id,
            NodeUpdate {
                name: Some("Research".to_string()),
                node_type: Some("department".to_string()),
                metadata: Some(json!({ "floor": 3 })),
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.name, "Research");
    assert_eq!(updated.node_type, "department");
    assert_eq!(updated.metadata, json!({ "floor": 3 }));
    // Renames leave the path label frozen
    assert_eq!(updated.path, "acme.r_d_team");
    assert!(updated.modified_at > updated.created_at);

    // The cache serves the updated node, not the pre-mutation one
    let fetched = service.get_node(&team.id).await.unwrap().unwrap();
    assert_eq!(fetched.name, "Research");
}

#[tokio::test]
async fn test_update_rejects_blank_and_missing() {
    let service = service();
    let root = create(&service, "Acme", None).await;

    let err = service
        .update_node(&root.id, NodeUpdate::name("  "))
        .await
        .unwrap_err();
    assert!(matches!(err, HierarchyError::Validation { .. }));

    let err = service
        .update_node("missing", NodeUpdate::name("X"))
        .await
        .unwrap_err();
    assert!(matches!(err, HierarchyError::NodeNotFound { .. }));
}

#[tokio::test]
async fn test_move_rewrites_subtree_and_preserves_suffixes() {
    let service = service();
    let acme = create(&service, "Acme", None).await;
    let team = create(&service, "R&D Team", Some(&acme)).await;
    let web = create(&service, "Web", Some(&team)).await;
    let api = create(&service, "API", Some(&web)).await;
    let beta = create(&service, "Beta", None).await;

    let old_paths: Vec<String> = vec![web.path.clone(), api.path.clone()];
    let old_prefix = team.path.clone();

    let moved = service.move_node(&team.id, &beta.id).await.unwrap();
    assert_eq!(moved.path, "beta.r_d_team");
    assert_eq!(moved.parent_id.as_deref(), Some(beta.id.as_str()));

    // Every descendant keeps its relative suffix byte-for-byte
    for (node_id, old_path) in [(&web.id, &old_paths[0]), (&api.id, &old_paths[1])] {
        let node = service.get_node(node_id).await.unwrap().unwrap();
        let suffix = &old_path[old_prefix.len()..];
        assert_eq!(node.path, format!("beta.r_d_team{}", suffix));
        assert!(paths::is_ancestor(&moved.path, &node.path));
    }

    // The old parent no longer lists the subtree; the new one does
    assert!(service.get_children(&acme.id).await.unwrap().is_empty());
    let beta_children = service.get_children(&beta.id).await.unwrap();
    assert_eq!(beta_children.len(), 1);
    assert_eq!(beta_children[0].id, team.id);

    // Old paths resolve to nothing, new ones resolve
    assert!(service.get_node_by_path("acme.r_d_team").await.unwrap().is_none());
    assert!(service
        .get_node_by_path("beta.r_d_team.web.api")
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_move_rejects_self_parent() {
    let service = service();
    let acme = create(&service, "Acme", None).await;
    let err = service.move_node(&acme.id, &acme.id).await.unwrap_err();
    assert!(matches!(err, HierarchyError::CannotBeOwnParent { .. }));
}

#[tokio::test]
async fn test_move_rejects_cycle_and_leaves_tree_unchanged() {
    let service = service();
    let acme = create(&service, "Acme", None).await;
    let eng = create(&service, "Engineering", Some(&acme)).await;
    let web = create(&service, "Web", Some(&eng)).await;

    let err = service.move_node(&acme.id, &web.id).await.unwrap_err();
    assert!(matches!(err, HierarchyError::WouldCreateCycle { .. }));

    // Nothing moved
    for (id, path) in [
        (&acme.id, "acme"),
        (&eng.id, "acme.engineering"),
        (&web.id, "acme.engineering.web"),
    ] {
        assert_eq!(service.get_node(id).await.unwrap().unwrap().path, path);
    }
}

#[tokio::test]
async fn test_move_to_current_parent_is_noop() {
    let service = service();
    let acme = create(&service, "Acme", None).await;
    let eng = create(&service, "Engineering", Some(&acme)).await;

    let unchanged = service.move_node(&eng.id, &acme.id).await.unwrap();
    assert_eq!(unchanged.path, eng.path);
    assert_eq!(unchanged.modified_at, eng.modified_at);
}

#[tokio::test]
async fn test_move_missing_node_or_parent() {
    let service = service();
    let acme = create(&service, "Acme", None).await;

    let err = service.move_node("missing", &acme.id).await.unwrap_err();
    assert!(matches!(err, HierarchyError::NodeNotFound { .. }));

    let err = service.move_node(&acme.id, "missing").await.unwrap_err();
    assert!(matches!(err, HierarchyError::ParentNotFound { .. }));
}

#[tokio::test]
async fn test_delete_cascades_deepest_first() {
    let service = service();
    let acme = create(&service, "Acme", None).await;
    let eng = create(&service, "Engineering", Some(&acme)).await;
    let web = create(&service, "Web", Some(&eng)).await;
    let other = create(&service, "Beta", None).await;

    let result = service.delete_node(&eng.id, true).await.unwrap();
    assert_eq!(result.deleted_count, 2);

    assert!(service.get_node(&eng.id).await.unwrap().is_none());
    assert!(service.get_node(&web.id).await.unwrap().is_none());
    // Unrelated nodes untouched
    assert!(service.get_node(&acme.id).await.unwrap().is_some());
    assert!(service.get_node(&other.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_delete_without_propagation_blocked_by_children() {
    let service = service();
    let acme = create(&service, "Acme", None).await;
    let eng = create(&service, "Engineering", Some(&acme)).await;

    let err = service.delete_node(&acme.id, false).await.unwrap_err();
    assert!(matches!(err, HierarchyError::HasChildren { .. }));
    assert!(service.get_node(&acme.id).await.unwrap().is_some());

    // A leaf deletes fine without propagation
    let result = service.delete_node(&eng.id, false).await.unwrap();
    assert_eq!(result.deleted_count, 1);
}

#[tokio::test]
async fn test_delete_missing_is_not_found() {
    let service = service();
    let err = service.delete_node("missing", true).await.unwrap_err();
    assert!(matches!(err, HierarchyError::NodeNotFound { .. }));
}

#[tokio::test]
async fn test_delete_invalidates_cached_lookups() {
    let service = service();
    let acme = create(&service, "Acme", None).await;
    // Prime both caches
    assert!(service.get_node(&acme.id).await.unwrap().is_some());
    assert!(service.get_node_by_path("acme").await.unwrap().is_some());

    service.delete_node(&acme.id, true).await.unwrap();

    assert!(service.get_node(&acme.id).await.unwrap().is_none());
    assert!(service.get_node_by_path("acme").await.unwrap().is_none());
}

#[tokio::test]
async fn test_get_descendants_ordered_parents_first() {
    let service = service();
    let acme = create(&service, "Acme", None).await;
    let eng = create(&service, "Engineering", Some(&acme)).await;
    create(&service, "Web", Some(&eng)).await;
    create(&service, "Sales", Some(&acme)).await;

    let descendants = service.get_descendants(&acme.id).await.unwrap();
    let got: Vec<&str> = descendants.iter().map(|n| n.path.as_str()).collect();
    assert_eq!(
        got,
        vec!["acme.engineering", "acme.engineering.web", "acme.sales"]
    );

    let err = service.get_descendants("missing").await.unwrap_err();
    assert!(matches!(err, HierarchyError::NodeNotFound { .. }));
}

#[tokio::test]
async fn test_pagination_pages_through_path_order() {
    let service = service();
    for name in ["A", "B", "C", "D", "E"] {
        create(&service, name, None).await;
    }

    let page1 = service.get_nodes_page(1, 2).await.unwrap();
    assert_eq!(page1.total, 5);
    assert_eq!(
        page1.nodes.iter().map(|n| n.path.as_str()).collect::<Vec<_>>(),
        vec!["a", "b"]
    );

    let page3 = service.get_nodes_page(3, 2).await.unwrap();
    assert_eq!(
        page3.nodes.iter().map(|n| n.path.as_str()).collect::<Vec<_>>(),
        vec!["e"]
    );

    // Page 0 is clamped to page 1
    let clamped = service.get_nodes_page(0, 2).await.unwrap();
    assert_eq!(clamped.page, 1);
}

#[tokio::test]
async fn test_search_is_case_insensitive_and_limited() {
    let service = service();
    let acme = create(&service, "Acme", None).await;
    create(&service, "Engineering", Some(&acme)).await;
    create(&service, "Engine Room", Some(&acme)).await;

    let hits = service.search_nodes("engine", 10).await.unwrap();
    assert_eq!(hits.len(), 2);

    let limited = service.search_nodes("engine", 1).await.unwrap();
    assert_eq!(limited.len(), 1);

    assert!(service.search_nodes("zzz", 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_batch_create_short_circuits_on_first_failure() {
    let service = service();
    let root = create(&service, "Acme", None).await;

    let result = service
        .batch_create(vec![
            params("Engineering", "team", Some(&root.id)),
            params("", "team", Some(&root.id)), // invalid
            params("Sales", "team", Some(&root.id)),
        ])
        .await;

    assert!(matches!(result, Err(HierarchyError::Validation { .. })));
    // First entry landed, third was never attempted
    assert!(service
        .get_node_by_path("acme.engineering")
        .await
        .unwrap()
        .is_some());
    assert!(service.get_node_by_path("acme.sales").await.unwrap().is_none());
}
