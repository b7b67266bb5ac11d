//! Category forest operations.
//!
//! A company's categories are loaded as a flat list and every operation is a
//! linear scan over it. Companies keep at most a few hundred categories, so
//! no index is built.

use serde::Serialize;
use uuid::Uuid;

use crate::catalog::error::CatalogError;

/// A category row as the tree code sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRecord {
    /// Category ID.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Parent category, `None` for roots.
    pub parent_id: Option<Uuid>,
}

/// A category with its subtree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryNode {
    /// The category itself.
    #[serde(flatten)]
    pub category: CategoryRecord,
    /// Direct children, each with their own subtree.
    pub children: Vec<CategoryNode>,
}

/// Direct children of `parent_id` (roots when `None`), in input order.
pub fn children_of(categories: &[CategoryRecord], parent_id: Option<Uuid>) -> Vec<&CategoryRecord> {
    categories
        .iter()
        .filter(|c| c.parent_id == parent_id)
        .collect()
}

/// IDs of every category below `id`, breadth first.
pub fn descendants(categories: &[CategoryRecord], id: Uuid) -> Vec<Uuid> {
    let mut found = Vec::new();
    let mut frontier = vec![id];

    while let Some(current) = frontier.pop() {
        for child in children_of(categories, Some(current)) {
            // Guards against corrupt cycles.
            if child.id != id && !found.contains(&child.id) {
                found.push(child.id);
                frontier.push(child.id);
            }
        }
    }

    found
}

/// IDs from `id`'s parent up to its root.
pub fn ancestors(categories: &[CategoryRecord], id: Uuid) -> Vec<Uuid> {
    let mut chain = Vec::new();
    let mut current = categories.iter().find(|c| c.id == id);

    while let Some(parent_id) = current.and_then(|c| c.parent_id) {
        if parent_id == id || chain.contains(&parent_id) {
            break;
        }
        chain.push(parent_id);
        current = categories.iter().find(|c| c.id == parent_id);
    }

    chain
}

/// Builds the forest of root categories with nested children.
pub fn build_tree(categories: &[CategoryRecord]) -> Vec<CategoryNode> {
    fn subtree(categories: &[CategoryRecord], record: &CategoryRecord, depth: usize) -> CategoryNode {
        let children = if depth >= categories.len() {
            Vec::new()
        } else {
            children_of(categories, Some(record.id))
                .into_iter()
                .map(|child| subtree(categories, child, depth + 1))
                .collect()
        };

        CategoryNode {
            category: record.clone(),
            children,
        }
    }

    children_of(categories, None)
        .into_iter()
        .map(|root| subtree(categories, root, 0))
        .collect()
}

/// Checks that `category_id` (or a new category when `None`) may hang
/// under `parent_id`.
///
/// # Errors
///
/// - `UnknownParent` when the parent is not among `categories`
/// - `CircularParent` when the parent is the category or one of its descendants
pub fn validate_parent(
    categories: &[CategoryRecord],
    category_id: Option<Uuid>,
    parent_id: Option<Uuid>,
) -> Result<(), CatalogError> {
    let Some(parent_id) = parent_id else {
        return Ok(());
    };

    if !categories.iter().any(|c| c.id == parent_id) {
        return Err(CatalogError::UnknownParent(parent_id));
    }

    if let Some(id) = category_id
        && (id == parent_id || descendants(categories, id).contains(&parent_id))
    {
        return Err(CatalogError::CircularParent);
    }

    Ok(())
}

/// Checks that a category can be deleted.
///
/// # Errors
///
/// Returns `HasChildren` while subcategories exist and `HasTemplates` while
/// templates are attached.
pub fn ensure_deletable(
    categories: &[CategoryRecord],
    id: Uuid,
    attached_templates: u64,
) -> Result<(), CatalogError> {
    if !children_of(categories, Some(id)).is_empty() {
        return Err(CatalogError::HasChildren);
    }
    if attached_templates > 0 {
        return Err(CatalogError::HasTemplates);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u128, name: &str, parent: Option<u128>) -> CategoryRecord {
        CategoryRecord {
            id: Uuid::from_u128(id),
            name: name.to_string(),
            description: None,
            parent_id: parent.map(Uuid::from_u128),
        }
    }

    /// Hardware
    ///   Tools
    ///     Drills
    ///   Fasteners
    /// Services
    fn sample() -> Vec<CategoryRecord> {
        vec![
            record(1, "Hardware", None),
            record(2, "Tools", Some(1)),
            record(3, "Drills", Some(2)),
            record(4, "Fasteners", Some(1)),
            record(5, "Services", None),
        ]
    }

    fn id(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    #[test]
    fn test_children_of() {
        let cats = sample();
        let roots: Vec<_> = children_of(&cats, None).iter().map(|c| c.name.as_str()).collect();
        assert_eq!(roots, vec!["Hardware", "Services"]);

        let under_hardware: Vec<_> = children_of(&cats, Some(id(1)))
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(under_hardware, vec!["Tools", "Fasteners"]);
        assert!(children_of(&cats, Some(id(3))).is_empty());
    }

    #[test]
    fn test_descendants_and_ancestors() {
        let cats = sample();
        let mut below = descendants(&cats, id(1));
        below.sort();
        assert_eq!(below, vec![id(2), id(3), id(4)]);
        assert_eq!(ancestors(&cats, id(3)), vec![id(2), id(1)]);
        assert!(ancestors(&cats, id(5)).is_empty());
    }

    #[test]
    fn test_build_tree() {
        let tree = build_tree(&sample());
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].category.name, "Hardware");
        assert_eq!(tree[0].children.len(), 2);
        assert_eq!(tree[0].children[0].children[0].category.name, "Drills");
        assert!(tree[1].children.is_empty());

        let json = serde_json::to_value(&tree[0]).unwrap();
        assert_eq!(json["name"], "Hardware");
        assert_eq!(json["children"][0]["parentId"], id(1).to_string());
    }

    #[test]
    fn test_validate_parent() {
        let cats = sample();
        assert_eq!(validate_parent(&cats, None, None), Ok(()));
        assert_eq!(validate_parent(&cats, None, Some(id(3))), Ok(()));
        assert_eq!(validate_parent(&cats, Some(id(4)), Some(id(2))), Ok(()));
        assert_eq!(
            validate_parent(&cats, None, Some(id(42))),
            Err(CatalogError::UnknownParent(id(42)))
        );
        assert_eq!(
            validate_parent(&cats, Some(id(2)), Some(id(2))),
            Err(CatalogError::CircularParent)
        );
        assert_eq!(
            validate_parent(&cats, Some(id(1)), Some(id(3))),
            Err(CatalogError::CircularParent)
        );
    }

    #[test]
    fn test_ensure_deletable() {
        let cats = sample();
        assert_eq!(ensure_deletable(&cats, id(3), 0), Ok(()));
        assert_eq!(ensure_deletable(&cats, id(2), 0), Err(CatalogError::HasChildren));
        assert_eq!(ensure_deletable(&cats, id(3), 2), Err(CatalogError::HasTemplates));
    }

    #[test]
    fn test_corrupt_cycle_terminates() {
        let cats = vec![record(1, "A", Some(2)), record(2, "B", Some(1))];
        assert_eq!(descendants(&cats, id(1)), vec![id(2)]);
        assert_eq!(ancestors(&cats, id(1)), vec![id(2)]);
        assert!(build_tree(&cats).is_empty());
    }
}
