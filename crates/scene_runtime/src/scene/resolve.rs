//! Reference resolution
//!
//! References name an entity either by its declared name (first match in
//! declaration order) or by zero-based index. Anything that does not resolve
//! yields `None`; callers skip the dependent behavior.

use std::collections::HashSet;

use log::warn;

use crate::foundation::collections::{NodeArena, NodeId};
use crate::scene::entities::{Named, Node, NodeRef};

/// Resolve a node reference against the arena
pub fn resolve_node(nodes: &NodeArena<Node>, reference: &NodeRef) -> Option<NodeId> {
    match reference {
        NodeRef::Name(name) => nodes
            .iter()
            .find(|(_, node)| node.name == *name)
            .map(|(id, _)| id),
        NodeRef::Index(index) => usize::try_from(*index).ok().and_then(|i| nodes.id_at(i)),
    }
}

/// Index of the first item with the given name
pub fn resolve_by_name<T: Named>(items: &[T], name: &str) -> Option<usize> {
    items.iter().position(|item| item.name() == name)
}

/// Like [`resolve_by_name`] for an optional name field
pub fn resolve_optional<T: Named>(items: &[T], name: Option<&str>) -> Option<usize> {
    name.and_then(|name| resolve_by_name(items, name))
}

/// Names that appear more than once, each reported once in first-seen order
pub fn duplicate_names<'a, I>(names: I) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    let mut duplicates = Vec::new();
    for name in names {
        if !seen.insert(name) && reported.insert(name) {
            duplicates.push(name);
        }
    }
    duplicates
}

/// Log every duplicated name of one entity kind
pub fn warn_duplicates<'a, I>(kind: &str, names: I)
where
    I: IntoIterator<Item = &'a str>,
{
    for name in duplicate_names(names) {
        warn!("Duplicate {kind} name '{name}'; references resolve to the first declaration");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::entities::Camera;

    fn arena(names: &[&str]) -> NodeArena<Node> {
        let mut nodes = NodeArena::new();
        for name in names {
            nodes.push(Node {
                name: (*name).to_string(),
                ..Node::default()
            });
        }
        nodes
    }

    #[test]
    fn test_index_and_name_resolve_to_same_node() {
        let nodes = arena(&["root", "child", "leaf"]);
        for (i, (id, node)) in nodes.iter().enumerate() {
            let by_index = resolve_node(&nodes, &NodeRef::Index(i as i64));
            let by_name = resolve_node(&nodes, &NodeRef::Name(node.name.clone()));
            assert_eq!(by_index, Some(id));
            assert_eq!(by_name, by_index);
        }
    }

    #[test]
    fn test_out_of_range_and_negative_indices() {
        let nodes = arena(&["a"]);
        assert_eq!(resolve_node(&nodes, &NodeRef::Index(1)), None);
        assert_eq!(resolve_node(&nodes, &NodeRef::Index(-1)), None);
        assert_eq!(resolve_node(&nodes, &NodeRef::Name("missing".into())), None);
    }

    #[test]
    fn test_first_declaration_wins() {
        let nodes = arena(&["twin", "twin"]);
        assert_eq!(
            resolve_node(&nodes, &NodeRef::Name("twin".into())),
            nodes.id_at(0)
        );

        let cameras = vec![
            Camera { name: "cam".into(), ..Camera::default() },
            Camera { name: "cam".into(), ..Camera::default() },
        ];
        assert_eq!(resolve_by_name(&cameras, "cam"), Some(0));
        assert_eq!(resolve_optional(&cameras, None), None);
    }

    #[test]
    fn test_duplicate_names_reported_once() {
        let duplicates = duplicate_names(["a", "b", "a", "a", "c", "b"]);
        assert_eq!(duplicates, vec!["a", "b"]);
    }
}
