use std::collections::{btree_map::Entry, BTreeMap};

use crate::Value;

/// Nodes keyed by name, as produced for the top level of a file and for a node's children.
pub type Tree = BTreeMap<String, Node>;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Node {
    /// Node name, suffixed with `@<address>` in lowercase hex when an address is present
    pub name: String,
    /// e.g. `uart0` in `uart0: uart@4000 { ... };`
    pub label: Option<String>,
    pub address: Option<u64>,
    pub properties: BTreeMap<String, Value>,
    pub children: Tree,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    #[must_use]
    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children.get(name)
    }

    /// Looks up a descendant by its `/`-separated path relative to this node.
    #[must_use]
    pub fn descendant(&self, path: &str) -> Option<&Node> {
        path.split('/')
            .filter(|part| !part.is_empty())
            .try_fold(self, |node, part| node.child(part))
    }

    /// Merges a later definition of the same node into this one.
    ///
    /// Properties from `other` replace ones with the same name, children are merged
    /// recursively, and a label or address is only replaced when `other` has one.
    pub fn merge(&mut self, other: Node) {
        if other.label.is_some() {
            self.label = other.label;
        }
        if other.address.is_some() {
            self.address = other.address;
        }
        self.properties.extend(other.properties);
        for child in other.children.into_values() {
            merge_into(&mut self.children, child);
        }
    }
}

/// Inserts `node` into `tree`, merging it with an existing node of the same name.
pub fn merge_into(tree: &mut Tree, node: Node) {
    match tree.entry(node.name.clone()) {
        Entry::Occupied(mut entry) => entry.get_mut().merge(node),
        Entry::Vacant(entry) => {
            entry.insert(node);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn node(name: &str, props: &[(&str, i64)], children: Vec<Node>) -> Node {
        Node {
            name: name.to_owned(),
            properties: props
                .iter()
                .map(|(key, value)| ((*key).to_owned(), Value::Integer(*value)))
                .collect(),
            children: children
                .into_iter()
                .map(|child| (child.name.clone(), child))
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn merge_properties_last_write_wins() {
        let mut base = node("soc", &[("a", 1), ("b", 2)], Vec::new());
        base.merge(node("soc", &[("b", 3), ("c", 4)], Vec::new()));
        assert_eq!(base, node("soc", &[("a", 1), ("b", 3), ("c", 4)], Vec::new()));
    }

    #[test]
    fn merge_children_recursively() {
        let mut base = node(
            "/",
            &[],
            vec![node("soc", &[], vec![node("uart", &[("a", 1)], Vec::new())])],
        );
        base.merge(node(
            "/",
            &[],
            vec![node(
                "soc",
                &[("x", 0)],
                vec![
                    node("uart", &[("b", 2)], Vec::new()),
                    node("i2c", &[], Vec::new()),
                ],
            )],
        ));

        assert_eq!(
            base,
            node(
                "/",
                &[],
                vec![node(
                    "soc",
                    &[("x", 0)],
                    vec![
                        node("uart", &[("a", 1), ("b", 2)], Vec::new()),
                        node("i2c", &[], Vec::new()),
                    ],
                )],
            )
        );
    }

    #[test]
    fn merge_keeps_label_when_absent() {
        let mut base = Node {
            label: Some("uart0".to_owned()),
            ..Node::new("uart")
        };
        base.merge(Node::new("uart"));
        assert_eq!(base.label.as_deref(), Some("uart0"));

        base.merge(Node {
            label: Some("console".to_owned()),
            ..Node::new("uart")
        });
        assert_eq!(base.label.as_deref(), Some("console"));
    }

    #[test]
    fn merge_into_tree() {
        let mut tree = Tree::new();
        merge_into(&mut tree, node("a", &[("x", 1)], Vec::new()));
        merge_into(&mut tree, node("b", &[], Vec::new()));
        merge_into(&mut tree, node("a", &[("y", 2)], Vec::new()));
        assert_eq!(tree.len(), 2);
        assert_eq!(tree["a"], node("a", &[("x", 1), ("y", 2)], Vec::new()));
    }

    #[test]
    fn descendant_lookup() {
        let root = node(
            "/",
            &[],
            vec![node("soc", &[], vec![node("uart@4000", &[], Vec::new())])],
        );
        assert_eq!(
            root.descendant("/soc/uart@4000").map(|n| n.name.as_str()),
            Some("uart@4000")
        );
        assert_eq!(root.descendant("soc/missing"), None);
        assert_eq!(root.descendant("").map(|n| n.name.as_str()), Some("/"));
    }
}
