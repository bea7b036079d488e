// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Topology-mutation capability used by normalization and validation.

use std::collections::{HashMap, HashSet};

use lineage_graph::{Link, Node, NodeKind};
use tracing::debug;

/// Capability to grow a node/link collection.
///
/// Only the build stages hold this; the clustering force and the visibility
/// engine never see it.
pub trait GraphMutator {
    /// Inserts a node; returns `false` (and keeps the existing node) when the id
    /// is already present.
    fn insert_node(&mut self, node: Node) -> bool;
    /// Appends a link.
    fn insert_link(&mut self, link: Link);
    /// Looks a node up by id.
    fn node(&self, id: &str) -> Option<&Node>;
    /// Returns `true` when a node with `id` exists.
    fn contains_node(&self, id: &str) -> bool {
        self.node(id).is_some()
    }
}

/// Append-only node/link accumulator with an id index.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    nodes: Vec<Node>,
    links: Vec<Link>,
    index: HashMap<String, usize>,
    /// `(workspace id, name)` of every lakehouse inserted.
    lakehouses: HashSet<(String, String)>,
}

impl GraphBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes inserted so far.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Mutable access to an existing node.
    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        let idx = *self.index.get(id)?;
        self.nodes.get_mut(idx)
    }

    /// Whether workspace `ws_id` holds a lakehouse called `name`.
    pub fn has_lakehouse(&self, ws_id: &str, name: &str) -> bool {
        self.lakehouses.contains(&(ws_id.to_owned(), name.to_owned()))
    }

    /// Consumes the builder.
    pub fn finish(self) -> (Vec<Node>, Vec<Link>) {
        (self.nodes, self.links)
    }
}

impl GraphMutator for GraphBuilder {
    fn insert_node(&mut self, node: Node) -> bool {
        if self.index.contains_key(&node.id) {
            debug!(id = %node.id, kind = ?node.kind, "duplicate node id ignored");
            return false;
        }
        if node.kind == NodeKind::Lakehouse {
            if let Some(ws) = &node.workspace_id {
                self.lakehouses.insert((ws.clone(), node.name.clone()));
            }
        }
        self.index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
        true
    }

    fn insert_link(&mut self, link: Link) {
        self.links.push(link);
    }

    fn node(&self, id: &str) -> Option<&Node> {
        self.index.get(id).and_then(|&i| self.nodes.get(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lineage_graph::NodeKind;

    #[test]
    fn first_insert_wins() {
        let mut b = GraphBuilder::new();
        assert!(b.insert_node(Node::new("a", NodeKind::Workspace, "first")));
        assert!(!b.insert_node(Node::new("a", NodeKind::Workspace, "second")));
        assert_eq!(b.node("a").map(|n| n.name.as_str()), Some("first"));
        assert_eq!(b.node_count(), 1);
    }

    #[test]
    fn lakehouses_are_indexed_by_workspace_and_name() {
        let mut b = GraphBuilder::new();
        b.insert_node(Node::new("lh", NodeKind::Lakehouse, "Bronze").in_workspace("w"));
        b.insert_node(Node::new("dm", NodeKind::Datamart, "Silver").in_workspace("w"));
        assert!(b.has_lakehouse("w", "Bronze"));
        assert!(!b.has_lakehouse("w", "Silver"));
        assert!(!b.has_lakehouse("other", "Bronze"));
    }
}
