// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Renderable lineage graph shared by the pipeline and its consumers.
//! Pure data (nodes, links, domains) with deterministic hashing/serialization.

use std::collections::HashMap;

use ciborium::ser::into_writer;
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod domain;
mod kind;
mod link;
mod node;

pub use domain::{Domain, DomainId, UNASSIGNED_DOMAIN};
pub use kind::{LinkKind, NodeKind, UnknownKind};
pub use link::{Link, LinkEndpoint};
pub use node::{Endorsement, Node, NodeDetails, NodeId, NodeMetadata, WorkspaceId};

/// Blake3 content hash (32 bytes).
pub type Hash32 = [u8; 32];

/// Errors raised while encoding a graph.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Canonical CBOR encoding failed.
    #[error("canonical encode failed: {0}")]
    Encode(String),
}

/// Nodes and links handed to the rendering layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct LineageGraph {
    /// All nodes.
    pub nodes: Vec<Node>,
    /// All links.
    pub links: Vec<Link>,
}

impl LineageGraph {
    /// Wraps an existing node/link pair.
    pub fn new(nodes: Vec<Node>, links: Vec<Link>) -> Self {
        Self { nodes, links }
    }

    /// Returns `true` when there are no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Map from node id to its position in `nodes`.
    pub fn node_index(&self) -> HashMap<&str, usize> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.as_str(), i))
            .collect()
    }

    /// Looks a node up by id (linear scan; use [`Self::node_index`] in loops).
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Rewrites every endpoint to the resolved form using the current node
    /// order. Endpoints whose id is unknown are left as bare ids.
    pub fn resolve_endpoints(&mut self) {
        let index: HashMap<String, usize> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), i))
            .collect();
        let resolve = |ep: &LinkEndpoint| match index.get(ep.id()) {
            Some(&i) => LinkEndpoint::Resolved {
                id: ep.id().to_owned(),
                index: i,
            },
            None => ep.unresolved(),
        };
        for link in &mut self.links {
            link.source = resolve(&link.source);
            link.target = resolve(&link.target);
        }
    }

    /// Canonical serialization (nodes by id, links by key, endpoints bare) for
    /// hashing/comparison.
    pub fn to_canonical_bytes(&self) -> Result<Vec<u8>, GraphError> {
        let mut g = self.clone();
        g.nodes.sort_by(|a, b| a.id.cmp(&b.id));
        for link in &mut g.links {
            link.source = link.source.unresolved();
            link.target = link.target.unresolved();
        }
        g.links.sort_by(|a, b| a.key().cmp(&b.key()));
        let mut bytes = Vec::new();
        into_writer(&g, &mut bytes).map_err(|e| GraphError::Encode(e.to_string()))?;
        Ok(bytes)
    }

    /// Compute blake3 hash of the canonical form.
    pub fn compute_hash(&self) -> Result<Hash32, GraphError> {
        Ok(blake3::hash(&self.to_canonical_bytes()?).into())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn sample() -> LineageGraph {
        let ws = Node::new("ws", NodeKind::Workspace, "Sales");
        let ds = Node::new("ds", NodeKind::SemanticModel, "Orders").in_workspace("ws");
        LineageGraph::new(vec![ws, ds], vec![Link::contains("ws", "ds")])
    }

    #[test]
    fn hash_ignores_order_and_endpoint_resolution() {
        let a = sample();
        let mut b = sample();
        b.nodes.reverse();
        b.resolve_endpoints();
        assert!(matches!(b.links[0].source, LinkEndpoint::Resolved { index: 1, .. }));
        assert_eq!(a.compute_hash().unwrap(), b.compute_hash().unwrap());
    }

    #[test]
    fn unknown_endpoints_stay_bare() {
        let mut g = sample();
        g.links.push(Link::contains("ws", "ghost"));
        g.resolve_endpoints();
        assert_eq!(g.links[1].target, LinkEndpoint::Id("ghost".into()));
        assert_eq!(g.links[1].source.index(), Some(0));
    }

    #[test]
    fn owning_workspace_is_self_for_workspaces() {
        let g = sample();
        assert_eq!(g.nodes[0].owning_workspace(), Some("ws"));
        assert_eq!(g.nodes[1].owning_workspace(), Some("ws"));
    }
}
