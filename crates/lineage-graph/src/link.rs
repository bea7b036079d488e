// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Directed links and their endpoints.

use serde::{Deserialize, Serialize};

use crate::kind::LinkKind;
use crate::node::NodeId;

/// One end of a link.
///
/// Before the physics layer has run, endpoints are plain ids; afterwards they
/// may be resolved to a reference into the node array. Consumers go through
/// [`LinkEndpoint::id`] and never inspect the representation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum LinkEndpoint {
    /// Bare node id.
    Id(NodeId),
    /// Node id plus its index in the current node array.
    Resolved {
        /// Node id.
        id: NodeId,
        /// Index into the node array at resolution time.
        index: usize,
    },
}

impl LinkEndpoint {
    /// The node id, whatever the representation.
    pub fn id(&self) -> &str {
        match self {
            Self::Id(id) | Self::Resolved { id, .. } => id,
        }
    }

    /// Cached node index, if resolved.
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::Id(_) => None,
            Self::Resolved { index, .. } => Some(*index),
        }
    }

    /// Drops any cached index.
    pub fn unresolved(&self) -> Self {
        Self::Id(self.id().to_owned())
    }
}

impl From<&str> for LinkEndpoint {
    fn from(id: &str) -> Self {
        Self::Id(id.to_owned())
    }
}

impl From<String> for LinkEndpoint {
    fn from(id: String) -> Self {
        Self::Id(id)
    }
}

/// A directed relationship between two nodes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Link {
    /// Source endpoint.
    pub source: LinkEndpoint,
    /// Target endpoint.
    pub target: LinkEndpoint,
    /// Relationship kind.
    #[serde(rename = "type")]
    pub kind: LinkKind,
}

impl Link {
    /// Creates a link between two ids.
    pub fn new(source: impl Into<LinkEndpoint>, target: impl Into<LinkEndpoint>, kind: LinkKind) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            kind,
        }
    }

    /// Shorthand for a `Contains` link.
    pub fn contains(source: impl Into<LinkEndpoint>, target: impl Into<LinkEndpoint>) -> Self {
        Self::new(source, target, LinkKind::Contains)
    }

    /// Shorthand for a `CrossWorkspace` link.
    pub fn cross_workspace(source: impl Into<LinkEndpoint>, target: impl Into<LinkEndpoint>) -> Self {
        Self::new(source, target, LinkKind::CrossWorkspace)
    }

    /// Source node id.
    pub fn source_id(&self) -> &str {
        self.source.id()
    }

    /// Target node id.
    pub fn target_id(&self) -> &str {
        self.target.id()
    }

    /// Identity key ignoring endpoint representation.
    pub fn key(&self) -> (&str, &str, LinkKind) {
        (self.source_id(), self.target_id(), self.kind)
    }
}
