// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Node records and their metadata.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::DomainId;
use crate::kind::NodeKind;

/// Globally unique node identifier within one loaded catalog.
pub type NodeId = String;
/// Identifier of a workspace node.
pub type WorkspaceId = String;

/// Endorsement state of an artifact.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, Hash)]
pub enum Endorsement {
    /// No endorsement.
    #[default]
    None,
    /// Promoted by the owner.
    Promoted,
    /// Certified by a designated principal.
    Certified,
}

impl Endorsement {
    /// Lenient parse of the raw scanner value; unknown strings map to `None`.
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(s) if s.eq_ignore_ascii_case("promoted") => Self::Promoted,
            Some(s) if s.eq_ignore_ascii_case("certified") => Self::Certified,
            _ => Self::None,
        }
    }
}

/// Type-specific metadata carried by a node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "detail", rename_all = "camelCase")]
pub enum NodeDetails {
    /// No type-specific data.
    #[default]
    None,
    /// Workspace attributes.
    Workspace {
        /// Raw workspace state (e.g. `Active`).
        state: Option<String>,
        /// Raw workspace type (e.g. `Workspace`, `PersonalGroup`).
        workspace_type: Option<String>,
        /// Capacity hosting the workspace.
        capacity_id: Option<String>,
    },
    /// Semantic model attributes.
    Dataset {
        /// Principal that configured the model.
        configured_by: Option<String>,
    },
    /// Report attributes.
    Report {
        /// Declared dataset id.
        dataset_id: Option<String>,
        /// Raw report type (e.g. `PaginatedReport`).
        report_type: Option<String>,
    },
    /// Dashboard attributes.
    Dashboard {
        /// Distinct report ids referenced by tiles.
        tile_report_ids: Vec<NodeId>,
    },
    /// Datamart attributes (covers lakehouses and warehouses too).
    Datamart {
        /// Raw datamart subtype.
        datamart_type: Option<String>,
    },
    /// Synthesized SQL analytics endpoint.
    SqlEndpoint {
        /// Lakehouse that exposes the endpoint.
        parent_lakehouse_id: NodeId,
    },
    /// Native item surfaced by the items collaborator.
    Item {
        /// Raw item type string.
        item_type: String,
    },
}

/// Open metadata mapping attached to every node.
///
/// Fields every consumer reads are typed; anything else the raw record carried
/// is preserved verbatim in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct NodeMetadata {
    /// Endorsement state.
    #[serde(default)]
    pub endorsement: Endorsement,
    /// Certifying principal, when certified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certified_by: Option<String>,
    /// Sensitivity label id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensitivity_label: Option<String>,
    /// Free-text description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Owning domain (workspaces only; `UNASSIGNED` when ungoverned).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_id: Option<DomainId>,
    /// Set on workspaces without a domain.
    #[serde(default)]
    pub is_unassigned: bool,
    /// Type-specific extras.
    #[serde(default)]
    pub details: NodeDetails,
    /// Unrecognized raw keys.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// A rendered graph vertex.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Node identifier.
    pub id: NodeId,
    /// Artifact kind.
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Display name.
    pub name: String,
    /// Owning workspace (`None` for workspaces themselves).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<WorkspaceId>,
    /// Workspaces this workspace feeds across boundaries.
    #[serde(default, rename = "crossDownstreamWSIds")]
    pub cross_downstream_ws_ids: Vec<WorkspaceId>,
    /// Workspaces this workspace receives from across boundaries.
    #[serde(default, rename = "crossUpstreamWSIds")]
    pub cross_upstream_ws_ids: Vec<WorkspaceId>,
    /// Metadata mapping.
    #[serde(default)]
    pub metadata: NodeMetadata,
}

impl Node {
    /// Creates a node with empty metadata.
    pub fn new(id: impl Into<NodeId>, kind: NodeKind, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            name: name.into(),
            workspace_id: None,
            cross_downstream_ws_ids: Vec::new(),
            cross_upstream_ws_ids: Vec::new(),
            metadata: NodeMetadata::default(),
        }
    }

    /// Sets the owning workspace.
    pub fn in_workspace(mut self, workspace_id: impl Into<WorkspaceId>) -> Self {
        self.workspace_id = Some(workspace_id.into());
        self
    }

    /// Returns `true` for workspace nodes.
    pub fn is_workspace(&self) -> bool {
        self.kind.is_workspace()
    }

    /// Workspace that owns this node: itself for workspaces.
    pub fn owning_workspace(&self) -> Option<&str> {
        if self.is_workspace() {
            Some(&self.id)
        } else {
            self.workspace_id.as_deref()
        }
    }

    /// Total cross-workspace degree (fan-out plus fan-in).
    pub fn cross_degree(&self) -> usize {
        self.cross_downstream_ws_ids.len() + self.cross_upstream_ws_ids.len()
    }

    /// Returns `true` for a workspace flagged as having no domain.
    pub fn is_unassigned(&self) -> bool {
        self.metadata.is_unassigned
    }
}
