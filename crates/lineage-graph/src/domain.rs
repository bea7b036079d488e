// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Organizational domains grouping workspaces.

use serde::{Deserialize, Serialize};

/// Domain identifier.
pub type DomainId = String;

/// Sentinel domain id for workspaces without a domain.
pub const UNASSIGNED_DOMAIN: &str = "UNASSIGNED";

/// An organizational grouping of workspaces; read-only to the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    /// Domain identifier.
    pub id: DomainId,
    /// Display name.
    #[serde(default, alias = "displayName")]
    pub name: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Parent domain for hierarchical domains.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_domain_id: Option<DomainId>,
}

impl Domain {
    /// The synthesized first-class domain for ungoverned workspaces.
    pub fn unassigned() -> Self {
        Self {
            id: UNASSIGNED_DOMAIN.to_owned(),
            name: "Unassigned".to_owned(),
            description: None,
            parent_domain_id: None,
        }
    }

    /// Returns `true` for the `UNASSIGNED` sentinel.
    pub fn is_unassigned(&self) -> bool {
        self.id == UNASSIGNED_DOMAIN
    }
}
