// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Raw catalog records as produced by the workspace scanner.
//!
//! Shapes are lenient: every array defaults to empty, missing ids default to
//! the empty string (the normalizer drops such records), and unknown keys are
//! captured so they can be carried into node metadata untouched.

use std::collections::BTreeMap;

use lineage_graph::Domain;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Unrecognized keys of a raw record.
pub type Extra = BTreeMap<String, Value>;

/// Error type for decoding catalog inputs.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Input is not valid JSON or a record has the wrong shape.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    /// Top-level value is neither an array nor an object holding `key`.
    #[error("expected an array or an object with a `{key}` array")]
    Shape {
        /// Expected wrapper key.
        key: &'static str,
    },
}

/// Endorsement block attached to artifacts.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RawEndorsement {
    /// `None`, `Promoted` or `Certified`.
    #[serde(default)]
    pub endorsement: Option<String>,
    /// Certifying principal.
    #[serde(default)]
    pub certified_by: Option<String>,
}

/// Sensitivity label reference.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RawSensitivity {
    /// Label id.
    #[serde(default)]
    pub label_id: Option<String>,
}

/// One upstream-dependency entry.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RawUpstream {
    /// Id of the upstream artifact.
    #[serde(
        default,
        alias = "targetDataflowId",
        alias = "targetDatasetId",
        alias = "targetDatamartId"
    )]
    pub target_id: String,
    /// Workspace the upstream artifact lives in.
    #[serde(default, rename = "groupId", alias = "workspaceId")]
    pub workspace_id: Option<String>,
}

/// Fields shared by every catalog artifact.
pub trait RawArtifact {
    /// Artifact id.
    fn id(&self) -> &str;
    /// Display name.
    fn name(&self) -> &str;
    /// Endorsement block.
    fn endorsement(&self) -> Option<&RawEndorsement>;
    /// Sensitivity label.
    fn sensitivity(&self) -> Option<&RawSensitivity>;
    /// Description.
    fn description(&self) -> Option<&str>;
    /// Unrecognized keys.
    fn extra(&self) -> &Extra;
    /// Upstream entries across all upstream arrays.
    fn upstream(&self) -> Vec<&RawUpstream> {
        Vec::new()
    }
}

macro_rules! raw_artifact {
    (@impl $ty:ty, $id:ident, $name:ident, { $($body:tt)* }) => {
        impl RawArtifact for $ty {
            fn id(&self) -> &str {
                &self.$id
            }
            fn name(&self) -> &str {
                &self.$name
            }
            fn endorsement(&self) -> Option<&RawEndorsement> {
                self.endorsement_details.as_ref()
            }
            fn sensitivity(&self) -> Option<&RawSensitivity> {
                self.sensitivity_label.as_ref()
            }
            fn description(&self) -> Option<&str> {
                self.description.as_deref()
            }
            fn extra(&self) -> &Extra {
                &self.extra
            }
            $($body)*
        }
    };
    ($ty:ty, $id:ident, $name:ident, upstream: [$($up:ident),+]) => {
        raw_artifact!(@impl $ty, $id, $name, {
            fn upstream(&self) -> Vec<&RawUpstream> {
                let mut out = Vec::new();
                $(out.extend(self.$up.iter());)+
                out
            }
        });
    };
    ($ty:ty, $id:ident, $name:ident) => {
        raw_artifact!(@impl $ty, $id, $name, {});
    };
}

/// Raw report record.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawReport {
    /// Report id.
    #[serde(default)]
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Raw report type (`PaginatedReport` selects the paginated kind).
    #[serde(default)]
    pub report_type: Option<String>,
    /// Dataset the report reads from.
    #[serde(default)]
    pub dataset_id: Option<String>,
    /// Endorsement block.
    #[serde(default)]
    pub endorsement_details: Option<RawEndorsement>,
    /// Sensitivity label.
    #[serde(default)]
    pub sensitivity_label: Option<RawSensitivity>,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// Unrecognized keys.
    #[serde(flatten)]
    pub extra: Extra,
}
raw_artifact!(RawReport, id, name);

/// Dashboard tile.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RawTile {
    /// Tile id.
    #[serde(default)]
    pub id: Option<String>,
    /// Report pinned by the tile.
    #[serde(default)]
    pub report_id: Option<String>,
    /// Dataset behind the tile.
    #[serde(default)]
    pub dataset_id: Option<String>,
}

/// Raw dashboard record.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawDashboard {
    /// Dashboard id.
    #[serde(default)]
    pub id: String,
    /// Display name.
    #[serde(default, alias = "name")]
    pub display_name: String,
    /// Tiles.
    #[serde(default)]
    pub tiles: Vec<RawTile>,
    /// Endorsement block.
    #[serde(default)]
    pub endorsement_details: Option<RawEndorsement>,
    /// Sensitivity label.
    #[serde(default)]
    pub sensitivity_label: Option<RawSensitivity>,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// Unrecognized keys.
    #[serde(flatten)]
    pub extra: Extra,
}
raw_artifact!(RawDashboard, id, display_name);

/// Raw dataset (semantic model) record.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawDataset {
    /// Dataset id.
    #[serde(default)]
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Principal that configured the dataset.
    #[serde(default)]
    pub configured_by: Option<String>,
    /// Upstream dataflows.
    #[serde(default)]
    pub upstream_dataflows: Vec<RawUpstream>,
    /// Upstream datasets.
    #[serde(default)]
    pub upstream_datasets: Vec<RawUpstream>,
    /// Upstream datamarts.
    #[serde(default)]
    pub upstream_datamarts: Vec<RawUpstream>,
    /// Endorsement block.
    #[serde(default)]
    pub endorsement_details: Option<RawEndorsement>,
    /// Sensitivity label.
    #[serde(default)]
    pub sensitivity_label: Option<RawSensitivity>,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// Unrecognized keys.
    #[serde(flatten)]
    pub extra: Extra,
}
raw_artifact!(RawDataset, id, name, upstream: [upstream_dataflows, upstream_datasets, upstream_datamarts]);

/// Raw dataflow record.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawDataflow {
    /// Dataflow id (the scanner calls it `objectId`).
    #[serde(default, alias = "id")]
    pub object_id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Principal that configured the dataflow.
    #[serde(default)]
    pub configured_by: Option<String>,
    /// Upstream dataflows.
    #[serde(default)]
    pub upstream_dataflows: Vec<RawUpstream>,
    /// Upstream datamarts.
    #[serde(default)]
    pub upstream_datamarts: Vec<RawUpstream>,
    /// Endorsement block.
    #[serde(default)]
    pub endorsement_details: Option<RawEndorsement>,
    /// Sensitivity label.
    #[serde(default)]
    pub sensitivity_label: Option<RawSensitivity>,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// Unrecognized keys.
    #[serde(flatten)]
    pub extra: Extra,
}
raw_artifact!(RawDataflow, object_id, name, upstream: [upstream_dataflows, upstream_datamarts]);

/// Raw datamart record (also carries lakehouses and warehouses).
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawDatamart {
    /// Datamart id.
    #[serde(default)]
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Reported subtype: `Lakehouse`, `Datawarehouse`, or anything else.
    #[serde(default, rename = "type", alias = "datamartType")]
    pub datamart_type: Option<String>,
    /// Principal that configured the datamart.
    #[serde(default)]
    pub configured_by: Option<String>,
    /// Upstream dataflows.
    #[serde(default)]
    pub upstream_dataflows: Vec<RawUpstream>,
    /// Upstream datamarts.
    #[serde(default)]
    pub upstream_datamarts: Vec<RawUpstream>,
    /// Endorsement block.
    #[serde(default)]
    pub endorsement_details: Option<RawEndorsement>,
    /// Sensitivity label.
    #[serde(default)]
    pub sensitivity_label: Option<RawSensitivity>,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// Unrecognized keys.
    #[serde(flatten)]
    pub extra: Extra,
}
raw_artifact!(RawDatamart, id, name, upstream: [upstream_dataflows, upstream_datamarts]);

/// Raw workspace record with its artifact arrays.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawWorkspace {
    /// Workspace id.
    #[serde(default)]
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Raw workspace type.
    #[serde(default, rename = "type")]
    pub workspace_type: Option<String>,
    /// Raw state; `Deleted` workspaces are skipped.
    #[serde(default)]
    pub state: Option<String>,
    /// Owning domain; absent or null means unassigned.
    #[serde(default)]
    pub domain_id: Option<String>,
    /// Hosting capacity.
    #[serde(default)]
    pub capacity_id: Option<String>,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// Reports.
    #[serde(default)]
    pub reports: Vec<RawReport>,
    /// Dashboards.
    #[serde(default)]
    pub dashboards: Vec<RawDashboard>,
    /// Datasets.
    #[serde(default)]
    pub datasets: Vec<RawDataset>,
    /// Dataflows.
    #[serde(default)]
    pub dataflows: Vec<RawDataflow>,
    /// Datamarts, lakehouses and warehouses.
    #[serde(default)]
    pub datamarts: Vec<RawDatamart>,
    /// Unrecognized keys.
    #[serde(flatten)]
    pub extra: Extra,
}

impl RawWorkspace {
    /// Returns `true` when the scanner reports the workspace as deleted.
    pub fn is_deleted(&self) -> bool {
        self.state
            .as_deref()
            .is_some_and(|s| s.trim().eq_ignore_ascii_case("deleted"))
    }
}

/// Native item from the items collaborator.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RawItem {
    /// Item id.
    #[serde(default)]
    pub id: String,
    /// Display name.
    #[serde(default, alias = "name")]
    pub display_name: String,
    /// Raw item type (e.g. `Notebook`, `DataPipeline`).
    #[serde(default, rename = "type")]
    pub item_type: String,
    /// Owning workspace.
    #[serde(default)]
    pub workspace_id: Option<String>,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
}

/// A full raw catalog.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawCatalog {
    /// Workspaces in scan order.
    pub workspaces: Vec<RawWorkspace>,
}

fn unwrap_list(value: Value, key: &'static str) -> Result<Value, CatalogError> {
    match value {
        Value::Array(_) => Ok(value),
        Value::Object(mut map) => match map.remove(key) {
            Some(list @ Value::Array(_)) => Ok(list),
            _ => Err(CatalogError::Shape { key }),
        },
        _ => Err(CatalogError::Shape { key }),
    }
}

/// Decodes a scan result (`{"workspaces": [...]}`) or a bare workspace array.
pub fn parse_catalog(bytes: &[u8]) -> Result<RawCatalog, CatalogError> {
    let value: Value = serde_json::from_slice(bytes)?;
    let workspaces = serde_json::from_value(unwrap_list(value, "workspaces")?)?;
    Ok(RawCatalog { workspaces })
}

/// Decodes a domain list (`{"domains": [...]}` or a bare array).
pub fn parse_domains(bytes: &[u8]) -> Result<Vec<Domain>, CatalogError> {
    let value: Value = serde_json::from_slice(bytes)?;
    Ok(serde_json::from_value(unwrap_list(value, "domains")?)?)
}

/// Decodes a native item list (`{"value": [...]}` or a bare array).
pub fn parse_items(bytes: &[u8]) -> Result<Vec<RawItem>, CatalogError> {
    let value: Value = serde_json::from_slice(bytes)?;
    Ok(serde_json::from_value(unwrap_list(value, "value")?)?)
}
