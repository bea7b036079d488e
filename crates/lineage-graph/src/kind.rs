// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Closed classification of nodes and links.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Artifact kind of a node.
///
/// The set is closed: raw catalog types that do not map onto one of these
/// variants are dropped during normalization.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeKind {
    /// A workspace (container of artifacts).
    Workspace,
    /// A semantic model (formerly "dataset").
    SemanticModel,
    /// An interactive report.
    Report,
    /// A paginated (RDL) report.
    PaginatedReport,
    /// A dashboard composed of report tiles.
    Dashboard,
    /// A dataflow.
    Dataflow,
    /// A lakehouse.
    Lakehouse,
    /// The SQL analytics endpoint exposed by a lakehouse.
    #[serde(rename = "SQLEndpoint")]
    SqlEndpoint,
    /// A data warehouse.
    DataWarehouse,
    /// A generic datamart.
    Datamart,
    /// A notebook.
    Notebook,
    /// A data pipeline.
    Pipeline,
    /// A Spark job definition.
    SparkJob,
    /// An eventstream.
    Eventstream,
    /// An eventhouse.
    Eventhouse,
    /// A KQL database.
    #[serde(rename = "KQLDatabase")]
    KqlDatabase,
    /// A KQL queryset.
    #[serde(rename = "KQLQueryset")]
    KqlQueryset,
    /// A machine-learning model.
    #[serde(rename = "MLModel")]
    MlModel,
    /// A machine-learning experiment.
    #[serde(rename = "MLExperiment")]
    MlExperiment,
    /// An organizational app.
    App,
}

impl NodeKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 20] = [
        Self::Workspace,
        Self::SemanticModel,
        Self::Report,
        Self::PaginatedReport,
        Self::Dashboard,
        Self::Dataflow,
        Self::Lakehouse,
        Self::SqlEndpoint,
        Self::DataWarehouse,
        Self::Datamart,
        Self::Notebook,
        Self::Pipeline,
        Self::SparkJob,
        Self::Eventstream,
        Self::Eventhouse,
        Self::KqlDatabase,
        Self::KqlQueryset,
        Self::MlModel,
        Self::MlExperiment,
        Self::App,
    ];

    /// Human-readable label, also matched by search.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Workspace => "Workspace",
            Self::SemanticModel => "Semantic Model",
            Self::Report => "Report",
            Self::PaginatedReport => "Paginated Report",
            Self::Dashboard => "Dashboard",
            Self::Dataflow => "Dataflow",
            Self::Lakehouse => "Lakehouse",
            Self::SqlEndpoint => "SQL Analytics Endpoint",
            Self::DataWarehouse => "Data Warehouse",
            Self::Datamart => "Datamart",
            Self::Notebook => "Notebook",
            Self::Pipeline => "Pipeline",
            Self::SparkJob => "Spark Job",
            Self::Eventstream => "Eventstream",
            Self::Eventhouse => "Eventhouse",
            Self::KqlDatabase => "KQL Database",
            Self::KqlQueryset => "KQL Queryset",
            Self::MlModel => "ML Model",
            Self::MlExperiment => "ML Experiment",
            Self::App => "App",
        }
    }

    /// Stable machine name (matches the serde representation).
    pub const fn name(self) -> &'static str {
        match self {
            Self::Workspace => "Workspace",
            Self::SemanticModel => "SemanticModel",
            Self::Report => "Report",
            Self::PaginatedReport => "PaginatedReport",
            Self::Dashboard => "Dashboard",
            Self::Dataflow => "Dataflow",
            Self::Lakehouse => "Lakehouse",
            Self::SqlEndpoint => "SQLEndpoint",
            Self::DataWarehouse => "DataWarehouse",
            Self::Datamart => "Datamart",
            Self::Notebook => "Notebook",
            Self::Pipeline => "Pipeline",
            Self::SparkJob => "SparkJob",
            Self::Eventstream => "Eventstream",
            Self::Eventhouse => "Eventhouse",
            Self::KqlDatabase => "KQLDatabase",
            Self::KqlQueryset => "KQLQueryset",
            Self::MlModel => "MLModel",
            Self::MlExperiment => "MLExperiment",
            Self::App => "App",
        }
    }

    /// Returns `true` for workspace nodes.
    pub const fn is_workspace(self) -> bool {
        matches!(self, Self::Workspace)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when a string names no known [`NodeKind`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown node kind: {0}")]
pub struct UnknownKind(pub String);

impl FromStr for NodeKind {
    type Err = UnknownKind;

    /// Accepts the machine name or the label, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(wanted) || k.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownKind(s.to_owned()))
    }
}

/// Relationship carried by a link.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LinkKind {
    /// Structural containment or artifact-level data flow.
    Contains,
    /// Workspace-to-workspace dependency summary.
    CrossWorkspace,
}
