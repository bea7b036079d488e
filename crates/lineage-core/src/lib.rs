// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Lineage pipeline: raw tenant catalog in, validated renderable graph out.
//!
//! Stages run in order: [`normalize`] (workspaces and artifacts into nodes
//! with containment links), [`lineage`] (upstream arrays into lineage edges),
//! [`validate`] (integrity repair and workspace limiting). [`visibility`]
//! answers what is shown for a filter state, and [`cluster`] is the force
//! that groups workspaces by domain during layout. [`state::GraphState`] ties
//! the stages together.

pub mod boundary;
pub mod builder;
pub mod catalog;
pub mod cluster;
pub mod impact;
pub mod layout;
pub mod lineage;
pub mod normalize;
pub mod palette;
pub mod state;
pub mod validate;
pub mod visibility;

pub use boundary::{domain_boundaries, Bounds, DomainBoundary};
pub use catalog::{parse_catalog, parse_domains, parse_items, CatalogError, RawCatalog, RawItem};
pub use cluster::{Bodies, ClusterConfig, DomainClusterForce, Force, PositionReader, VelocityWriter};
pub use impact::{impact_of, upstream_of, Direction, Impact};
pub use layout::{Simulation, SimulationConfig};
pub use lineage::{link_lineage, link_lineage_with, LinkerOptions};
pub use normalize::{normalize, normalize_catalog, NormalizeStats};
pub use state::{GraphState, LoadOptions, LoadSummary};
pub use validate::{validate, validate_with, ValidationReport, ValidatorConfig};
pub use visibility::{
    is_link_visible, is_node_visible, reduce, FilterEvent, FilterState, NodeLookup, SliceLookup,
    VisibilityMask,
};
