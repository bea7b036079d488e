// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Graph state coordinator: owns the loaded graph and serves lookups.

use std::collections::{BTreeSet, HashMap};

use lineage_graph::{Domain, LineageGraph, Node, UNASSIGNED_DOMAIN};
use tracing::{debug, info, instrument};

use crate::catalog::{RawCatalog, RawItem};
use crate::cluster::{ClusterConfig, DomainClusterForce};
use crate::impact::{walk, Direction, Impact};
use crate::lineage::{link_lineage_with, LinkerOptions};
use crate::normalize::{normalize_catalog, NormalizeStats};
use crate::validate::{validate_with, ValidationReport, ValidatorConfig};
use crate::visibility::{workspace_domain, FilterState, NodeLookup, VisibilityMask};

/// Pipeline knobs for [`GraphState::load`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Validator/limiter settings.
    pub validator: ValidatorConfig,
    /// Lineage linker settings.
    pub linker: LinkerOptions,
}

/// Counters from the last load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Normalizer counters.
    pub normalize: NormalizeStats,
    /// Lineage links emitted before validation.
    pub lineage_links: usize,
    /// Validator counters.
    pub validation: ValidationReport,
}

/// The current graph plus id indexes.
#[derive(Debug, Clone, Default)]
pub struct GraphState {
    graph: LineageGraph,
    domains: Vec<Domain>,
    node_index: HashMap<String, usize>,
    domain_index: HashMap<String, usize>,
    summary: LoadSummary,
}

impl GraphState {
    /// Empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a state in one step.
    pub fn from_catalog(catalog: &RawCatalog, domains: Vec<Domain>, items: &[RawItem], opts: &LoadOptions) -> Self {
        let mut state = Self::new();
        state.load(catalog, domains, items, opts);
        state
    }

    /// Replaces the current graph: normalize, link, validate, resolve.
    #[instrument(skip_all, fields(workspaces = catalog.workspaces.len(), domains = domains.len()))]
    pub fn load(
        &mut self,
        catalog: &RawCatalog,
        domains: Vec<Domain>,
        items: &[RawItem],
        opts: &LoadOptions,
    ) -> &LoadSummary {
        self.clear();
        let normalized = normalize_catalog(&catalog.workspaces, items);
        let mut links = normalized.links;
        let lineage = link_lineage_with(&catalog.workspaces, opts.linker);
        let lineage_links = lineage.len();
        links.extend(lineage);
        let validated = validate_with(normalized.nodes, links, &opts.validator);

        self.graph = LineageGraph::new(validated.nodes, validated.links);
        self.graph.resolve_endpoints();
        self.domains = complete_domains(domains, &self.graph.nodes);
        self.node_index = self
            .graph
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), i))
            .collect();
        self.domain_index = self
            .domains
            .iter()
            .enumerate()
            .map(|(i, d)| (d.id.clone(), i))
            .collect();
        self.summary = LoadSummary {
            normalize: normalized.stats,
            lineage_links,
            validation: validated.report,
        };
        info!(
            nodes = self.graph.nodes.len(),
            links = self.graph.links.len(),
            domains = self.domains.len(),
            "graph loaded"
        );
        &self.summary
    }

    /// Drops the current graph.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Whether nothing is loaded.
    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    /// The loaded graph.
    pub fn graph(&self) -> &LineageGraph {
        &self.graph
    }

    /// Loaded nodes.
    pub fn nodes(&self) -> &[Node] {
        &self.graph.nodes
    }

    /// Loaded links.
    pub fn links(&self) -> &[lineage_graph::Link] {
        &self.graph.links
    }

    /// Domains, including a synthesized entry for every domain id a workspace
    /// references but the domain list lacks.
    pub fn domains(&self) -> &[Domain] {
        &self.domains
    }

    /// Counters from the last load.
    pub fn summary(&self) -> &LoadSummary {
        &self.summary
    }

    /// Position of `id` in [`Self::nodes`].
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.node_index.get(id).copied()
    }

    /// Visibility of every node and link under `filter`.
    pub fn visibility(&self, filter: &FilterState) -> VisibilityMask {
        VisibilityMask::compute(&self.graph.nodes, &self.graph.links, filter, self)
    }

    /// Downstream impact of `id`.
    pub fn impact(&self, id: &str) -> Option<Impact> {
        walk(&self.graph, id, Direction::Downstream)
    }

    /// Upstream dependencies of `id`.
    pub fn upstream(&self, id: &str) -> Option<Impact> {
        walk(&self.graph, id, Direction::Upstream)
    }

    /// Clustering force indexed against the current node order.
    pub fn cluster_force(&self, cfg: ClusterConfig) -> DomainClusterForce {
        DomainClusterForce::new(cfg, &self.graph.nodes)
    }
}

impl NodeLookup for GraphState {
    fn node(&self, id: &str) -> Option<&Node> {
        self.node_index.get(id).map(|&i| &self.graph.nodes[i])
    }

    fn domain(&self, id: &str) -> Option<&Domain> {
        self.domain_index.get(id).map(|&i| &self.domains[i])
    }
}

/// Adds `UNASSIGNED` and any referenced-but-unlisted domain so every
/// workspace resolves to a domain record.
fn complete_domains(mut domains: Vec<Domain>, nodes: &[Node]) -> Vec<Domain> {
    let mut known: BTreeSet<String> = domains.iter().map(|d| d.id.clone()).collect();
    for ws in nodes.iter().filter(|n| n.is_workspace()) {
        let id = workspace_domain(ws);
        if known.contains(id) {
            continue;
        }
        known.insert(id.to_owned());
        if id == UNASSIGNED_DOMAIN {
            domains.push(Domain::unassigned());
        } else {
            debug!(domain = id, "workspace references unlisted domain");
            domains.push(Domain {
                id: id.to_owned(),
                name: id.to_owned(),
                description: None,
                parent_domain_id: None,
            });
        }
    }
    domains
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{RawDataset, RawReport, RawWorkspace};

    fn catalog() -> RawCatalog {
        RawCatalog {
            workspaces: vec![
                RawWorkspace {
                    id: "w1".into(),
                    name: "Sales".into(),
                    domain_id: Some("d1".into()),
                    datasets: vec![RawDataset {
                        id: "ds".into(),
                        name: "Orders".into(),
                        ..RawDataset::default()
                    }],
                    ..RawWorkspace::default()
                },
                RawWorkspace {
                    id: "w2".into(),
                    name: "Ops".into(),
                    reports: vec![RawReport {
                        id: "r".into(),
                        name: "Daily".into(),
                        dataset_id: Some("ds".into()),
                        ..RawReport::default()
                    }],
                    ..RawWorkspace::default()
                },
            ],
        }
    }

    #[test]
    fn load_builds_indexes_and_domains() {
        let state = GraphState::from_catalog(&catalog(), Vec::new(), &[], &LoadOptions::default());
        assert_eq!(state.nodes().len(), 4);
        assert_eq!(state.index_of("r"), Some(3));
        let ids: Vec<_> = state.domains().iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["d1", UNASSIGNED_DOMAIN]);
        assert!(state.links().iter().all(|l| l.source.index().is_some()));
        assert_eq!(state.summary().validation.final_nodes, 4);
        assert_eq!(state.impact("ds").map(|i| i.nodes), Some(vec!["r".to_owned()]));
    }

    #[test]
    fn reload_discards_previous_graph() {
        let mut state = GraphState::from_catalog(&catalog(), Vec::new(), &[], &LoadOptions::default());
        state.load(&RawCatalog::default(), Vec::new(), &[], &LoadOptions::default());
        assert!(state.is_empty());
        assert!(state.domains().is_empty());
        assert!(state.node("ds").is_none());
    }
}
