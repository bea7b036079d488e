// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Graph validator/limiter: restores referential integrity and bounds the
//! number of rendered workspaces.
//!
//! Never fails. Dirty input degrades to a smaller (possibly empty) graph and
//! every drop is logged and counted in [`ValidationReport`].

use std::collections::{HashMap, HashSet};

use lineage_graph::{Link, LinkKind, Node};
use tracing::{debug, info, instrument, warn};

/// Default ceiling on rendered workspaces.
pub const DEFAULT_MAX_WORKSPACES: usize = 100;

/// Validator tunables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatorConfig {
    /// Workspace count above which the limiter kicks in.
    pub max_workspaces: usize,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            max_workspaces: DEFAULT_MAX_WORKSPACES,
        }
    }
}

/// What a validation pass removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Nodes dropped because their id was already taken.
    pub duplicate_nodes: usize,
    /// Links dropped in the first pass for referencing unknown ids.
    pub dangling_links: usize,
    /// Whether the workspace ceiling was exceeded.
    pub limited: bool,
    /// Workspaces kept by rank.
    pub ranked_workspaces: usize,
    /// Extra workspaces kept as one-hop cross-workspace neighbors.
    pub neighbor_workspaces: usize,
    /// Nodes (workspaces and artifacts) removed by the limiter.
    pub dropped_by_limit: usize,
    /// Artifacts removed because their workspace does not exist.
    pub orphaned_artifacts: usize,
    /// Links removed by the final re-filter.
    pub pruned_links: usize,
    /// Node count after validation.
    pub final_nodes: usize,
    /// Link count after validation.
    pub final_links: usize,
}

/// Output of [`validate_with`].
#[derive(Debug, Clone, Default)]
pub struct Validated {
    /// Surviving nodes, in input order.
    pub nodes: Vec<Node>,
    /// Surviving links, in input order.
    pub links: Vec<Link>,
    /// Removal counters.
    pub report: ValidationReport,
}

/// Validates with the default ceiling.
pub fn validate(nodes: Vec<Node>, links: Vec<Link>) -> (Vec<Node>, Vec<Link>) {
    let out = validate_with(nodes, links, &ValidatorConfig::default());
    (out.nodes, out.links)
}

/// Validates `nodes`/`links`: dangling-link removal, cross-workspace degree
/// accounting, size limiting, orphan cleanup, final link re-filter.
#[instrument(skip_all, fields(nodes = nodes.len(), links = links.len(), max = cfg.max_workspaces))]
pub fn validate_with(mut nodes: Vec<Node>, mut links: Vec<Link>, cfg: &ValidatorConfig) -> Validated {
    let mut report = ValidationReport::default();

    let mut seen = HashSet::new();
    nodes.retain(|n| {
        let fresh = seen.insert(n.id.clone());
        if !fresh {
            warn!(id = %n.id, "duplicate node id dropped");
            report.duplicate_nodes += 1;
        }
        fresh
    });

    report.dangling_links = retain_resolvable(&mut links, &nodes);
    accumulate_cross_degrees(&mut nodes, &links);

    let workspace_count = nodes.iter().filter(|n| n.is_workspace()).count();
    if workspace_count > cfg.max_workspaces {
        report.limited = true;
        let (ranked, neighbors) = select_workspaces(&nodes, &links, cfg.max_workspaces);
        report.ranked_workspaces = ranked.len();
        report.neighbor_workspaces = neighbors.len();
        let before = nodes.len();
        nodes.retain(|n| {
            n.owning_workspace()
                .is_some_and(|ws| ranked.contains(ws) || neighbors.contains(ws))
        });
        report.dropped_by_limit = before - nodes.len();
        info!(
            workspaces = workspace_count,
            kept = ranked.len() + neighbors.len(),
            dropped_nodes = report.dropped_by_limit,
            "catalog limited to most connected workspaces"
        );
    }

    let present: HashSet<String> = nodes
        .iter()
        .filter(|n| n.is_workspace())
        .map(|n| n.id.clone())
        .collect();
    nodes.retain(|n| {
        if n.is_workspace() {
            return true;
        }
        let ok = n.workspace_id.as_deref().is_some_and(|ws| present.contains(ws));
        if !ok {
            warn!(
                id = %n.id,
                kind = ?n.kind,
                workspace = n.workspace_id.as_deref().unwrap_or("<none>"),
                "artifact without a valid workspace dropped"
            );
            report.orphaned_artifacts += 1;
        }
        ok
    });

    report.pruned_links = retain_resolvable(&mut links, &nodes);
    accumulate_cross_degrees(&mut nodes, &links);

    report.final_nodes = nodes.len();
    report.final_links = links.len();
    debug!(?report, "validation finished");
    Validated {
        nodes,
        links,
        report,
    }
}

/// Drops links with an endpoint outside `nodes`; returns how many were dropped.
pub fn retain_resolvable(links: &mut Vec<Link>, nodes: &[Node]) -> usize {
    let ids: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    let before = links.len();
    links.retain(|l| {
        let ok = ids.contains(l.source_id()) && ids.contains(l.target_id());
        if !ok {
            debug!(source = l.source_id(), target = l.target_id(), kind = ?l.kind, "dangling link dropped");
        }
        ok
    });
    before - links.len()
}

/// Recomputes `cross_downstream_ws_ids`/`cross_upstream_ws_ids` from the
/// `CrossWorkspace` links. Lists are cleared first, so repeated calls agree.
pub fn accumulate_cross_degrees(nodes: &mut [Node], links: &[Link]) {
    for n in nodes.iter_mut() {
        n.cross_downstream_ws_ids.clear();
        n.cross_upstream_ws_ids.clear();
    }
    let index: HashMap<String, usize> = nodes
        .iter()
        .enumerate()
        .filter(|(_, n)| n.is_workspace())
        .map(|(i, n)| (n.id.clone(), i))
        .collect();
    for link in links.iter().filter(|l| l.kind == LinkKind::CrossWorkspace) {
        let (Some(&s), Some(&t)) = (index.get(link.source_id()), index.get(link.target_id())) else {
            debug!(source = link.source_id(), target = link.target_id(), "cross-workspace link between non-workspaces");
            continue;
        };
        nodes[s].cross_downstream_ws_ids.push(link.target_id().to_owned());
        nodes[t].cross_upstream_ws_ids.push(link.source_id().to_owned());
    }
}

/// Picks the `max` most connected workspaces (ties keep input order) and
/// their one-hop cross-workspace neighbors.
fn select_workspaces(nodes: &[Node], links: &[Link], max: usize) -> (HashSet<String>, HashSet<String>) {
    let mut ranked: Vec<&Node> = nodes.iter().filter(|n| n.is_workspace()).collect();
    ranked.sort_by(|a, b| b.cross_degree().cmp(&a.cross_degree()));
    let top: HashSet<String> = ranked.iter().take(max).map(|n| n.id.clone()).collect();
    let workspaces: HashSet<&str> = ranked.iter().map(|n| n.id.as_str()).collect();

    let mut neighbors = HashSet::new();
    for link in links.iter().filter(|l| l.kind == LinkKind::CrossWorkspace) {
        let (s, t) = (link.source_id(), link.target_id());
        if top.contains(s) && !top.contains(t) && workspaces.contains(t) {
            neighbors.insert(t.to_owned());
        }
        if top.contains(t) && !top.contains(s) && workspaces.contains(s) {
            neighbors.insert(s.to_owned());
        }
    }
    (top, neighbors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lineage_graph::NodeKind;

    fn ws(id: &str) -> Node {
        Node::new(id, NodeKind::Workspace, id)
    }

    fn art(id: &str, ws: &str) -> Node {
        Node::new(id, NodeKind::Report, id).in_workspace(ws)
    }

    #[test]
    fn dangling_links_are_dropped() {
        let nodes = vec![ws("a"), art("r", "a")];
        let links = vec![Link::contains("a", "r"), Link::contains("a", "ghost")];
        let out = validate_with(nodes, links, &ValidatorConfig::default());
        assert_eq!(out.links.len(), 1);
        assert_eq!(out.report.dangling_links, 1);
    }

    #[test]
    fn cross_degrees_are_symmetric_and_idempotent() {
        let nodes = vec![ws("a"), ws("b")];
        let links = vec![Link::cross_workspace("a", "b"), Link::cross_workspace("a", "b")];
        let (nodes, links) = validate(nodes, links);
        assert_eq!(nodes[0].cross_downstream_ws_ids, ["b", "b"]);
        assert_eq!(nodes[1].cross_upstream_ws_ids, ["a", "a"]);
        let (again_nodes, again_links) = validate(nodes.clone(), links.clone());
        assert_eq!(again_nodes, nodes);
        assert_eq!(again_links, links);
    }

    #[test]
    fn orphans_and_their_links_are_removed() {
        let nodes = vec![ws("a"), art("r", "a"), art("lost", "deleted-ws"), Node::new("bare", NodeKind::Notebook, "bare")];
        let links = vec![Link::contains("r", "lost"), Link::contains("a", "r")];
        let out = validate_with(nodes, links, &ValidatorConfig::default());
        assert_eq!(out.report.orphaned_artifacts, 2);
        assert!(out.nodes.iter().all(|n| n.id != "lost" && n.id != "bare"));
        assert_eq!(out.links, vec![Link::contains("a", "r")]);
    }

    #[test]
    fn limiter_keeps_top_ranked_and_their_neighbors() {
        // hub links to h1..h3; lone has no cross links; ceiling 2.
        let nodes = vec![ws("lone"), ws("hub"), ws("h1"), ws("h2"), ws("h3"), art("r", "lone")];
        let links = vec![
            Link::cross_workspace("hub", "h1"),
            Link::cross_workspace("hub", "h2"),
            Link::cross_workspace("h3", "hub"),
            Link::contains("lone", "r"),
        ];
        let out = validate_with(nodes, links, &ValidatorConfig { max_workspaces: 2 });
        let ids: Vec<_> = out.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, ["hub", "h1", "h2", "h3"]);
        assert!(out.report.limited);
        assert_eq!(out.report.ranked_workspaces, 2);
        assert_eq!(out.report.neighbor_workspaces, 2);
        assert_eq!(out.links.len(), 3);
    }
}
