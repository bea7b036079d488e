// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Impact analysis over artifact lineage edges.
//!
//! Walks `Contains` links between artifacts only. Workspace containment edges
//! and `CrossWorkspace` summaries are never followed.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use lineage_graph::{LineageGraph, LinkKind, NodeId, NodeKind, WorkspaceId};

/// Walk direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Follow links source → target (what breaks if the root changes).
    Downstream,
    /// Follow links target → source (what the root depends on).
    Upstream,
}

/// Nodes reached from a root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Impact {
    /// Starting node.
    pub root: NodeId,
    /// Direction walked.
    pub direction: Direction,
    /// Reached artifacts in breadth-first order; the root is excluded unless a
    /// workspace root seeded the walk with its own artifacts.
    pub nodes: Vec<NodeId>,
    /// Workspaces owning the reached artifacts.
    pub workspaces: BTreeSet<WorkspaceId>,
    /// Reached artifacts per kind.
    pub by_kind: BTreeMap<NodeKind, usize>,
    /// Longest hop count from the root.
    pub depth: usize,
}

impl Impact {
    /// Whether nothing was reached.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Downstream impact of `id`; `None` when the id is unknown.
pub fn impact_of(graph: &LineageGraph, id: &str) -> Option<Impact> {
    walk(graph, id, Direction::Downstream)
}

/// Upstream dependencies of `id`; `None` when the id is unknown.
pub fn upstream_of(graph: &LineageGraph, id: &str) -> Option<Impact> {
    walk(graph, id, Direction::Upstream)
}

/// Breadth-first walk from `id`. A workspace root starts from all of its
/// artifacts.
pub fn walk(graph: &LineageGraph, id: &str, direction: Direction) -> Option<Impact> {
    let index = graph.node_index();
    let &root = index.get(id)?;
    let mut adjacency: HashMap<usize, Vec<usize>> = HashMap::new();
    for link in graph.links.iter().filter(|l| l.kind == LinkKind::Contains) {
        let (Some(&s), Some(&t)) = (index.get(link.source_id()), index.get(link.target_id())) else {
            continue;
        };
        if graph.nodes[s].is_workspace() || graph.nodes[t].is_workspace() {
            continue;
        }
        let (from, to) = match direction {
            Direction::Downstream => (s, t),
            Direction::Upstream => (t, s),
        };
        adjacency.entry(from).or_default().push(to);
    }

    let mut seen = vec![false; graph.nodes.len()];
    let mut queue = VecDeque::new();
    let mut reached = Vec::new();
    seen[root] = true;
    if graph.nodes[root].is_workspace() {
        for (i, n) in graph.nodes.iter().enumerate() {
            if !n.is_workspace() && n.workspace_id.as_deref() == Some(id) {
                seen[i] = true;
                reached.push((i, 0));
                queue.push_back((i, 0));
            }
        }
    } else {
        queue.push_back((root, 0));
    }
    while let Some((at, hops)) = queue.pop_front() {
        for &next in adjacency.get(&at).into_iter().flatten() {
            if !seen[next] {
                seen[next] = true;
                reached.push((next, hops + 1));
                queue.push_back((next, hops + 1));
            }
        }
    }

    let mut impact = Impact {
        root: id.to_owned(),
        direction,
        nodes: Vec::with_capacity(reached.len()),
        workspaces: BTreeSet::new(),
        by_kind: BTreeMap::new(),
        depth: 0,
    };
    for (i, hops) in reached {
        let n = &graph.nodes[i];
        impact.nodes.push(n.id.clone());
        if let Some(ws) = &n.workspace_id {
            impact.workspaces.insert(ws.clone());
        }
        *impact.by_kind.entry(n.kind).or_default() += 1;
        impact.depth = impact.depth.max(hops);
    }
    Some(impact)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use lineage_graph::{Link, Node};

    fn graph() -> LineageGraph {
        let nodes = vec![
            Node::new("w1", NodeKind::Workspace, "W1"),
            Node::new("w2", NodeKind::Workspace, "W2"),
            Node::new("df", NodeKind::Dataflow, "df").in_workspace("w1"),
            Node::new("ds", NodeKind::SemanticModel, "ds").in_workspace("w1"),
            Node::new("r", NodeKind::Report, "r").in_workspace("w2"),
            Node::new("d", NodeKind::Dashboard, "d").in_workspace("w2"),
        ];
        let links = vec![
            Link::contains("w1", "df"),
            Link::contains("w1", "ds"),
            Link::contains("w2", "r"),
            Link::contains("w2", "d"),
            Link::contains("df", "ds"),
            Link::contains("ds", "r"),
            Link::contains("r", "d"),
            Link::cross_workspace("w1", "w2"),
        ];
        LineageGraph::new(nodes, links)
    }

    #[test]
    fn downstream_follows_artifact_edges_only() {
        let g = graph();
        let out = impact_of(&g, "ds").unwrap();
        assert_eq!(out.nodes, ["r", "d"]);
        assert_eq!(out.workspaces.iter().map(String::as_str).collect::<Vec<_>>(), ["w2"]);
        assert_eq!(out.depth, 2);
        assert_eq!(out.by_kind.get(&NodeKind::Dashboard), Some(&1));
    }

    #[test]
    fn upstream_reverses_direction() {
        let out = upstream_of(&graph(), "r").unwrap();
        assert_eq!(out.nodes, ["ds", "df"]);
    }

    #[test]
    fn workspace_root_seeds_its_artifacts() {
        let out = impact_of(&graph(), "w1").unwrap();
        assert_eq!(out.nodes, ["df", "ds", "r", "d"]);
        assert_eq!(out.workspaces.len(), 2);
    }

    #[test]
    fn unknown_root_and_leaves() {
        let g = graph();
        assert!(impact_of(&g, "ghost").is_none());
        assert!(impact_of(&g, "d").unwrap().is_empty());
    }
}
