// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Table rendering for command output.

use std::collections::BTreeMap;

use comfy_table::{presets::UTF8_FULL, Table};
use lineage_core::palette::to_hex;
use lineage_core::{DomainBoundary, Impact, LoadSummary};
use lineage_graph::{Node, NodeKind};
use serde::Serialize;

fn table(header: &[&str]) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL).set_header(header.to_vec());
    t
}

/// Node counts per kind, in kind order.
pub fn kind_counts<'a>(nodes: impl IntoIterator<Item = &'a Node>) -> BTreeMap<NodeKind, usize> {
    let mut counts = BTreeMap::new();
    for n in nodes {
        *counts.entry(n.kind).or_insert(0) += 1;
    }
    counts
}

/// `Kind | Nodes` table.
pub fn kinds_table(counts: &BTreeMap<NodeKind, usize>) -> Table {
    let mut t = table(&["Kind", "Nodes"]);
    for (kind, n) in counts {
        t.add_row(vec![kind.label().to_owned(), n.to_string()]);
    }
    t
}

/// What the pipeline removed or synthesized.
pub fn summary_table(s: &LoadSummary) -> Table {
    let v = &s.validation;
    let rows: [(&str, String); 12] = [
        ("workspaces normalized", s.normalize.workspaces.to_string()),
        ("deleted workspaces skipped", s.normalize.deleted_workspaces.to_string()),
        ("records without id", s.normalize.missing_ids.to_string()),
        ("sql endpoints synthesized", s.normalize.sql_endpoints.to_string()),
        ("native items added", s.normalize.items.to_string()),
        ("lineage links", s.lineage_links.to_string()),
        ("dangling links dropped", v.dangling_links.to_string()),
        ("limited", if v.limited { format!("yes (+{} neighbors)", v.neighbor_workspaces) } else { "no".to_owned() }),
        ("dropped by limit", v.dropped_by_limit.to_string()),
        ("orphaned artifacts", v.orphaned_artifacts.to_string()),
        ("final nodes", v.final_nodes.to_string()),
        ("final links", v.final_links.to_string()),
    ];
    let mut t = table(&["Step", "Count"]);
    for (label, value) in rows {
        t.add_row(vec![label.to_owned(), value]);
    }
    t
}

/// Boundary overlay table.
pub fn boundaries_table(boundaries: &[DomainBoundary]) -> Table {
    let mut t = table(&["Domain", "Name", "Color", "Workspaces", "Artifacts", "Center", "Size"]);
    for b in boundaries {
        let c = b.bounds.center();
        let s = b.bounds.size();
        t.add_row(vec![
            b.domain_id.clone(),
            b.name.clone(),
            to_hex(b.color),
            b.workspaces.to_string(),
            b.artifacts.to_string(),
            format!("({:.0}, {:.0})", c.x, c.y),
            format!("{:.0} x {:.0}", s.x, s.y),
        ]);
    }
    t
}

/// Reached nodes with their kind and workspace.
pub fn impact_table(impact: &Impact, lookup: impl Fn(&str) -> Option<(NodeKind, Option<String>)>) -> Table {
    let mut t = table(&["Node", "Kind", "Workspace"]);
    for id in &impact.nodes {
        let (kind, ws) = lookup(id).map_or(("?".to_owned(), String::new()), |(k, ws)| {
            (k.label().to_owned(), ws.unwrap_or_default())
        });
        t.add_row(vec![id.clone(), kind, ws]);
    }
    t
}

/// Machine-readable `build` output.
#[derive(Debug, Serialize)]
pub struct BuildReport {
    /// Node count.
    pub nodes: usize,
    /// Link count.
    pub links: usize,
    /// Domain count (including synthesized ones).
    pub domains: usize,
    /// Hex blake3 hash of the canonical graph bytes.
    pub hash: String,
    /// Nodes per kind label.
    pub kinds: BTreeMap<String, usize>,
    /// Whether the workspace ceiling kicked in.
    pub limited: bool,
    /// Artifacts dropped for lacking a workspace.
    pub orphaned_artifacts: usize,
    /// Links dropped for unresolvable endpoints.
    pub dangling_links: usize,
}
