// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Lineage linker: upstream-dependency arrays into artifact and
//! workspace-summary edges.

use std::collections::HashSet;

use lineage_graph::Link;
use tracing::{debug, instrument};

use crate::catalog::{RawArtifact, RawWorkspace};

/// Options for [`link_lineage_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkerOptions {
    /// Drop exact duplicates (same source, target and kind).
    pub dedupe: bool,
}

/// Emits lineage edges for every dataset, dataflow and datamart.
///
/// Each upstream entry yields a `Contains` edge upstream → dependent. When the
/// upstream lives in another workspace, a `CrossWorkspace` edge between the two
/// workspaces is emitted as well. Duplicates are kept.
pub fn link_lineage(workspaces: &[RawWorkspace]) -> Vec<Link> {
    link_lineage_with(workspaces, LinkerOptions::default())
}

/// [`link_lineage`] with explicit options.
#[instrument(skip_all, fields(workspaces = workspaces.len(), dedupe = opts.dedupe))]
pub fn link_lineage_with(workspaces: &[RawWorkspace], opts: LinkerOptions) -> Vec<Link> {
    let mut links = Vec::new();
    for ws in workspaces.iter().filter(|ws| !ws.is_deleted()) {
        let artifacts = ws
            .datasets
            .iter()
            .map(|a| a as &dyn RawArtifact)
            .chain(ws.dataflows.iter().map(|a| a as &dyn RawArtifact))
            .chain(ws.datamarts.iter().map(|a| a as &dyn RawArtifact));
        for artifact in artifacts {
            for up in artifact.upstream() {
                if up.target_id.is_empty() {
                    debug!(artifact = artifact.id(), "upstream entry without target");
                    continue;
                }
                links.push(Link::contains(up.target_id.as_str(), artifact.id()));
                match up.workspace_id.as_deref() {
                    Some(up_ws) if !up_ws.is_empty() && up_ws != ws.id => {
                        links.push(Link::cross_workspace(up_ws, ws.id.as_str()));
                    }
                    _ => {}
                }
            }
        }
    }
    if opts.dedupe {
        dedupe(&mut links);
    }
    debug!(links = links.len(), "lineage linked");
    links
}

/// Removes repeated links, keeping the first occurrence.
pub fn dedupe(links: &mut Vec<Link>) {
    let mut seen = HashSet::new();
    links.retain(|l| seen.insert((l.source_id().to_owned(), l.target_id().to_owned(), l.kind)));
}
