// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Catalog normalizer: raw workspace records into uniform nodes plus
//! containment links.

use lineage_graph::{
    Endorsement, Link, Node, NodeDetails, NodeKind, NodeMetadata, UNASSIGNED_DOMAIN,
};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::builder::{GraphBuilder, GraphMutator};
use crate::catalog::{RawArtifact, RawItem, RawWorkspace};

/// Suffix appended to a lakehouse id to derive its SQL endpoint id.
pub const SQL_ENDPOINT_SUFFIX: &str = "-sqlendpoint";

/// Id of the SQL analytics endpoint synthesized for `lakehouse_id`.
pub fn sql_endpoint_id(lakehouse_id: &str) -> String {
    format!("{lakehouse_id}{SQL_ENDPOINT_SUFFIX}")
}

/// Counters describing one normalization run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeStats {
    /// Workspace nodes created.
    pub workspaces: usize,
    /// Workspaces skipped because their state is `Deleted`.
    pub deleted_workspaces: usize,
    /// Records skipped because they carry no id.
    pub missing_ids: usize,
    /// Artifact nodes created from catalog arrays (endpoints excluded).
    pub artifacts: usize,
    /// SQL analytics endpoints synthesized for lakehouses.
    pub sql_endpoints: usize,
    /// Native items added.
    pub items: usize,
    /// Native items skipped because their id already existed.
    pub duplicate_items: usize,
    /// Native items skipped because their type is not in the type table.
    pub unknown_items: usize,
}

/// Output of [`normalize_catalog`].
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    /// Normalized nodes.
    pub nodes: Vec<Node>,
    /// Containment (and report-derived cross-workspace) links.
    pub links: Vec<Link>,
    /// Run counters.
    pub stats: NormalizeStats,
}

/// Converts raw workspaces (and optional native items) into nodes and
/// containment links.
pub fn normalize(workspaces: &[RawWorkspace], items: &[RawItem]) -> (Vec<Node>, Vec<Link>) {
    let out = normalize_catalog(workspaces, items);
    (out.nodes, out.links)
}

/// [`normalize`] plus run counters.
#[instrument(skip_all, fields(workspaces = workspaces.len(), items = items.len()))]
pub fn normalize_catalog(workspaces: &[RawWorkspace], items: &[RawItem]) -> Normalized {
    let mut g = GraphBuilder::new();
    let mut stats = NormalizeStats::default();
    let live: Vec<&RawWorkspace> = workspaces
        .iter()
        .filter(|ws| {
            if ws.is_deleted() {
                debug!(workspace = %ws.id, "skipping deleted workspace");
                stats.deleted_workspaces += 1;
                return false;
            }
            if ws.id.trim().is_empty() {
                warn!(name = %ws.name, "skipping workspace without id");
                stats.missing_ids += 1;
                return false;
            }
            true
        })
        .collect();

    // Sources first so report and tile lookups see every workspace's data.
    for ws in &live {
        if g.insert_node(workspace_node(ws)) {
            stats.workspaces += 1;
        }
        for ds in &ws.datasets {
            let mut node = artifact_node(ds, NodeKind::SemanticModel, &ws.id);
            node.metadata.details = NodeDetails::Dataset {
                configured_by: ds.configured_by.clone(),
            };
            add_artifact(&mut g, &mut stats, node);
        }
        for df in &ws.dataflows {
            let mut node = artifact_node(df, NodeKind::Dataflow, &ws.id);
            node.metadata.details = NodeDetails::Dataset {
                configured_by: df.configured_by.clone(),
            };
            add_artifact(&mut g, &mut stats, node);
        }
        for dm in &ws.datamarts {
            let kind = datamart_kind(dm.datamart_type.as_deref());
            let mut node = artifact_node(dm, kind, &ws.id);
            node.metadata.details = NodeDetails::Datamart {
                datamart_type: dm.datamart_type.clone(),
            };
            add_artifact(&mut g, &mut stats, node);
        }
    }

    for ws in &live {
        for report in &ws.reports {
            let kind = if report.report_type.as_deref() == Some("PaginatedReport") {
                NodeKind::PaginatedReport
            } else {
                NodeKind::Report
            };
            let mut node = artifact_node(report, kind, &ws.id);
            node.metadata.details = NodeDetails::Report {
                dataset_id: report.dataset_id.clone(),
                report_type: report.report_type.clone(),
            };
            let report_id = node.id.clone();
            if !add_artifact(&mut g, &mut stats, node) {
                continue;
            }
            let Some(dataset_id) = report.dataset_id.as_deref() else {
                continue;
            };
            let Some(dataset_ws) = g.node(dataset_id).map(|ds| ds.owning_workspace().map(str::to_owned)) else {
                debug!(report = %report_id, dataset = dataset_id, "report dataset not in catalog");
                continue;
            };
            g.insert_link(Link::contains(dataset_id, report_id.as_str()));
            if let Some(dataset_ws) = dataset_ws {
                if dataset_ws != ws.id {
                    g.insert_link(Link::cross_workspace(dataset_ws, ws.id.as_str()));
                }
            }
        }
    }

    for ws in &live {
        for dash in &ws.dashboards {
            let mut tile_reports: Vec<String> = Vec::new();
            for tile in &dash.tiles {
                if let Some(rid) = tile.report_id.as_deref() {
                    if !tile_reports.iter().any(|r| r == rid) {
                        tile_reports.push(rid.to_owned());
                    }
                }
            }
            let mut node = artifact_node(dash, NodeKind::Dashboard, &ws.id);
            node.metadata.details = NodeDetails::Dashboard {
                tile_report_ids: tile_reports.clone(),
            };
            let dash_id = node.id.clone();
            if !add_artifact(&mut g, &mut stats, node) {
                continue;
            }
            for rid in tile_reports {
                if g.contains_node(&rid) {
                    g.insert_link(Link::contains(rid, dash_id.as_str()));
                }
            }
        }
    }

    // Endpoints last so every native lakehouse is known when they are deduped.
    let is_endpoint = |item: &&RawItem| item_kind(&item.item_type) == Some(NodeKind::SqlEndpoint);
    for item in items.iter().filter(|i| !is_endpoint(i)) {
        add_item(&mut g, &mut stats, item);
    }
    for item in items.iter().filter(is_endpoint) {
        add_item(&mut g, &mut stats, item);
    }

    let (nodes, links) = g.finish();
    info!(
        nodes = nodes.len(),
        links = links.len(),
        workspaces = stats.workspaces,
        "catalog normalized"
    );
    Normalized { nodes, links, stats }
}

/// Resolves a datamart's reported subtype to its node kind.
pub fn datamart_kind(raw: Option<&str>) -> NodeKind {
    match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
        Some("lakehouse") => NodeKind::Lakehouse,
        Some("datawarehouse" | "warehouse") => NodeKind::DataWarehouse,
        _ => NodeKind::Datamart,
    }
}

/// Fixed type table for native items; `None` for types outside the graph.
pub fn item_kind(raw: &str) -> Option<NodeKind> {
    let kind = match raw.trim().to_ascii_lowercase().as_str() {
        "semanticmodel" | "dataset" => NodeKind::SemanticModel,
        "report" => NodeKind::Report,
        "paginatedreport" => NodeKind::PaginatedReport,
        "dashboard" => NodeKind::Dashboard,
        "dataflow" => NodeKind::Dataflow,
        "lakehouse" => NodeKind::Lakehouse,
        "sqlendpoint" | "sqlanalyticsendpoint" => NodeKind::SqlEndpoint,
        "warehouse" | "datawarehouse" => NodeKind::DataWarehouse,
        "datamart" => NodeKind::Datamart,
        "notebook" => NodeKind::Notebook,
        "datapipeline" | "pipeline" => NodeKind::Pipeline,
        "sparkjobdefinition" | "sparkjob" => NodeKind::SparkJob,
        "eventstream" => NodeKind::Eventstream,
        "eventhouse" => NodeKind::Eventhouse,
        "kqldatabase" => NodeKind::KqlDatabase,
        "kqlqueryset" => NodeKind::KqlQueryset,
        "mlmodel" => NodeKind::MlModel,
        "mlexperiment" => NodeKind::MlExperiment,
        "orgapp" | "app" => NodeKind::App,
        _ => return None,
    };
    Some(kind)
}

fn workspace_node(ws: &RawWorkspace) -> Node {
    let domain = ws
        .domain_id
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty() && *d != UNASSIGNED_DOMAIN);
    let mut node = Node::new(ws.id.as_str(), NodeKind::Workspace, ws.name.as_str());
    node.metadata = NodeMetadata {
        description: ws.description.clone(),
        domain_id: Some(domain.unwrap_or(UNASSIGNED_DOMAIN).to_owned()),
        is_unassigned: domain.is_none(),
        details: NodeDetails::Workspace {
            state: ws.state.clone(),
            workspace_type: ws.workspace_type.clone(),
            capacity_id: ws.capacity_id.clone(),
        },
        extra: ws.extra.clone(),
        ..NodeMetadata::default()
    };
    node
}

fn artifact_node<A: RawArtifact>(raw: &A, kind: NodeKind, workspace_id: &str) -> Node {
    let mut node = Node::new(raw.id(), kind, raw.name()).in_workspace(workspace_id);
    let endorsement = raw.endorsement();
    node.metadata = NodeMetadata {
        endorsement: Endorsement::from_raw(endorsement.and_then(|e| e.endorsement.as_deref())),
        certified_by: endorsement.and_then(|e| e.certified_by.clone()),
        sensitivity_label: raw.sensitivity().and_then(|s| s.label_id.clone()),
        description: raw.description().map(str::to_owned),
        extra: raw.extra().clone(),
        ..NodeMetadata::default()
    };
    node
}

/// Inserts an artifact with its workspace link; lakehouses also get their
/// SQL endpoint. Returns `false` when the node was not inserted.
fn add_artifact(g: &mut GraphBuilder, stats: &mut NormalizeStats, node: Node) -> bool {
    if node.id.trim().is_empty() {
        warn!(kind = ?node.kind, name = %node.name, "skipping artifact without id");
        stats.missing_ids += 1;
        return false;
    }
    let Some(ws_id) = node.workspace_id.clone() else {
        return false;
    };
    let id = node.id.clone();
    let is_lakehouse = node.kind == NodeKind::Lakehouse;
    let name = node.name.clone();
    if !g.insert_node(node) {
        return false;
    }
    stats.artifacts += 1;
    g.insert_link(Link::contains(ws_id.as_str(), id.as_str()));
    if is_lakehouse {
        synthesize_sql_endpoint(g, stats, &id, &name, &ws_id);
    }
    true
}

fn synthesize_sql_endpoint(
    g: &mut GraphBuilder,
    stats: &mut NormalizeStats,
    lakehouse_id: &str,
    lakehouse_name: &str,
    ws_id: &str,
) {
    let endpoint_id = sql_endpoint_id(lakehouse_id);
    let mut endpoint = Node::new(
        endpoint_id.as_str(),
        NodeKind::SqlEndpoint,
        format!("{lakehouse_name} SQL analytics endpoint"),
    )
    .in_workspace(ws_id);
    endpoint.metadata.details = NodeDetails::SqlEndpoint {
        parent_lakehouse_id: lakehouse_id.to_owned(),
    };
    if !g.insert_node(endpoint) {
        return;
    }
    stats.sql_endpoints += 1;
    if let Some(lakehouse) = g.node_mut(lakehouse_id) {
        lakehouse
            .metadata
            .extra
            .insert("sqlEndpointId".to_owned(), Value::String(endpoint_id.clone()));
    }
    g.insert_link(Link::contains(lakehouse_id, endpoint_id.as_str()));
    g.insert_link(Link::contains(ws_id, endpoint_id.as_str()));
}

fn add_item(g: &mut GraphBuilder, stats: &mut NormalizeStats, item: &RawItem) {
    if item.id.trim().is_empty() {
        stats.missing_ids += 1;
        return;
    }
    if g.contains_node(&item.id) {
        stats.duplicate_items += 1;
        return;
    }
    let Some(kind) = item_kind(&item.item_type) else {
        debug!(id = %item.id, item_type = %item.item_type, "native item type not mapped");
        stats.unknown_items += 1;
        return;
    };
    let ws_id = item.workspace_id.as_deref().unwrap_or_default();
    if kind == NodeKind::SqlEndpoint && g.has_lakehouse(ws_id, &item.display_name) {
        // Already represented by the synthesized endpoint of that lakehouse.
        stats.duplicate_items += 1;
        return;
    }
    let mut node = Node::new(item.id.as_str(), kind, item.display_name.as_str());
    node.metadata.description = item.description.clone();
    node.metadata.details = NodeDetails::Item {
        item_type: item.item_type.clone(),
    };
    if ws_id.is_empty() {
        // Kept so validation can report it as an orphan.
        warn!(id = %item.id, "native item without workspace");
        if g.insert_node(node) {
            stats.items += 1;
        }
        return;
    }
    let node = node.in_workspace(ws_id);
    let is_lakehouse = kind == NodeKind::Lakehouse;
    if g.insert_node(node) {
        stats.items += 1;
        g.insert_link(Link::contains(ws_id, item.id.as_str()));
        if is_lakehouse {
            synthesize_sql_endpoint(g, stats, &item.id, &item.display_name, ws_id);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::catalog::{RawDatamart, RawDataset, RawReport};
    use lineage_graph::LinkKind;

    fn ws(id: &str, domain: Option<&str>) -> RawWorkspace {
        RawWorkspace {
            id: id.into(),
            name: format!("{id} name"),
            domain_id: domain.map(Into::into),
            ..RawWorkspace::default()
        }
    }

    fn has_link(links: &[Link], s: &str, t: &str, kind: LinkKind) -> bool {
        links.iter().any(|l| l.key() == (s, t, kind))
    }

    #[test]
    fn missing_domain_is_tagged_unassigned() {
        let (nodes, _) = normalize(&[ws("w", None)], &[]);
        assert_eq!(nodes[0].metadata.domain_id.as_deref(), Some(UNASSIGNED_DOMAIN));
        assert!(nodes[0].metadata.is_unassigned);

        let (nodes, _) = normalize(&[ws("w", Some("d1"))], &[]);
        assert_eq!(nodes[0].metadata.domain_id.as_deref(), Some("d1"));
        assert!(!nodes[0].metadata.is_unassigned);
    }

    #[test]
    fn deleted_workspaces_are_skipped_with_their_artifacts() {
        let mut w = ws("gone", Some("d"));
        w.state = Some("Deleted".into());
        w.datasets.push(RawDataset {
            id: "ds".into(),
            ..RawDataset::default()
        });
        let out = normalize_catalog(&[w], &[]);
        assert!(out.nodes.is_empty());
        assert_eq!(out.stats.deleted_workspaces, 1);
    }

    #[test]
    fn datamart_subtype_dispatch() {
        assert_eq!(datamart_kind(Some("Lakehouse")), NodeKind::Lakehouse);
        assert_eq!(datamart_kind(Some("Datawarehouse")), NodeKind::DataWarehouse);
        assert_eq!(datamart_kind(Some("Sql")), NodeKind::Datamart);
        assert_eq!(datamart_kind(None), NodeKind::Datamart);
    }

    #[test]
    fn lakehouse_gets_exactly_one_sql_endpoint() {
        let mut w = ws("w", Some("d"));
        w.datamarts.push(RawDatamart {
            id: "lh".into(),
            name: "Bronze".into(),
            datamart_type: Some("Lakehouse".into()),
            ..RawDatamart::default()
        });
        let items = [RawItem {
            id: "lh".into(),
            display_name: "Bronze".into(),
            item_type: "Lakehouse".into(),
            workspace_id: Some("w".into()),
            description: None,
        }];
        let out = normalize_catalog(&[w], &items);
        let endpoint = sql_endpoint_id("lh");
        let endpoints: Vec<_> = out
            .nodes
            .iter()
            .filter(|n| n.kind == NodeKind::SqlEndpoint)
            .collect();
        assert_eq!(endpoints.len(), 1);
        assert_eq!(endpoints[0].id, endpoint);
        assert!(has_link(&out.links, "lh", &endpoint, LinkKind::Contains));
        assert!(has_link(&out.links, "w", &endpoint, LinkKind::Contains));
        assert_eq!(out.stats.duplicate_items, 1);
    }

    #[test]
    fn native_endpoint_listed_before_its_lakehouse_is_deduped() {
        let item = |id: &str, item_type: &str| RawItem {
            id: id.into(),
            display_name: "Bronze".into(),
            item_type: item_type.into(),
            workspace_id: Some("w".into()),
            description: None,
        };
        let items = [item("ep", "SQLEndpoint"), item("lh", "Lakehouse")];
        let out = normalize_catalog(&[ws("w", Some("d"))], &items);
        let endpoints: Vec<&str> = out
            .nodes
            .iter()
            .filter(|n| n.kind == NodeKind::SqlEndpoint)
            .map(|n| n.id.as_str())
            .collect();
        assert_eq!(endpoints, [sql_endpoint_id("lh")]);
        assert_eq!(out.stats.duplicate_items, 1);
        assert_eq!(out.stats.items, 1);
    }

    #[test]
    fn paginated_reports_and_cross_workspace_dataset() {
        let mut a = ws("wa", Some("d1"));
        a.datasets.push(RawDataset {
            id: "ds1".into(),
            ..RawDataset::default()
        });
        let mut b = ws("wb", Some("d2"));
        b.reports.push(RawReport {
            id: "r1".into(),
            dataset_id: Some("ds1".into()),
            report_type: Some("PaginatedReport".into()),
            ..RawReport::default()
        });
        // Reports are resolved after every workspace's sources, so order
        // between workspaces does not matter.
        let (nodes, links) = normalize(&[b, a], &[]);
        let r1 = nodes.iter().find(|n| n.id == "r1").unwrap();
        assert_eq!(r1.kind, NodeKind::PaginatedReport);
        assert!(has_link(&links, "ds1", "r1", LinkKind::Contains));
        assert!(has_link(&links, "wa", "wb", LinkKind::CrossWorkspace));
    }

    #[test]
    fn unknown_and_duplicate_items_are_skipped() {
        let mut w = ws("w", Some("d"));
        w.datasets.push(RawDataset {
            id: "ds".into(),
            ..RawDataset::default()
        });
        let items = [
            RawItem {
                id: "ds".into(),
                item_type: "SemanticModel".into(),
                workspace_id: Some("w".into()),
                ..RawItem::default()
            },
            RawItem {
                id: "nb".into(),
                item_type: "Notebook".into(),
                workspace_id: Some("w".into()),
                ..RawItem::default()
            },
            RawItem {
                id: "x".into(),
                item_type: "Spreadsheet".into(),
                workspace_id: Some("w".into()),
                ..RawItem::default()
            },
        ];
        let out = normalize_catalog(&[w], &items);
        assert_eq!(out.stats.items, 1);
        assert_eq!(out.stats.duplicate_items, 1);
        assert_eq!(out.stats.unknown_items, 1);
        assert!(has_link(&out.links, "w", "nb", LinkKind::Contains));
    }
}
