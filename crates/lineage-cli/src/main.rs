// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `lineage`: build, filter, lay out and inspect tenant lineage graphs from
//! catalog scan files.
//!
//! Logs go to stderr (`RUST_LOG`, `-v`, `-vv`); command output goes to stdout.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use lineage_app_core::prefs::{load_viewer_prefs, save_viewer_prefs, ViewerPrefs};
use lineage_core::{
    domain_boundaries, reduce, ClusterConfig, FilterEvent, FilterState, GraphState, NodeLookup,
    Simulation, SimulationConfig,
};
use lineage_graph::NodeKind;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod input;
mod report;

use input::{config_service, prefs_or_default, InputArgs};

#[derive(Parser, Debug)]
#[command(author, version, about = "Tenant lineage graph builder")]
struct Cli {
    /// More logging on stderr (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    /// Preferences directory (defaults to the platform config dir)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the graph and print what the pipeline produced
    Build {
        #[command(flatten)]
        input: InputArgs,
        /// Write the graph as JSON
        #[arg(long)]
        out: Option<PathBuf>,
        /// Print a JSON report instead of tables
        #[arg(long)]
        json: bool,
    },
    /// Count (or list) what a filter state leaves visible
    Filter {
        #[command(flatten)]
        input: InputArgs,
        /// Free-text search over artifacts
        #[arg(long)]
        search: Option<String>,
        /// Hide a domain (repeatable)
        #[arg(long)]
        hide_domain: Vec<String>,
        /// Show only this domain
        #[arg(long)]
        isolate: Option<String>,
        /// Hide workspaces without a domain
        #[arg(long)]
        hide_unassigned: bool,
        /// Show only workspaces without a domain
        #[arg(long, conflicts_with = "hide_unassigned")]
        unassigned_only: bool,
        /// Hide a node kind (repeatable)
        #[arg(long)]
        hide_kind: Vec<NodeKind>,
        /// Print the visible node ids
        #[arg(long)]
        list: bool,
    },
    /// Run the force layout with domain clustering and print domain boundaries
    Layout {
        #[command(flatten)]
        input: InputArgs,
        /// Simulation ticks (overrides stored prefs)
        #[arg(long)]
        ticks: Option<usize>,
    },
    /// Show what depends on a node and what it depends on
    Impact {
        #[command(flatten)]
        input: InputArgs,
        /// Node id
        #[arg(long)]
        node: String,
    },
    /// Inspect or reset stored preferences
    Prefs {
        #[command(subcommand)]
        action: PrefsAction,
    },
}

#[derive(Subcommand, Debug)]
enum PrefsAction {
    /// Print the effective preferences as JSON
    Show,
    /// Overwrite stored preferences with defaults
    Reset,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.parse()?))
        .with_writer(io::stderr)
        .init();

    let mut out = io::stdout().lock();
    let config_dir = cli.config_dir.as_deref();
    match cli.cmd {
        Command::Build { input, out: path, json } => {
            let prefs = prefs_or_default(config_dir);
            let state = input.load(&prefs)?;
            build(&mut out, &state, path, json)
        }
        Command::Filter {
            input,
            search,
            hide_domain,
            isolate,
            hide_unassigned,
            unassigned_only,
            hide_kind,
            list,
        } => {
            let prefs = prefs_or_default(config_dir);
            let state = input.load(&prefs)?;
            let mut events = Vec::new();
            events.extend(search.map(FilterEvent::SetSearch));
            events.extend(hide_domain.into_iter().map(FilterEvent::HideDomain));
            events.extend(isolate.map(FilterEvent::Isolate));
            if hide_unassigned {
                events.push(FilterEvent::SetShowUnassigned(false));
            }
            if unassigned_only {
                events.push(FilterEvent::SetUnassignedOnly(true));
            }
            events.extend(hide_kind.into_iter().map(FilterEvent::ToggleKind));
            let filter = events
                .into_iter()
                .fold(initial_filter(&prefs), |f, ev| reduce(&f, ev));
            debug!(?filter, "filter state");
            filter_cmd(&mut out, &state, &filter, list)
        }
        Command::Layout { input, ticks } => {
            let prefs = prefs_or_default(config_dir);
            let state = input.load(&prefs)?;
            layout(&mut out, &state, &prefs, ticks.unwrap_or(prefs.layout.ticks))
        }
        Command::Impact { input, node } => {
            let prefs = prefs_or_default(config_dir);
            let state = input.load(&prefs)?;
            impact(&mut out, &state, &node)
        }
        Command::Prefs { action } => {
            let svc = config_service(config_dir)?;
            let prefs = match action {
                PrefsAction::Show => load_viewer_prefs(&svc)?,
                PrefsAction::Reset => {
                    let prefs = ViewerPrefs::default();
                    save_viewer_prefs(&svc, &prefs)?;
                    info!(dir = %svc.store().base().display(), "preferences reset");
                    prefs
                }
            };
            writeln!(out, "{}", serde_json::to_string_pretty(&prefs)?)?;
            Ok(())
        }
    }
}

fn initial_filter(prefs: &ViewerPrefs) -> FilterState {
    FilterState {
        show_unassigned: prefs.filter.show_unassigned,
        show_contains: prefs.filter.show_contains,
        show_cross_workspace: prefs.filter.show_cross_workspace,
        ..FilterState::default()
    }
}

fn build(out: &mut impl Write, state: &GraphState, path: Option<PathBuf>, json: bool) -> Result<()> {
    let graph = state.graph();
    let hash = hex::encode(graph.compute_hash()?);
    if let Some(path) = path {
        let body = serde_json::to_vec_pretty(graph)?;
        fs::write(&path, body).with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), "graph written");
    }
    let counts = report::kind_counts(state.nodes());
    let summary = state.summary();
    if json {
        let rep = report::BuildReport {
            nodes: state.nodes().len(),
            links: state.links().len(),
            domains: state.domains().len(),
            hash,
            kinds: counts.iter().map(|(k, n)| (k.label().to_owned(), *n)).collect(),
            limited: summary.validation.limited,
            orphaned_artifacts: summary.validation.orphaned_artifacts,
            dangling_links: summary.validation.dangling_links,
        };
        writeln!(out, "{}", serde_json::to_string_pretty(&rep)?)?;
        return Ok(());
    }
    writeln!(out, "{}", report::kinds_table(&counts))?;
    writeln!(out, "{}", report::summary_table(summary))?;
    writeln!(out, "graph hash: {hash}")?;
    Ok(())
}

fn filter_cmd(out: &mut impl Write, state: &GraphState, filter: &FilterState, list: bool) -> Result<()> {
    let mask = state.visibility(filter);
    writeln!(out, "visible nodes: {} / {}", mask.visible_nodes(), state.nodes().len())?;
    writeln!(out, "visible links: {} / {}", mask.visible_links(), state.links().len())?;
    if list {
        let visible = state.nodes().iter().zip(&mask.nodes).filter(|(_, v)| **v).map(|(n, _)| n);
        writeln!(out, "{}", report::kinds_table(&report::kind_counts(visible.clone())))?;
        for n in visible {
            writeln!(out, "{}\t{}\t{}", n.id, n.kind.label(), n.name)?;
        }
    }
    Ok(())
}

fn layout(out: &mut impl Write, state: &GraphState, prefs: &ViewerPrefs, ticks: usize) -> Result<()> {
    let cluster = ClusterConfig {
        domain_strength: prefs.layout.domain_strength,
        workspace_strength: prefs.layout.workspace_strength,
        repulsion_strength: prefs.layout.repulsion_strength,
        min_separation: prefs.layout.min_separation,
    };
    let mut sim = Simulation::new(state.nodes(), state.links(), SimulationConfig::default());
    sim.add_force(state.cluster_force(cluster));
    let ran = sim.run(ticks);
    let mask = state.visibility(&initial_filter(prefs));
    let boundaries = domain_boundaries(&sim, state.nodes(), &mask, state);
    writeln!(out, "{}", report::boundaries_table(&boundaries))?;
    writeln!(out, "ticks: {ran}, settled: {}", sim.is_settled())?;
    Ok(())
}

fn impact(out: &mut impl Write, state: &GraphState, id: &str) -> Result<()> {
    let (Some(down), Some(up)) = (state.impact(id), state.upstream(id)) else {
        bail!("unknown node id {id:?}");
    };
    let lookup = |id: &str| state.node(id).map(|n| (n.kind, n.workspace_id.clone()));
    writeln!(
        out,
        "downstream of {id}: {} nodes in {} workspaces (depth {})",
        down.nodes.len(),
        down.workspaces.len(),
        down.depth
    )?;
    if !down.is_empty() {
        writeln!(out, "{}", report::impact_table(&down, lookup))?;
    }
    writeln!(out, "upstream of {id}: {} nodes", up.nodes.len())?;
    if !up.is_empty() {
        writeln!(out, "{}", report::impact_table(&up, lookup))?;
    }
    Ok(())
}
