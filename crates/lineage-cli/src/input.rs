// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Catalog file loading and prefs resolution.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use lineage_app_core::config::ConfigService;
use lineage_app_core::prefs::{load_viewer_prefs, ViewerPrefs};
use lineage_config_fs::FsConfigStore;
use lineage_core::{
    parse_catalog, parse_domains, parse_items, GraphState, LinkerOptions, LoadOptions,
    ValidatorConfig,
};
use tracing::{info, warn};

/// Catalog inputs shared by every graph command.
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Scanner result JSON (`{"workspaces": [...]}` or a bare array)
    #[arg(long)]
    pub catalog: PathBuf,
    /// Domain list JSON (`{"domains": [...]}` or a bare array)
    #[arg(long)]
    pub domains: Option<PathBuf>,
    /// Native item list JSON (`{"value": [...]}` or a bare array)
    #[arg(long)]
    pub items: Option<PathBuf>,
    /// Workspace ceiling (overrides stored prefs)
    #[arg(long)]
    pub max_workspaces: Option<usize>,
    /// Drop duplicate lineage edges (overrides stored prefs)
    #[arg(long)]
    pub dedupe: bool,
}

impl InputArgs {
    /// Pipeline options: flags first, then prefs.
    pub fn options(&self, prefs: &ViewerPrefs) -> LoadOptions {
        LoadOptions {
            validator: ValidatorConfig {
                max_workspaces: self.max_workspaces.unwrap_or(prefs.limits.max_workspaces),
            },
            linker: LinkerOptions {
                dedupe: self.dedupe || prefs.limits.dedupe_links,
            },
        }
    }

    /// Reads every input file and runs the pipeline.
    pub fn load(&self, prefs: &ViewerPrefs) -> Result<GraphState> {
        let catalog = parse_catalog(&read(&self.catalog)?)
            .with_context(|| format!("parsing catalog {}", self.catalog.display()))?;
        let domains = match &self.domains {
            Some(path) => parse_domains(&read(path)?).with_context(|| format!("parsing domains {}", path.display()))?,
            None => Vec::new(),
        };
        let items = match &self.items {
            Some(path) => parse_items(&read(path)?).with_context(|| format!("parsing items {}", path.display()))?,
            None => Vec::new(),
        };
        let state = GraphState::from_catalog(&catalog, domains, &items, &self.options(prefs));
        info!(nodes = state.nodes().len(), links = state.links().len(), "catalog loaded");
        Ok(state)
    }
}

fn read(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("reading {}", path.display()))
}

/// Config service rooted at `dir`, or at the platform config directory.
pub fn config_service(dir: Option<&Path>) -> Result<ConfigService<FsConfigStore>> {
    let store = match dir {
        Some(dir) => FsConfigStore::at(dir).with_context(|| format!("opening config dir {}", dir.display()))?,
        None => FsConfigStore::new().context("opening platform config dir")?,
    };
    Ok(ConfigService::new(store))
}

/// Stored prefs; falls back to defaults (with a warning) when the store is
/// unavailable or unreadable.
pub fn prefs_or_default(dir: Option<&Path>) -> ViewerPrefs {
    let loaded = config_service(dir).and_then(|svc| load_viewer_prefs(&svc).map_err(anyhow::Error::from));
    match loaded {
        Ok(prefs) => prefs,
        Err(err) => {
            warn!(error = %format!("{err:#}"), "using default preferences");
            ViewerPrefs::default()
        }
    }
}
