// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Persisted viewer preferences: layout tunables, load limits, default
//! filter toggles.

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, ConfigService, ConfigStore};

/// Store key for [`ViewerPrefs`].
pub const VIEWER_PREFS_KEY: &str = "viewer";

/// Saved preferences for a lineage viewer surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ViewerPrefs {
    /// Force layout tunables.
    pub layout: LayoutPrefs,
    /// Load-time limits.
    pub limits: LimitPrefs,
    /// Initial filter toggles.
    pub filter: FilterPrefs,
}

/// Clustering and simulation tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutPrefs {
    /// Pull of workspaces toward their domain centroid.
    pub domain_strength: f32,
    /// Pull of artifacts toward their workspace.
    pub workspace_strength: f32,
    /// Inter-domain repulsion scale.
    pub repulsion_strength: f32,
    /// Minimum distance between domain centroids.
    pub min_separation: f32,
    /// Ticks to simulate before reporting positions.
    pub ticks: usize,
}

impl Default for LayoutPrefs {
    fn default() -> Self {
        Self {
            domain_strength: 0.1,
            workspace_strength: 0.3,
            repulsion_strength: 8.0,
            min_separation: 300.0,
            ticks: 300,
        }
    }
}

/// Graph size limits applied while loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitPrefs {
    /// Workspace ceiling before the limiter ranks and trims.
    pub max_workspaces: usize,
    /// Drop duplicate lineage edges.
    pub dedupe_links: bool,
}

impl Default for LimitPrefs {
    fn default() -> Self {
        Self {
            max_workspaces: 100,
            dedupe_links: false,
        }
    }
}

/// Filter toggles applied when a graph is first shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterPrefs {
    /// Show workspaces without a domain.
    pub show_unassigned: bool,
    /// Show containment and lineage links.
    pub show_contains: bool,
    /// Show workspace-to-workspace summary links.
    pub show_cross_workspace: bool,
}

impl Default for FilterPrefs {
    fn default() -> Self {
        Self {
            show_unassigned: true,
            show_contains: true,
            show_cross_workspace: true,
        }
    }
}

impl ViewerPrefs {
    /// Replaces non-finite or negative layout values with defaults.
    pub fn sanitized(mut self) -> Self {
        let d = LayoutPrefs::default();
        let fix = |v: f32, fallback: f32| if v.is_finite() && v >= 0.0 { v } else { fallback };
        self.layout.domain_strength = fix(self.layout.domain_strength, d.domain_strength);
        self.layout.workspace_strength = fix(self.layout.workspace_strength, d.workspace_strength);
        self.layout.repulsion_strength = fix(self.layout.repulsion_strength, d.repulsion_strength);
        self.layout.min_separation = fix(self.layout.min_separation, d.min_separation);
        self
    }
}

/// Loads stored prefs (defaults when missing), sanitized.
pub fn load_viewer_prefs<S: ConfigStore>(svc: &ConfigService<S>) -> Result<ViewerPrefs, ConfigError> {
    Ok(svc.load_or_default::<ViewerPrefs>(VIEWER_PREFS_KEY)?.sanitized())
}

/// Persists `prefs` under [`VIEWER_PREFS_KEY`].
pub fn save_viewer_prefs<S: ConfigStore>(svc: &ConfigService<S>, prefs: &ViewerPrefs) -> Result<(), ConfigError> {
    svc.save(VIEWER_PREFS_KEY, prefs)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_fills_defaults() {
        let prefs: ViewerPrefs = serde_json::from_str(r#"{"limits":{"max_workspaces":20}}"#).unwrap();
        assert_eq!(prefs.limits.max_workspaces, 20);
        assert!(!prefs.limits.dedupe_links);
        assert_eq!(prefs.layout, LayoutPrefs::default());
        assert!(prefs.filter.show_unassigned);
    }

    #[test]
    fn sanitize_replaces_bad_layout_values() {
        let mut prefs = ViewerPrefs::default();
        prefs.layout.min_separation = -5.0;
        prefs.layout.domain_strength = f32::NAN;
        prefs.layout.repulsion_strength = 0.9;
        let clean = prefs.sanitized();
        assert_eq!(clean.layout.min_separation, 300.0);
        assert_eq!(clean.layout.domain_strength, 0.1);
        assert_eq!(clean.layout.repulsion_strength, 0.9);
    }
}
