// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Domain clustering force.
//!
//! Per tick: domain centroids from workspace positions, pairwise repulsion
//! between centroids closer than `min_separation`, workspaces pulled toward
//! their domain centroid, artifacts pulled toward their workspace. Cost is
//! O(domains² + nodes); node-to-node pairs are never visited.

use std::collections::HashMap;

use glam::Vec3;
use lineage_graph::{DomainId, Node};
use tracing::debug;

use crate::visibility::workspace_domain;

/// Read access to body positions.
pub trait PositionReader {
    /// Number of bodies.
    fn body_count(&self) -> usize;
    /// Current position of body `i`.
    fn position(&self, i: usize) -> Vec3;
}

/// Write access to body velocities. Positions are never writable here.
pub trait VelocityWriter {
    /// Adds `dv` to the velocity of body `i`.
    fn add_velocity(&mut self, i: usize, dv: Vec3);
}

/// Capability handed to forces: read positions, nudge velocities.
pub trait Bodies: PositionReader + VelocityWriter {}

impl<T: PositionReader + VelocityWriter + ?Sized> Bodies for T {}

/// A per-tick force registered into a simulation.
pub trait Force {
    /// Applies one tick at cooling factor `alpha`.
    fn apply(&mut self, bodies: &mut dyn Bodies, alpha: f32);
}

/// Clustering tunables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterConfig {
    /// Pull of workspaces toward their domain centroid.
    pub domain_strength: f32,
    /// Pull of artifacts toward their workspace; stronger than domain pull.
    pub workspace_strength: f32,
    /// Scale of the inter-domain repulsion impulse.
    pub repulsion_strength: f32,
    /// Centroid distance below which two domains repel.
    pub min_separation: f32,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            domain_strength: 0.1,
            workspace_strength: 0.3,
            repulsion_strength: 8.0,
            min_separation: 300.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Workspace { domain: usize },
    Artifact { workspace: usize },
    Free,
}

/// The clustering force. Topology is captured by [`Self::initialize`].
#[derive(Debug, Clone, Default)]
pub struct DomainClusterForce {
    cfg: ClusterConfig,
    roles: Vec<Role>,
    domains: Vec<DomainId>,
    sums: Vec<Vec3>,
    counts: Vec<u32>,
    centroids: Vec<Vec3>,
    impulses: Vec<Vec3>,
}

impl DomainClusterForce {
    /// Creates the force and indexes `nodes`.
    pub fn new(cfg: ClusterConfig, nodes: &[Node]) -> Self {
        let mut force = Self {
            cfg,
            ..Self::default()
        };
        force.initialize(nodes);
        force
    }

    /// Re-indexes roles after the node set changed. Node order must match the
    /// body order of the simulation the force runs in.
    pub fn initialize(&mut self, nodes: &[Node]) {
        let mut ws_index: HashMap<&str, usize> = HashMap::new();
        let mut slots: HashMap<&str, usize> = HashMap::new();
        self.domains.clear();
        for (i, n) in nodes.iter().enumerate() {
            if n.is_workspace() {
                ws_index.insert(n.id.as_str(), i);
                let domain = workspace_domain(n);
                if !slots.contains_key(domain) {
                    slots.insert(domain, self.domains.len());
                    self.domains.push(domain.to_owned());
                }
            }
        }
        self.roles = nodes
            .iter()
            .map(|n| {
                if n.is_workspace() {
                    Role::Workspace {
                        domain: slots[workspace_domain(n)],
                    }
                } else {
                    n.workspace_id
                        .as_deref()
                        .and_then(|ws| ws_index.get(ws))
                        .map_or(Role::Free, |&workspace| Role::Artifact { workspace })
                }
            })
            .collect();
        let d = self.domains.len();
        self.sums = vec![Vec3::ZERO; d];
        self.counts = vec![0; d];
        self.centroids = vec![Vec3::ZERO; d];
        self.impulses = vec![Vec3::ZERO; d];
        debug!(nodes = nodes.len(), domains = d, "cluster force initialized");
    }

    /// Current configuration.
    pub fn config(&self) -> &ClusterConfig {
        &self.cfg
    }

    /// Domain ids in slot order.
    pub fn domains(&self) -> &[DomainId] {
        &self.domains
    }

    /// Centroids computed by the last tick, in slot order; `None` for domains
    /// without workspaces.
    pub fn centroids(&self) -> Vec<Option<Vec3>> {
        self.centroids
            .iter()
            .zip(&self.counts)
            .map(|(c, &n)| (n > 0).then_some(*c))
            .collect()
    }

    #[allow(clippy::cast_precision_loss)]
    fn compute_centroids(&mut self, bodies: &dyn PositionReader, n: usize) {
        self.sums.iter_mut().for_each(|s| *s = Vec3::ZERO);
        self.counts.iter_mut().for_each(|c| *c = 0);
        for (i, role) in self.roles.iter().enumerate().take(n) {
            if let Role::Workspace { domain } = *role {
                self.sums[domain] += bodies.position(i);
                self.counts[domain] += 1;
            }
        }
        for ((c, s), &k) in self.centroids.iter_mut().zip(&self.sums).zip(&self.counts) {
            *c = if k > 0 { *s / k as f32 } else { Vec3::ZERO };
        }
    }

    fn compute_repulsion(&mut self) {
        self.impulses.iter_mut().for_each(|v| *v = Vec3::ZERO);
        let d = self.domains.len();
        let min_sep = self.cfg.min_separation;
        for a in 0..d {
            if self.counts[a] == 0 {
                continue;
            }
            for b in (a + 1)..d {
                if self.counts[b] == 0 {
                    continue;
                }
                let delta = self.centroids[a] - self.centroids[b];
                let dist = delta.length();
                if dist >= min_sep {
                    continue;
                }
                let dir = if dist > f32::EPSILON {
                    delta / dist
                } else {
                    separation_axis(a, b)
                };
                let magnitude = self.cfg.repulsion_strength * (min_sep - dist) / dist.max(1.0);
                let half = dir * (magnitude * 0.5);
                self.impulses[a] += half;
                self.impulses[b] -= half;
            }
        }
    }
}

/// Deterministic push direction for coincident centroids.
#[allow(clippy::cast_precision_loss)]
fn separation_axis(a: usize, b: usize) -> Vec3 {
    let angle = (a * 31 + b) as f32 * 2.399_963;
    Vec3::new(angle.cos(), angle.sin(), 0.0)
}

impl Force for DomainClusterForce {
    fn apply(&mut self, bodies: &mut dyn Bodies, alpha: f32) {
        let n = bodies.body_count().min(self.roles.len());
        if n != self.roles.len() {
            debug!(bodies = bodies.body_count(), roles = self.roles.len(), "body count differs from indexed nodes");
        }
        self.compute_centroids(&*bodies, n);
        self.compute_repulsion();
        for i in 0..n {
            match self.roles[i] {
                Role::Workspace { domain } => {
                    let pos = bodies.position(i);
                    let pull = (self.centroids[domain] - pos) * (self.cfg.domain_strength * alpha);
                    bodies.add_velocity(i, pull + self.impulses[domain] * alpha);
                }
                Role::Artifact { workspace } if workspace < n => {
                    let anchor = bodies.position(workspace);
                    let pos = bodies.position(i);
                    bodies.add_velocity(i, (anchor - pos) * (self.cfg.workspace_strength * alpha));
                }
                Role::Artifact { .. } | Role::Free => {}
            }
        }
    }
}
