// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Reference force simulation.
//!
//! A small velocity-Verlet-style loop: pairwise charge, link springs and any
//! registered [`Force`], all scaled by a cooling `alpha`. Initial positions are
//! seeded from a blake3 hash of the node id so runs are reproducible.

use std::collections::HashMap;

use glam::Vec3;
use lineage_graph::{Link, Node};
use tracing::{debug, instrument};

use crate::cluster::{Force, PositionReader, VelocityWriter};

/// Alpha below which the simulation counts as settled.
pub const ALPHA_MIN: f32 = 0.001;
/// Fraction of velocity removed each tick.
pub const VELOCITY_DECAY: f32 = 0.4;

/// Per-tick alpha decay that cools from 1 to [`ALPHA_MIN`] in 300 ticks.
pub fn default_alpha_decay() -> f32 {
    1.0 - ALPHA_MIN.powf(1.0 / 300.0)
}

/// Simulation tunables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationConfig {
    /// Pairwise repulsion constant; `0` disables the O(n²) pass.
    pub charge: f32,
    /// Rest length of link springs.
    pub link_distance: f32,
    /// Spring stiffness.
    pub link_strength: f32,
    /// Fraction of velocity removed per tick.
    pub velocity_decay: f32,
    /// Settling threshold.
    pub alpha_min: f32,
    /// Per-tick cooling rate.
    pub alpha_decay: f32,
    /// Radius of the initial placement disc.
    pub initial_radius: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            charge: 2400.0,
            link_distance: 140.0,
            link_strength: 0.08,
            velocity_decay: VELOCITY_DECAY,
            alpha_min: ALPHA_MIN,
            alpha_decay: default_alpha_decay(),
            initial_radius: 200.0,
        }
    }
}

/// A simulated point.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Body {
    /// Position.
    pub pos: Vec3,
    /// Velocity.
    pub vel: Vec3,
}

impl PositionReader for Vec<Body> {
    fn body_count(&self) -> usize {
        self.len()
    }

    fn position(&self, i: usize) -> Vec3 {
        self[i].pos
    }
}

impl VelocityWriter for Vec<Body> {
    fn add_velocity(&mut self, i: usize, dv: Vec3) {
        self[i].vel += dv;
    }
}

/// Force-directed layout over a fixed node/link set.
pub struct Simulation {
    cfg: SimulationConfig,
    bodies: Vec<Body>,
    edges: Vec<(usize, usize)>,
    forces: Vec<Box<dyn Force>>,
    alpha: f32,
    alpha_target: f32,
    ticks: u64,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("bodies", &self.bodies.len())
            .field("edges", &self.edges.len())
            .field("forces", &self.forces.len())
            .field("alpha", &self.alpha)
            .field("ticks", &self.ticks)
            .finish()
    }
}

impl Simulation {
    /// Seeds one body per node; links whose endpoints are unknown are skipped.
    pub fn new(nodes: &[Node], links: &[Link], cfg: SimulationConfig) -> Self {
        let bodies = nodes
            .iter()
            .map(|n| Body {
                pos: seed_position(&n.id, cfg.initial_radius),
                vel: Vec3::ZERO,
            })
            .collect();
        let index: HashMap<&str, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.as_str(), i))
            .collect();
        let edges = links
            .iter()
            .filter_map(|l| {
                let s = l.source.index().or_else(|| index.get(l.source_id()).copied())?;
                let t = l.target.index().or_else(|| index.get(l.target_id()).copied())?;
                (s < nodes.len() && t < nodes.len() && s != t).then_some((s, t))
            })
            .collect();
        Self {
            cfg,
            bodies,
            edges,
            forces: Vec::new(),
            alpha: 1.0,
            alpha_target: 0.0,
            ticks: 0,
        }
    }

    /// Registers an extra per-tick force.
    pub fn add_force(&mut self, force: impl Force + 'static) {
        self.forces.push(Box::new(force));
    }

    /// Current cooling factor.
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Ticks run so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Restarts cooling from `alpha`.
    pub fn reheat(&mut self, alpha: f32) {
        self.alpha = alpha;
    }

    /// Whether alpha dropped below the settling threshold.
    pub fn is_settled(&self) -> bool {
        self.alpha < self.cfg.alpha_min
    }

    /// All bodies, in node order.
    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    /// Moves body `i` to `pos` and stops it. Out-of-range indices are ignored.
    pub fn set_position(&mut self, i: usize, pos: Vec3) {
        if let Some(b) = self.bodies.get_mut(i) {
            b.pos = pos;
            b.vel = Vec3::ZERO;
        }
    }

    /// Advances one tick.
    pub fn tick(&mut self) {
        self.alpha += (self.alpha_target - self.alpha) * self.cfg.alpha_decay;
        let alpha = self.alpha;
        self.apply_charge(alpha);
        self.apply_links(alpha);
        for force in &mut self.forces {
            force.apply(&mut self.bodies, alpha);
        }
        let keep = 1.0 - self.cfg.velocity_decay;
        for body in &mut self.bodies {
            body.vel *= keep;
            body.pos += body.vel;
        }
        self.ticks += 1;
    }

    /// Runs until settled or `max_ticks` elapse; returns the ticks run.
    #[instrument(skip_all, fields(bodies = self.bodies.len(), max_ticks = max_ticks))]
    pub fn run(&mut self, max_ticks: usize) -> usize {
        let mut ran = 0;
        while ran < max_ticks && !self.is_settled() {
            self.tick();
            ran += 1;
        }
        debug!(ran, alpha = self.alpha, settled = self.is_settled(), "simulation stopped");
        ran
    }

    /// Largest distance of any body from the origin (at least 1).
    pub fn bounding_radius(&self) -> f32 {
        self.bodies
            .iter()
            .map(|b| b.pos.length())
            .fold(0.0, f32::max)
            .max(1.0)
    }

    fn apply_charge(&mut self, alpha: f32) {
        if self.cfg.charge.abs() <= f32::EPSILON {
            return;
        }
        let n = self.bodies.len();
        let k = self.cfg.charge * alpha;
        for i in 0..n {
            for j in (i + 1)..n {
                let delta = self.bodies[i].pos - self.bodies[j].pos;
                let dist2 = delta.length_squared().max(9.0);
                let f = delta.normalize_or_zero() * (k / dist2);
                self.bodies[i].vel += f;
                self.bodies[j].vel -= f;
            }
        }
    }

    fn apply_links(&mut self, alpha: f32) {
        for &(a, b) in &self.edges {
            let delta = self.bodies[b].pos - self.bodies[a].pos;
            let dist = delta.length().max(1.0);
            let f = delta / dist * ((dist - self.cfg.link_distance) * self.cfg.link_strength * alpha * 0.5);
            self.bodies[a].vel += f;
            self.bodies[b].vel -= f;
        }
    }
}

impl PositionReader for Simulation {
    fn body_count(&self) -> usize {
        self.bodies.len()
    }

    fn position(&self, i: usize) -> Vec3 {
        self.bodies[i].pos
    }
}

/// Deterministic point in the XY disc of radius `r`, keyed by `id`.
#[allow(clippy::cast_precision_loss)]
pub fn seed_position(id: &str, r: f32) -> Vec3 {
    let hash = blake3::hash(id.as_bytes());
    let b = hash.as_bytes();
    let unit = |off: usize| {
        let word = u32::from_le_bytes([b[off], b[off + 1], b[off + 2], b[off + 3]]);
        word as f32 / u32::MAX as f32
    };
    let theta = unit(0) * std::f32::consts::TAU;
    let radius = r * unit(4).sqrt();
    Vec3::new(radius * theta.cos(), radius * theta.sin(), 0.0)
}
