// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Domain boundary overlays computed from simulated positions.

use std::collections::BTreeMap;

use glam::Vec3;
use lineage_graph::{DomainId, Node, UNASSIGNED_DOMAIN};

use crate::cluster::PositionReader;
use crate::palette::{domain_color, Rgb};
use crate::visibility::{workspace_domain, NodeLookup, VisibilityMask};

/// Margin added around every domain box.
pub const BOUNDARY_PADDING: f32 = 40.0;

/// Axis-aligned bounding box.
///
/// Invariant: `min` is component-wise less than or equal to `max`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Bounds {
    min: Vec3,
    max: Vec3,
}

impl Bounds {
    /// Box from two corners in any order.
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Minimal box around `points`; `None` when empty.
    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        Some(rest.iter().fold(Self::new(*first, *first), |acc, p| Self {
            min: acc.min.min(*p),
            max: acc.max.max(*p),
        }))
    }

    /// Minimum corner.
    pub fn min(&self) -> Vec3 {
        self.min
    }

    /// Maximum corner.
    pub fn max(&self) -> Vec3 {
        self.max
    }

    /// Midpoint.
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Edge lengths.
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Whether `p` lies inside (faces inclusive).
    pub fn contains(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    /// Whether the boxes overlap (touching faces count).
    pub fn overlaps(&self, other: &Self) -> bool {
        self.max.cmpge(other.min).all() && self.min.cmple(other.max).all()
    }

    /// Smallest box containing both.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Grows the box by `m` on every side.
    pub fn inflate(&self, m: f32) -> Self {
        let d = Vec3::splat(m);
        Self {
            min: self.min - d,
            max: self.max + d,
        }
    }
}

/// Overlay for one domain.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainBoundary {
    /// Domain id (`UNASSIGNED` included).
    pub domain_id: DomainId,
    /// Display name.
    pub name: String,
    /// Fill color.
    pub color: Rgb,
    /// Padded box around the domain's visible nodes.
    pub bounds: Bounds,
    /// Visible workspaces inside.
    pub workspaces: usize,
    /// Visible artifacts inside.
    pub artifacts: usize,
}

#[derive(Default)]
struct Members {
    points: Vec<Vec3>,
    workspaces: usize,
    artifacts: usize,
}

/// One boundary per domain with at least one visible workspace, ordered by
/// domain id. `positions` must be aligned with `nodes`.
pub fn domain_boundaries<L: NodeLookup + ?Sized>(
    positions: &dyn PositionReader,
    nodes: &[Node],
    mask: &VisibilityMask,
    lookup: &L,
) -> Vec<DomainBoundary> {
    let mut groups: BTreeMap<&str, Members> = BTreeMap::new();
    let n = nodes.len().min(positions.body_count()).min(mask.nodes.len());
    for (i, node) in nodes.iter().enumerate().take(n) {
        if !mask.nodes[i] {
            continue;
        }
        if node.is_workspace() {
            let m = groups.entry(workspace_domain(node)).or_default();
            m.points.push(positions.position(i));
            m.workspaces += 1;
        } else if let Some(ws) = node.workspace_id.as_deref().and_then(|id| lookup.node(id)) {
            let m = groups.entry(workspace_domain(ws)).or_default();
            m.points.push(positions.position(i));
            m.artifacts += 1;
        }
    }
    groups
        .into_iter()
        .filter(|(_, m)| m.workspaces > 0)
        .filter_map(|(id, m)| {
            let bounds = Bounds::from_points(&m.points)?.inflate(BOUNDARY_PADDING);
            let name = match lookup.domain(id) {
                Some(d) => d.name.clone(),
                None if id == UNASSIGNED_DOMAIN => "Unassigned".to_owned(),
                None => id.to_owned(),
            };
            Some(DomainBoundary {
                domain_id: id.to_owned(),
                name,
                color: domain_color(id),
                bounds,
                workspaces: m.workspaces,
                artifacts: m.artifacts,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visibility::{FilterState, SliceLookup};
    use lineage_graph::{Domain, NodeKind};

    struct Fixed(Vec<Vec3>);

    impl PositionReader for Fixed {
        fn body_count(&self) -> usize {
            self.0.len()
        }
        fn position(&self, i: usize) -> Vec3 {
            self.0[i]
        }
    }

    #[test]
    fn bounds_basics() {
        let b = Bounds::from_points(&[Vec3::new(1.0, 5.0, 0.0), Vec3::new(-1.0, 2.0, 0.0)]);
        let b = b.map(|b| b.inflate(1.0));
        assert_eq!(b.map(|b| b.min()), Some(Vec3::new(-2.0, 1.0, -1.0)));
        assert_eq!(b.map(|b| b.center()), Some(Vec3::new(0.0, 3.5, 0.0)));
        assert!(Bounds::from_points(&[]).is_none());
        let a = Bounds::new(Vec3::ZERO, Vec3::ONE);
        let c = Bounds::new(Vec3::ONE, Vec3::splat(2.0));
        assert!(a.overlaps(&c));
        assert!(a.union(&c).contains(Vec3::splat(1.5)));
        assert!(!a.overlaps(&Bounds::new(Vec3::splat(3.0), Vec3::splat(4.0))));
    }

    #[test]
    fn one_boundary_per_visible_domain() {
        let mut wa = Node::new("wa", NodeKind::Workspace, "A");
        wa.metadata.domain_id = Some("d1".into());
        let mut wb = Node::new("wb", NodeKind::Workspace, "B");
        wb.metadata.domain_id = Some("d2".into());
        let nodes = vec![wa, wb, Node::new("r", NodeKind::Report, "r").in_workspace("wa")];
        let domains = vec![Domain {
            id: "d1".into(),
            name: "Finance".into(),
            description: None,
            parent_domain_id: None,
        }];
        let lookup = SliceLookup::new(&nodes, &domains);
        let positions = Fixed(vec![Vec3::ZERO, Vec3::splat(500.0), Vec3::new(10.0, 0.0, 0.0)]);

        let all = VisibilityMask::compute(&nodes, &[], &FilterState::default(), &lookup);
        let out = domain_boundaries(&positions, &nodes, &all, &lookup);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].name, "Finance");
        assert_eq!(out[0].artifacts, 1);
        assert!(out[0].bounds.contains(Vec3::new(10.0, 0.0, 0.0)));
        assert_eq!(out[1].name, "d2");

        let mut filter = FilterState::default();
        filter.hidden_domains.insert("d2".into());
        let mask = VisibilityMask::compute(&nodes, &[], &filter, &lookup);
        let out = domain_boundaries(&positions, &nodes, &mask, &lookup);
        assert_eq!(out.iter().map(|b| b.domain_id.as_str()).collect::<Vec<_>>(), ["d1"]);
    }
}
