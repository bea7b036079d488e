// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Stable per-domain colors.

use lineage_graph::UNASSIGNED_DOMAIN;

/// Linear RGB, each channel in `0.0..=1.0`.
pub type Rgb = [f32; 3];

/// Colors handed out to domains.
pub const PALETTE: [Rgb; 12] = [
    [0.306, 0.475, 0.655],
    [0.949, 0.557, 0.169],
    [0.882, 0.341, 0.349],
    [0.463, 0.718, 0.698],
    [0.349, 0.631, 0.310],
    [0.929, 0.788, 0.282],
    [0.690, 0.478, 0.631],
    [1.000, 0.616, 0.655],
    [0.612, 0.459, 0.373],
    [0.729, 0.690, 0.675],
    [0.329, 0.616, 0.875],
    [0.553, 0.827, 0.780],
];

/// Fixed grey for workspaces without a domain.
pub const UNASSIGNED_COLOR: Rgb = [0.55, 0.55, 0.6];

/// Color for `domain_id`, keyed by a blake3 hash of the id.
pub fn domain_color(domain_id: &str) -> Rgb {
    if domain_id == UNASSIGNED_DOMAIN {
        return UNASSIGNED_COLOR;
    }
    let h = blake3::hash(domain_id.as_bytes());
    let b = h.as_bytes();
    let word = u16::from_le_bytes([b[0], b[1]]);
    PALETTE[usize::from(word) % PALETTE.len()]
}

/// `#rrggbb` form of `rgb`.
pub fn to_hex(rgb: Rgb) -> String {
    // Clamped to 0..=255 before the cast.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let [r, g, b] = rgb.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
    format!("#{r:02x}{g:02x}{b:02x}")
}
