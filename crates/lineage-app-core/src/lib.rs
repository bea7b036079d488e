// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared application services for the lineage tools (config, prefs).
//! Keeps the CLI and any future viewer adapters thin.

pub mod config;
pub mod prefs;
