//! # cadence-settings
//!
//! Configuration for the Cadence scheduling server.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`CadenceSettings::default()`]
//! 2. **User file**: `~/.cadence/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `CADENCE_*` overrides (highest priority)
//!
//! The binary loads settings once at startup and passes them down by value;
//! nothing in the workspace reads a global.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    apply_overrides, deep_merge, load_settings, load_settings_from_path, load_with_env, settings_path,
};
pub use types::*;
