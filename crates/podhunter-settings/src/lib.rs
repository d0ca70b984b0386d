//! # podhunter-settings
//!
//! Configuration management with layered sources.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`PodhunterSettings::default()`]
//! 2. **User file**: `~/.podhunter/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `PODHUNTER_*` overrides (highest priority)
//!
//! The proxy chain and the candidate model list are ordered sequences in
//! this configuration so tests and deployments can substitute their own.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    deep_merge, load_settings, load_settings_from_path, podhunter_home, resolve_path,
    settings_path,
};
pub use types::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn re_exports_work() {
        let _settings = PodhunterSettings::default();
        let path = settings_path();
        assert!(path.ends_with(".podhunter/settings.json"));
    }
}
