//! # takeabreak-settings
//!
//! Configuration for the takeabreak client, loaded from three layers (in
//! priority order):
//! 1. **Compiled defaults**: [`TakeabreakSettings::default()`]
//! 2. **User file**: `~/.takeabreak/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `TAKEABREAK_*` / `GOOGLE_*` overrides
//!
//! # Usage
//!
//! ```no_run
//! use takeabreak_settings::get_settings;
//!
//! let settings = get_settings();
//! println!("backend: {}", settings.api.base_url);
//! ```

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;

use std::sync::OnceLock;

static SETTINGS: OnceLock<TakeabreakSettings> = OnceLock::new();

/// Get the global settings instance.
///
/// On first call, loads settings from `~/.takeabreak/settings.json` with env
/// var overrides. If loading fails, the error is logged and compiled
/// defaults are used.
pub fn get_settings() -> &'static TakeabreakSettings {
    SETTINGS.get_or_init(|| {
        load_settings().unwrap_or_else(|e| {
            tracing::warn!("falling back to default settings: {e}");
            TakeabreakSettings::default()
        })
    })
}

/// Initialize the global settings with a specific value.
///
/// Returns `Err(settings)` if the global was already initialized.
#[allow(clippy::result_large_err)]
pub fn init_settings(settings: TakeabreakSettings) -> std::result::Result<(), TakeabreakSettings> {
    SETTINGS.set(settings)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
