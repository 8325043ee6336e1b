use anyhow::{anyhow, ensure, Result};
use serde::Deserialize;
use std::str::FromStr;

// ==================== Constants ====================
// Defaults that match the page layout the host expects
pub mod html {
    pub const CANVAS_ID: &str = "canvas";
    pub const CONTEXT_2D: &str = "2d";
    pub const PAUSE_BUTTON_ID: &str = "pause";
    pub const STOP_BUTTON_ID: &str = "stop";
}

pub const MODULE_PATH: &str = "./main.wasm";
pub const IMPORT_NAMESPACE: &str = "env";
pub const CANVAS_PREFIX: &str = "canvas_";
pub const MATH_PREFIX: &str = "math_";

/// Settings handed over by the page script.
///
/// Every field has a default, so `undefined` or `{}` from JS works and
/// `{ startRunning: false }` only overrides that one field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Where to fetch the module from, relative to the page
    pub module_path: String,
    /// Append a random query parameter so every reload refetches the module
    pub cache_bust: bool,
    pub canvas_id: String,
    pub pause_button_id: String,
    pub stop_button_id: String,
    /// Start the frame loop right after `init()` instead of waiting for a click
    pub start_running: bool,
    /// Import namespace the module was linked against
    pub import_namespace: String,
    pub canvas_prefix: String,
    /// `None` leaves the math table out
    pub math_prefix: Option<String>,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            module_path: MODULE_PATH.to_string(),
            cache_bust: false,
            canvas_id: html::CANVAS_ID.to_string(),
            pause_button_id: html::PAUSE_BUTTON_ID.to_string(),
            stop_button_id: html::STOP_BUTTON_ID.to_string(),
            start_running: true,
            import_namespace: IMPORT_NAMESPACE.to_string(),
            canvas_prefix: CANVAS_PREFIX.to_string(),
            math_prefix: Some(MATH_PREFIX.to_string()),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.module_path.is_empty(), "modulePath must not be empty");
        ensure!(!self.canvas_id.is_empty(), "canvasId must not be empty");
        ensure!(
            !self.import_namespace.is_empty(),
            "importNamespace must not be empty"
        );
        self.level()?;
        Ok(())
    }

    pub fn level(&self) -> Result<log::Level> {
        log::Level::from_str(&self.log_level)
            .map_err(|_| anyhow!("unknown log level '{}'", self.log_level))
    }
}
