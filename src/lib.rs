// ==================== Modules ====================
// Plain Rust, tested natively
pub mod canvas;
pub mod config;
pub mod console;
pub mod env;
pub mod exports;
pub mod lifecycle;
pub mod loader;
pub mod marshal;
pub mod math;
pub mod viewport;

// Browser glue, only meaningful on wasm32
#[cfg(target_arch = "wasm32")]
mod browser;
#[cfg(target_arch = "wasm32")]
pub mod engine;

#[cfg(target_arch = "wasm32")]
pub use self::web::main_js;

#[cfg(target_arch = "wasm32")]
mod web {
    use crate::config::Config;
    use crate::engine::{self, to_js, CanvasHost};
    use anyhow::anyhow;
    use wasm_bindgen::prelude::*;

    // ==================== Main Functions ====================
    /// Main entry for the host
    /// - decodes the config (`undefined` means defaults)
    /// - sets up logging and panic messages
    /// - wires the canvas, buttons and window events, then loads the module
    #[wasm_bindgen]
    pub fn main_js(config: JsValue) -> Result<CanvasHost, JsValue> {
        // setup better panic messages for debugging
        console_error_panic_hook::set_once();

        let config: Config = if config.is_undefined() || config.is_null() {
            Config::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|err| to_js(anyhow!("invalid config : {}", err)))?
        };
        config.validate().map_err(to_js)?;

        // a second main_js call finds the logger already installed, that's fine
        console_log::init_with_level(config.level().map_err(to_js)?).ok();
        log::info!("canvas host starting, module {}", config.module_path);

        engine::start(config).map_err(to_js)
    }
}
