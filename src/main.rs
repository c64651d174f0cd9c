mod app;
mod components;
mod config;
mod core;
mod models;
mod utils;

use app::App;
use leptos::prelude::*;
use wasm_bindgen::JsCast;

use crate::config::AppConfig;

fn main() {
    console_error_panic_hook::set_once();

    let (config, config_error) = match AppConfig::bundled() {
        Ok(config) => (config, None),
        Err(error) => (AppConfig::default(), Some(error)),
    };
    if let Err(error) = utils::init_logging(&config.log_level) {
        let _ = utils::init_logging("info");
        tracing::warn!(%error, "falling back to the info log level");
    }
    if let Some(error) = config_error {
        tracing::warn!(%error, "using default configuration");
    }

    let root = document()
        .get_element_by_id("app")
        .expect("Failed to find #app element")
        .unchecked_into::<web_sys::HtmlElement>();

    mount_to(root, move || view! { <App config=config /> }).forget();
}
