#![forbid(unsafe_code)]

//! `wasm-bindgen` exports. Only compiled on `wasm32` targets.

use wasm_bindgen::prelude::*;

use crate::error::WebError;
use crate::{editor, host};

impl From<WebError> for JsValue {
    fn from(err: WebError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    tracing_wasm::set_as_global_default();
}

/// Wire the live editor into the storefront page.
#[wasm_bindgen(js_name = installHost)]
pub fn install_host(config_json: Option<String>) -> Result<(), JsValue> {
    host::install(config_json).map_err(Into::into)
}

/// Wire the editor controls inside the sidebar document.
#[wasm_bindgen(js_name = installEditor)]
pub fn install_editor(config_json: Option<String>) -> Result<(), JsValue> {
    editor::install(config_json).map_err(Into::into)
}
