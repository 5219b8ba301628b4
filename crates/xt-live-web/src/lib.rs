#![forbid(unsafe_code)]

//! Browser bindings for the xt-live in-page layout editor.
//!
//! # Role in xt-live
//! `xt-live-web` is the thin shell around `xt-live-core`. It listens to DOM
//! events, feeds them to the core controllers, and applies the commands they
//! hand back: iframe navigation, sidebar reveal, placeholder patches, hidden
//! form submission, modals, and `postMessage` delivery.
//!
//! # JS exports
//! - `installHost(configJson?)` on the storefront page.
//! - `installEditor(configJson?)` inside the sidebar iframe.
//!
//! Without an explicit argument both read the JSON config embedded in
//! `<script type="application/json" id="xt-live-config">`.
//!
//! Everything touching `web_sys` is compiled only on `wasm32`; the selector
//! and error types below are shared with native tests.

pub mod error;
pub mod selectors;

pub use error::WebError;

#[cfg(target_arch = "wasm32")]
pub mod dom;
#[cfg(target_arch = "wasm32")]
mod editor;
#[cfg(target_arch = "wasm32")]
mod host;
#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::{install_editor, install_host};
