#![forbid(unsafe_code)]

//! Element ids, classes, and CSS selectors the shell queries.
//!
//! Lookups are repeated on every event; nothing caches element handles
//! across a placeholder patch.

use xt_live_core::config::LIVE_CONFIG_ELEMENT_ID;
use xt_live_core::dom::{DEFAULT_CONFIG_CLASS, PLACEHOLDER_NAME_ATTR};
use xt_live_core::editor::{CONTROL_CLASSES, PLUGIN_SELECT_CLASS, RELOAD_ATTR};

pub const SIDEBAR_ID: &str = "xt-live-sidebar";
pub const SIDEBAR_FRAME_ID: &str = "xt-live-sidebar-frame";
pub const SIDEBAR_VISIBLE_CLASS: &str = "xt-live-sidebar--visible";
/// Clickable handle that shows/hides the sidebar.
pub const SIDEBAR_TOGGLE_CLASS: &str = "xt-live-sidebar-toggle";
pub const MODAL_CLASS: &str = "xt-live-modal";
/// Full-viewport layer behind the modal; holds the pending ticket.
pub const MODAL_OVERLAY_CLASS: &str = "xt-live-modal-overlay";
pub const MODAL_TICKET_ATTR: &str = "data-xt-ticket";
/// `accept` or `decline` on the modal's buttons.
pub const CONFIRM_ATTR: &str = "data-xt-confirm";
/// Name of the `CustomEvent` dispatched on `window` for user-facing notices.
pub const NOTICE_EVENT: &str = "xt-live-notice";
/// Remembers the plugin selector value the page was rendered with.
pub const PREVIOUS_VALUE_ATTR: &str = "data-xt-previous";

#[must_use]
pub fn config_selector() -> String {
    format!("#{LIVE_CONFIG_ELEMENT_ID}")
}

#[must_use]
pub fn placeholder_selector() -> String {
    format!("[{PLACEHOLDER_NAME_ATTR}]")
}

#[must_use]
pub fn default_config_selector() -> String {
    format!("script.{DEFAULT_CONFIG_CLASS}")
}

#[must_use]
pub fn reload_selector() -> String {
    format!("[{RELOAD_ATTR}]")
}

#[must_use]
pub fn plugin_select_selector() -> String {
    format!("select.{PLUGIN_SELECT_CLASS}")
}

#[must_use]
pub fn sidebar_toggle_selector() -> String {
    format!(".{SIDEBAR_TOGGLE_CLASS}")
}

#[must_use]
pub fn modal_overlay_selector() -> String {
    format!(".{MODAL_OVERLAY_CLASS}")
}

#[must_use]
pub fn confirm_button_selector() -> String {
    format!("[{CONFIRM_ATTR}]")
}

/// Matches any editor control, for `Element::closest`.
#[must_use]
pub fn control_selector() -> String {
    CONTROL_CLASSES
        .iter()
        .map(|class| format!(".{class}"))
        .collect::<Vec<_>>()
        .join(", ")
}
