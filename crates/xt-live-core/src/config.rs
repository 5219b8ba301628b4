#![forbid(unsafe_code)]

//! Page-global configuration handed to the live editor by the server.
//!
//! The server embeds a JSON object in the page (see
//! [`LIVE_CONFIG_ELEMENT_ID`]); both the host and the editor side parse it
//! once at install time. The core never computes any of these values.

use serde::{Deserialize, Serialize};

use crate::error::{LiveError, Result};

/// Id of the `<script type="application/json">` element carrying the config.
pub const LIVE_CONFIG_ELEMENT_ID: &str = "xt-live-config";

/// Default query parameter used to defeat caches on placeholder refresh.
pub const DEFAULT_CACHE_BUST_PARAM: &str = "_xt";

/// CSRF field name and token value added to every command form.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CsrfToken {
    pub field: String,
    pub value: String,
}

impl CsrfToken {
    #[must_use]
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Live-editor page configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveConfig {
    /// Name of the CSRF form field.
    pub csrf_field: String,
    /// CSRF token value for this page.
    pub csrf_token: String,
    /// Endpoint receiving host-side commands (`edit_on` / `edit_off`).
    pub command_url: String,
    /// Whether the page is currently rendered in edit mode.
    pub edit_mode: bool,
    /// Page/view identifier passed to the sidebar as `view`.
    pub view: String,
    /// Theme identifier passed to the sidebar as `theme`.
    pub theme: String,
    /// Base URL of the sidebar editor page.
    pub sidebar_url: String,
    /// Query parameter carrying the refresh cache-buster.
    pub cache_bust_param: String,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            csrf_field: String::new(),
            csrf_token: String::new(),
            command_url: String::new(),
            edit_mode: false,
            view: String::new(),
            theme: String::new(),
            sidebar_url: String::new(),
            cache_bust_param: DEFAULT_CACHE_BUST_PARAM.to_owned(),
        }
    }
}

impl LiveConfig {
    /// Parse and validate the embedded JSON config.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configs that cannot produce a valid command form.
    pub fn validate(&self) -> Result<()> {
        if self.csrf_field.trim().is_empty() {
            return Err(LiveError::MissingConfig("csrf_field"));
        }
        if self.cache_bust_param.trim().is_empty() {
            return Err(LiveError::MissingConfig("cache_bust_param"));
        }
        Ok(())
    }

    /// Additional checks for the host side, which also needs the sidebar
    /// and command endpoints.
    pub fn validate_host(&self) -> Result<()> {
        self.validate()?;
        if self.sidebar_url.trim().is_empty() {
            return Err(LiveError::MissingConfig("sidebar_url"));
        }
        if self.command_url.trim().is_empty() {
            return Err(LiveError::MissingConfig("command_url"));
        }
        Ok(())
    }

    #[must_use]
    pub fn csrf(&self) -> CsrfToken {
        CsrfToken::new(&self.csrf_field, &self.csrf_token)
    }

    #[must_use]
    pub fn with_edit_mode(mut self, edit_mode: bool) -> Self {
        self.edit_mode = edit_mode;
        self
    }
}
