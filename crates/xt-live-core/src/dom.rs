#![forbid(unsafe_code)]

//! DOM seams between the controllers and the embedding document.
//!
//! Controllers never hold element references. Every operation looks the
//! target up again through these traits, so a placeholder subtree that was
//! replaced by a refresh is picked up transparently on the next call.

use core::fmt;

use crate::transport::CommandForm;

/// Attribute marking a clickable placeholder element.
pub const PLACEHOLDER_NAME_ATTR: &str = "data-xt-placeholder-name";
/// Class of the nested `<script type="application/json">` with the default layout.
pub const DEFAULT_CONFIG_CLASS: &str = "xt-default-config";
/// Prefix of the placeholder anchor element id.
pub const ANCHOR_ID_PREFIX: &str = "xt-ph-";

/// Server-defined placeholder name, unique per page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlaceholderName(String);

impl PlaceholderName {
    /// Returns `None` for blank names; the host treats those as "no placeholder".
    #[must_use]
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            None
        } else {
            Some(Self(name))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Id of the element whose inner content is this placeholder's subtree.
    #[must_use]
    pub fn anchor_id(&self) -> String {
        format!("{ANCHOR_ID_PREFIX}{}", self.0)
    }
}

impl fmt::Display for PlaceholderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Read/patch access to the live host document.
pub trait PlaceholderDom {
    /// Whether an element with `anchor_id` exists right now.
    fn has_anchor(&self, anchor_id: &str) -> bool;

    /// Replace the inner content of the `anchor_id` element.
    ///
    /// Returns `false` (and changes nothing) when the anchor is gone.
    fn replace_anchor_content(&mut self, anchor_id: &str, inner_html: &str) -> bool;

    /// Whether any element carries [`PLACEHOLDER_NAME_ATTR`].
    fn has_placeholder_markers(&self) -> bool;
}

/// Parses a fetched page into a detached document.
pub trait DocumentParser {
    /// Inner HTML of the `anchor_id` element in `document_html`, if present.
    fn anchor_inner_html(&self, document_html: &str, anchor_id: &str) -> Option<String>;
}

/// Submits a command form as a full navigation.
pub trait FormSubmitter {
    type Error: fmt::Debug + fmt::Display;

    fn submit(&mut self, form: &CommandForm) -> Result<(), Self::Error>;
}

/// A window that can receive `postMessage` payloads.
pub trait MessageTarget {
    type Error: fmt::Debug + fmt::Display;

    /// Post serialized `data`, restricted to receivers at `target_origin`.
    fn post_message(&self, data: &str, target_origin: &str) -> Result<(), Self::Error>;
}
