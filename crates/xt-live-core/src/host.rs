#![forbid(unsafe_code)]

//! Host injection controller: the live-editor side running in the storefront page.
//!
//! Owns the sidebar [`EditSession`], turns placeholder clicks into sidebar
//! navigations, and refreshes single placeholder subtrees when the editor
//! reports a change.
//!
//! # Sidebar state machine
//!
//! ```text
//!            open(url): SetSource + ScheduleReveal
//!   Hidden ───────────────────────────────────────▶ Hidden (reveal pending)
//!     ▲  │                                               │ reveal_tick(): Show
//!     │  └──────────────── toggle(): Show ──────────┐    ▼
//!     └──────────────────── toggle(): Hide ──────── Visible
//! ```
//!
//! The one-tick delay between setting the iframe source and revealing the
//! sidebar keeps the browser from folding both changes into a single
//! non-animated paint.
//!
//! # Placeholder refresh
//!
//! Refreshes are host-driven: [`HostController::handle_message`] returns a
//! [`RefreshRequest`], the shell fetches it, and reports back through
//! [`HostController::complete_refresh`] or [`HostController::fail_refresh`].
//! Each request carries a per-placeholder sequence number; a response older
//! than the newest request for the same placeholder is discarded.

use std::collections::HashMap;

use tracing::{debug, info, trace, warn};

use crate::channel::{ChannelMessage, OriginFilter, PickPayload};
use crate::command::Command;
use crate::config::LiveConfig;
use crate::dom::{DocumentParser, PlaceholderDom, PlaceholderName};
use crate::error::Result;
use crate::query;
use crate::transport::{CommandForm, CommandTransport};

/// Class of the rendered edit-mode toggle form.
pub const EDIT_TOGGLE_CLASS: &str = "xt-edit-toggle";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SidebarVisibility {
    #[default]
    Hidden,
    Visible,
}

/// Sidebar session for one page load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditSession {
    visibility: SidebarVisibility,
    target_url: Option<String>,
    reveal_pending: bool,
}

impl EditSession {
    #[must_use]
    pub fn visibility(&self) -> SidebarVisibility {
        self.visibility
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visibility == SidebarVisibility::Visible
    }

    #[must_use]
    pub fn target_url(&self) -> Option<&str> {
        self.target_url.as_deref()
    }

    #[must_use]
    pub fn reveal_pending(&self) -> bool {
        self.reveal_pending
    }
}

/// Sidebar DOM change the shell must apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SidebarCommand {
    /// Point the sidebar iframe at this URL.
    SetSource(String),
    /// Call [`HostController::reveal_tick`] after one scheduling tick.
    ScheduleReveal,
    Show,
    Hide,
}

/// Attributes read from a clicked placeholder element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaceholderClick {
    pub name: Option<String>,
    /// Text of the nested default-layout JSON script, if any.
    pub default_config: Option<String>,
}

impl PlaceholderClick {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            default_config: None,
        }
    }

    #[must_use]
    pub fn with_default_config(mut self, json: impl Into<String>) -> Self {
        self.default_config = Some(json.into());
        self
    }
}

/// Result of the delegated placeholder click handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickDispatch {
    /// Whether the shell must call `preventDefault` + `stopPropagation`.
    pub suppress_default: bool,
    pub commands: Vec<SidebarCommand>,
}

/// Fetch the shell must perform to refresh one placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshRequest {
    pub placeholder: PlaceholderName,
    pub url: String,
    pub sequence: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadIgnoredReason {
    MissingAnchor,
    NoSidebar,
}

/// Outcome of one channel message on the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadOutcome {
    Refresh(RefreshRequest),
    /// Forward a popup selection to the sidebar iframe.
    ForwardPick(PickPayload),
    Ignored(ReloadIgnoredReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    Applied,
    /// A newer refresh for the same placeholder was issued.
    Stale,
    /// The live anchor disappeared while the fetch was in flight.
    MissingAnchor,
    /// The fetched page does not contain the anchor.
    MissingInResponse,
}

/// Notice for the external notifier after a failed refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshFailure {
    pub placeholder: PlaceholderName,
    pub message: String,
}

/// Edit-mode toggle rendered on pages that contain placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditToggle {
    pub form: CommandForm,
    pub label: &'static str,
}

impl EditToggle {
    #[must_use]
    pub fn to_html(&self) -> String {
        self.form.to_html(EDIT_TOGGLE_CLASS, self.label)
    }
}

#[derive(Debug, Clone)]
pub struct HostController {
    config: LiveConfig,
    origin: OriginFilter,
    page_url: String,
    transport: CommandTransport,
    session: Option<EditSession>,
    next_sequence: u64,
    latest_sequence: HashMap<PlaceholderName, u64>,
}

impl HostController {
    /// `origin` is the host page's own origin, `page_url` its current href.
    pub fn new(
        config: LiveConfig,
        origin: impl Into<String>,
        page_url: impl Into<String>,
    ) -> Result<Self> {
        config.validate_host()?;
        let transport = CommandTransport::for_command_url(&config.command_url, config.csrf());
        Ok(Self {
            config,
            origin: OriginFilter::new(origin),
            page_url: page_url.into(),
            transport,
            session: None,
            next_sequence: 1,
            latest_sequence: HashMap::new(),
        })
    }

    #[must_use]
    pub fn config(&self) -> &LiveConfig {
        &self.config
    }

    #[must_use]
    pub fn origin(&self) -> &OriginFilter {
        &self.origin
    }

    /// The session exists once the first placeholder was clicked.
    #[must_use]
    pub fn session(&self) -> Option<&EditSession> {
        self.session.as_ref()
    }

    /// Track `history.pushState` navigations; refreshes fetch this URL.
    pub fn set_page_url(&mut self, page_url: impl Into<String>) {
        self.page_url = page_url.into();
    }

    /// Flip sidebar visibility. Before the first placeholder click there is
    /// no session and the sidebar simply stays hidden.
    pub fn toggle(&mut self) -> SidebarCommand {
        let Some(session) = self.session.as_mut() else {
            trace!("sidebar toggled before any placeholder was opened");
            return SidebarCommand::Hide;
        };
        session.reveal_pending = false;
        session.visibility = match session.visibility {
            SidebarVisibility::Hidden => SidebarVisibility::Visible,
            SidebarVisibility::Visible => SidebarVisibility::Hidden,
        };
        debug!(visible = session.is_visible(), "sidebar toggled");
        if session.is_visible() {
            SidebarCommand::Show
        } else {
            SidebarCommand::Hide
        }
    }

    /// Load `target_url` into the sidebar and schedule the reveal.
    pub fn open(&mut self, target_url: impl Into<String>) -> Vec<SidebarCommand> {
        let target_url = target_url.into();
        let session = self.session.get_or_insert_with(EditSession::default);
        session.target_url = Some(target_url.clone());
        session.reveal_pending = true;
        vec![
            SidebarCommand::SetSource(target_url),
            SidebarCommand::ScheduleReveal,
        ]
    }

    /// Second half of [`Self::open`], run one tick later.
    pub fn reveal_tick(&mut self) -> Option<SidebarCommand> {
        let session = self.session.as_mut()?;
        if !session.reveal_pending {
            return None;
        }
        session.reveal_pending = false;
        if session.is_visible() {
            return None;
        }
        session.visibility = SidebarVisibility::Visible;
        Some(SidebarCommand::Show)
    }

    /// Sidebar URL for `name` with `view`, `theme`, `ph`, `default_config`.
    #[must_use]
    pub fn sidebar_url(&self, name: &PlaceholderName, default_config: Option<&str>) -> String {
        query::mutate_url(
            &self.config.sidebar_url,
            [
                ("view", Some(self.config.view.as_str())),
                ("theme", Some(self.config.theme.as_str())),
                ("ph", Some(name.as_str())),
                ("default_config", Some(default_config.unwrap_or_default())),
            ],
        )
    }

    /// Open the editor for the clicked placeholder; no name means no-op.
    pub fn open_placeholder_editor(&mut self, click: &PlaceholderClick) -> Vec<SidebarCommand> {
        let Some(name) = click.name.clone().and_then(PlaceholderName::new) else {
            trace!("placeholder click without a name");
            return Vec::new();
        };
        let default_config = click
            .default_config
            .as_deref()
            .map(str::trim)
            .filter(|json| !json.is_empty());
        let url = self.sidebar_url(&name, default_config);
        info!(placeholder = %name, %url, "opening placeholder editor");
        self.open(url)
    }

    /// Delegated click handler for any element tagged as a placeholder.
    pub fn handle_placeholder_click(&mut self, click: &PlaceholderClick) -> ClickDispatch {
        ClickDispatch {
            suppress_default: true,
            commands: self.open_placeholder_editor(click),
        }
    }

    /// Act on a same-origin channel message received by the host window.
    ///
    /// The shell registers this behind [`crate::MessageRouter::on_same_origin`]
    /// with [`Self::origin`], so foreign and undecodable events never get here.
    pub fn handle_message<D: PlaceholderDom>(
        &mut self,
        message: ChannelMessage,
        dom: &D,
        cache_token: u64,
    ) -> ReloadOutcome {
        match message {
            ChannelMessage::ReloadPlaceholder(name) => {
                self.handle_reload_message(name, dom, cache_token)
            }
            ChannelMessage::Pick(pick) => {
                if self.session.as_ref().is_some_and(|s| s.target_url.is_some()) {
                    ReloadOutcome::ForwardPick(pick)
                } else {
                    ReloadOutcome::Ignored(ReloadIgnoredReason::NoSidebar)
                }
            }
        }
    }

    /// Start a refresh of `name` if its anchor is in the live document.
    pub fn handle_reload_message<D: PlaceholderDom>(
        &mut self,
        name: PlaceholderName,
        dom: &D,
        cache_token: u64,
    ) -> ReloadOutcome {
        if !dom.has_anchor(&name.anchor_id()) {
            debug!(placeholder = %name, "reload for placeholder not on this page");
            return ReloadOutcome::Ignored(ReloadIgnoredReason::MissingAnchor);
        }
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.latest_sequence.insert(name.clone(), sequence);

        let token = format!("{cache_token}-{sequence}");
        let url = query::mutate_url(
            &self.page_url,
            [(self.config.cache_bust_param.as_str(), Some(token.as_str()))],
        );
        debug!(placeholder = %name, sequence, %url, "refreshing placeholder");
        ReloadOutcome::Refresh(RefreshRequest {
            placeholder: name,
            url,
            sequence,
        })
    }

    fn is_current(&self, request: &RefreshRequest) -> bool {
        self.latest_sequence.get(&request.placeholder) == Some(&request.sequence)
    }

    /// Patch the live anchor with the fetched page's copy of it.
    pub fn complete_refresh<D, P>(
        &mut self,
        request: &RefreshRequest,
        body: &str,
        dom: &mut D,
        parser: &P,
    ) -> PatchOutcome
    where
        D: PlaceholderDom,
        P: DocumentParser,
    {
        if !self.is_current(request) {
            debug!(
                placeholder = %request.placeholder,
                sequence = request.sequence,
                "discarding stale refresh response"
            );
            return PatchOutcome::Stale;
        }
        let anchor_id = request.placeholder.anchor_id();
        let Some(inner_html) = parser.anchor_inner_html(body, &anchor_id) else {
            warn!(placeholder = %request.placeholder, "fetched page has no anchor");
            return PatchOutcome::MissingInResponse;
        };
        if dom.replace_anchor_content(&anchor_id, &inner_html) {
            debug!(placeholder = %request.placeholder, bytes = inner_html.len(), "placeholder patched");
            PatchOutcome::Applied
        } else {
            debug!(placeholder = %request.placeholder, "anchor removed before patch");
            PatchOutcome::MissingAnchor
        }
    }

    /// Record a failed fetch. Returns a notice unless a newer refresh for
    /// the same placeholder is already in flight.
    pub fn fail_refresh(
        &mut self,
        request: &RefreshRequest,
        reason: impl core::fmt::Display,
    ) -> Option<RefreshFailure> {
        if !self.is_current(request) {
            return None;
        }
        let reason = reason.to_string();
        warn!(
            placeholder = %request.placeholder,
            sequence = request.sequence,
            %reason,
            "placeholder refresh failed"
        );
        Some(RefreshFailure {
            placeholder: request.placeholder.clone(),
            message: format!(
                "Could not refresh \"{}\": {reason}. Reload the page to see the latest layout.",
                request.placeholder
            ),
        })
    }

    /// Edit-mode toggle for pages that have at least one placeholder.
    pub fn edit_toggle<D: PlaceholderDom>(&self, dom: &D) -> Option<EditToggle> {
        if !dom.has_placeholder_markers() {
            return None;
        }
        let command = Command::edit_toggle(self.config.edit_mode);
        let label = if self.config.edit_mode {
            "Leave edit mode"
        } else {
            "Edit this page"
        };
        Some(EditToggle {
            form: self.transport.form(&command),
            label,
        })
    }

    /// Escaped HTML of [`Self::edit_toggle`], ready to append to the body.
    pub fn add_edit_toggle_markup<D: PlaceholderDom>(&self, dom: &D) -> Option<String> {
        self.edit_toggle(dom).map(|toggle| toggle.to_html())
    }
}
