#![forbid(unsafe_code)]

//! Core: the host/editor protocol of the xt-live in-page layout editor.
//!
//! # Role in xt-live
//! `xt-live-core` owns everything about the live editor that can be decided
//! without a browser: query-string encoding, command forms, cross-frame
//! message validation, and the two controllers that sit on either side of the
//! sidebar iframe. `xt-live-web` binds these to the real DOM.
//!
//! # Primary responsibilities
//! - **Query codec** ([`query`]): merge/stringify URL query parameters.
//! - **Commands** ([`command`]): the closed set of layout mutations.
//! - **Transport** ([`transport`]): hidden POST forms carrying a command and CSRF token.
//! - **Channel** ([`channel`]): `postMessage` payloads and origin filtering.
//! - **Host controller** ([`host`]): sidebar session, placeholder clicks, partial refresh.
//! - **Editor controller** ([`editor`]): control dispatch, change tracking, confirmation gating.
//!
//! # How it fits in the system
//! The core is host-driven. The embedding shell pushes clicks, messages, and
//! fetched documents in; controllers hand back commands (set the iframe
//! source, submit a form, navigate, post a message, ask for confirmation) that
//! the shell applies. DOM reads and writes go through the traits in [`dom`],
//! so nothing here caches element references across a patch.

pub mod channel;
pub mod command;
pub mod config;
pub mod confirm;
pub mod dom;
pub mod editor;
pub mod error;
pub mod host;
pub mod query;
pub mod transport;

pub use channel::{ChannelMessage, CrossFrameEvent, MessageRouter, OriginFilter, PickPayload};
pub use command::{CellCoord, Command, CommandName};
pub use config::{CsrfToken, LiveConfig};
pub use confirm::{ConfirmGate, ConfirmPrompt, ConfirmRequest, ConfirmTicket, Resolution};
pub use dom::{DocumentParser, FormSubmitter, MessageTarget, PlaceholderDom, PlaceholderName};
pub use editor::{EditorControl, EditorController, EditorEffect};
pub use channel::SendError;
pub use error::{LiveError, Result};
pub use host::{
    ClickDispatch, EditSession, EditToggle, HostController, PatchOutcome, PlaceholderClick,
    RefreshFailure, RefreshRequest, ReloadIgnoredReason, ReloadOutcome, SidebarCommand,
    SidebarVisibility,
};
pub use transport::{CommandForm, CommandTransport, FormField, FormMethod};
