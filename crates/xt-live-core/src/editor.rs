#![forbid(unsafe_code)]

//! Editor controller: the live-editor side running inside the sidebar iframe.
//!
//! Each control in the sidebar document maps to one [`EditorControl`].
//! Selecting a cell is a plain GET navigation; everything that mutates the
//! layout becomes a [`Command`] submitted through the [`CommandTransport`].
//! Destructive commands and plugin switches over unsaved edits are parked
//! in a [`ConfirmGate`] until the user answers the modal.
//!
//! The unsaved-changes flag only ever goes from `false` to `true`; a fresh
//! document load (a new controller) is the only reset.

use tracing::{debug, trace, warn};

use crate::channel::{ChannelMessage, OriginFilter};
use crate::command::{CellCoord, Command, CommandName, parse_coordinate};
use crate::config::LiveConfig;
use crate::confirm::{ConfirmGate, ConfirmPrompt, ConfirmRequest, ConfirmTicket, Resolution};
use crate::dom::{FormSubmitter, PlaceholderName};
use crate::error::{LiveError, Result};
use crate::query;
use crate::transport::{CommandForm, CommandTransport};

pub const CELL_CLASS: &str = "xt-cell";
pub const ADD_ROW_CLASS: &str = "xt-add-row";
pub const ADD_CELL_CLASS: &str = "xt-add-cell";
pub const DEL_ROW_CLASS: &str = "xt-del-row";
pub const DEL_CELL_CLASS: &str = "xt-del-cell";
pub const PUBLISH_CLASS: &str = "xt-publish";
pub const REVERT_CLASS: &str = "xt-revert";
pub const PLUGIN_SELECT_CLASS: &str = "xt-plugin-select";
/// Set on the editor root when the server wants a placeholder refreshed.
pub const RELOAD_ATTR: &str = "data-xt-reload";

/// Control classes in the order the shell should test them.
pub const CONTROL_CLASSES: [&str; 7] = [
    CELL_CLASS,
    ADD_ROW_CLASS,
    ADD_CELL_CLASS,
    DEL_ROW_CLASS,
    DEL_CELL_CLASS,
    PUBLISH_CLASS,
    REVERT_CLASS,
];

/// A clickable control in the sidebar document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorControl {
    /// Select a cell for editing (navigation only).
    Cell(CellCoord),
    AddRow { y: u32 },
    AddCell { y: u32 },
    DeleteRow { y: u32 },
    DeleteCell(CellCoord),
    Publish,
    Revert,
}

impl EditorControl {
    /// Build a control from its CSS class and a `data-x` / `data-y` lookup.
    ///
    /// Returns `Ok(None)` for classes that are not editor controls.
    pub fn from_class<'a, F>(class: &str, mut lookup: F) -> Result<Option<Self>>
    where
        F: FnMut(&'static str) -> Option<&'a str>,
    {
        let mut coord = |control: &'static str, param: &'static str| -> Result<u32> {
            let raw = lookup(param).ok_or(LiveError::MissingParam {
                command: control,
                param,
            })?;
            parse_coordinate(param, raw)
        };
        Ok(Some(match class {
            CELL_CLASS => Self::Cell(CellCoord::new(coord(CELL_CLASS, "x")?, coord(CELL_CLASS, "y")?)),
            ADD_ROW_CLASS => Self::AddRow {
                y: coord(CommandName::AddRow.as_str(), "y")?,
            },
            ADD_CELL_CLASS => Self::AddCell {
                y: coord(CommandName::AddCell.as_str(), "y")?,
            },
            DEL_ROW_CLASS => Self::DeleteRow {
                y: coord(CommandName::DelRow.as_str(), "y")?,
            },
            DEL_CELL_CLASS => {
                let name = CommandName::DelCell.as_str();
                Self::DeleteCell(CellCoord::new(coord(name, "x")?, coord(name, "y")?))
            }
            PUBLISH_CLASS => Self::Publish,
            REVERT_CLASS => Self::Revert,
            _ => return Ok(None),
        }))
    }
}

/// Side effect the shell must apply for the editor document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEffect {
    /// Full GET navigation of the sidebar document.
    Navigate(String),
    /// Submit through [`EditorController::submit`]; navigates away.
    Submit(Command),
    /// Show a modal and report back via [`EditorController::resolve`].
    Confirm(ConfirmRequest),
    /// Put the plugin selector back to this value.
    RestorePluginSelection(String),
    /// Write a picked value into the form field with this id.
    SetField { target: String, value: String },
    /// `postMessage` to the parent (host) window.
    PostToParent(ChannelMessage),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum GatedAction {
    Command(Command),
    PluginChange { previous: String, selected: String },
}

#[derive(Debug, Clone)]
pub struct EditorController {
    location: String,
    transport: CommandTransport,
    origin: OriginFilter,
    changes_made: bool,
    gate: ConfirmGate<GatedAction>,
}

impl EditorController {
    /// Controller for a freshly loaded sidebar document at `location_href`.
    pub fn new(
        config: &LiveConfig,
        origin: impl Into<String>,
        location_href: impl Into<String>,
    ) -> Result<Self> {
        config.validate()?;
        let location = location_href.into();
        Ok(Self {
            transport: CommandTransport::for_location(location.clone(), config.csrf()),
            location,
            origin: OriginFilter::new(origin),
            changes_made: false,
            gate: ConfirmGate::new(),
        })
    }

    #[must_use]
    pub fn changes_made(&self) -> bool {
        self.changes_made
    }

    /// Filter the shell registers its `message` listener behind.
    #[must_use]
    pub fn origin(&self) -> &OriginFilter {
        &self.origin
    }

    #[must_use]
    pub fn pending_confirmation(&self) -> Option<ConfirmRequest> {
        self.gate.pending()
    }

    /// Effects to run right after the document loaded.
    ///
    /// `reload_placeholder` is the placeholder the server asks the host to
    /// refresh, if the rendered editor page names one.
    #[must_use]
    pub fn on_load(&self, reload_placeholder: Option<&str>) -> Vec<EditorEffect> {
        reload_placeholder
            .and_then(PlaceholderName::new)
            .map(|name| {
                debug!(placeholder = %name, "notifying host of layout change");
                vec![EditorEffect::PostToParent(ChannelMessage::ReloadPlaceholder(name))]
            })
            .unwrap_or_default()
    }

    pub fn activate(&mut self, control: EditorControl) -> Vec<EditorEffect> {
        match control {
            EditorControl::Cell(cell) => {
                let x = cell.x.to_string();
                let y = cell.y.to_string();
                let url = query::mutate_url(
                    &self.location,
                    [("x", Some(x.as_str())), ("y", Some(y.as_str()))],
                );
                vec![EditorEffect::Navigate(url)]
            }
            EditorControl::AddRow { y } => vec![EditorEffect::Submit(Command::AddRow { y })],
            EditorControl::AddCell { y } => vec![EditorEffect::Submit(Command::AddCell { y })],
            EditorControl::DeleteRow { y } => {
                self.gated(ConfirmPrompt::DeleteRow, GatedAction::Command(Command::DelRow { y }))
            }
            EditorControl::DeleteCell(cell) => self.gated(
                ConfirmPrompt::DeleteCell,
                GatedAction::Command(Command::DelCell { cell }),
            ),
            EditorControl::Publish => {
                self.gated(ConfirmPrompt::Publish, GatedAction::Command(Command::Publish))
            }
            EditorControl::Revert => {
                self.gated(ConfirmPrompt::Revert, GatedAction::Command(Command::Revert))
            }
        }
    }

    /// Input/change on any form control other than the plugin selector.
    pub fn field_changed(&mut self) {
        if !self.changes_made {
            trace!("form has unsaved changes");
        }
        self.changes_made = true;
    }

    /// Plugin selector moved from `previous` (its value before the change) to `selected`.
    pub fn plugin_changed(&mut self, previous: &str, selected: &str) -> Vec<EditorEffect> {
        if previous == selected {
            return Vec::new();
        }
        let submit = Command::ChangePlugin {
            plugin: selected.to_owned(),
        };
        if !self.changes_made {
            return vec![EditorEffect::Submit(submit)];
        }
        self.gated(
            ConfirmPrompt::DiscardChanges,
            GatedAction::PluginChange {
                previous: previous.to_owned(),
                selected: selected.to_owned(),
            },
        )
    }

    /// Answer to the modal shown for `ticket`.
    pub fn resolve(&mut self, ticket: ConfirmTicket, accepted: bool) -> Vec<EditorEffect> {
        match self.gate.resolve(ticket, accepted) {
            Resolution::Accepted(GatedAction::Command(command)) => {
                vec![EditorEffect::Submit(command)]
            }
            Resolution::Accepted(GatedAction::PluginChange { selected, .. }) => {
                vec![EditorEffect::Submit(Command::ChangePlugin { plugin: selected })]
            }
            Resolution::Declined(GatedAction::PluginChange { previous, .. }) => {
                debug!(%previous, "plugin switch declined");
                vec![EditorEffect::RestorePluginSelection(previous)]
            }
            Resolution::Declined(GatedAction::Command(command)) => {
                debug!(command = command.name().as_str(), "command declined");
                Vec::new()
            }
            Resolution::Unknown => {
                trace!(ticket = ticket.raw(), "ignoring unknown confirmation ticket");
                Vec::new()
            }
        }
    }

    /// Handle a same-origin channel message delivered to the sidebar window.
    pub fn handle_message(&mut self, message: ChannelMessage) -> Vec<EditorEffect> {
        match message {
            ChannelMessage::Pick(pick) => {
                self.changes_made = true;
                vec![EditorEffect::SetField {
                    target: pick.target,
                    value: pick.value,
                }]
            }
            ChannelMessage::ReloadPlaceholder(name) => {
                trace!(placeholder = %name, "reload request is for the host");
                Vec::new()
            }
        }
    }

    /// Submit `command` through the transport. Navigates away on success.
    pub fn submit<S: FormSubmitter>(
        &self,
        command: &Command,
        submitter: &mut S,
    ) -> core::result::Result<CommandForm, S::Error> {
        self.transport.submit(command, submitter).inspect_err(|err| {
            warn!(command = command.name().as_str(), %err, "command submission failed");
        })
    }

    fn gated(&mut self, prompt: ConfirmPrompt, mut action: GatedAction) -> Vec<EditorEffect> {
        let mut effects = Vec::with_capacity(2);
        if let Some(GatedAction::PluginChange { previous, .. }) = self.gate.pending_action() {
            match &mut action {
                // The selector already shows the new pick. Keep the value the
                // page was rendered with for a later decline.
                GatedAction::PluginChange {
                    previous: incoming, ..
                } => incoming.clone_from(previous),
                GatedAction::Command(_) => {
                    effects.push(EditorEffect::RestorePluginSelection(previous.clone()));
                }
            }
        }
        effects.push(EditorEffect::Confirm(self.gate.request(prompt, action)));
        effects
    }
}
