#![forbid(unsafe_code)]

//! Layout commands understood by the server.
//!
//! A command is one server round trip. The client never keeps layout state
//! of its own; it only names the mutation and the coordinates it applies to.

use core::fmt;

use crate::error::{LiveError, Result};

/// Cell address within a placeholder layout: `y` is the row, `x` the cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CellCoord {
    pub x: u32,
    pub y: u32,
}

impl CellCoord {
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// Parse a `data-x` / `data-y` style attribute into a coordinate component.
pub fn parse_coordinate(field: &'static str, raw: &str) -> Result<u32> {
    raw.trim()
        .parse::<u32>()
        .map_err(|_| LiveError::InvalidCoordinate {
            field,
            value: raw.to_owned(),
        })
}

/// Wire names of the recognized commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandName {
    AddCell,
    AddRow,
    DelRow,
    DelCell,
    Publish,
    Revert,
    ChangePlugin,
    EditOn,
    EditOff,
}

impl CommandName {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AddCell => "add_cell",
            Self::AddRow => "add_row",
            Self::DelRow => "del_row",
            Self::DelCell => "del_cell",
            Self::Publish => "publish",
            Self::Revert => "revert",
            Self::ChangePlugin => "change_plugin",
            Self::EditOn => "edit_on",
            Self::EditOff => "edit_off",
        }
    }
}

impl fmt::Display for CommandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A layout mutation with its fixed parameter set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    AddCell { y: u32 },
    AddRow { y: u32 },
    DelRow { y: u32 },
    DelCell { cell: CellCoord },
    Publish,
    Revert,
    ChangePlugin { plugin: String },
    EditOn,
    EditOff,
}

impl Command {
    /// `edit_on` when edit mode is currently off, `edit_off` otherwise.
    #[must_use]
    pub const fn edit_toggle(edit_mode: bool) -> Self {
        if edit_mode { Self::EditOff } else { Self::EditOn }
    }

    #[must_use]
    pub const fn name(&self) -> CommandName {
        match self {
            Self::AddCell { .. } => CommandName::AddCell,
            Self::AddRow { .. } => CommandName::AddRow,
            Self::DelRow { .. } => CommandName::DelRow,
            Self::DelCell { .. } => CommandName::DelCell,
            Self::Publish => CommandName::Publish,
            Self::Revert => CommandName::Revert,
            Self::ChangePlugin { .. } => CommandName::ChangePlugin,
            Self::EditOn => CommandName::EditOn,
            Self::EditOff => CommandName::EditOff,
        }
    }

    /// Command-specific form parameters, `x` before `y`.
    #[must_use]
    pub fn params(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::AddCell { y } | Self::AddRow { y } | Self::DelRow { y } => {
                vec![("y", y.to_string())]
            }
            Self::DelCell { cell } => vec![("x", cell.x.to_string()), ("y", cell.y.to_string())],
            Self::ChangePlugin { plugin } => vec![("plugin", plugin.clone())],
            Self::Publish | Self::Revert | Self::EditOn | Self::EditOff => Vec::new(),
        }
    }
}
