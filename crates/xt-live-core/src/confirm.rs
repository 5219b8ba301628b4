#![forbid(unsafe_code)]

//! Non-blocking confirmation gate.
//!
//! A gated action is parked behind a ticket while the shell shows a modal.
//! It runs only when that exact ticket is resolved affirmatively; declining,
//! or resolving a ticket that is no longer pending, has no side effects.

/// Handle for one pending confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConfirmTicket(u64);

impl ConfirmTicket {
    /// Ticket read back from a rendered modal.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// What the user is asked to confirm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmPrompt {
    DeleteRow,
    DeleteCell,
    Publish,
    Revert,
    DiscardChanges,
}

impl ConfirmPrompt {
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::DeleteRow => "Delete this row and all of its cells?",
            Self::DeleteCell => "Delete this cell?",
            Self::Publish => "Publish all unpublished changes?",
            Self::Revert => "Revert all unpublished changes?",
            Self::DiscardChanges => {
                "Switching the plugin discards your other unsaved changes on this form. Continue?"
            }
        }
    }
}

/// Modal request handed to the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmRequest {
    pub ticket: ConfirmTicket,
    pub prompt: ConfirmPrompt,
}

/// How a ticket resolution turned out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<A> {
    Accepted(A),
    Declined(A),
    /// Ticket was never issued, already resolved, or superseded.
    Unknown,
}

/// Holds at most one pending action; a new request supersedes the old one.
#[derive(Debug, Clone)]
pub struct ConfirmGate<A> {
    next_ticket: u64,
    pending: Option<(ConfirmTicket, ConfirmPrompt, A)>,
}

impl<A> Default for ConfirmGate<A> {
    fn default() -> Self {
        Self {
            next_ticket: 1,
            pending: None,
        }
    }
}

impl<A> ConfirmGate<A> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Park `action` behind a fresh ticket.
    pub fn request(&mut self, prompt: ConfirmPrompt, action: A) -> ConfirmRequest {
        let ticket = ConfirmTicket(self.next_ticket);
        self.next_ticket = self.next_ticket.wrapping_add(1);
        self.pending = Some((ticket, prompt, action));
        ConfirmRequest { ticket, prompt }
    }

    #[must_use]
    pub fn pending(&self) -> Option<ConfirmRequest> {
        self.pending
            .as_ref()
            .map(|(ticket, prompt, _)| ConfirmRequest {
                ticket: *ticket,
                prompt: *prompt,
            })
    }

    /// Action parked behind the current ticket.
    #[must_use]
    pub fn pending_action(&self) -> Option<&A> {
        self.pending.as_ref().map(|(_, _, action)| action)
    }

    pub fn resolve(&mut self, ticket: ConfirmTicket, accepted: bool) -> Resolution<A> {
        match self.pending.take() {
            Some((pending, _, action)) if pending == ticket => {
                if accepted {
                    Resolution::Accepted(action)
                } else {
                    Resolution::Declined(action)
                }
            }
            other => {
                self.pending = other;
                Resolution::Unknown
            }
        }
    }
}
