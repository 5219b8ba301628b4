#![forbid(unsafe_code)]

//! Command transport: one command, one hidden POST form, one page load.
//!
//! The form is built as a plain value first. The web shell turns it into a
//! detached `<form>` element, appends it to `<body>` and submits it, which
//! navigates away from the calling document. Nothing after the submission
//! runs in the old document.

use core::fmt::Write as _;

use tracing::debug;
use v_htmlescape::escape;

use crate::command::Command;
use crate::config::CsrfToken;
use crate::dom::FormSubmitter;

/// Form field carrying the command name.
pub const COMMAND_FIELD: &str = "command";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormMethod {
    #[default]
    Post,
}

impl FormMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Post => "post",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub name: String,
    pub value: String,
}

impl FormField {
    fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A fully-specified command submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandForm {
    pub action: String,
    pub method: FormMethod,
    /// Hidden inputs in submission order: `command`, parameters, CSRF.
    pub fields: Vec<FormField>,
}

impl CommandForm {
    /// First value submitted under `name`.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }

    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Render as an HTML `<form>` with hidden inputs and one submit button.
    ///
    /// All attribute values are HTML-escaped.
    #[must_use]
    pub fn to_html(&self, form_class: &str, button_label: &str) -> String {
        let mut out = String::new();
        let _ = write!(
            out,
            r#"<form class="{}" method="{}" action="{}">"#,
            escape(form_class),
            self.method.as_str(),
            escape(&self.action)
        );
        for field in &self.fields {
            let _ = write!(
                out,
                r#"<input type="hidden" name="{}" value="{}">"#,
                escape(&field.name),
                escape(&field.value)
            );
        }
        let _ = write!(
            out,
            r#"<button type="submit">{}</button></form>"#,
            escape(button_label)
        );
        out
    }
}

/// Builds command forms for one target endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTransport {
    action: String,
    csrf: CsrfToken,
}

impl CommandTransport {
    /// Transport posting back to the current document (editor side).
    #[must_use]
    pub fn for_location(location_href: impl Into<String>, csrf: CsrfToken) -> Self {
        Self {
            action: location_href.into(),
            csrf,
        }
    }

    /// Transport posting to the configured command endpoint (host side).
    #[must_use]
    pub fn for_command_url(command_url: impl Into<String>, csrf: CsrfToken) -> Self {
        Self {
            action: command_url.into(),
            csrf,
        }
    }

    #[must_use]
    pub fn form(&self, command: &Command) -> CommandForm {
        let params = command.params();
        let mut fields = Vec::with_capacity(params.len() + 2);
        fields.push(FormField::new(COMMAND_FIELD, command.name().as_str()));
        fields.extend(
            params
                .into_iter()
                .map(|(name, value)| FormField::new(name, value)),
        );
        fields.push(FormField::new(&self.csrf.field, &self.csrf.value));
        CommandForm {
            action: self.action.clone(),
            method: FormMethod::Post,
            fields,
        }
    }

    /// Build the form for `command` and hand it to `submitter`.
    ///
    /// On a real page this navigates away; callers must not rely on code
    /// after this returning `Ok`.
    pub fn submit<S: FormSubmitter>(
        &self,
        command: &Command,
        submitter: &mut S,
    ) -> Result<CommandForm, S::Error> {
        let form = self.form(command);
        debug!(
            command = command.name().as_str(),
            action = %form.action,
            "submitting command form"
        );
        submitter.submit(&form)?;
        Ok(form)
    }
}
