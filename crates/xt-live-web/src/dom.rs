#![forbid(unsafe_code)]

//! `web_sys` implementations of the core DOM seams.

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, DomParser, HtmlFormElement, HtmlInputElement, SupportedType, Window};
use xt_live_core::{CommandForm, DocumentParser, FormSubmitter, MessageTarget, PlaceholderDom};

use crate::error::{Result, WebError};
use crate::selectors;

pub(crate) fn js_error(value: JsValue) -> WebError {
    WebError::Js(value.as_string().unwrap_or_else(|| format!("{value:?}")))
}

pub(crate) fn window() -> Result<Window> {
    web_sys::window().ok_or(WebError::NoWindow)
}

pub(crate) fn document(window: &Window) -> Result<Document> {
    window.document().ok_or(WebError::NoDocument)
}

/// Text of the embedded `#xt-live-config` script.
pub(crate) fn embedded_config(document: &Document) -> Result<String> {
    let selector = selectors::config_selector();
    document
        .query_selector(&selector)
        .map_err(js_error)?
        .and_then(|el| el.text_content())
        .ok_or(WebError::MissingElement(selector))
}

/// The live page document.
#[derive(Debug, Clone)]
pub struct WebDocument {
    document: Document,
}

impl WebDocument {
    #[must_use]
    pub fn new(document: Document) -> Self {
        Self { document }
    }
}

impl PlaceholderDom for WebDocument {
    fn has_anchor(&self, anchor_id: &str) -> bool {
        self.document.get_element_by_id(anchor_id).is_some()
    }

    fn replace_anchor_content(&mut self, anchor_id: &str, inner_html: &str) -> bool {
        match self.document.get_element_by_id(anchor_id) {
            Some(anchor) => {
                anchor.set_inner_html(inner_html);
                true
            }
            None => false,
        }
    }

    fn has_placeholder_markers(&self) -> bool {
        matches!(
            self.document
                .query_selector(&selectors::placeholder_selector()),
            Ok(Some(_))
        )
    }
}

/// Parses fetched pages with the browser's `DOMParser`.
#[derive(Debug, Default, Clone, Copy)]
pub struct WebParser;

impl DocumentParser for WebParser {
    fn anchor_inner_html(&self, document_html: &str, anchor_id: &str) -> Option<String> {
        let parser = DomParser::new().ok()?;
        let parsed = parser
            .parse_from_string(document_html, SupportedType::TextHtml)
            .ok()?;
        parsed
            .get_element_by_id(anchor_id)
            .map(|anchor| anchor.inner_html())
    }
}

/// Builds a hidden `<form>` in the page body and submits it.
#[derive(Debug, Clone)]
pub struct HiddenFormSubmitter {
    document: Document,
}

impl HiddenFormSubmitter {
    #[must_use]
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    fn build(&self, form: &CommandForm) -> Result<HtmlFormElement> {
        let element: HtmlFormElement = self
            .document
            .create_element("form")
            .map_err(js_error)?
            .dyn_into()
            .map_err(|_| WebError::UnexpectedType("form"))?;
        element.set_action(&form.action);
        element.set_method(form.method.as_str());
        element.set_attribute("hidden", "").map_err(js_error)?;
        for field in &form.fields {
            let input: HtmlInputElement = self
                .document
                .create_element("input")
                .map_err(js_error)?
                .dyn_into()
                .map_err(|_| WebError::UnexpectedType("input"))?;
            input.set_type("hidden");
            input.set_name(&field.name);
            input.set_value(&field.value);
            element.append_child(&input).map_err(js_error)?;
        }
        Ok(element)
    }
}

impl FormSubmitter for HiddenFormSubmitter {
    type Error = WebError;

    fn submit(&mut self, form: &CommandForm) -> Result<()> {
        let element = self.build(form)?;
        let body = self
            .document
            .body()
            .ok_or_else(|| WebError::MissingElement("body".into()))?;
        body.append_child(&element).map_err(js_error)?;
        // Unlike `submit()`, this dispatches the `submit` event first.
        element.request_submit().map_err(js_error)
    }
}

/// A window reachable through `postMessage`.
#[derive(Debug, Clone)]
pub struct WindowTarget(pub Window);

impl MessageTarget for WindowTarget {
    type Error = WebError;

    fn post_message(&self, data: &str, target_origin: &str) -> Result<()> {
        let value = js_sys::JSON::parse(data).map_err(js_error)?;
        self.0.post_message(&value, target_origin).map_err(js_error)
    }
}
