//! In-memory DOM, parser, and form submitter shared by the integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::convert::Infallible;

use xt_live_core::{CommandForm, DocumentParser, FormSubmitter, PlaceholderDom};

/// Anchor id -> inner HTML, with a log of every mutation.
#[derive(Debug, Default)]
pub struct FakeDom {
    pub anchors: BTreeMap<String, String>,
    pub markers: bool,
    pub mutations: Vec<String>,
}

impl FakeDom {
    pub fn with_anchors(anchors: &[(&str, &str)]) -> Self {
        Self {
            anchors: anchors
                .iter()
                .map(|(id, html)| ((*id).to_owned(), (*html).to_owned()))
                .collect(),
            markers: !anchors.is_empty(),
            mutations: Vec::new(),
        }
    }

    pub fn content(&self, anchor_id: &str) -> Option<&str> {
        self.anchors.get(anchor_id).map(String::as_str)
    }
}

impl PlaceholderDom for FakeDom {
    fn has_anchor(&self, anchor_id: &str) -> bool {
        self.anchors.contains_key(anchor_id)
    }

    fn replace_anchor_content(&mut self, anchor_id: &str, inner_html: &str) -> bool {
        match self.anchors.get_mut(anchor_id) {
            Some(slot) => {
                *slot = inner_html.to_owned();
                self.mutations.push(anchor_id.to_owned());
                true
            }
            None => false,
        }
    }

    fn has_placeholder_markers(&self) -> bool {
        self.markers
    }
}

/// Finds `<div id="ID">...</div>` without nesting support.
#[derive(Debug, Default)]
pub struct FakeParser;

impl DocumentParser for FakeParser {
    fn anchor_inner_html(&self, document_html: &str, anchor_id: &str) -> Option<String> {
        let open = format!("<div id=\"{anchor_id}\">");
        let start = document_html.find(&open)? + open.len();
        let len = document_html[start..].find("</div>")?;
        Some(document_html[start..start + len].to_owned())
    }
}

pub fn page(anchors: &[(&str, &str)]) -> String {
    let mut html = String::from("<html><body>");
    for (id, inner) in anchors {
        html.push_str(&format!("<div id=\"{id}\">{inner}</div>"));
    }
    html.push_str("</body></html>");
    html
}

#[derive(Debug, Default)]
pub struct RecordingSubmitter {
    pub submitted: Vec<CommandForm>,
}

impl FormSubmitter for RecordingSubmitter {
    type Error = Infallible;

    fn submit(&mut self, form: &CommandForm) -> Result<(), Infallible> {
        self.submitted.push(form.clone());
        Ok(())
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}
