#![forbid(unsafe_code)]

//! Cross-frame channel: `postMessage` payloads exchanged between the host
//! page, the sidebar iframe, and popup browse windows.
//!
//! Wire shapes:
//! - `{ "reloadPlaceholder": "<name>" }` asks the host to refresh a placeholder.
//! - `{ "pick": { "target": "<field id>", "value": "<value>" } }` carries a
//!   selection made in a browse popup.
//!
//! Delivery is best-effort. Receivers register through
//! [`MessageRouter::on_same_origin`]; [`OriginFilter`] is the only trust
//! boundary.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;

use crate::dom::{MessageTarget, PlaceholderName};

/// Selection made in a browse popup, destined for a form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickPayload {
    /// Id of the form field receiving the value.
    pub target: String,
    pub value: String,
}

/// A decoded channel message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelMessage {
    ReloadPlaceholder(PlaceholderName),
    Pick(PickPayload),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct WireMessage {
    #[serde(
        rename = "reloadPlaceholder",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    reload_placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pick: Option<PickPayload>,
}

impl ChannelMessage {
    /// Decode a JSON message body. Anything unrecognized yields `None`.
    ///
    /// Unknown extra fields are ignored; when both fields are present the
    /// reload request wins.
    #[must_use]
    pub fn from_json(data: &str) -> Option<Self> {
        let wire: WireMessage = serde_json::from_str(data).ok()?;
        if let Some(name) = wire.reload_placeholder.and_then(PlaceholderName::new) {
            return Some(Self::ReloadPlaceholder(name));
        }
        wire.pick.map(Self::Pick)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        let wire = match self {
            Self::ReloadPlaceholder(name) => WireMessage {
                reload_placeholder: Some(name.as_str().to_owned()),
                ..WireMessage::default()
            },
            Self::Pick(pick) => WireMessage {
                pick: Some(pick.clone()),
                ..WireMessage::default()
            },
        };
        serde_json::to_string(&wire)
    }
}

/// A received `message` event, reduced to what the core inspects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossFrameEvent {
    pub origin: String,
    /// JSON-serialized `event.data`.
    pub data: String,
}

impl CrossFrameEvent {
    #[must_use]
    pub fn new(origin: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            data: data.into(),
        }
    }
}

/// Accepts only events whose origin equals the page's own origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginFilter {
    own_origin: String,
}

impl OriginFilter {
    #[must_use]
    pub fn new(own_origin: impl Into<String>) -> Self {
        Self {
            own_origin: own_origin.into(),
        }
    }

    #[must_use]
    pub fn own_origin(&self) -> &str {
        &self.own_origin
    }

    #[must_use]
    pub fn accepts(&self, event: &CrossFrameEvent) -> bool {
        event.origin == self.own_origin
    }
}

type Predicate = Box<dyn Fn(&CrossFrameEvent) -> bool>;
type Handler = Box<dyn FnMut(ChannelMessage)>;

/// Ordered set of `(predicate, handler)` listeners.
#[derive(Default)]
pub struct MessageRouter {
    listeners: Vec<(Predicate, Handler)>,
}

impl core::fmt::Debug for MessageRouter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MessageRouter")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl MessageRouter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler`, invoked with the decoded payload whenever
    /// `predicate` holds for an event.
    pub fn on_message<P, H>(&mut self, predicate: P, handler: H)
    where
        P: Fn(&CrossFrameEvent) -> bool + 'static,
        H: FnMut(ChannelMessage) + 'static,
    {
        self.listeners.push((Box::new(predicate), Box::new(handler)));
    }

    /// [`Self::on_message`] guarded by `filter`: only same-origin events
    /// reach `handler`.
    pub fn on_same_origin<H>(&mut self, filter: OriginFilter, handler: H)
    where
        H: FnMut(ChannelMessage) + 'static,
    {
        self.on_message(move |event| filter.accepts(event), handler);
    }

    /// Deliver `event` to matching listeners; returns how many ran.
    pub fn dispatch(&mut self, event: &CrossFrameEvent) -> usize {
        let mut invoked = 0;
        for (predicate, handler) in &mut self.listeners {
            if !predicate(event) {
                trace!(origin = %event.origin, "listener skipped message");
                continue;
            }
            if let Some(message) = ChannelMessage::from_json(&event.data) {
                handler(message);
                invoked += 1;
            }
        }
        invoked
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum SendError<E> {
    #[error("failed to encode channel message: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("postMessage failed: {0}")]
    Post(E),
}

/// Post `message` to `target`, restricted to `target_origin`.
pub fn send<T: MessageTarget>(
    target: &T,
    message: &ChannelMessage,
    target_origin: &str,
) -> Result<(), SendError<T::Error>> {
    let data = message.to_json()?;
    trace!(%target_origin, %data, "posting channel message");
    target
        .post_message(&data, target_origin)
        .map_err(SendError::Post)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    const ORIGIN: &str = "https://shop.example";

    #[test]
    fn decodes_reload_and_pick() {
        assert_eq!(
            ChannelMessage::from_json(r#"{"reloadPlaceholder":"hero","extra":1}"#),
            Some(ChannelMessage::ReloadPlaceholder(
                PlaceholderName::new("hero").unwrap()
            ))
        );
        assert_eq!(
            ChannelMessage::from_json(r#"{"pick":{"target":"image","value":"/m/1.png"}}"#),
            Some(ChannelMessage::Pick(PickPayload {
                target: "image".into(),
                value: "/m/1.png".into(),
            }))
        );
    }

    #[test]
    fn rejects_unrelated_payloads() {
        assert_eq!(ChannelMessage::from_json(r#"{"type":"resize"}"#), None);
        assert_eq!(ChannelMessage::from_json(r#"{"reloadPlaceholder":""}"#), None);
        assert_eq!(ChannelMessage::from_json(r#"{"reloadPlaceholder":3}"#), None);
        assert_eq!(ChannelMessage::from_json("\"hero\""), None);
    }

    #[test]
    fn encodes_wire_shape() {
        let msg = ChannelMessage::ReloadPlaceholder(PlaceholderName::new("hero").unwrap());
        assert_eq!(msg.to_json().unwrap(), r#"{"reloadPlaceholder":"hero"}"#);
    }

    #[test]
    fn origin_filter_is_exact() {
        let filter = OriginFilter::new(ORIGIN);
        let data = r#"{"reloadPlaceholder":"hero"}"#;
        assert!(filter.accepts(&CrossFrameEvent::new(ORIGIN, data)));
        assert!(!filter.accepts(&CrossFrameEvent::new("https://evil.example", data)));
        assert!(!filter.accepts(&CrossFrameEvent::new("https://shop.example:8443", data)));
    }

    #[test]
    fn router_only_invokes_matching_listeners() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut router = MessageRouter::new();
        let sink = Rc::clone(&seen);
        router.on_same_origin(OriginFilter::new(ORIGIN), move |message| {
            sink.borrow_mut().push(message);
        });
        let counted = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&counted);
        router.on_message(
            |event| event.data.contains("pick"),
            move |_| *counter.borrow_mut() += 1,
        );
        assert_eq!(router.len(), 2);

        let data = r#"{"reloadPlaceholder":"hero"}"#;
        assert_eq!(router.dispatch(&CrossFrameEvent::new("https://evil.example", data)), 0);
        assert_eq!(router.dispatch(&CrossFrameEvent::new(ORIGIN, "{}")), 0);
        assert_eq!(router.dispatch(&CrossFrameEvent::new(ORIGIN, data)), 1);
        assert_eq!(
            seen.borrow().as_slice(),
            &[ChannelMessage::ReloadPlaceholder(
                PlaceholderName::new("hero").unwrap()
            )]
        );

        let pick = r#"{"pick":{"target":"image","value":"/m/1.png"}}"#;
        assert_eq!(router.dispatch(&CrossFrameEvent::new("https://evil.example", pick)), 1);
        assert_eq!(*counted.borrow(), 1);
        assert_eq!(seen.borrow().len(), 1);
    }

    struct RecordingWindow(RefCell<Vec<(String, String)>>);

    impl MessageTarget for RecordingWindow {
        type Error = String;

        fn post_message(&self, data: &str, target_origin: &str) -> Result<(), String> {
            self.0
                .borrow_mut()
                .push((data.to_owned(), target_origin.to_owned()));
            Ok(())
        }
    }

    #[test]
    fn send_posts_encoded_message() {
        let window = RecordingWindow(RefCell::new(Vec::new()));
        let msg = ChannelMessage::ReloadPlaceholder(PlaceholderName::new("footer").unwrap());
        send(&window, &msg, ORIGIN).unwrap();
        assert_eq!(
            window.0.borrow().as_slice(),
            &[(
                r#"{"reloadPlaceholder":"footer"}"#.to_owned(),
                ORIGIN.to_owned()
            )]
        );
    }
}
