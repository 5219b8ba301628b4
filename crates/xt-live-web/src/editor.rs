#![forbid(unsafe_code)]

//! Sidebar-side shell around [`EditorController`].

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, info, trace, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    Document, Element, Event, HtmlInputElement, HtmlSelectElement, HtmlTextAreaElement,
    MessageEvent, Window,
};
use xt_live_core::channel::{self, CrossFrameEvent};
use xt_live_core::editor::{CONTROL_CLASSES, PLUGIN_SELECT_CLASS, RELOAD_ATTR};
use xt_live_core::{
    ConfirmRequest, ConfirmTicket, EditorControl, EditorController, EditorEffect, LiveConfig,
    MessageRouter,
};

use crate::dom::{self, HiddenFormSubmitter, WindowTarget, js_error};
use crate::error::{Result, WebError};
use crate::selectors::{
    self, CONFIRM_ATTR, MODAL_CLASS, MODAL_OVERLAY_CLASS, MODAL_TICKET_ATTR, PREVIOUS_VALUE_ATTR,
};

const ACCEPT: &str = "accept";
const DECLINE: &str = "decline";
const OVERLAY_STYLE: &str = "position:fixed;inset:0;z-index:2147483647;display:flex;\
align-items:center;justify-content:center;background:rgba(0,0,0,0.4)";

struct EditorShell {
    controller: EditorController,
    window: Window,
    document: Document,
    origin: String,
}

type SharedEditor = Rc<RefCell<EditorShell>>;

pub(crate) fn install(config_json: Option<String>) -> Result<()> {
    let window = dom::window()?;
    let document = dom::document(&window)?;
    let json = match config_json {
        Some(json) => json,
        None => dom::embedded_config(&document)?,
    };
    let config = LiveConfig::from_json(&json)?;
    let location = window.location();
    let origin = location.origin().map_err(js_error)?;
    let href = location.href().map_err(js_error)?;
    let controller = EditorController::new(&config, origin.clone(), href)?;

    remember_plugin_selection(&document)?;
    let reload = document
        .query_selector(&selectors::reload_selector())
        .map_err(js_error)?
        .and_then(|root| root.get_attribute(RELOAD_ATTR));
    let effects = controller.on_load(reload.as_deref());

    let shell = Rc::new(RefCell::new(EditorShell {
        controller,
        window,
        document,
        origin,
    }));
    listen(&shell, "click", on_click)?;
    listen(&shell, "change", on_change)?;
    listen(&shell, "input", on_input)?;
    listen_messages(&shell)?;
    apply(&shell, effects);
    info!("xt-live editor installed");
    Ok(())
}

fn remember_plugin_selection(document: &Document) -> Result<()> {
    let selects = document
        .query_selector_all(&selectors::plugin_select_selector())
        .map_err(js_error)?;
    for idx in 0..selects.length() {
        let Some(select) = selects
            .item(idx)
            .and_then(|node| node.dyn_into::<HtmlSelectElement>().ok())
        else {
            continue;
        };
        select
            .set_attribute(PREVIOUS_VALUE_ATTR, &select.value())
            .map_err(js_error)?;
    }
    Ok(())
}

fn listen(shell: &SharedEditor, kind: &str, handler: fn(&SharedEditor, Event)) -> Result<()> {
    let handler_shell = Rc::clone(shell);
    let callback = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
        handler(&handler_shell, event);
    });
    shell
        .borrow()
        .document
        .add_event_listener_with_callback(kind, callback.as_ref().unchecked_ref())
        .map_err(js_error)?;
    callback.forget();
    Ok(())
}

fn event_element(event: &Event) -> Option<Element> {
    event.target()?.dyn_into::<Element>().ok()
}

fn on_click(shell: &SharedEditor, event: Event) {
    let Some(target) = event_element(&event) else {
        return;
    };
    if let Ok(Some(button)) = target.closest(&selectors::confirm_button_selector()) {
        event.prevent_default();
        event.stop_propagation();
        resolve_modal(shell, &button);
        return;
    }
    if modal_overlay(&shell.borrow().document).is_some() {
        trace!("click ignored while a confirmation is open");
        return;
    }
    let Ok(Some(element)) = target.closest(&selectors::control_selector()) else {
        return;
    };
    let classes = element.class_list();
    let Some(class) = CONTROL_CLASSES.iter().find(|class| classes.contains(class)) else {
        return;
    };
    let x = element.get_attribute("data-x");
    let y = element.get_attribute("data-y");
    let control = EditorControl::from_class(class, |attr| match attr {
        "x" => x.as_deref(),
        "y" => y.as_deref(),
        _ => None,
    });
    event.prevent_default();
    match control {
        Ok(Some(control)) => {
            let effects = shell.borrow_mut().controller.activate(control);
            apply(shell, effects);
        }
        Ok(None) => {}
        Err(err) => warn!(%class, %err, "malformed editor control"),
    }
}

fn on_change(shell: &SharedEditor, event: Event) {
    let Some(target) = event_element(&event) else {
        return;
    };
    if !target.class_list().contains(PLUGIN_SELECT_CLASS) {
        shell.borrow_mut().controller.field_changed();
        return;
    }
    let Ok(select) = target.dyn_into::<HtmlSelectElement>() else {
        return;
    };
    let previous = select.get_attribute(PREVIOUS_VALUE_ATTR).unwrap_or_default();
    let effects = shell
        .borrow_mut()
        .controller
        .plugin_changed(&previous, &select.value());
    apply(shell, effects);
}

fn on_input(shell: &SharedEditor, event: Event) {
    let Some(target) = event_element(&event) else {
        return;
    };
    // The plugin selector is handled on `change` only.
    if !target.class_list().contains(PLUGIN_SELECT_CLASS) {
        shell.borrow_mut().controller.field_changed();
    }
}

fn listen_messages(shell: &SharedEditor) -> Result<()> {
    let mut router = MessageRouter::new();
    let origin = shell.borrow().controller.origin().clone();
    let handler_shell = Rc::clone(shell);
    router.on_same_origin(origin, move |message| {
        let effects = handler_shell.borrow_mut().controller.handle_message(message);
        apply(&handler_shell, effects);
    });

    let on_message = Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| {
        let Some(data) = js_sys::JSON::stringify(&event.data())
            .ok()
            .and_then(|json| json.as_string())
        else {
            return;
        };
        router.dispatch(&CrossFrameEvent::new(event.origin(), data));
    });
    shell
        .borrow()
        .window
        .add_event_listener_with_callback("message", on_message.as_ref().unchecked_ref())
        .map_err(js_error)?;
    on_message.forget();
    Ok(())
}

fn apply(shell: &SharedEditor, effects: Vec<EditorEffect>) {
    for effect in effects {
        if let Err(err) = apply_one(shell, effect) {
            warn!(%err, "failed to apply editor effect");
        }
    }
}

fn apply_one(shell: &SharedEditor, effect: EditorEffect) -> Result<()> {
    match effect {
        EditorEffect::Navigate(url) => {
            debug!(%url, "navigating sidebar");
            shell
                .borrow()
                .window
                .location()
                .set_href(&url)
                .map_err(js_error)
        }
        EditorEffect::Submit(command) => {
            let guard = shell.borrow();
            let mut submitter = HiddenFormSubmitter::new(guard.document.clone());
            guard.controller.submit(&command, &mut submitter).map(|_| ())
        }
        EditorEffect::Confirm(request) => show_modal(shell, request),
        EditorEffect::RestorePluginSelection(value) => {
            let guard = shell.borrow();
            let select = guard
                .document
                .query_selector(&selectors::plugin_select_selector())
                .map_err(js_error)?
                .ok_or_else(|| WebError::MissingElement(PLUGIN_SELECT_CLASS.into()))?
                .dyn_into::<HtmlSelectElement>()
                .map_err(|_| WebError::UnexpectedType("select"))?;
            select.set_value(&value);
            Ok(())
        }
        EditorEffect::SetField { target, value } => {
            let guard = shell.borrow();
            let field = guard
                .document
                .get_element_by_id(&target)
                .ok_or_else(|| WebError::MissingElement(target.clone()))?;
            set_field_value(field, &value)
        }
        EditorEffect::PostToParent(message) => {
            let guard = shell.borrow();
            let Some(parent) = guard.window.parent().map_err(js_error)? else {
                trace!("editor has no parent window");
                return Ok(());
            };
            channel::send(&WindowTarget(parent), &message, &guard.origin).map_err(|err| match err {
                channel::SendError::Post(err) => err,
                encode => WebError::Js(encode.to_string()),
            })
        }
    }
}

fn set_field_value(field: Element, value: &str) -> Result<()> {
    let field = match field.dyn_into::<HtmlInputElement>() {
        Ok(input) => {
            input.set_value(value);
            return Ok(());
        }
        Err(field) => field,
    };
    match field.dyn_into::<HtmlTextAreaElement>() {
        Ok(area) => {
            area.set_value(value);
            Ok(())
        }
        Err(_) => Err(WebError::UnexpectedType("input")),
    }
}

/// Non-blocking replacement for `window.confirm`.
///
/// A newer request replaces the visible modal; the controller already
/// dropped the older ticket. Buttons are handled by the delegated click
/// listener, which reads the ticket back from the overlay.
fn show_modal(shell: &SharedEditor, request: ConfirmRequest) -> Result<()> {
    let document = shell.borrow().document.clone();
    close_modal(&document);

    let overlay = document.create_element("div").map_err(js_error)?;
    overlay.set_class_name(MODAL_OVERLAY_CLASS);
    overlay.set_attribute("style", OVERLAY_STYLE).map_err(js_error)?;
    overlay
        .set_attribute(MODAL_TICKET_ATTR, &request.ticket.raw().to_string())
        .map_err(js_error)?;

    let modal = document.create_element("div").map_err(js_error)?;
    modal.set_class_name(MODAL_CLASS);
    modal.set_attribute("role", "dialog").map_err(js_error)?;
    modal.set_attribute("aria-modal", "true").map_err(js_error)?;

    let message = document.create_element("p").map_err(js_error)?;
    message.set_text_content(Some(request.prompt.message()));
    modal.append_child(&message).map_err(js_error)?;

    for (label, answer) in [("OK", ACCEPT), ("Cancel", DECLINE)] {
        let button = document.create_element("button").map_err(js_error)?;
        button.set_attribute("type", "button").map_err(js_error)?;
        button.set_attribute(CONFIRM_ATTR, answer).map_err(js_error)?;
        button.set_text_content(Some(label));
        modal.append_child(&button).map_err(js_error)?;
    }
    overlay.append_child(&modal).map_err(js_error)?;

    let body = document
        .body()
        .ok_or_else(|| WebError::MissingElement("body".into()))?;
    body.append_child(&overlay).map_err(js_error)?;
    Ok(())
}

fn resolve_modal(shell: &SharedEditor, button: &Element) {
    let accepted = button.get_attribute(CONFIRM_ATTR).as_deref() == Some(ACCEPT);
    let ticket = button
        .closest(&selectors::modal_overlay_selector())
        .ok()
        .flatten()
        .and_then(|overlay| overlay.get_attribute(MODAL_TICKET_ATTR))
        .and_then(|raw| raw.parse::<u64>().ok())
        .map(ConfirmTicket::from_raw);
    close_modal(&shell.borrow().document);
    let Some(ticket) = ticket else {
        warn!("confirmation button outside a modal");
        return;
    };
    let effects = shell.borrow_mut().controller.resolve(ticket, accepted);
    apply(shell, effects);
}

fn modal_overlay(document: &Document) -> Option<Element> {
    document
        .query_selector(&selectors::modal_overlay_selector())
        .ok()
        .flatten()
}

fn close_modal(document: &Document) {
    if let Some(overlay) = modal_overlay(document) {
        overlay.remove();
    }
}
