#![forbid(unsafe_code)]

//! Storefront-side shell around [`HostController`].

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, info, trace, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::{
    CustomEvent, CustomEventInit, Document, Element, Event, HtmlIFrameElement, MessageEvent,
    Request, RequestInit, Response, Window,
};
use xt_live_core::channel::{self, ChannelMessage, CrossFrameEvent, PickPayload};
use xt_live_core::dom::PLACEHOLDER_NAME_ATTR;
use xt_live_core::{
    HostController, LiveConfig, MessageRouter, PatchOutcome, PlaceholderClick, RefreshRequest,
    ReloadOutcome, SidebarCommand,
};

use crate::dom::{self, WebDocument, WebParser, WindowTarget, js_error};
use crate::error::{Result, WebError};
use crate::selectors::{
    self, NOTICE_EVENT, SIDEBAR_FRAME_ID, SIDEBAR_ID, SIDEBAR_TOGGLE_CLASS, SIDEBAR_VISIBLE_CLASS,
};

struct HostShell {
    controller: HostController,
    window: Window,
    document: Document,
}

type SharedHost = Rc<RefCell<HostShell>>;

impl HostShell {
    fn frame(&self) -> Option<HtmlIFrameElement> {
        self.document
            .get_element_by_id(SIDEBAR_FRAME_ID)
            .and_then(|el| el.dyn_into().ok())
    }

    fn set_visible(&self, visible: bool) {
        let Some(sidebar) = self.document.get_element_by_id(SIDEBAR_ID) else {
            return;
        };
        let classes = sidebar.class_list();
        let result = if visible {
            classes.add_1(SIDEBAR_VISIBLE_CLASS)
        } else {
            classes.remove_1(SIDEBAR_VISIBLE_CLASS)
        };
        if let Err(err) = result {
            warn!(error = %js_error(err), "failed to toggle sidebar class");
        }
    }
}

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
    let controller = HostController::new(config, origin, href)?;

    ensure_sidebar(&document)?;
    if let Some(markup) = controller.add_edit_toggle_markup(&WebDocument::new(document.clone())) {
        let body = document
            .body()
            .ok_or_else(|| WebError::MissingElement("body".into()))?;
        body.insert_adjacent_html("beforeend", &markup)
            .map_err(js_error)?;
    }

    let shell = Rc::new(RefCell::new(HostShell {
        controller,
        window,
        document,
    }));
    listen_clicks(&shell)?;
    listen_messages(&shell)?;
    info!("xt-live host installed");
    Ok(())
}

fn ensure_sidebar(document: &Document) -> Result<()> {
    if document.get_element_by_id(SIDEBAR_FRAME_ID).is_some() {
        return Ok(());
    }
    let body = document
        .body()
        .ok_or_else(|| WebError::MissingElement("body".into()))?;
    let sidebar = document.create_element("aside").map_err(js_error)?;
    sidebar.set_id(SIDEBAR_ID);

    let toggle = document.create_element("button").map_err(js_error)?;
    toggle.set_class_name(SIDEBAR_TOGGLE_CLASS);
    toggle.set_attribute("type", "button").map_err(js_error)?;
    toggle.set_text_content(Some("Layout"));

    let frame = document.create_element("iframe").map_err(js_error)?;
    frame.set_id(SIDEBAR_FRAME_ID);

    sidebar.append_child(&toggle).map_err(js_error)?;
    sidebar.append_child(&frame).map_err(js_error)?;
    body.append_child(&sidebar).map_err(js_error)?;
    Ok(())
}

fn placeholder_click(element: &Element) -> PlaceholderClick {
    let default_config = element
        .query_selector(&selectors::default_config_selector())
        .ok()
        .flatten()
        .and_then(|script| script.text_content());
    PlaceholderClick {
        name: element.get_attribute(PLACEHOLDER_NAME_ATTR),
        default_config,
    }
}

fn listen_clicks(shell: &SharedHost) -> Result<()> {
    let handler_shell = Rc::clone(shell);
    let on_click = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
        let Some(target) = event
            .target()
            .and_then(|target| target.dyn_into::<Element>().ok())
        else {
            return;
        };
        if let Ok(Some(_)) = target.closest(&selectors::sidebar_toggle_selector()) {
            let command = handler_shell.borrow_mut().controller.toggle();
            apply_sidebar(&handler_shell, vec![command]);
            return;
        }
        let Ok(Some(placeholder)) = target.closest(&selectors::placeholder_selector()) else {
            return;
        };
        let click = placeholder_click(&placeholder);
        let dispatch = handler_shell
            .borrow_mut()
            .controller
            .handle_placeholder_click(&click);
        if dispatch.suppress_default {
            event.prevent_default();
            event.stop_propagation();
        }
        apply_sidebar(&handler_shell, dispatch.commands);
    });
    shell
        .borrow()
        .document
        .add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())
        .map_err(js_error)?;
    on_click.forget();
    Ok(())
}

fn apply_sidebar(shell: &SharedHost, commands: Vec<SidebarCommand>) {
    for command in commands {
        match command {
            SidebarCommand::SetSource(url) => match shell.borrow().frame() {
                Some(frame) => frame.set_src(&url),
                None => warn!("sidebar iframe is gone"),
            },
            SidebarCommand::ScheduleReveal => schedule_reveal(shell),
            SidebarCommand::Show => shell.borrow().set_visible(true),
            SidebarCommand::Hide => shell.borrow().set_visible(false),
        }
    }
}

fn schedule_reveal(shell: &SharedHost) {
    let tick_shell = Rc::clone(shell);
    let tick = Closure::once_into_js(move || {
        let command = tick_shell.borrow_mut().controller.reveal_tick();
        if let Some(command) = command {
            apply_sidebar(&tick_shell, vec![command]);
        }
    });
    let scheduled = shell
        .borrow()
        .window
        .set_timeout_with_callback_and_timeout_and_arguments_0(tick.unchecked_ref(), 0);
    if let Err(err) = scheduled {
        warn!(error = %js_error(err), "failed to schedule sidebar reveal");
    }
}

fn listen_messages(shell: &SharedHost) -> Result<()> {
    let mut router = MessageRouter::new();
    let origin = shell.borrow().controller.origin().clone();
    let handler_shell = Rc::clone(shell);
    router.on_same_origin(origin, move |message| {
        let cache_token = js_sys::Date::now() as u64;
        let outcome = {
            let mut guard = handler_shell.borrow_mut();
            let href = guard.window.location().href();
            match href {
                Ok(href) => guard.controller.set_page_url(href),
                Err(err) => warn!(error = %js_error(err), "keeping last known page url"),
            }
            let dom = WebDocument::new(guard.document.clone());
            guard.controller.handle_message(message, &dom, cache_token)
        };
        match outcome {
            ReloadOutcome::Refresh(request) => spawn_refresh(&handler_shell, request),
            ReloadOutcome::ForwardPick(pick) => forward_pick(&handler_shell, pick),
            ReloadOutcome::Ignored(reason) => trace!(?reason, "host message ignored"),
        }
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

async fn fetch_text(window: &Window, url: &str) -> Result<String> {
    let init = RequestInit::new();
    init.set_method("GET");
    let request = Request::new_with_str_and_init(url, &init).map_err(js_error)?;
    let response: Response = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(js_error)?
        .dyn_into()
        .map_err(|_| WebError::UnexpectedType("Response"))?;
    if !response.ok() {
        return Err(WebError::Status(response.status()));
    }
    let text = JsFuture::from(response.text().map_err(js_error)?)
        .await
        .map_err(js_error)?;
    text.as_string()
        .ok_or(WebError::UnexpectedType("string"))
}

fn spawn_refresh(shell: &SharedHost, request: RefreshRequest) {
    let shell = Rc::clone(shell);
    spawn_local(async move {
        let window = shell.borrow().window.clone();
        let fetched = fetch_text(&window, &request.url).await;

        let failure = {
            let mut guard = shell.borrow_mut();
            let mut dom = WebDocument::new(guard.document.clone());
            match fetched {
                Ok(body) => {
                    match guard
                        .controller
                        .complete_refresh(&request, &body, &mut dom, &WebParser)
                    {
                        PatchOutcome::MissingInResponse => guard
                            .controller
                            .fail_refresh(&request, "the placeholder is missing from the response"),
                        outcome => {
                            debug!(placeholder = %request.placeholder, ?outcome, "refresh finished");
                            None
                        }
                    }
                }
                Err(err) => guard.controller.fail_refresh(&request, &err),
            }
        };
        if let Some(failure) = failure {
            notify(&window, &failure.message);
        }
    });
}

fn forward_pick(shell: &SharedHost, pick: PickPayload) {
    let shell = shell.borrow();
    let Some(frame_window) = shell.frame().and_then(|frame| frame.content_window()) else {
        debug!("no sidebar window to forward pick to");
        return;
    };
    let origin = shell.controller.origin().own_origin();
    if let Err(err) = channel::send(
        &WindowTarget(frame_window),
        &ChannelMessage::Pick(pick),
        origin,
    ) {
        warn!(%err, "failed to forward pick to sidebar");
    }
}

/// Hand a user-facing notice to whatever listens for [`NOTICE_EVENT`].
fn notify(window: &Window, message: &str) {
    let init = CustomEventInit::new();
    init.set_detail(&JsValue::from_str(message));
    match CustomEvent::new_with_event_init_dict(NOTICE_EVENT, &init) {
        Ok(event) => {
            if let Err(err) = window.dispatch_event(&event) {
                warn!(error = %js_error(err), "failed to dispatch notice");
            }
        }
        Err(err) => warn!(error = %js_error(err), %message, "failed to build notice"),
    }
}
