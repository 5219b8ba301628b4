#![cfg(target_arch = "wasm32")]
#![forbid(unsafe_code)]

//! Host shell wired into a fixture page, driven by synthetic events.

use std::cell::Cell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::{Document, Element, Event, EventInit, HtmlIFrameElement};
use xt_live_core::PlaceholderDom;
use xt_live_web::dom::WebDocument;
use xt_live_web::install_host;
use xt_live_web::selectors::{
    SIDEBAR_FRAME_ID, SIDEBAR_ID, SIDEBAR_TOGGLE_CLASS, SIDEBAR_VISIBLE_CLASS,
};

wasm_bindgen_test_configure!(run_in_browser);

const CONFIG: &str = r#"{
    "csrf_field": "_token",
    "csrf_token": "t0k",
    "command_url": "/live/command",
    "sidebar_url": "/live/sidebar",
    "view": "home",
    "theme": "summer"
}"#;

fn document() -> Document {
    web_sys::window()
        .and_then(|window| window.document())
        .expect("test runs in a browser document")
}

fn element(document: &Document, id: &str) -> Element {
    document
        .get_element_by_id(id)
        .unwrap_or_else(|| panic!("missing #{id}"))
}

fn click(target: &Element) -> Event {
    let init = EventInit::new();
    init.set_bubbles(true);
    init.set_cancelable(true);
    let event = Event::new_with_event_init_dict("click", &init).expect("click event");
    target.dispatch_event(&event).expect("dispatch click");
    event
}

fn frame(document: &Document) -> HtmlIFrameElement {
    element(document, SIDEBAR_FRAME_ID)
        .dyn_into()
        .expect("sidebar frame is an iframe")
}

fn sidebar_visible(document: &Document) -> bool {
    element(document, SIDEBAR_ID)
        .class_list()
        .contains(SIDEBAR_VISIBLE_CLASS)
}

#[wasm_bindgen_test]
fn delegated_placeholder_clicks_survive_patches() {
    let window = web_sys::window().expect("window");
    let document = document();
    let body = document.body().expect("body");
    body.set_inner_html(
        r#"<div data-xt-placeholder-name="hero">
             <div id="xt-ph-hero"><a id="hero-link" href="/product/1">Buy</a></div>
           </div>
           <p id="plain">Not editable</p>"#,
    );
    install_host(Some(CONFIG.to_owned())).expect("host installs");
    assert!(document.query_selector(".xt-edit-toggle").unwrap().is_some());

    // Clicks that escape the document-level handler reach the window.
    let escaped = Rc::new(Cell::new(0_u32));
    let counter = Rc::clone(&escaped);
    let on_window = Closure::<dyn FnMut(Event)>::new(move |_: Event| {
        counter.set(counter.get() + 1);
    });
    window
        .add_event_listener_with_callback("click", on_window.as_ref().unchecked_ref())
        .expect("window listener");
    on_window.forget();

    // No session yet: the toggle keeps the sidebar hidden.
    let toggle = document
        .query_selector(&format!(".{SIDEBAR_TOGGLE_CLASS}"))
        .unwrap()
        .expect("sidebar toggle");
    click(&toggle);
    assert!(!sidebar_visible(&document));
    assert_eq!(escaped.get(), 1);

    let event = click(&element(&document, "hero-link"));
    assert!(event.default_prevented());
    assert_eq!(escaped.get(), 1);
    let src = frame(&document).src();
    assert!(src.contains("ph=hero"), "{src}");
    assert!(src.contains("theme=summer"), "{src}");

    frame(&document).set_src("about:blank");
    let mut dom = WebDocument::new(document.clone());
    assert!(dom.replace_anchor_content("xt-ph-hero", r#"<span id="hero-new">Sale</span>"#));

    let event = click(&element(&document, "hero-new"));
    assert!(event.default_prevented());
    assert_eq!(escaped.get(), 1);
    let src = frame(&document).src();
    assert!(src.contains("ph=hero"), "{src}");

    let event = click(&element(&document, "plain"));
    assert!(!event.default_prevented());
    assert_eq!(escaped.get(), 2);
}
