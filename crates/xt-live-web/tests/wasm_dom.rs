#![cfg(target_arch = "wasm32")]
#![forbid(unsafe_code)]

use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use xt_live_core::{DocumentParser, PlaceholderDom};
use xt_live_web::dom::{WebDocument, WebParser};

wasm_bindgen_test_configure!(run_in_browser);

fn document() -> web_sys::Document {
    web_sys::window()
        .and_then(|window| window.document())
        .expect("test runs in a browser document")
}

#[wasm_bindgen_test]
fn parser_extracts_anchor_from_fetched_page() {
    let page = r#"<html><body>
        <div id="xt-ph-hero"><p>new hero</p></div>
        <div id="xt-ph-footer">footer</div>
    </body></html>"#;
    assert_eq!(
        WebParser.anchor_inner_html(page, "xt-ph-hero").as_deref(),
        Some("<p>new hero</p>")
    );
    assert_eq!(WebParser.anchor_inner_html(page, "xt-ph-aside"), None);
}

#[wasm_bindgen_test]
fn patch_replaces_only_the_named_anchor() {
    let document = document();
    let body = document.body().expect("body");
    body.set_inner_html(
        r#"<div data-xt-placeholder-name="hero"><div id="xt-ph-hero">old</div></div>
           <div id="xt-ph-footer">footer</div>"#,
    );

    let mut dom = WebDocument::new(document.clone());
    assert!(dom.has_placeholder_markers());
    assert!(dom.has_anchor("xt-ph-hero"));
    assert!(dom.replace_anchor_content("xt-ph-hero", "<b>new</b>"));
    assert!(!dom.replace_anchor_content("xt-ph-missing", "x"));

    let hero = document.get_element_by_id("xt-ph-hero").expect("hero");
    let footer = document.get_element_by_id("xt-ph-footer").expect("footer");
    assert_eq!(hero.inner_html(), "<b>new</b>");
    assert_eq!(footer.inner_html(), "footer");
}
