//! Editor flows: confirmation gating, plugin switching, command submission.

mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::{RecordingSubmitter, init_tracing};
use pretty_assertions::assert_eq;
use xt_live_core::editor::DEL_ROW_CLASS;
use xt_live_core::{
    Command, ConfirmPrompt, ConfirmTicket, CrossFrameEvent, EditorControl, EditorController,
    EditorEffect, LiveConfig, MessageRouter,
};

const LOCATION: &str = "https://shop.example/live/sidebar?ph=hero&x=0&y=1";

fn editor() -> EditorController {
    let config = LiveConfig::from_json(r#"{"csrf_field":"_token","csrf_token":"t0k"}"#).unwrap();
    EditorController::new(&config, "https://shop.example", LOCATION).unwrap()
}

/// Apply effects the way the shell would, recording submissions.
fn run(
    editor: &EditorController,
    effects: Vec<EditorEffect>,
    submitter: &mut RecordingSubmitter,
) -> Vec<EditorEffect> {
    let mut rest = Vec::new();
    for effect in effects {
        match effect {
            EditorEffect::Submit(command) => {
                editor.submit(&command, submitter).unwrap();
            }
            other => rest.push(other),
        }
    }
    rest
}

fn ticket(effects: &[EditorEffect], prompt: ConfirmPrompt) -> ConfirmTicket {
    match effects {
        [EditorEffect::Confirm(request)] if request.prompt == prompt => request.ticket,
        other => panic!("expected a {prompt:?} confirmation, got {other:?}"),
    }
}

#[test]
fn declined_delete_row_submits_nothing() {
    init_tracing();
    let mut editor = editor();
    let mut submitter = RecordingSubmitter::default();

    let control = EditorControl::from_class(DEL_ROW_CLASS, |attr| (attr == "y").then_some("1"))
        .unwrap()
        .unwrap();
    let effects = editor.activate(control);
    let t = ticket(&effects, ConfirmPrompt::DeleteRow);

    let effects = editor.resolve(t, false);
    let effects = run(&editor, effects, &mut submitter);
    assert!(effects.is_empty());
    assert!(submitter.submitted.is_empty());
    assert_eq!(editor.pending_confirmation(), None);
}

#[test]
fn accepted_delete_row_submits_once() {
    let mut editor = editor();
    let mut submitter = RecordingSubmitter::default();
    let effects = editor.activate(EditorControl::DeleteRow { y: 1 });
    let t = ticket(&effects, ConfirmPrompt::DeleteRow);

    for _ in 0..2 {
        let effects = editor.resolve(t, true);
        run(&editor, effects, &mut submitter);
    }
    assert_eq!(submitter.submitted.len(), 1);
    let form = &submitter.submitted[0];
    assert_eq!(form.action, LOCATION);
    assert_eq!(form.field("command"), Some("del_row"));
    assert_eq!(form.field("y"), Some("1"));
}

#[test]
fn declined_plugin_change_restores_selector() {
    init_tracing();
    let mut editor = editor();
    let mut submitter = RecordingSubmitter::default();

    editor.field_changed();
    let effects = editor.plugin_changed("text", "gallery");
    let t = ticket(&effects, ConfirmPrompt::DiscardChanges);

    let effects = editor.resolve(t, false);
    let effects = run(&editor, effects, &mut submitter);
    assert_eq!(
        effects,
        vec![EditorEffect::RestorePluginSelection("text".into())]
    );
    assert!(submitter.submitted.is_empty());
    assert!(editor.changes_made());
}

#[test]
fn second_plugin_pick_replaces_pending_switch_without_snapping_back() {
    let mut editor = editor();
    let mut submitter = RecordingSubmitter::default();

    editor.field_changed();
    ticket(
        &editor.plugin_changed("text", "image"),
        ConfirmPrompt::DiscardChanges,
    );
    let effects = editor.plugin_changed("text", "video");
    let t = ticket(&effects, ConfirmPrompt::DiscardChanges);

    let effects = editor.resolve(t, true);
    let effects = run(&editor, effects, &mut submitter);
    assert!(effects.is_empty());
    assert_eq!(submitter.submitted.len(), 1);
    assert_eq!(submitter.submitted[0].field("plugin"), Some("video"));
}

#[test]
fn declining_replaced_plugin_switch_restores_rendered_plugin() {
    let mut editor = editor();

    editor.field_changed();
    ticket(
        &editor.plugin_changed("text", "image"),
        ConfirmPrompt::DiscardChanges,
    );
    let effects = editor.plugin_changed("image", "video");
    let t = ticket(&effects, ConfirmPrompt::DiscardChanges);

    assert_eq!(
        editor.resolve(t, false),
        vec![EditorEffect::RestorePluginSelection("text".into())]
    );
}

#[test]
fn add_cell_submits_command_and_row_only() {
    let mut editor = editor();
    let mut submitter = RecordingSubmitter::default();
    let effects = editor.activate(EditorControl::AddCell { y: 2 });
    let effects = run(&editor, effects, &mut submitter);
    assert!(effects.is_empty());

    let form = &submitter.submitted[0];
    let fields: Vec<(&str, &str)> = form
        .fields
        .iter()
        .map(|f| (f.name.as_str(), f.value.as_str()))
        .collect();
    assert_eq!(
        fields,
        vec![("command", "add_cell"), ("y", "2"), ("_token", "t0k")]
    );
    assert!(!form.has_field("x"));
}

#[test]
fn plugin_change_without_edits_skips_confirmation() {
    let mut editor = editor();
    let mut submitter = RecordingSubmitter::default();
    let effects = editor.plugin_changed("text", "gallery");
    let effects = run(&editor, effects, &mut submitter);
    assert!(effects.is_empty());
    assert_eq!(submitter.submitted[0].field("command"), Some("change_plugin"));
    assert_eq!(submitter.submitted[0].field("plugin"), Some("gallery"));
}

#[test]
fn resolving_superseded_ticket_is_a_no_op() {
    let mut editor = editor();
    let mut submitter = RecordingSubmitter::default();
    let first = ticket(
        &editor.activate(EditorControl::Publish),
        ConfirmPrompt::Publish,
    );
    let second = ticket(
        &editor.activate(EditorControl::Revert),
        ConfirmPrompt::Revert,
    );

    assert!(editor.resolve(first, true).is_empty());
    let effects = editor.resolve(second, true);
    run(&editor, effects, &mut submitter);
    assert_eq!(submitter.submitted.len(), 1);
    assert_eq!(
        submitter.submitted[0].field("command"),
        Some(Command::Revert.name().as_str())
    );
}

#[test]
fn only_same_origin_picks_reach_the_editor() {
    let editor = Rc::new(RefCell::new(editor()));
    let applied = Rc::new(RefCell::new(Vec::new()));
    let mut router = MessageRouter::new();
    let filter = editor.borrow().origin().clone();
    let (target, sink) = (Rc::clone(&editor), Rc::clone(&applied));
    router.on_same_origin(filter, move |message| {
        let effects = target.borrow_mut().handle_message(message);
        sink.borrow_mut().extend(effects);
    });

    let pick = r#"{"pick":{"target":"cfg_image","value":"x"}}"#;
    assert_eq!(router.dispatch(&CrossFrameEvent::new("https://evil.example", pick)), 0);
    assert!(!editor.borrow().changes_made());
    assert!(applied.borrow().is_empty());

    assert_eq!(router.dispatch(&CrossFrameEvent::new("https://shop.example", pick)), 1);
    assert!(editor.borrow().changes_made());
    assert_eq!(
        applied.borrow().as_slice(),
        &[EditorEffect::SetField {
            target: "cfg_image".into(),
            value: "x".into()
        }]
    );
}
