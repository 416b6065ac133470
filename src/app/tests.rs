use std::rc::Rc;
use std::sync::mpsc::Receiver;
use std::time::Duration;

use crate::error::EditorError;
use crate::markdown::{ElementKind, SourceSpan};
use crate::paste::{ClipboardData, ClipboardFile};
use crate::store::{MemoryStore, PageId, Scripted};
use crate::surface::{DisplaySurface, HeadlessSurface};

use super::{Disposition, EditorEvent, EditorSettings, EditorSurface, Message};

type TestEditor = EditorSurface<HeadlessSurface, MemoryStore, MemoryStore>;

fn create_test_editor() -> (TestEditor, Rc<MemoryStore>) {
    let store = Rc::new(MemoryStore::new());
    let editor = EditorSurface::new(
        EditorSettings::default(),
        HeadlessSurface::new(),
        Rc::clone(&store),
        Rc::clone(&store),
    );
    (editor, store)
}

fn create_opened_editor(body: &str) -> (TestEditor, Rc<MemoryStore>, Receiver<EditorEvent>) {
    let (mut editor, store) = create_test_editor();
    store.insert_page(&PageId::from("home"), body);
    let events = editor.subscribe();
    (editor, store, events)
}

fn drain(events: &Receiver<EditorEvent>) -> Vec<EditorEvent> {
    events.try_iter().collect()
}

fn png(name: &str, byte: u8) -> ClipboardFile {
    ClipboardFile::new(name, "image/png", vec![byte])
}

fn edit(editor: &mut TestEditor, line: usize, text: &str) -> Result<Disposition, EditorError> {
    editor.surface_mut().type_line(line, text);
    editor.dispatch(Message::LineEdited {
        line,
        text: text.to_string(),
    })
}

// --- Loading ---

#[tokio::test(start_paused = true)]
async fn test_open_loads_lines_and_reports_title_and_revision() {
    let (mut editor, _store, events) = create_opened_editor("# Home\nbody");
    editor.open(PageId::from("home")).await.unwrap();

    assert_eq!(editor.surface().lines(), ["# Home", "body"]);
    assert_eq!(editor.source(), "# Home\nbody");
    assert_eq!(editor.title(), "Home");

    let events = drain(&events);
    assert_eq!(events.len(), 2);
    assert!(matches!(
        &events[0],
        EditorEvent::RevisionChanged { page, revision, .. }
            if page.as_str() == "home" && revision == "1"
    ));
    assert_eq!(
        events[1],
        EditorEvent::TitleChanged {
            title: "Home".to_string()
        }
    );
}

#[tokio::test(start_paused = true)]
async fn test_open_missing_page_fails() {
    let (mut editor, _store) = create_test_editor();
    let err = editor.open(PageId::from("nope")).await.unwrap_err();
    assert!(matches!(err, EditorError::Load { .. }));
    assert!(!err.is_data_loss());
}

#[tokio::test(start_paused = true)]
async fn test_create_page_opens_it_for_saving() {
    let (mut editor, store) = create_test_editor();
    let page = editor.create_page().await.unwrap();
    assert_eq!(editor.model().page.as_ref(), Some(&page));

    edit(&mut editor, 1, "fresh").unwrap();
    editor.settle().await.unwrap();
    assert_eq!(store.page_body(&page).as_deref(), Some("fresh"));
    assert_eq!(editor.model().revision.as_ref().map(|r| r.id.as_str()), Some("1"));
}

#[test]
fn test_set_value_does_not_save() {
    let (mut editor, store) = create_test_editor();
    editor
        .dispatch(Message::SetValue("# Draft\ntext".to_string()))
        .unwrap();
    assert_eq!(editor.surface().lines(), ["# Draft", "text"]);
    assert_eq!(editor.in_flight(), 0);
    assert_eq!(store.save_calls(), 0);
}

// --- Editing and saving ---

#[tokio::test(start_paused = true)]
async fn test_edit_saves_and_reports_revision() {
    let (mut editor, store, events) = create_opened_editor("# Home\nbody");
    editor.open(PageId::from("home")).await.unwrap();
    drain(&events);

    edit(&mut editor, 2, "more body").unwrap();
    assert_eq!(editor.source(), "# Home\nmore body");
    editor.settle().await.unwrap();

    assert_eq!(store.page_body(&PageId::from("home")).as_deref(), Some("# Home\nmore body"));
    let events = drain(&events);
    assert_eq!(events.len(), 1);
    assert!(matches!(&events[0], EditorEvent::RevisionChanged { revision, .. } if revision == "2"));
    assert!(!editor.is_busy());
}

#[tokio::test(start_paused = true)]
async fn test_title_change_is_reported_once() {
    let (mut editor, _store, events) = create_opened_editor("# Home");
    editor.open(PageId::from("home")).await.unwrap();
    drain(&events);

    edit(&mut editor, 1, "# Home page").unwrap();
    edit(&mut editor, 1, "# Home page").unwrap();
    let titles: Vec<EditorEvent> = drain(&events)
        .into_iter()
        .filter(|e| matches!(e, EditorEvent::TitleChanged { .. }))
        .collect();
    assert_eq!(
        titles,
        [EditorEvent::TitleChanged {
            title: "Home page".to_string()
        }]
    );
}

#[tokio::test(start_paused = true)]
async fn test_slow_save_shows_busy_after_grace() {
    let (mut editor, store, events) = create_opened_editor("# T\nx");
    editor.open(PageId::from("home")).await.unwrap();
    drain(&events);
    store.script_saves([Scripted::ok_after(Duration::from_millis(500))]);

    // The heading keeps the title fixed, so only save events follow.
    edit(&mut editor, 2, "y").unwrap();
    editor.next_completion().await.unwrap().unwrap();
    assert!(editor.is_busy());

    editor.settle().await.unwrap();
    let events = drain(&events);
    assert_eq!(events[0], EditorEvent::Busy { busy: true });
    assert_eq!(events[1], EditorEvent::Busy { busy: false });
    assert!(matches!(events[2], EditorEvent::RevisionChanged { .. }));
    assert_eq!(events.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_fast_save_never_shows_busy() {
    let (mut editor, store, events) = create_opened_editor("x");
    editor.open(PageId::from("home")).await.unwrap();
    drain(&events);
    store.script_saves([Scripted::ok_after(Duration::from_millis(20))]);

    edit(&mut editor, 1, "y").unwrap();
    editor.settle().await.unwrap();
    assert!(
        !drain(&events)
            .iter()
            .any(|e| matches!(e, EditorEvent::Busy { .. }))
    );
}

#[tokio::test(start_paused = true)]
async fn test_failed_save_is_raised_after_busy_clears() {
    let (mut editor, store, events) = create_opened_editor("# T\nx");
    editor.open(PageId::from("home")).await.unwrap();
    drain(&events);
    store.script_saves([Scripted::fail_after(Duration::from_millis(500))]);

    edit(&mut editor, 2, "lost?").unwrap();
    let err = editor.settle().await.unwrap_err();
    assert!(err.is_data_loss());
    assert!(!editor.is_busy());

    let events = drain(&events);
    assert_eq!(events[0], EditorEvent::Busy { busy: true });
    assert_eq!(events[1], EditorEvent::Busy { busy: false });
    assert!(matches!(&events[2], EditorEvent::SaveFailed { page, .. } if page.as_str() == "home"));
    assert_eq!(events.len(), 3);
    assert_eq!(store.page_body(&PageId::from("home")).as_deref(), Some("# T\nx"));
}

#[test]
fn test_invalid_edit_is_rejected() {
    let (mut editor, _store) = create_test_editor();
    let err = editor
        .dispatch(Message::LineEdited {
            line: 1,
            text: "a\nb".to_string(),
        })
        .unwrap_err();
    assert!(matches!(err, EditorError::Buffer(_)));
}

// --- Navigation ---

#[test]
fn test_click_focuses_source_line() {
    let (mut editor, _store) = create_test_editor();
    editor.dispatch(Message::SetValue("a\n\nb".to_string())).unwrap();

    let node = editor
        .surface()
        .render_node_at(&SourceSpan::new(3, 1, 3, 1))
        .unwrap();
    let disposition = editor.dispatch(Message::RenderedClicked(node)).unwrap();
    assert_eq!(disposition, Disposition::Consumed);
    assert_eq!(editor.surface().focused(), [3]);
}

#[test]
fn test_click_on_link_navigates() {
    let (mut editor, _store) = create_test_editor();
    editor
        .dispatch(Message::SetValue("[next](convind://2)".to_string()))
        .unwrap();
    let (link, _) = editor
        .surface()
        .presented()
        .iter()
        .find(|(_, node)| matches!(node.kind, ElementKind::Link { .. }))
        .unwrap();
    let disposition = editor.dispatch(Message::RenderedClicked(link)).unwrap();
    assert_eq!(disposition, Disposition::Ignored);
    assert!(editor.surface().focused().is_empty());
}

#[test]
fn test_caret_move_scrolls_rendered_node() {
    let (mut editor, _store) = create_test_editor();
    editor
        .dispatch(Message::SetValue("a\n\nb\n\n- five".to_string()))
        .unwrap();
    editor.surface_mut().set_caret(5, 2);
    editor.dispatch(Message::CaretMoved).unwrap();

    let scrolled = editor.surface().scrolled();
    assert_eq!(scrolled.len(), 1);
    let span = editor.model().rendered.span_of(scrolled[0].0).unwrap();
    assert_eq!(span.start_label(), "5:3");
}

// --- Paste ---

#[test]
fn test_anchor_paste_inserts_and_rerenders() {
    let (mut editor, _store) = create_test_editor();
    editor.dispatch(Message::SetValue("see ".to_string())).unwrap();
    editor.surface_mut().set_caret(1, 4);

    let data = ClipboardData::html(r#"<a href="/x">A</a>"#, "A");
    assert_eq!(editor.dispatch(Message::Paste(data)).unwrap(), Disposition::Consumed);
    assert_eq!(editor.source(), "see [A](/x)");
    assert!(editor.surface().presented().to_html().contains("href=\"/x\""));
}

#[test]
fn test_plain_paste_is_left_to_platform() {
    let (mut editor, store) = create_test_editor();
    let disposition = editor
        .dispatch(Message::Paste(ClipboardData::text("typed")))
        .unwrap();
    assert_eq!(disposition, Disposition::Ignored);
    assert_eq!(editor.in_flight(), 0);
    assert_eq!(store.upload_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_rich_paste_without_plain_text_is_left_to_platform() {
    let (mut editor, store, _events) = create_opened_editor("body");
    editor.open(PageId::from("home")).await.unwrap();

    let data = ClipboardData {
        html: Some(r#"<p>see <a href="/x">A</a></p>"#.to_string()),
        ..ClipboardData::default()
    };
    assert_eq!(editor.dispatch(Message::Paste(data)).unwrap(), Disposition::Ignored);
    assert_eq!(editor.in_flight(), 0);
    assert_eq!(store.save_calls(), 0);
    assert_eq!(editor.source(), "body");
}

#[tokio::test(start_paused = true)]
async fn test_image_paste_uploads_and_inserts_reference() {
    let (mut editor, store) = create_test_editor();
    editor.dispatch(Message::SetValue(String::new())).unwrap();

    let data = ClipboardData::files(vec![png("shot.png", 7)]);
    assert_eq!(editor.dispatch(Message::Paste(data)).unwrap(), Disposition::Consumed);
    editor.settle().await.unwrap();

    assert_eq!(store.upload_calls(), 1);
    assert_eq!(editor.source(), "![](/content/1)");
    assert_eq!(store.item("1"), Some(("image/png".to_string(), vec![7])));
}

#[tokio::test(start_paused = true)]
async fn test_attachment_paste_inserts_plain_reference() {
    let (mut editor, _store) = create_test_editor();
    editor.dispatch(Message::SetValue(String::new())).unwrap();

    let data = ClipboardData::files(vec![ClipboardFile::new("a.bin", "", vec![1])]);
    editor.dispatch(Message::Paste(data)).unwrap();
    editor.settle().await.unwrap();
    assert_eq!(editor.source(), "[](/content/1)");
}

#[tokio::test(start_paused = true)]
async fn test_failed_upload_does_not_block_sibling() {
    let (mut editor, store) = create_test_editor();
    let events = editor.subscribe();
    editor.dispatch(Message::SetValue(String::new())).unwrap();
    store.script_uploads([Scripted::fail_after(Duration::from_millis(10))]);

    let data = ClipboardData::files(vec![png("a.png", 1), png("b.png", 2)]);
    editor.dispatch(Message::Paste(data)).unwrap();
    editor.settle().await.unwrap();

    assert_eq!(store.upload_calls(), 2);
    assert_eq!(store.item_count(), 1);
    assert_eq!(editor.source(), "![](/content/1)");
    let failures = drain(&events)
        .into_iter()
        .filter(|e| matches!(e, EditorEvent::UploadFailed { .. }))
        .count();
    assert_eq!(failures, 1);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_uploads_insert_in_completion_order() {
    let (mut editor, store) = create_test_editor();
    editor.dispatch(Message::SetValue("start".to_string())).unwrap();
    editor.surface_mut().set_caret(1, 5);
    store.script_uploads([
        Scripted::ok_after(Duration::from_millis(300)),
        Scripted::ok_after(Duration::from_millis(100)),
    ]);

    let started = tokio::time::Instant::now();
    let data = ClipboardData::files(vec![png("slow.png", 1), png("fast.png", 2)]);
    editor.dispatch(Message::Paste(data)).unwrap();
    editor.settle().await.unwrap();

    // Both ran at once, and each landed at the caret when it resolved.
    assert!(started.elapsed() < Duration::from_millis(400));
    assert_eq!(editor.source(), "start![](/content/1)![](/content/2)");
    assert_eq!(store.upload_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_upload_insertion_is_saved() {
    let (mut editor, store, _events) = create_opened_editor("body");
    editor.open(PageId::from("home")).await.unwrap();
    editor.surface_mut().set_caret(1, 4);

    editor
        .dispatch(Message::Paste(ClipboardData::files(vec![png("a.png", 1)])))
        .unwrap();
    editor.settle().await.unwrap();
    assert_eq!(
        store.page_body(&PageId::from("home")).as_deref(),
        Some("body![](/content/1)")
    );
}

// --- Lifecycle ---

#[tokio::test(start_paused = true)]
async fn test_detach_releases_listeners_and_work() {
    let (mut editor, store) = create_test_editor();
    let events = editor.subscribe();
    editor.dispatch(Message::SetValue(String::new())).unwrap();
    editor
        .dispatch(Message::Paste(ClipboardData::files(vec![png("a.png", 1)])))
        .unwrap();
    assert_eq!(editor.in_flight(), 1);

    editor.detach();
    assert!(editor.is_detached());
    assert_eq!(editor.in_flight(), 0);
    assert!(editor.next_completion().await.is_none());
    assert_eq!(
        editor.dispatch(Message::SetValue("# Later".to_string())).unwrap(),
        Disposition::Ignored
    );
    assert_eq!(editor.source(), "");
    drain(&events);
    assert!(events.recv().is_err());
    assert_eq!(store.item_count(), 0);
}

#[test]
fn test_dropped_listener_does_not_break_others() {
    let (mut editor, _store) = create_test_editor();
    let dropped = editor.subscribe();
    let kept = editor.subscribe();
    drop(dropped);
    editor.dispatch(Message::SetValue("# T".to_string())).unwrap();
    assert_eq!(
        drain(&kept),
        [EditorEvent::TitleChanged {
            title: "T".to_string()
        }]
    );
}

mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn source_matches_buffer_after_every_edit(
            initial in "[a-z# \n]{0,60}",
            edits in prop::collection::vec((0..16usize, "[a-z# *]{0,10}"), 0..12),
        ) {
            let (mut editor, _store) = create_test_editor();
            editor.dispatch(Message::SetValue(initial.clone())).unwrap();
            prop_assert_eq!(editor.surface().lines().join("\n"), initial);

            for (pick, text) in edits {
                let line = pick % editor.model().buffer.line_count() + 1;
                edit(&mut editor, line, &text).unwrap();
                prop_assert_eq!(editor.source(), editor.model().buffer.to_source());
                prop_assert_eq!(editor.source(), editor.surface().lines().join("\n"));
            }
        }
    }
}
