use std::cell::{Cell, RefCell};
use std::rc::Rc;

use pretty_assertions::assert_eq;
use weft_editor_core::{
    CommandObserver, CommandState, CommandValue, Composer, Document, EditorConfig, HtmlUndoManager,
    Key, KeydownResult, Modifiers, NativeCommands, NativeError, Selection,
};

fn composer(html: &str) -> Composer {
    Composer::from_html(html, EditorConfig::default())
}

fn paragraph_composer(html: &str) -> Composer {
    let config = EditorConfig {
        use_line_breaks: false,
        ..EditorConfig::default()
    };
    Composer::from_html(html, config)
}

/// Host primitives that record what they were asked to do and change nothing.
#[derive(Clone, Default)]
struct RecordingNative {
    supported: Vec<&'static str>,
    fail: bool,
    calls: Rc<RefCell<Vec<String>>>,
    support_checks: Rc<Cell<usize>>,
}

impl RecordingNative {
    fn supporting(commands: &[&'static str]) -> Self {
        Self {
            supported: commands.to_vec(),
            ..Self::default()
        }
    }
}

impl NativeCommands for RecordingNative {
    fn supports(&self, command: &str) -> bool {
        self.support_checks.set(self.support_checks.get() + 1);
        self.supported.iter().any(|c| c.eq_ignore_ascii_case(command))
    }

    fn exec(
        &mut self,
        _doc: &mut Document,
        _selection: &mut Selection,
        command: &str,
        value: Option<&str>,
    ) -> Result<bool, NativeError> {
        self.calls
            .borrow_mut()
            .push(format!("{command}:{}", value.unwrap_or_default()));
        if self.fail {
            return Err(NativeError::new(command, "host refused"));
        }
        Ok(true)
    }

    fn state(
        &self,
        _doc: &Document,
        _selection: &Selection,
        command: &str,
        _value: Option<&str>,
    ) -> Result<bool, NativeError> {
        if self.fail {
            return Err(NativeError::new(command, "host refused"));
        }
        Ok(true)
    }

    fn value(
        &self,
        _doc: &Document,
        _selection: &Selection,
        _command: &str,
    ) -> Result<Option<String>, NativeError> {
        Ok(Some("native".to_string()))
    }
}

struct Log(Rc<RefCell<Vec<String>>>);

impl CommandObserver for Log {
    fn before_command(&mut self, command: &str, _value: Option<&CommandValue>) {
        self.0.borrow_mut().push(format!("before {command}"));
    }

    fn after_command(&mut self, command: &str, _value: Option<&CommandValue>, changed: bool) {
        self.0.borrow_mut().push(format!("after {command} {changed}"));
    }
}

// === Undo ===

#[test]
fn test_undo_redo_commands() {
    let mut c = composer("hello");
    c.set_caret(0, 5);
    c.exec("bold", None);
    assert_eq!(c.get_value(), "<b>hello</b>");

    assert!(c.exec("undo", None));
    assert_eq!(c.get_value(), "hello");
    assert!(c.exec("redo", None));
    assert_eq!(c.get_value(), "<b>hello</b>");
    assert!(!c.exec("redo", None));
}

#[test]
fn test_undo_redo_shortcuts() {
    let mut c = composer("hello");
    c.set_caret(0, 5);
    c.exec("italic", None);

    let result = c.handle_key_down(&Key::character("z"), Modifiers::CTRL);
    assert_eq!(result, KeydownResult::Handled);
    assert_eq!(c.get_value(), "hello");

    let result = c.handle_key_down(&Key::character("Z"), Modifiers::CTRL_SHIFT);
    assert_eq!(result, KeydownResult::Handled);
    assert_eq!(c.get_value(), "<i>hello</i>");

    c.handle_key_down(&Key::character("z"), Modifiers::META);
    assert_eq!(c.get_value(), "hello");
    c.handle_key_down(&Key::character("y"), Modifiers::CTRL);
    assert_eq!(c.get_value(), "<i>hello</i>");
}

#[test]
fn test_other_shortcuts_are_not_handled() {
    let mut c = composer("hello");
    c.set_caret(0, 5);
    let result = c.handle_key_down(&Key::character("b"), Modifiers::CTRL);
    assert_eq!(result, KeydownResult::NotHandled);
    assert_eq!(c.get_value(), "hello");
}

#[test]
fn test_custom_undo_depth() {
    let mut c = composer("abc").with_undo_manager(HtmlUndoManager::new(1));
    c.set_caret(0, 3);
    c.exec("bold", None);
    c.exec("italic", None);

    assert!(c.exec("undo", None));
    assert_eq!(c.get_value(), "<b>abc</b>");
    assert!(!c.exec("undo", None));
}

// === Host primitives ===

#[test]
fn test_unknown_command_without_native_does_nothing() {
    let mut c = composer("abc");
    c.set_caret(0, 3);
    assert!(!c.exec("strikeThrough", None));
    assert_eq!(c.state("strikeThrough", None), CommandState::Off);
    assert_eq!(c.value("strikeThrough"), None);
    assert_eq!(c.get_value(), "abc");
}

#[test]
fn test_unknown_command_goes_to_native_and_support_is_cached() {
    let native = RecordingNative::supporting(&["strikeThrough"]);
    let calls = native.calls.clone();
    let support_checks = native.support_checks.clone();
    let mut c = composer("abc").with_native(native);
    c.set_caret(0, 3);

    assert!(c.exec("strikeThrough", None));
    assert!(c.exec("strikethrough", None));
    assert_eq!(c.state("strikeThrough", None), CommandState::On);
    assert_eq!(c.value("strikeThrough").as_deref(), Some("native"));
    assert_eq!(support_checks.get(), 1);
    assert_eq!(calls.borrow().len(), 2);
}

#[test]
fn test_failing_native_counts_as_no_change() {
    let native = RecordingNative {
        fail: true,
        ..RecordingNative::supporting(&["strikeThrough"])
    };
    let calls = native.calls.clone();
    let mut c = composer("abc").with_native(native);
    c.set_caret(0, 3);

    assert!(!c.exec("strikeThrough", None));
    assert_eq!(c.state("strikeThrough", None), CommandState::Off);
    assert_eq!(calls.borrow().len(), 1);
}

#[test]
fn test_line_break_prefers_native() {
    let native = RecordingNative::supporting(&["insertLineBreak"]);
    let calls = native.calls.clone();
    let mut c = composer("ab").with_native(native);
    c.set_caret(1, 1);

    assert!(c.exec("insertLineBreak", None));
    assert_eq!(*calls.borrow(), vec!["insertLineBreak:".to_string()]);
    assert_eq!(c.get_value(), "ab");
}

#[test]
fn test_format_block_prefers_native_without_class() {
    let native = RecordingNative::supporting(&["formatBlock"]);
    let calls = native.calls.clone();
    let mut c = composer("ab").with_native(native);
    c.set_caret(1, 1);

    assert!(c.exec("formatBlock", Some(&CommandValue::text("h3"))));
    assert_eq!(*calls.borrow(), vec!["formatBlock:h3".to_string()]);

    // alignment needs the class, so it never asks the host
    assert!(c.exec("justifyCenter", None));
    assert_eq!(calls.borrow().len(), 1);
    assert!(c.get_value().contains("wysiwyg-text-align-center"));
}

// === Observers ===

#[test]
fn test_observers_see_every_command() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut c = composer("abc");
    c.add_observer(Log(log.clone()));
    c.set_caret(0, 3);

    c.exec("bold", None);
    c.exec("nonsense", None);
    assert_eq!(
        *log.borrow(),
        vec![
            "before bold".to_string(),
            "after bold true".to_string(),
            "before nonsense".to_string(),
            "after nonsense false".to_string(),
        ]
    );
}

// === Keys ===

#[test]
fn test_backspace_removes_selected_image() {
    let mut c = composer(r#"a<img src="i.png">b"#);
    let img = c.doc().children(c.doc().body())[1];
    c.select_node(img);

    let result = c.handle_key_down(&Key::Backspace, Modifiers::NONE);
    assert_eq!(result, KeydownResult::Handled);
    assert_eq!(c.get_value(), "ab");
}

#[test]
fn test_backspace_in_text_is_left_to_host() {
    let mut c = composer("ab");
    c.set_caret(1, 1);
    let result = c.handle_key_down(&Key::Backspace, Modifiers::NONE);
    assert_eq!(result, KeydownResult::NotHandled);
    assert_eq!(c.get_value(), "ab");
}

#[test]
fn test_enter_inserts_line_break() {
    let mut c = composer("ab");
    c.set_caret(1, 1);

    let result = c.handle_key_down(&Key::Enter, Modifiers::NONE);
    assert_eq!(result, KeydownResult::Handled);
    assert_eq!(c.get_value(), "a<br>b");
    assert!(!c.has_pending());
}

#[test]
fn test_enter_in_paragraph_mode_is_left_to_host() {
    let mut c = paragraph_composer("ab");
    c.set_caret(1, 1);
    let result = c.handle_key_down(&Key::Enter, Modifiers::NONE);
    assert_eq!(result, KeydownResult::NotHandled);
    assert_eq!(c.get_value(), "ab");
}

#[test]
fn test_enter_leaving_list_drops_paragraph() {
    let mut c = composer("<ul><li>a</li></ul>");
    c.set_caret(1, 1);

    let result = c.handle_key_down(&Key::Enter, Modifiers::NONE);
    assert_eq!(result, KeydownResult::PassThrough);
    assert!(c.has_pending());

    // the host leaves the list into a new paragraph
    let body = c.doc().body();
    c.doc_mut()
        .set_inner_html(body, "<ul><li>a</li></ul><p>b</p>")
        .unwrap();
    c.set_caret(2, 2);
    c.tick();

    assert!(!c.has_pending());
    assert_eq!(c.get_value(), "<ul><li>a</li></ul>b");
}

#[test]
fn test_enter_after_heading_renames_div_in_paragraph_mode() {
    let mut c = paragraph_composer("<h1>t</h1>");
    c.set_caret(1, 1);
    assert_eq!(
        c.handle_key_down(&Key::Enter, Modifiers::NONE),
        KeydownResult::PassThrough
    );

    let body = c.doc().body();
    c.doc_mut()
        .set_inner_html(body, "<h1>t</h1><div>x</div>")
        .unwrap();
    c.set_caret(2, 2);
    c.tick();
    assert_eq!(c.get_value(), "<h1>t</h1><p>x</p>");
}

#[test]
fn test_enter_within_list_keeps_new_item() {
    let mut c = composer("<ul><li>a</li></ul>");
    c.set_caret(1, 1);
    c.handle_key_down(&Key::Enter, Modifiers::NONE);

    let body = c.doc().body();
    c.doc_mut()
        .set_inner_html(body, "<ul><li>a</li><li>b</li></ul>")
        .unwrap();
    c.set_caret(2, 2);
    c.tick();
    assert_eq!(c.get_value(), "<ul><li>a</li><li>b</li></ul>");
}

#[test]
fn test_space_links_typed_url() {
    let mut c = composer("visit www.x.org");
    c.set_caret(15, 15);

    let result = c.handle_key_down(&Key::Space, Modifiers::NONE);
    assert_eq!(result, KeydownResult::NotHandled);
    assert_eq!(
        c.get_value(),
        r#"visit <a href="http://www.x.org">www.x.org</a>"#
    );
}

#[test]
fn test_space_inside_link_does_not_relink() {
    let mut c = composer(r#"<a href="http://a.com">http://a.com</a>"#);
    c.set_caret(4, 4);
    c.handle_key_down(&Key::Space, Modifiers::NONE);
    assert_eq!(c.get_value(), r#"<a href="http://a.com">http://a.com</a>"#);
}

#[test]
fn test_auto_link_can_be_disabled() {
    let config = EditorConfig {
        auto_link: false,
        ..EditorConfig::default()
    };
    let mut c = Composer::from_html("visit www.x.org", config);
    c.set_caret(15, 15);
    c.handle_key_down(&Key::Space, Modifiers::NONE);
    c.handle_blur();
    assert_eq!(c.get_value(), "visit www.x.org");
}

#[test]
fn test_key_up_syncs_href_with_url_text() {
    let mut c = composer(r#"<a href="http://old.com">www.new.com</a>"#);
    c.set_caret(3, 3);
    c.handle_key_up(&Key::character("m"));
    assert_eq!(
        c.get_value(),
        r#"<a href="http://www.new.com">www.new.com</a>"#
    );
}

#[test]
fn test_key_up_adds_scheme_to_uppercase_www() {
    let mut c = composer(r#"<a href="http://old.com">WWW.new.com</a>"#);
    c.set_caret(3, 3);
    c.handle_key_up(&Key::character("w"));
    assert_eq!(
        c.get_value(),
        r#"<a href="http://WWW.new.com">WWW.new.com</a>"#
    );
}

#[test]
fn test_key_up_leaves_plain_text_links() {
    let mut c = composer(r#"<a href="http://old.com">click me</a>"#);
    c.set_caret(3, 3);
    c.handle_key_up(&Key::character("e"));
    assert_eq!(c.get_value(), r#"<a href="http://old.com">click me</a>"#);
}

#[test]
fn test_typing_into_empty_editor_starts_paragraph() {
    let mut c = paragraph_composer("");
    c.set_caret(0, 0);

    let result = c.handle_key_down(&Key::character("a"), Modifiers::NONE);
    assert_eq!(result, KeydownResult::NotHandled);
    assert_eq!(c.get_value(), "<p></p>");
    let range = c.selection().get_range(c.doc()).unwrap();
    assert!(c.doc().has_tag(range.start.node, &["p"]));
}

// === Content ===

#[test]
fn test_paste_links_urls() {
    let mut c = composer("ab");
    c.set_caret(1, 1);

    assert!(c.handle_paste("see http://x.com now"));
    assert_eq!(
        c.get_value(),
        r#"asee <a href="http://x.com">http://x.com</a> nowb"#
    );
}

#[test]
fn test_blur_links_urls() {
    let mut c = composer("go to www.a.com");
    c.handle_blur();
    assert_eq!(c.get_value(), r#"go to <a href="http://www.a.com">www.a.com</a>"#);
}

#[test]
fn test_blur_with_caret_inside_url_links_whole_url() {
    let mut c = composer("see www.example.com today");
    c.set_caret(8, 8);
    c.handle_blur();

    assert_eq!(
        c.get_value(),
        r#"see <a href="http://www.example.com">www.example.com</a> today"#
    );
    assert_eq!(c.selection().caret_text_offset(c.doc()), Some((8, 8)));
    let range = c.selection().get_range(c.doc()).unwrap();
    assert_eq!(c.doc().text(range.start.node), Some("www.example.com"));
}

#[test]
fn test_blur_with_selection_inside_url_keeps_url_whole() {
    let mut c = composer("http://x.com/abc");
    c.set_caret(10, 14);
    c.handle_blur();

    assert_eq!(
        c.get_value(),
        r#"<a href="http://x.com/abc">http://x.com/abc</a>"#
    );
    assert_eq!(c.selection().caret_text_offset(c.doc()), Some((10, 14)));
}

#[test]
fn test_value_text_and_emptiness() {
    let mut c = composer("<p><br></p>");
    assert!(c.is_empty());

    c.set_caret(0, 0);
    c.set_value("a\u{feff}<b>b</b>").unwrap();
    assert!(!c.is_empty());
    assert_eq!(c.get_text(), "ab");
    assert!(c.selection().get_range(c.doc()).is_none());
}
