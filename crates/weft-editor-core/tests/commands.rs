use insta::assert_snapshot;
use pretty_assertions::assert_eq;
use weft_editor_core::{CommandState, CommandValue, Composer, EditorConfig, NodeId};

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

fn find_tag(c: &Composer, tag: &str) -> NodeId {
    let doc = c.doc();
    doc.descendants(doc.body())
        .find(|&n| doc.has_tag(n, &[tag]))
        .unwrap()
}

// === Inline formatting ===

#[test]
fn test_bold_toggles_on_and_off() {
    let mut c = composer("hello world");
    c.set_caret(6, 11);

    assert!(c.exec("bold", None));
    assert_eq!(c.get_value(), "hello <b>world</b>");
    assert!(c.state("bold", None).is_active());

    assert!(c.exec("bold", None));
    assert_eq!(c.get_value(), "hello world");
    assert!(!c.state("bold", None).is_active());
}

#[test]
fn test_bold_at_caret_on_and_off_leaves_no_placeholder() {
    let mut c = composer("ab");
    c.set_caret(1, 1);

    assert!(c.exec("bold", None));
    assert!(c.exec("bold", None));
    assert_eq!(c.get_value(), "ab");
    assert_eq!(c.get_text(), "ab");
    assert!(!c.state("bold", None).is_active());
}

#[test]
fn test_bold_state_sees_strong() {
    let mut c = composer("<strong>x</strong>y");
    c.set_caret(0, 1);
    assert!(c.state("bold", None).is_active());
    assert!(!c.state("italic", None).is_active());
}

#[test]
fn test_command_names_are_case_insensitive() {
    let mut c = composer("abc");
    c.set_caret(0, 3);
    assert!(c.exec("ITALIC", None));
    assert_eq!(c.get_value(), "<i>abc</i>");
}

#[test]
fn test_font_size_replaces_previous_size() {
    let mut c = composer("abc");
    c.set_caret(0, 3);

    assert!(c.exec("fontSize", Some(&CommandValue::text("large"))));
    assert_snapshot!(c.get_value(), @r#"<span class="wysiwyg-font-size-large">abc</span>"#);
    assert_eq!(c.value("fontSize").as_deref(), Some("large"));
    assert!(c.state("fontSize", None).is_active());
    assert!(c.state("fontSize", Some(&CommandValue::text("large"))).is_active());
    assert!(!c.state("fontSize", Some(&CommandValue::text("small"))).is_active());

    assert!(c.exec("fontSize", Some(&CommandValue::text("small"))));
    assert_snapshot!(c.get_value(), @r#"<span class="wysiwyg-font-size-small">abc</span>"#);
    assert_eq!(c.value("fontSize").as_deref(), Some("small"));
}

#[test]
fn test_state_without_selection_is_off() {
    let mut c = composer("<b>abc</b>");
    assert_eq!(c.state("bold", None), CommandState::Off);
    assert!(!c.exec("bold", None));
}

// === Links ===

#[test]
fn test_create_link_at_caret_uses_href_as_text() {
    let mut c = composer("see");
    c.set_caret(3, 3);

    assert!(c.exec("createLink", Some(&CommandValue::text("http://x.com"))));
    assert_snapshot!(c.get_value(), @r#"see<a href="http://x.com">http://x.com</a> "#);
}

#[test]
fn test_create_link_wraps_selection_with_attributes() {
    let mut c = composer("go home");
    c.set_caret(3, 7);
    let value = CommandValue::attributes([("href", "/home"), ("target", "_blank")]);

    assert!(c.exec("createLink", Some(&value)));
    assert_snapshot!(c.get_value(), @r#"go <a href="/home" target="_blank">home</a>"#);
}

#[test]
fn test_create_link_inside_link_removes_it() {
    let mut c = composer(r#"<a href="http://x.com">click</a> here"#);
    c.set_caret(2, 2);
    assert!(c.state("createLink", None).is_active());

    assert!(c.exec("createLink", Some(&CommandValue::text("http://y.com"))));
    assert_eq!(c.get_value(), "click here");
}

#[test]
fn test_removing_url_link_keeps_it_as_code() {
    let mut c = composer(r#"<a href="http://x.com">http://x.com</a>"#);
    c.set_caret(3, 3);

    assert!(c.exec("createLink", None));
    assert_eq!(c.get_value(), "<code>http://x.com</code>");
}

// === Images ===

#[test]
fn test_insert_image_at_caret() {
    let mut c = composer("ab");
    c.set_caret(1, 1);

    assert!(c.exec("insertImage", Some(&CommandValue::text("cat.png"))));
    assert_snapshot!(c.get_value(), @r#"a<img src="cat.png">b"#);
}

#[test]
fn test_insert_image_on_selected_image_removes_it() {
    let mut c = composer(r#"a<img src="cat.png">b"#);
    let img = find_tag(&c, "img");
    assert!(c.select_node(img));
    assert_eq!(c.state("insertImage", None), CommandState::Node(img));

    assert!(c.exec("insertImage", None));
    assert_eq!(c.get_value(), "ab");
}

#[test]
fn test_removing_only_image_of_link_removes_link() {
    let mut c = composer(r#"x<a href="y"><img src="i.png"></a>"#);
    let img = find_tag(&c, "img");
    c.select_node(img);

    assert!(c.exec("insertImage", None));
    assert_eq!(c.get_value(), "x");
}

// === Lists ===

#[test]
fn test_unordered_list_from_line() {
    let mut c = composer("foo");
    c.set_caret(1, 1);

    assert!(c.exec("insertUnorderedList", None));
    assert_eq!(c.get_value(), "<ul><li>foo</li></ul>");
    assert!(c.state("insertUnorderedList", None).is_active());
    assert!(!c.state("insertOrderedList", None).is_active());
}

#[test]
fn test_list_switches_type_then_resolves() {
    let mut c = composer("<ul><li>foo</li></ul>");
    c.set_caret(1, 1);

    assert!(c.exec("insertOrderedList", None));
    assert_eq!(c.get_value(), "<ol><li>foo</li></ol>");

    assert!(c.exec("insertOrderedList", None));
    assert_eq!(c.get_value(), "foo<br>");
}

#[test]
fn test_list_in_empty_editor_gets_an_item() {
    let mut c = composer("");
    c.set_caret(0, 0);

    assert!(c.exec("insertUnorderedList", None));
    assert_eq!(c.get_value(), "<ul><li></li></ul>");

    let li = find_tag(&c, "li");
    let range = c.selection().get_range(c.doc()).unwrap();
    assert!(range.is_collapsed());
    assert_eq!(range.start.node, li);
}

#[test]
fn test_list_on_and_off_in_empty_editor_leaves_nothing() {
    let mut c = composer("");
    c.set_caret(0, 0);

    assert!(c.exec("insertOrderedList", None));
    assert!(c.exec("insertOrderedList", None));
    assert_eq!(c.get_value(), "");
    assert!(c.is_empty());
}

#[test]
fn test_resolve_list_into_paragraphs() {
    let mut c = paragraph_composer("<ul><li>a</li><li>b</li></ul>");
    c.set_caret(0, 0);

    assert!(c.exec("insertUnorderedList", None));
    assert_eq!(c.get_value(), "<p>a</p><p>b</p>");
}

// === Blocks ===

#[test]
fn test_format_block_heading_toggles() {
    let mut c = composer("title");
    c.set_caret(2, 2);

    assert!(c.exec("formatBlock", Some(&CommandValue::text("h1"))));
    assert_eq!(c.get_value(), "<h1>title</h1>");
    assert!(c.state("formatBlock", Some(&CommandValue::text("h1"))).is_active());

    assert!(c.exec("formatBlock", Some(&CommandValue::text("h1"))));
    assert_eq!(c.get_value(), "title");
}

#[test]
fn test_format_block_wraps_only_the_caret_line() {
    let mut c = composer("one<br>two");
    c.set_caret(5, 5);

    assert!(c.exec("formatBlock", Some(&CommandValue::text("p"))));
    assert_eq!(c.get_value(), "one<p>two</p>");
}

#[test]
fn test_format_block_renames_existing_block() {
    let mut c = composer("<p>text</p>");
    c.set_caret(1, 1);

    assert!(c.exec("formatBlock", Some(&CommandValue::text("h2"))));
    assert_eq!(c.get_value(), "<h2>text</h2>");
}

#[test]
fn test_format_block_rejects_bad_tag() {
    let mut c = composer("text");
    c.set_caret(1, 1);
    assert!(!c.exec("formatBlock", Some(&CommandValue::text("<script>"))));
    assert_eq!(c.get_value(), "text");
}

#[test]
fn test_justify_swaps_and_removes_alignment() {
    let mut c = composer("<p>x</p>");
    c.set_caret(1, 1);

    assert!(c.exec("justifyCenter", None));
    assert_snapshot!(c.get_value(), @r#"<p class="wysiwyg-text-align-center">x</p>"#);
    assert!(c.state("justifyCenter", None).is_active());
    assert!(!c.state("justifyLeft", None).is_active());

    assert!(c.exec("justifyLeft", None));
    assert_snapshot!(c.get_value(), @r#"<p class="wysiwyg-text-align-left">x</p>"#);

    assert!(c.exec("justifyLeft", None));
    assert_eq!(c.get_value(), "<p>x</p>");
}

#[test]
fn test_justify_bare_line_creates_block() {
    let mut c = composer("x");
    c.set_caret(1, 1);

    assert!(c.exec("justifyRight", None));
    assert_snapshot!(c.get_value(), @r#"<div class="wysiwyg-text-align-right">x</div>"#);

    assert!(c.exec("justifyRight", None));
    assert_eq!(c.get_value(), "x");
}

// === Insertion ===

#[test]
fn test_insert_line_break_without_native() {
    let mut c = composer("ab");
    c.set_caret(1, 1);

    assert!(c.exec("insertLineBreak", None));
    assert_eq!(c.get_value(), "a<br>b");
}

#[test]
fn test_insert_html_replaces_selection() {
    let mut c = composer("abc");
    c.set_caret(1, 2);

    assert!(c.exec("insertHTML", Some(&CommandValue::text("<i>x</i>"))));
    assert_eq!(c.get_value(), "a<i>x</i>c");
}

#[test]
fn test_insert_html_needs_a_value() {
    let mut c = composer("abc");
    c.set_caret(1, 1);
    assert!(!c.exec("insertHTML", None));
}
