use job_assistant::portal::{
    form_model::{ControlKind, FormElementDescriptor},
    scanner::{label_for, scan_page},
};

use crate::common::fake_page::{FakeElement, FakePage};

mod common;

// =========================================================================
// Ordering and indices
// =========================================================================

#[test]
fn scan_orders_inputs_then_textareas_then_selects() {
    // Document order deliberately interleaves the control kinds.
    let mut page = FakePage::single(vec![
        FakeElement::select("country", "country", &["France", "Germany"]),
        FakeElement::textarea("motivation", "motivation"),
        FakeElement::input("text", "first", "first_name"),
        FakeElement::input("email", "mail", "email"),
    ]);

    let scan = scan_page(&mut page);

    let kinds: Vec<ControlKind> = scan.descriptors.iter().map(|d| d.kind()).collect();
    assert_eq!(
        kinds,
        vec![ControlKind::Input, ControlKind::Input, ControlKind::Textarea, ControlKind::Select]
    );

    let indices: Vec<usize> = scan.descriptors.iter().map(|d| d.index()).collect();
    assert_eq!(indices, vec![0, 1, 2, 3]);

    assert_eq!(scan.descriptors[0].base().name.as_deref(), Some("first_name"));
    assert_eq!(scan.descriptors[1].base().name.as_deref(), Some("email"));
}

#[test]
fn scan_handles_are_index_aligned() {
    let mut page = FakePage::single(vec![
        FakeElement::textarea("cover", "cover"),
        FakeElement::input("text", "city", "city"),
    ]);

    let scan = scan_page(&mut page);

    assert_eq!(scan.len(), 2);
    assert_eq!(scan.descriptors.len(), scan.handles.len());
    let (descriptor, _) = scan.get(1).expect("second control");
    assert_eq!(descriptor.kind(), ControlKind::Textarea);
    assert!(scan.get(2).is_none());
}

// =========================================================================
// Exclusions
// =========================================================================

#[test]
fn scan_skips_non_fillable_input_types() {
    let mut page = FakePage::single(vec![
        FakeElement::input("hidden", "csrf", "csrf"),
        FakeElement::input("submit", "go", "go"),
        FakeElement::input("button", "b", "b"),
        FakeElement::input("image", "img", "img"),
        FakeElement::input("reset", "r", "r"),
        FakeElement::input("text", "name", "name"),
    ]);

    let scan = scan_page(&mut page);

    assert_eq!(scan.len(), 1);
    assert_eq!(scan.descriptors[0].base().id.as_deref(), Some("name"));
    assert_eq!(scan.descriptors[0].index(), 0);
}

#[test]
fn scan_excluded_type_check_is_case_insensitive() {
    let mut page = FakePage::single(vec![FakeElement::input("HIDDEN", "token", "token")]);

    assert!(scan_page(&mut page).is_empty());
}

#[test]
fn scan_skips_invisible_controls() {
    let mut page = FakePage::single(vec![
        FakeElement::input("text", "honeypot", "website").hidden(),
        FakeElement::textarea("notes", "notes").hidden(),
        FakeElement::input("text", "real", "real"),
    ]);

    let scan = scan_page(&mut page);

    assert_eq!(scan.len(), 1);
    assert_eq!(scan.descriptors[0].base().id.as_deref(), Some("real"));
}

#[test]
fn scan_of_empty_page_is_empty() {
    let mut page = FakePage::single(vec![
        FakeElement::button("Submit"),
        FakeElement::link("Home"),
    ]);

    let scan = scan_page(&mut page);

    assert!(scan.is_empty());
    assert_eq!(scan.len(), 0);
}

#[test]
fn scan_skips_unreadable_control_and_keeps_indices_contiguous() {
    let mut page = FakePage::single(vec![
        FakeElement::input("text", "a", "a"),
        FakeElement::input("text", "gone", "gone").unreadable(),
        FakeElement::input("text", "b", "b"),
    ]);

    let scan = scan_page(&mut page);

    assert_eq!(scan.len(), 2);
    let ids: Vec<Option<&str>> = scan
        .descriptors
        .iter()
        .map(|d| d.base().id.as_deref())
        .collect();
    assert_eq!(ids, vec![Some("a"), Some("b")]);
    assert_eq!(scan.descriptors[1].index(), 1);
}

// =========================================================================
// Attributes, labels and options
// =========================================================================

#[test]
fn scan_captures_label_and_placeholder() {
    let mut page = FakePage::single(vec![
        FakeElement::label("fn", "  Full Name  "),
        FakeElement::input("text", "fn", "full_name").attr("placeholder", "Jane Doe"),
    ]);

    let scan = scan_page(&mut page);

    let base = scan.descriptors[0].base();
    assert_eq!(base.label.as_deref(), Some("Full Name"));
    assert_eq!(base.placeholder.as_deref(), Some("Jane Doe"));
    assert_eq!(base.name.as_deref(), Some("full_name"));
}

#[test]
fn scan_control_without_id_has_no_label() {
    let mut page = FakePage::single(vec![
        FakeElement::label("", "Orphan label"),
        FakeElement::new("input").attr("name", "q"),
    ]);

    let scan = scan_page(&mut page);

    assert_eq!(scan.len(), 1);
    let base = scan.descriptors[0].base();
    assert_eq!(base.id, None);
    assert_eq!(base.label, None);
}

#[test]
fn scan_treats_empty_attributes_as_absent() {
    let mut page = FakePage::single(vec![FakeElement::new("input")
        .attr("type", "")
        .attr("id", "")
        .attr("name", "")
        .attr("placeholder", "")]);

    let scan = scan_page(&mut page);

    assert_eq!(scan.len(), 1);
    match &scan.descriptors[0] {
        FormElementDescriptor::Input { base, input_type } => {
            assert_eq!(*input_type, None);
            assert_eq!(base.id, None);
            assert_eq!(base.name, None);
            assert_eq!(base.placeholder, None);
        }
        other => panic!("expected input, got {:?}", other),
    }
}

#[test]
fn scan_select_options_are_trimmed_and_capped_at_ten() {
    let many: Vec<String> = (1..=12).map(|i| format!("  Option {}  ", i)).collect();
    let many: Vec<&str> = many.iter().map(String::as_str).collect();
    let mut page = FakePage::single(vec![FakeElement::select("pick", "pick", &many)]);

    let scan = scan_page(&mut page);

    match &scan.descriptors[0] {
        FormElementDescriptor::Select { options, .. } => {
            assert_eq!(options.len(), 10);
            assert_eq!(options[0], "Option 1");
            assert_eq!(options[9], "Option 10");
        }
        other => panic!("expected select, got {:?}", other),
    }
}

#[test]
fn select_descriptor_has_no_placeholder() {
    let mut page = FakePage::single(vec![
        FakeElement::select("deg", "degree", &["BSc", "MSc"]).attr("placeholder", "Pick one"),
    ]);

    let scan = scan_page(&mut page);

    assert_eq!(scan.descriptors[0].base().placeholder, None);
}

#[test]
fn label_lookup_takes_first_match_and_escapes_quotes() {
    let mut page = FakePage::single(vec![
        FakeElement::label("o'brien", "First"),
        FakeElement::label("o'brien", "Second"),
    ]);

    assert_eq!(label_for(&mut page, "o'brien").as_deref(), Some("First"));
    assert_eq!(label_for(&mut page, "missing"), None);
}

#[test]
fn descriptor_serializes_as_flat_record() {
    let mut page = FakePage::single(vec![
        FakeElement::label("deg", "Degree"),
        FakeElement::select("deg", "degree", &["BSc", "MSc"]),
        FakeElement::input("email", "mail", "email"),
    ]);

    let scan = scan_page(&mut page);
    let json = serde_json::to_value(&scan.descriptors).expect("serialize descriptors");

    assert_eq!(
        json,
        serde_json::json!([
            {"tag": "input", "index": 0, "name": "email", "id": "mail", "type": "email"},
            {"tag": "select", "index": 1, "name": "degree", "id": "deg", "label": "Degree",
             "options": ["BSc", "MSc"]}
        ])
    );
}
