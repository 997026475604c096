//! End-to-end coverage of document mutations over a realistic element
//! configuration.

use usbuilder_editor::{
    BuilderConfig, BuilderEvent, BuilderSession, NotifyLevel, PageData, Position, QueueSink,
};
use usbuilder_shortcode::Atts;

fn test_config() -> BuilderConfig {
    BuilderConfig::from_json(
        r#"{
        "main_container": "container",
        "containers": [
            "vc_row", "vc_row_inner", "vc_column", "vc_column_inner",
            "vc_tta_tabs", "vc_tta_accordion", "vc_tta_tour", "vc_tta_section",
            "hwrapper", "vwrapper"
        ],
        "relations": {
            "as_child": {
                "vc_row": { "only": "container" },
                "vc_column": { "only": "vc_row" },
                "vc_row_inner": { "only": "vc_column" },
                "vc_column_inner": { "only": "vc_row_inner" },
                "vc_tta_section": { "only": "vc_tta_tabs,vc_tta_accordion,vc_tta_tour" }
            },
            "as_parent": {
                "vc_row": { "only": "vc_column" },
                "vc_row_inner": { "only": "vc_column_inner" },
                "vc_tta_tabs": { "only": "vc_tta_section" },
                "vc_tta_accordion": { "only": "vc_tta_section" },
                "vc_tta_tour": { "only": "vc_tta_section" }
            }
        },
        "templates": {
            "vc_row": "[vc_row usbid=\"{%vc_row%}\"][vc_column usbid=\"{%vc_column%}\"]{%content%}[/vc_column][/vc_row]",
            "vc_tta_section": "[vc_tta_section title=\"{%title_1%}\" usbid=\"{%vc_tta_section_1%}\"][vc_column_text usbid=\"{%vc_column_text%}\"]{%vc_column_text_content%}[/vc_column_text][/vc_tta_section][vc_tta_section title=\"{%title_2%}\" usbid=\"{%vc_tta_section_2%}\"][/vc_tta_section]"
        },
        "default_values": {
            "btn": { "label": "Button" },
            "text": { "content": "Lorem ipsum" },
            "vc_column_text": { "content": "Text block" }
        },
        "edit_content": {
            "text": "content",
            "vc_column_text": "content"
        },
        "translations": {
            "section": "Section",
            "invalid_data": "Invalid data",
            "all_inner_elms_del": "Remove all inner elements?"
        }
    }"#,
    )
    .unwrap()
}

fn session_with(content: &str) -> (BuilderSession, QueueSink) {
    let sink = QueueSink::new();
    let mut session = BuilderSession::new(test_config(), false).with_sink(sink.clone());
    session.load_page(PageData {
        content: content.to_owned(),
        ..PageData::default()
    });
    (session, sink)
}

const TWO_ROWS: &str = concat!(
    r#"[vc_row usbid="vc_row:1"]"#,
    r#"[vc_column usbid="vc_column:1"]"#,
    r#"[us_btn usbid="us_btn:1" label="Go"]"#,
    r#"[/vc_column]"#,
    r#"[/vc_row]"#,
    r#"[vc_row usbid="vc_row:2"][vc_column usbid="vc_column:2"][/vc_column][/vc_row]"#,
);

#[test]
fn create_plain_element_at_root_is_wrapped_in_a_row() {
    let (mut session, sink) = session_with("");
    let id = session.create_elm("us_btn", "container", 0, Atts::new());
    assert_eq!(id.as_deref(), Some("us_btn:1"));
    assert_eq!(
        session.page.content,
        concat!(
            r#"[vc_row usbid="vc_row:1"][vc_column usbid="vc_column:1"]"#,
            r#"[us_btn usbid="us_btn:1" label="Button"]"#,
            r#"[/vc_column][/vc_row]"#,
        )
    );
    assert_eq!(sink.count_content_changes(), 1);
}

#[test]
fn create_row_gets_a_default_column_child() {
    let (mut session, _sink) = session_with("");
    let id = session.create_elm("vc_row", "container", 0, Atts::new());
    assert_eq!(id.as_deref(), Some("vc_row:1"));
    assert_eq!(
        session.page.content,
        r#"[vc_row usbid="vc_row:1"][vc_column usbid="vc_column:1"][/vc_column][/vc_row]"#
    );
}

#[test]
fn create_with_content_attribute_emits_closing_tag() {
    let (mut session, _sink) = session_with(TWO_ROWS);
    let id = session.create_elm("us_text", "vc_column:2", 0, Atts::new());
    assert_eq!(id.as_deref(), Some("us_text:1"));
    assert!(session
        .page
        .content
        .contains(r#"[us_text usbid="us_text:1"]Lorem ipsum[/us_text]"#));
}

#[test]
fn create_tta_tabs_seeds_two_sections() {
    let (mut session, _sink) = session_with(TWO_ROWS);
    let id = session.create_elm("vc_tta_tabs", "vc_column:2", 0, Atts::new());
    assert_eq!(id.as_deref(), Some("vc_tta_tabs:1"));
    let content = &session.page.content;
    assert!(content.contains(r#"title="Section 1" usbid="vc_tta_section:1""#));
    assert!(content.contains(r#"title="Section 2" usbid="vc_tta_section:2""#));
    assert!(content.contains(r#"[vc_column_text usbid="vc_column_text:1"]Text block[/vc_column_text]"#));
}

#[test]
fn create_appends_at_interior_index() {
    let (mut session, _sink) = session_with(TWO_ROWS);
    session.create_elm("us_text", "vc_column:1", 1, Atts::new());
    let content = &session.page.content;
    let btn = content.find("us_btn:1").unwrap();
    let text = content.find("us_text:1").unwrap();
    assert!(btn < text);
}

#[test]
fn create_rejects_same_type_ancestor() {
    let (mut session, sink) = session_with(TWO_ROWS);
    assert_eq!(session.create_elm("vc_row", "vc_column:1", 0, Atts::new()), None);
    assert_eq!(sink.count_content_changes(), 0);
}

#[test]
fn create_falls_back_to_root_for_missing_parent() {
    let (mut session, _sink) = session_with("");
    let id = session.create_elm("us_btn", "vc_column:9", 0, Atts::new());
    assert_eq!(id.as_deref(), Some("us_btn:1"));
    assert!(session.page.content.starts_with("[vc_row"));
}

#[test]
fn insert_position_resolution() {
    let (session, _sink) = session_with(TWO_ROWS);
    let p = session.get_insert_position("container", 0);
    assert_eq!((p.position, p.parent.as_str()), (Position::Prepend, "container"));
    let p = session.get_insert_position("container", 5);
    assert_eq!((p.position, p.parent.as_str()), (Position::Append, "container"));
    // Interior index becomes "after the previous child".
    let p = session.get_insert_position("container", 1);
    assert_eq!((p.position, p.parent.as_str()), (Position::After, "vc_row:1"));
    // Non-containers only support before/after.
    let p = session.get_insert_position("us_btn:1", 0);
    assert_eq!((p.position, p.parent.as_str()), (Position::Before, "us_btn:1"));
    let p = session.get_insert_position("us_btn:1", 3);
    assert_eq!((p.position, p.parent.as_str()), (Position::After, "us_btn:1"));
}

#[test]
fn move_between_columns() {
    let (mut session, sink) = session_with(TWO_ROWS);
    assert!(session.move_elm("us_btn:1", "vc_column:2", 0));
    assert!(session
        .page
        .content
        .contains(r#"[vc_column usbid="vc_column:2"][us_btn usbid="us_btn:1" label="Go"][/vc_column]"#));
    assert!(!session
        .page
        .content
        .contains(r#"[vc_column usbid="vc_column:1"][us_btn"#));
    assert_eq!(sink.count_content_changes(), 1);
}

#[test]
fn move_rejects_root_and_missing_elements() {
    let (mut session, sink) = session_with(TWO_ROWS);
    assert!(!session.move_elm("container", "vc_column:1", 0));
    assert!(!session.move_elm("us_btn:9", "vc_column:1", 0));
    assert!(!session.move_elm("us_btn:1", "vc_column:9", 0));
    assert_eq!(sink.count_content_changes(), 0);
}

#[test]
fn move_rejects_same_type_nesting() {
    let (mut session, _sink) = session_with(concat!(
        r#"[vc_row usbid="vc_row:1"][vc_column usbid="vc_column:1"]"#,
        r#"[vc_row_inner usbid="vc_row_inner:1"]"#,
        r#"[vc_column_inner usbid="vc_column_inner:1"][/vc_column_inner]"#,
        r#"[/vc_row_inner]"#,
        r#"[/vc_column][/vc_row]"#,
    ));
    assert!(!session.move_elm("vc_row:1", "vc_column_inner:1", 0));
}

#[test]
fn duplicate_remaps_ids_and_lands_after_the_source() {
    let (mut session, sink) = session_with(TWO_ROWS);
    let new_id = session.duplicate_elm("us_btn:1");
    assert_eq!(new_id.as_deref(), Some("us_btn:2"));
    assert!(session
        .page
        .content
        .contains(concat!(
            r#"[us_btn usbid="us_btn:1" label="Go"]"#,
            r#"[us_btn usbid="us_btn:2" label="Go"]"#,
        )));
    assert_eq!(sink.count_content_changes(), 1);
}

#[test]
fn duplicate_remaps_the_whole_subtree_and_strips_el_id() {
    let (mut session, _sink) = session_with(concat!(
        r#"[vc_row usbid="vc_row:1" el_id="hero"]"#,
        r#"[vc_column usbid="vc_column:1"][us_btn usbid="us_btn:1"][/vc_column]"#,
        r#"[/vc_row]"#,
    ));
    let new_id = session.duplicate_elm("vc_row:1");
    assert_eq!(new_id.as_deref(), Some("vc_row:2"));
    let content = &session.page.content;
    assert!(content.contains(r#"usbid="vc_column:2""#));
    assert!(content.contains(r#"usbid="us_btn:2""#));
    // The source keeps its anchor, the copy loses it.
    assert_eq!(content.matches("el_id=").count(), 1);
}

#[test]
fn remove_column_reports_the_row() {
    let (mut session, sink) = session_with(TWO_ROWS);
    assert!(session.remove_elm("vc_column:2"));
    assert!(!session.page.content.contains("vc_column:2"));
    let events = sink.drain();
    assert!(events.contains(&BuilderEvent::ColumnChange {
        row_id: "vc_row:2".to_owned()
    }));
}

#[test]
fn remove_selected_subtree_falls_back_to_add_panel() {
    let (mut session, sink) = session_with(TWO_ROWS);
    session.select_elm("us_btn:1");
    assert!(session.remove_elm("vc_row:1"));
    assert_eq!(session.selected_elm_id, None);
    assert!(sink.drain().contains(&BuilderEvent::ShowAddPanel));
}

#[test]
fn delete_last_column_cascades_to_the_row() {
    let (mut session, _sink) = session_with(TWO_ROWS);
    let mut asked = false;
    assert!(session.delete_elm("vc_column:1", |_| {
        asked = true;
        true
    }));
    // The column was the row's only child, so the whole row goes.
    assert!(!session.page.content.contains("vc_row:1"));
    assert!(session.page.content.contains("vc_row:2"));
    assert!(asked);
}

#[test]
fn delete_respects_a_declined_confirmation() {
    let (mut session, sink) = session_with(TWO_ROWS);
    assert!(!session.delete_elm("vc_column:1", |_| false));
    assert_eq!(session.page.content, TWO_ROWS);
    assert_eq!(sink.count_content_changes(), 0);
}

#[test]
fn values_round_trip_including_edited_content() {
    let (mut session, _sink) = session_with(concat!(
        r#"[vc_row usbid="vc_row:1"][vc_column usbid="vc_column:1"]"#,
        r#"[us_text usbid="us_text:1"]old[/us_text]"#,
        r#"[/vc_column][/vc_row]"#,
    ));
    let values = session.get_elm_values("us_text:1");
    assert_eq!(values.get_text("usbid"), Some("us_text:1"));
    assert_eq!(values.get_text("content"), Some("old"));

    let mut update = Atts::new();
    update.set("content", "new text");
    update.set("color", "red");
    session.set_elm_values("us_text:1", update);
    assert!(session
        .page
        .content
        .contains(r#"[us_text usbid="us_text:1" color="red"]new text[/us_text]"#));
}

#[test]
fn set_values_updates_attributes_in_place() {
    let (mut session, sink) = session_with(TWO_ROWS);
    let mut update = Atts::new();
    update.set("label", "Stop");
    session.set_elm_values("us_btn:1", update);
    assert!(session
        .page
        .content
        .contains(r#"[us_btn usbid="us_btn:1" label="Stop"]"#));
    assert_eq!(sink.count_content_changes(), 1);
}

#[test]
fn columns_layout_grows_and_assigns_simplified_widths() {
    let (mut session, _sink) = session_with(TWO_ROWS);
    session.update_columns_layout("vc_row:1", "1-2-1");
    let children = session.get_elm_children("vc_row:1");
    assert_eq!(children.len(), 3);
    let content = &session.page.content;
    assert!(content.contains(r#"usbid="vc_column:1" width="1/4""#));
    assert!(content.contains(r#"usbid="vc_column:3" width="1/2""#));
    assert!(content.contains(r#"usbid="vc_column:4" width="1/4""#));
    // The original column keeps its content.
    assert!(content.contains("us_btn:1"));
}

#[test]
fn columns_layout_shrinks_only_through_empty_columns() {
    let (mut session, _sink) = session_with(concat!(
        r#"[vc_row usbid="vc_row:1"]"#,
        r#"[vc_column usbid="vc_column:1"][us_btn usbid="us_btn:1"][/vc_column]"#,
        r#"[vc_column usbid="vc_column:2"][/vc_column]"#,
        r#"[/vc_row]"#,
    ));
    session.update_columns_layout("vc_row:1", "1");
    let children = session.get_elm_children("vc_row:1");
    assert_eq!(children, vec!["vc_column:1"]);
    assert!(session.page.content.contains("us_btn:1"));

    // Non-empty columns survive a shrink.
    let (mut session, _sink) = session_with(concat!(
        r#"[vc_row usbid="vc_row:1"]"#,
        r#"[vc_column usbid="vc_column:1"][us_btn usbid="us_btn:1"][/vc_column]"#,
        r#"[vc_column usbid="vc_column:2"][us_btn usbid="us_btn:2"][/vc_column]"#,
        r#"[/vc_row]"#,
    ));
    session.update_columns_layout("vc_row:1", "1");
    assert_eq!(session.get_elm_children("vc_row:1").len(), 2);
}

#[test]
fn import_appends_content_and_assigns_ids() {
    let (mut session, sink) = session_with(TWO_ROWS);
    assert!(session.import_content("[vc_row][vc_column][us_btn][/vc_column][/vc_row]"));
    assert!(session.page.content.starts_with(TWO_ROWS));
    assert_eq!(
        &session.page.content[TWO_ROWS.len()..],
        concat!(
            r#"[vc_row usbid="vc_row:3"][vc_column usbid="vc_column:3"]"#,
            r#"[us_btn usbid="us_btn:2"][/vc_column][/vc_row]"#,
        )
    );
    assert_eq!(sink.count_content_changes(), 1);
}

#[test]
fn import_discards_ids_carried_by_the_paste() {
    // A snippet copied out of the page still carries the old ids; they
    // must not survive next to the fresh ones.
    let (mut session, sink) = session_with(TWO_ROWS);
    assert!(session.import_content(concat!(
        r#"[vc_row usbid="vc_row:1"][vc_column usbid="vc_column:1"]"#,
        r#"[us_btn usbid="us_btn:1" label="Go"][/vc_column][/vc_row]"#,
    )));
    let appended = &session.page.content[TWO_ROWS.len()..];
    assert_eq!(
        appended,
        concat!(
            r#"[vc_row usbid="vc_row:3"][vc_column usbid="vc_column:3"]"#,
            r#"[us_btn usbid="us_btn:2" label="Go"][/vc_column][/vc_row]"#,
        )
    );
    assert_eq!(appended.matches(r#"usbid="vc_row:"#).count(), 1);
    assert_eq!(sink.count_content_changes(), 1);
}

#[test]
fn import_rejects_content_without_row_wrapping() {
    let (mut session, sink) = session_with(TWO_ROWS);
    assert!(!session.import_content("[us_btn label=\"x\"]"));
    assert_eq!(session.page.content, TWO_ROWS);
    let events = sink.drain();
    assert!(events.iter().any(|e| matches!(
        e,
        BuilderEvent::Notify {
            level: NotifyLevel::Error,
            ..
        }
    )));
}
