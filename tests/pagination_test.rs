//! End-to-end pagination scenarios on the headless oracle
//!
//! Page content box is 400 x 200 px; the default font sets 50 characters per
//! 20 px line, so a one-line paragraph is 20 px and ten fill a page.

use page_flow::document::to_markup;
use page_flow::{
    page_shells, Attrs, EditContext, EditMeta, HeadlessOracle, MeasurementOracle, Node, NodeKind,
    PageError, PageLayout, PaginationConfig, PaginationEngine, Selection, SequentialIds,
};
use std::collections::HashSet;

fn config() -> PaginationConfig {
    PaginationConfig::new(PageLayout::plain(480.0, 280.0, 40.0))
}

fn engine() -> PaginationEngine<HeadlessOracle> {
    PaginationEngine::new(config(), HeadlessOracle::default())
        .unwrap()
        .with_ids(SequentialIds::new("t"))
}

fn lines(n: usize) -> Vec<Node> {
    (0..n)
        .map(|i| Node::paragraph(format!("p{}", i), "abcd"))
        .collect()
}

fn ids_of(page: &Node) -> Vec<String> {
    page.content
        .iter()
        .filter_map(|node| node.id().map(|id| id.to_string()))
        .collect()
}

fn all_ids(doc: &Node) -> Vec<String> {
    let mut ids = Vec::new();
    doc.descendants(|node, _, _, _| {
        if let Some(id) = node.id() {
            ids.push(id.to_string());
        }
        true
    });
    ids
}

fn five_pages(engine: &mut PaginationEngine<HeadlessOracle>) -> Node {
    let doc = Node::doc(vec![Node::page("page", 1, lines(50))]);
    engine.paginate_initial(&doc).into_doc()
}

#[test]
fn test_initial_pagination_fills_pages() {
    let mut engine = engine();
    let doc = five_pages(&mut engine);

    assert_eq!(doc.child_count(), 5);
    for (index, page) in doc.content.iter().enumerate() {
        assert_eq!(page.kind, NodeKind::Page);
        assert_eq!(page.child_count(), 10);
        assert_eq!(page.attrs.page_number, Some(index as u32 + 1));
    }
    assert_eq!(ids_of(&doc.content[1])[0], "p10");
}

#[test]
fn test_stable_document_is_left_alone() {
    let mut engine = engine();
    let doc = five_pages(&mut engine);
    let head = doc.content_size() - 2;

    let tr = engine.paginate(&EditContext::new(
        &doc,
        &doc,
        Selection::cursor(head),
        EditMeta::inserting(),
    ));
    assert!(tr.is_identity());

    let tr = engine.paginate(&EditContext::new(
        &doc,
        &doc,
        Selection::cursor(1),
        EditMeta::default(),
    ));
    assert!(tr.is_identity());
}

#[test]
fn test_long_paragraph_splits_on_word_boundary() {
    let text = vec!["abcd"; 150].join(" ");
    let doc = Node::doc(vec![Node::page("page", 1, vec![Node::paragraph("long", &text)])]);
    let mut engine = engine();
    let out = engine.paginate_initial(&doc).into_doc();

    assert_eq!(out.child_count(), 2);
    let head = &out.content[0].content[0];
    let tail = &out.content[1].content[0];
    assert_eq!(head.text_content().chars().count(), 500);
    assert_eq!(head.id().map(|id| id.as_str()), Some("long"));
    assert_eq!(tail.kind, NodeKind::Paragraph);
    assert!(tail.attrs.extend);
    assert_ne!(tail.id(), head.id());
    assert_eq!(
        format!("{}{}", head.text_content(), tail.text_content()),
        text
    );
}

#[test]
fn test_deletion_pulls_content_back() {
    let mut engine = engine();
    let doc = five_pages(&mut engine);

    let mut edited = doc.clone();
    for page in &mut edited.content[1..] {
        page.content.truncate(1);
    }
    let head = edited.child_offset(1) + 1;
    let out = engine
        .paginate(&EditContext::new(
            &edited,
            &doc,
            Selection::cursor(head),
            EditMeta::deleting(),
        ))
        .into_doc();

    assert_eq!(out.child_count(), 2);
    assert_eq!(out.content[0].child_count(), 10);
    assert_eq!(ids_of(&out.content[1]), vec!["p10", "p20", "p30", "p40"]);
    assert_eq!(out.content[1].attrs.page_number, Some(2));
}

#[test]
fn test_deletion_merges_down_to_one_page() {
    let mut engine = engine();
    let doc = five_pages(&mut engine);

    let mut edited = doc.clone();
    for page in &mut edited.content {
        page.content.truncate(1);
    }
    let out = engine
        .paginate(&EditContext::new(
            &edited,
            &doc,
            Selection::cursor(1),
            EditMeta::deleting(),
        ))
        .into_doc();

    assert_eq!(out.child_count(), 1);
    assert_eq!(
        ids_of(&out.content[0]),
        vec!["p0", "p10", "p20", "p30", "p40"]
    );
}

#[test]
fn test_ordered_list_continues_numbering() {
    let items = (0..15)
        .map(|i| Node::list_item(format!("li{}", i), vec![Node::paragraph(format!("lp{}", i), "abcd")]))
        .collect();
    let doc = Node::doc(vec![Node::page(
        "page",
        1,
        vec![Node::ordered_list("ol", None, items)],
    )]);
    let mut engine = engine();
    let out = engine.paginate_initial(&doc).into_doc();

    assert_eq!(out.child_count(), 2);
    let first = &out.content[0].content[0];
    let rest = &out.content[1].content[0];
    assert_eq!(first.child_count(), 10);
    assert_eq!(rest.kind, NodeKind::OrderedList);
    assert_eq!(rest.child_count(), 5);
    assert_eq!(rest.attrs.start, Some(11));
    assert!(rest.attrs.extend);

    // shrinking the first half lets the continuation rejoin its list
    let mut edited = out.clone();
    edited.content[0].content[0].content.truncate(5);
    let merged = engine
        .paginate(&EditContext::new(
            &edited,
            &out,
            Selection::cursor(2),
            EditMeta::deleting(),
        ))
        .into_doc();
    assert_eq!(merged.child_count(), 1);
    let list = &merged.content[0].content[0];
    assert_eq!(merged.content[0].child_count(), 1);
    assert_eq!(list.child_count(), 10);
    assert_eq!(list.attrs.start, None);
    assert!(!list.attrs.extend);
}

fn words(n: usize) -> String {
    vec!["abcd"; n].join(" ")
}

/// Numbers shown by ordered-list items, in document order. Continuation
/// items carry on their head's number and show none.
fn displayed_numbers(doc: &Node) -> Vec<(String, u32)> {
    let mut shown = Vec::new();
    for page in &doc.content {
        for list in page.content.iter().filter(|n| n.kind == NodeKind::OrderedList) {
            let mut number = list.attrs.start.unwrap_or(1);
            for item in list.content.iter().filter(|item| !item.attrs.extend) {
                let id = item.id().map(|id| id.to_string()).unwrap_or_default();
                shown.push((id, number));
                number += 1;
            }
        }
    }
    shown
}

#[test]
fn test_item_spanning_three_pages_keeps_numbering() {
    let paragraphs = (0..25)
        .map(|i| Node::paragraph(format!("q{}", i), "abcd"))
        .collect();
    let items = vec![
        Node::list_item("li0", vec![Node::paragraph("a", "abcd")]),
        Node::list_item("li1", paragraphs),
        Node::list_item("li2", vec![Node::paragraph("c", "abcd")]),
    ];
    let doc = Node::doc(vec![Node::page(
        "page",
        1,
        vec![Node::ordered_list("ol", None, items)],
    )]);
    let mut engine = engine();
    let out = engine.paginate_initial(&doc).into_doc();

    assert_eq!(out.child_count(), 3);
    let tails: Vec<&Node> = out.content[1..]
        .iter()
        .map(|page| &page.content[0].content[0])
        .collect();
    assert!(tails.iter().all(|item| item.attrs.extend));
    assert_eq!(tails[0].child_count(), 10);
    assert_eq!(tails[1].child_count(), 6);
    assert_eq!(
        displayed_numbers(&out),
        vec![
            ("li0".to_string(), 1),
            ("li1".to_string(), 2),
            ("li2".to_string(), 3)
        ]
    );
}

#[test]
fn test_fixed_block_continues_as_extension() {
    let doc = Node::doc(vec![Node::page(
        "page",
        1,
        vec![Node::fixed_block("fx", lines(12))],
    )]);
    let mut engine = engine();
    let out = engine.paginate_initial(&doc).into_doc();

    assert_eq!(out.child_count(), 2);
    let head = &out.content[0].content[0];
    let tail = &out.content[1].content[0];
    assert_eq!(head.kind, NodeKind::FixedBlock);
    assert_eq!(head.child_count(), 9);
    assert_eq!(tail.kind, NodeKind::FixedBlockExtend);
    assert!(tail.attrs.extend);
    assert_eq!(ids_of(tail), vec!["p9", "p10", "p11"]);
}

#[test]
fn test_heading_taller_than_page_is_split() {
    let text = words(60);
    let doc = Node::doc(vec![Node::page(
        "page",
        1,
        vec![Node::heading("h", 1, &text)],
    )]);
    let mut engine = engine();
    let out = engine.paginate_initial(&doc).into_doc();

    assert_eq!(out.child_count(), 2);
    let head = &out.content[0].content[0];
    let tail = &out.content[1].content[0];
    assert_eq!(head.kind, NodeKind::Heading);
    assert_eq!(head.text_content().chars().count(), 200);
    assert_eq!(tail.kind, NodeKind::Heading);
    assert_eq!(tail.attrs.level, Some(1));
    assert!(tail.attrs.extend);
    assert_eq!(format!("{}{}", head.text_content(), tail.text_content()), text);
}

#[test]
fn test_pages_stay_within_budget() {
    let mut blocks = Vec::new();
    for i in 0..6 {
        blocks.push(Node::heading(format!("h{}", i), 2, &format!("Section {}", i)));
        blocks.push(Node::paragraph(format!("intro{}", i), &words(23)));
        let items = (0..4)
            .map(|j| {
                Node::list_item(
                    format!("li{}-{}", i, j),
                    vec![Node::paragraph(format!("lp{}-{}", i, j), &words(3 + 4 * j))],
                )
            })
            .collect();
        blocks.push(Node::bullet_list(format!("ul{}", i), items));
        blocks.push(Node::paragraph(format!("body{}", i), &words(35)));
    }
    let doc = Node::doc(vec![Node::page("page", 1, blocks)]);
    let mut engine = engine();
    let out = engine.paginate_initial(&doc).into_doc();

    assert!(out.child_count() > 2);
    assert_eq!(out.text_content(), doc.text_content());
    let budget = engine.config().layout.content_height();
    let slack = engine.oracle_mut().default_block_height();
    for page in &out.content {
        let height = engine
            .oracle_mut()
            .render_and_measure(&to_markup(page))
            .height;
        assert!(
            height <= budget + slack,
            "page {:?} is {} px",
            page.attrs.page_number,
            height
        );
    }
}

#[test]
fn test_duplicate_and_missing_ids_are_resolved() {
    let anonymous = Node::element(NodeKind::Paragraph, Attrs::default(), vec![Node::text("x")]);
    let doc = Node::doc(vec![Node::page(
        "page",
        1,
        vec![
            Node::paragraph("dup", "Hello"),
            Node::paragraph("dup", "Hello world"),
            anonymous,
        ],
    )]);
    let mut engine = engine();
    let out = engine
        .paginate(&EditContext::new(
            &doc,
            &doc,
            Selection::cursor(1),
            EditMeta::default(),
        ))
        .into_doc();

    let ids = all_ids(&out);
    let unique: HashSet<&String> = ids.iter().collect();
    assert_eq!(ids.len(), 4);
    assert_eq!(unique.len(), ids.len());
    assert_eq!(ids_of(&out.content[0])[1], "dup");
    assert_eq!(out.content[0].content[0].text_content(), "Hello");
}

fn extended(mut node: Node) -> Node {
    node.attrs.extend = true;
    node
}

#[test]
fn test_malformed_continuation_pair_is_repaired() {
    let doc = Node::doc(vec![
        Node::page("p1", 1, vec![Node::paragraph("a", "a")]),
        Node::page(
            "p2",
            2,
            vec![
                extended(Node::paragraph("b", "b")),
                extended(Node::heading("h", 1, "Title")),
                Node::heading("plain", 2, "Plain"),
                extended(Node::paragraph("tail", "tail")),
            ],
        ),
    ]);
    let head = doc.content_size() - 2;
    let mut engine = engine();
    let out = engine
        .paginate(&EditContext::new(
            &doc,
            &doc,
            Selection::cursor(head),
            EditMeta::inserting(),
        ))
        .into_doc();

    let page = &out.content[1];
    assert_eq!(page.child_count(), 3);
    assert_eq!(page.content[0].kind, NodeKind::Paragraph);
    assert_eq!(page.content[0].text_content(), "bTitle");
    // a continuation after an ordinary heading stays where it is
    assert_eq!(page.content[1].kind, NodeKind::Heading);
    assert_eq!(page.content[1].text_content(), "Plain");
    assert_eq!(page.content[2].text_content(), "tail");
    assert!(page.content[2].attrs.extend);
}

#[test]
fn test_empty_pages_and_numbers_are_cleaned_up() {
    let doc = Node::doc(vec![
        Node::page("p1", 7, vec![Node::paragraph("a", "a")]),
        Node::page("p2", 9, vec![Node::paragraph("b", "b")]),
        Node::page("p3", 3, Vec::new()),
    ]);
    let mut engine = engine();
    let out = engine
        .paginate(&EditContext::new(
            &doc,
            &doc,
            Selection::cursor(1),
            EditMeta::default(),
        ))
        .into_doc();

    assert_eq!(out.child_count(), 2);
    let numbers: Vec<u32> = page_shells(&out).iter().map(|shell| shell.page_number).collect();
    assert_eq!(numbers, vec![1, 2]);
}

#[test]
fn test_emptied_first_page_gets_a_paragraph() {
    let prev = Node::doc(vec![Node::page("p1", 1, vec![Node::paragraph("a", "a")])]);
    let doc = Node::doc(vec![Node::page("p1", 1, Vec::new())]);
    let mut engine = engine();
    let out = engine
        .paginate(&EditContext::new(
            &doc,
            &prev,
            Selection::cursor(1),
            EditMeta::default(),
        ))
        .into_doc();

    let page = &out.content[0];
    assert_eq!(page.child_count(), 1);
    assert_eq!(page.content[0].kind, NodeKind::Paragraph);
    assert!(page.content[0].id().is_some());
}

#[test]
fn test_page_labels() {
    let mut engine = engine();
    let doc = five_pages(&mut engine);
    let mut numbers = engine.config().layout.page_numbers;
    numbers.show = true;
    numbers.show_count = true;

    let labels: Vec<Option<String>> = engine
        .page_shells(&doc)
        .iter()
        .map(|shell| shell.label(&numbers))
        .collect();
    assert_eq!(labels[2].as_deref(), Some("3 of 5"));
    assert_eq!(labels.len(), 5);
}

#[test]
fn test_configuration_errors() {
    let zero_cache = PaginationConfig {
        cache_capacity: 0,
        ..config()
    };
    assert_eq!(
        PaginationEngine::new(zero_cache, HeadlessOracle::default()).err(),
        Some(PageError::ZeroCacheCapacity)
    );

    let parsed: PaginationConfig =
        serde_json::from_str(r#"{"layout":{"pageWidth":600},"cacheCapacity":5}"#).unwrap();
    assert_eq!(parsed.layout.page_width, 600.0);
    assert_eq!(parsed.layout.page_height, 1056.0);
    assert_eq!(parsed.cache_capacity, 5);
    assert_eq!(parsed.positions_per_page, 1000);
}

#[test]
fn test_cache_stays_within_capacity() {
    let small = PaginationConfig {
        cache_capacity: 5,
        ..config()
    };
    let mut engine = PaginationEngine::new(small, HeadlessOracle::default())
        .unwrap()
        .with_ids(SequentialIds::new("t"));
    let doc = Node::doc(vec![Node::page("page", 1, lines(50))]);
    let out = engine.paginate_initial(&doc).into_doc();

    assert_eq!(out.child_count(), 5);
    assert!(engine.cache().max_len() <= 5);
}

#[test]
fn test_edits_between_frames_coalesce() {
    let mut engine = engine();
    let ten = Node::doc(vec![Node::page("page", 1, lines(10))]);
    let twelve = Node::doc(vec![Node::page("page", 1, lines(12))]);
    let three = Node::doc(vec![Node::page("page", 1, lines(3))]);

    let first = engine.view_updated(&twelve, &ten, Selection::cursor(70));
    let second = engine.view_updated(&three, &twelve, Selection::cursor(1));
    assert!(first.is_some() && second.is_some());
    assert_ne!(first, second);
    assert!(!engine.cancel(first.unwrap()));

    let meta = engine.on_frame().unwrap();
    assert!(meta.inserting && meta.deleting);
    assert_eq!(engine.on_frame(), None);
}

#[test]
fn test_overflowing_paragraph_opens_a_new_page() {
    let mut engine = engine();
    let doc = Node::doc(vec![Node::page("page", 1, lines(40))]);
    let four = engine.paginate_initial(&doc).into_doc();
    assert_eq!(four.child_count(), 4);

    let mut edited = four.clone();
    if let Some(last) = edited.content.last_mut() {
        last.content.push(Node::paragraph("new", &vec!["abcd"; 15].join(" ")));
    }
    let head = edited.content_size() - 3;
    let out = engine
        .paginate(&EditContext::new(
            &edited,
            &four,
            Selection::cursor(head),
            EditMeta::inserting(),
        ))
        .into_doc();

    assert_eq!(out.child_count(), 5);
    assert_eq!(out.content[3].child_count(), 10);
    assert_eq!(ids_of(&out.content[4]), vec!["new"]);
}

#[test]
fn test_clearing_every_page_leaves_one() {
    let mut engine = engine();
    let doc = five_pages(&mut engine);

    let mut edited = doc.clone();
    for page in &mut edited.content {
        page.content.clear();
    }
    edited.content[0].content.push(Node::paragraph("typed", "x"));
    let out = engine
        .paginate(&EditContext::new(
            &edited,
            &doc,
            Selection::cursor(2),
            EditMeta::deleting(),
        ))
        .into_doc();

    assert_eq!(out.child_count(), 1);
    assert_eq!(ids_of(&out.content[0]), vec!["typed"]);
    assert_eq!(out.content[0].attrs.page_number, Some(1));
}
