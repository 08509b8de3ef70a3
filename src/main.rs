//! Headless pagination demo
//! The main interface is through WASM bindings.

use page_flow::{
    page_shells, EditContext, EditMeta, HeadlessOracle, Node, PageLayout, PaginationConfig,
    PaginationEngine, Selection, SequentialIds,
};

fn sample_document() -> Node {
    let mut blocks = vec![Node::heading("title", 1, "Quarterly report")];
    for i in 0..12 {
        blocks.push(Node::paragraph(
            format!("intro-{}", i),
            &"Lorem ipsum dolor sit amet, consectetur adipiscing elit. ".repeat(4),
        ));
    }
    let items = (0..20)
        .map(|i| {
            Node::list_item(
                format!("item-{}", i),
                vec![Node::paragraph(format!("item-p-{}", i), &format!("Action item {}", i + 1))],
            )
        })
        .collect();
    blocks.push(Node::ordered_list("actions", None, items));
    Node::doc(vec![Node::page("page-1", 1, blocks)])
}

fn print_pages(doc: &Node, layout: &PageLayout) {
    for (page, shell) in doc.content.iter().zip(page_shells(doc)) {
        println!(
            "  page {:>2}: {:>2} blocks  label {:?}",
            shell.page_number,
            page.child_count(),
            shell.label(&layout.page_numbers)
        );
    }
}

fn main() {
    println!("page-flow headless demo");
    println!("=======================");

    let layout = PageLayout::default();
    let config = PaginationConfig::new(layout);
    let mut engine = match PaginationEngine::new(config, HeadlessOracle::default()) {
        Ok(engine) => engine.with_ids(SequentialIds::new("demo")),
        Err(err) => {
            eprintln!("invalid configuration: {}", err);
            return;
        }
    };

    let doc = sample_document();
    let paginated = engine.paginate_initial(&doc).into_doc();
    println!("initial pagination: {} pages", paginated.child_count());
    print_pages(&paginated, &layout);

    // drop the first page's content and let the rest flow back
    let mut edited = paginated.clone();
    if let Some(first) = edited.content.first_mut() {
        first.content.truncate(2);
    }
    let ctx = EditContext::new(&edited, &paginated, Selection::cursor(1), EditMeta::deleting());
    let reflowed = engine.paginate(&ctx).into_doc();
    println!("after deleting from page 1: {} pages", reflowed.child_count());
    if let Some(elapsed) = engine.last_pass_duration() {
        println!("reflow pass took {:?}", elapsed);
    }
    print_pages(&reflowed, &layout);

    let [markup, dimensions, elements] = engine.cache_stats();
    println!(
        "cache hit rates: markup {:.2}, dimensions {:.2}, elements {:.2}",
        markup.hit_rate(),
        dimensions.hit_rate(),
        elements.hit_rate()
    );
}
