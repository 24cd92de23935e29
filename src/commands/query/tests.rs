use rusqlite::Connection;

use super::search::snippet;
use super::*;
use crate::cli::DuplicatePolicy;
use crate::commands::ingest::{PosterDraft, enable_foreign_keys, ensure_schema, persist_poster};
use crate::model::StructuralBlock;

fn seeded_store() -> Connection {
    let mut connection = Connection::open_in_memory().expect("in-memory db");
    enable_foreign_keys(&connection).expect("foreign keys");
    ensure_schema(&connection).expect("schema");

    let posters = [
        ("p1", "Graph Neural Networks", vec!["Ada Lovelace"], "Message passing on molecules."),
        ("p2", "Protein Folding", vec!["Grace Hopper", "Alan Turing"], "Folding graphs 100% solved_x."),
        ("p3", "Soil Microbes", vec!["Alan Turing"], "Nothing relevant here."),
    ];
    for (poster_id, title, authors, text) in posters {
        let draft = PosterDraft {
            poster_id: Some(poster_id.to_string()),
            title: Some(title.to_string()),
            authors: authors.into_iter().map(str::to_string).collect(),
            text_content: text.to_string(),
            ..PosterDraft::default()
        };
        persist_poster(&mut connection, &draft, DuplicatePolicy::Reject).expect("persist");
    }
    connection
}

fn filter(query: Option<&str>, author: Option<&str>) -> SearchFilter {
    SearchFilter {
        query: query.map(str::to_string),
        author: author.map(str::to_string),
        page: 1,
        page_size: 10,
    }
}

#[test]
fn search_matches_title_authors_and_text_case_insensitively() {
    let connection = seeded_store();

    let page = search_posters(&connection, &filter(Some("GRAPH"), None)).expect("search");
    assert_eq!(page.total, 2);
    let ids = page
        .items
        .iter()
        .map(|item| item.poster_id.as_deref().unwrap_or_default())
        .collect::<Vec<_>>();
    assert_eq!(ids, vec!["p1", "p2"]);

    let page = search_posters(&connection, &filter(Some("hopper"), None)).expect("search");
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].authors, vec!["Grace Hopper", "Alan Turing"]);
}

#[test]
fn search_combines_query_and_author_filters() {
    let connection = seeded_store();

    let page = search_posters(&connection, &filter(None, Some("turing"))).expect("search");
    assert_eq!(page.total, 2);

    let page =
        search_posters(&connection, &filter(Some("folding"), Some("Turing"))).expect("search");
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].title.as_deref(), Some("Protein Folding"));

    let page = search_posters(&connection, &filter(Some("  "), None)).expect("search");
    assert_eq!(page.total, 3);
}

#[test]
fn search_treats_like_wildcards_literally() {
    let connection = seeded_store();

    let page = search_posters(&connection, &filter(Some("100%"), None)).expect("search");
    assert_eq!(page.total, 1);

    let page = search_posters(&connection, &filter(Some("d_x"), None)).expect("search");
    assert_eq!(page.total, 1);

    let page = search_posters(&connection, &filter(Some("%"), None)).expect("search");
    assert_eq!(page.total, 1);
}

#[test]
fn search_pages_in_id_order() {
    let connection = seeded_store();
    let mut paged = filter(None, None);
    paged.page_size = 2;

    let first = search_posters(&connection, &paged).expect("first page");
    assert_eq!(first.total, 3);
    assert_eq!(first.items.len(), 2);

    paged.page = 2;
    let second = search_posters(&connection, &paged).expect("second page");
    assert_eq!(second.items.len(), 1);
    assert!(second.items[0].id > first.items[1].id);

    paged.page = 3;
    assert!(search_posters(&connection, &paged).expect("past end").items.is_empty());
}

#[test]
fn snippet_truncates_long_text_on_char_boundary() {
    let long = "é".repeat(300);
    let short = snippet(&long);

    assert_eq!(short.chars().count(), 263);
    assert!(short.ends_with("..."));
    assert_eq!(snippet("short"), "short");
    assert_eq!(snippet(&"x".repeat(260)), "x".repeat(260));
}

#[test]
fn detail_returns_children_in_insertion_order() {
    let mut connection = seeded_store();
    let draft = PosterDraft {
        poster_id: Some("p4".to_string()),
        title: Some("Detailed".to_string()),
        authors: vec!["Ada".to_string()],
        text_content: "body".to_string(),
        blocks: vec![
            StructuralBlock {
                block_label: Some("title".to_string()),
                block_content: Some("Detailed".to_string()),
                block_bbox: Some([1, 2, 30, 40].map(serde_json::Number::from)),
            },
            StructuralBlock {
                block_label: Some("text".to_string()),
                block_content: None,
                block_bbox: None,
            },
        ],
        figures: vec!["b.png".to_string(), "a.png".to_string()],
        tables: vec!["| t |\n| - |".to_string()],
        ..PosterDraft::default()
    };
    let id = persist_poster(&mut connection, &draft, DuplicatePolicy::Reject).expect("persist");

    let detail = load_poster_detail(&connection, id)
        .expect("load detail")
        .expect("poster exists");
    assert_eq!(detail.poster_id.as_deref(), Some("p4"));
    assert_eq!(detail.authors, vec!["Ada"]);
    assert_eq!(detail.blocks.len(), 2);
    assert_eq!(
        detail.blocks[0].block_bbox,
        Some(serde_json::json!([1, 2, 30, 40]))
    );
    assert_eq!(detail.blocks[1].block_bbox, None);
    assert_eq!(detail.figures, vec!["b.png", "a.png"]);
    assert_eq!(detail.tables.len(), 1);
}

#[test]
fn detail_for_unknown_id_is_none() {
    let connection = seeded_store();
    assert!(load_poster_detail(&connection, 999).expect("load detail").is_none());
}
