use std::fs;

use super::matcher::{ExactPosterId, ImagePathHasUnitPng};
use super::*;

fn record(poster_id: Option<&str>, image_path: Option<&str>) -> SourceMetadataRecord {
    SourceMetadataRecord {
        poster_id: poster_id.map(str::to_string),
        local_image_path: image_path.map(str::to_string),
        ..SourceMetadataRecord::default()
    }
}

fn key<'a>(unit_id: &'a str, candidate_filename: Option<&'a str>) -> UnitKey<'a> {
    UnitKey {
        unit_id,
        candidate_filename,
    }
}

#[test]
fn author_text_splits_on_every_delimiter() {
    let splitter = AuthorSplitter::new().expect("splitter");

    assert_eq!(
        splitter.split(Some(&AuthorField::Text("A, B and C".to_string()))),
        vec!["A", "B", "C"]
    );
    assert_eq!(
        splitter.split(Some(&AuthorField::Text(
            "Li Wei; Sandra Alexander / Kim · Park,".to_string()
        ))),
        vec!["Li Wei", "Sandra Alexander", "Kim", "Park"]
    );
}

#[test]
fn author_list_is_trimmed_and_missing_authors_are_empty() {
    let splitter = AuthorSplitter::new().expect("splitter");

    assert_eq!(
        splitter.split(Some(&AuthorField::List(vec![
            " Ada ".to_string(),
            String::new(),
            "Grace".to_string(),
        ]))),
        vec!["Ada", "Grace"]
    );
    assert!(splitter.split(None).is_empty());
    assert!(splitter.split(Some(&AuthorField::Text(" , and ;".to_string()))).is_empty());
}

#[test]
fn records_accept_numeric_ids_and_legacy_image_key() {
    let records: Vec<SourceMetadataRecord> = serde_json::from_str(
        r#"[
            {"poster_id": 29917, "title": "X", "authors": ["A", "B"], "local_png_path": "posters/29917.png"},
            {"poster_id": "  ", "authors": "C and D", "page_url": "https://example.org/p"},
            {"title": "no id", "extra": true}
        ]"#,
    )
    .expect("metadata parses");

    assert_eq!(records.len(), 3);
    assert_eq!(records[0].poster_id.as_deref(), Some("29917"));
    assert_eq!(records[0].local_image_path.as_deref(), Some("posters/29917.png"));
    assert_eq!(
        records[0].authors,
        Some(AuthorField::List(vec!["A".to_string(), "B".to_string()]))
    );
    assert_eq!(records[1].poster_id, None);
    assert_eq!(records[1].authors, Some(AuthorField::Text("C and D".to_string())));
    assert_eq!(records[2].poster_id, None);
    assert_eq!(records[2].title.as_deref(), Some("no id"));
}

#[test]
fn load_metadata_reads_file_and_rejects_missing_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("merged_posters.json");
    fs::write(&path, r#"[{"poster_id": "1", "title": "T"}]"#).expect("write metadata");

    let records = load_metadata(&path).expect("load metadata");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].title.as_deref(), Some("T"));

    let err = load_metadata(&dir.path().join("absent.json")).expect_err("missing file");
    assert!(err.to_string().contains("metadata file not found"));
}

#[test]
fn load_metadata_reports_malformed_json() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("broken.json");
    fs::write(&path, "{not json").expect("write metadata");

    let err = load_metadata(&path).expect_err("malformed metadata");
    assert!(format!("{err:#}").contains("failed to parse"));
}

#[test]
fn exact_id_wins_over_earlier_image_path_record() {
    let records = vec![
        record(Some("other"), Some("posters/29917.png")),
        record(Some("29917"), Some("posters/elsewhere.png")),
    ];
    let matcher = MetadataMatcher::default();

    let matched = matcher
        .find(&key("29917", Some("29917.png")), &records)
        .expect("match");
    assert_eq!(matched.strategy, "exact_poster_id");
    assert_eq!(matched.index, 1);
}

#[test]
fn image_path_rule_matches_when_no_id_equals_unit() {
    let records = vec![
        record(Some("1"), Some("posters/2.png")),
        record(None, Some("imgs/posters/777.png")),
    ];
    let matched = MetadataMatcher::default()
        .find(&key("777", None), &records)
        .expect("match");

    assert_eq!(matched.strategy, "image_path_unit_png");
    assert_eq!(matched.index, 1);
}

#[test]
fn filename_rule_is_case_insensitive() {
    let records = vec![record(None, Some("Posters/Scan_042.PNG"))];
    let matcher = MetadataMatcher::default();

    let matched = matcher
        .find(&key("scan_042", Some("scan_042.png")), &records)
        .expect("match");
    assert_eq!(matched.strategy, "image_path_filename");

    assert!(matcher.find(&key("scan_042", None), &records).is_none());
}

#[test]
fn unmatched_unit_returns_none() {
    let records = vec![
        record(Some("29917"), Some("posters/29917.png")),
        record(None, None),
    ];

    assert!(MetadataMatcher::default()
        .find(&key("99999", Some("99999.png")), &records)
        .is_none());
    assert!(MetadataMatcher::default().find(&key("1", None), &[]).is_none());
}

#[test]
fn custom_strategy_order_changes_precedence() {
    let records = vec![
        record(None, Some("posters/5.png")),
        record(Some("5"), None),
    ];
    let matcher = MetadataMatcher::with_strategies(vec![
        Box::new(ImagePathHasUnitPng),
        Box::new(ExactPosterId),
    ]);

    assert_eq!(matcher.strategy_names(), vec!["image_path_unit_png", "exact_poster_id"]);
    let matched = matcher.find(&key("5", None), &records).expect("match");
    assert_eq!(matched.index, 0);
}
