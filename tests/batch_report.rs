//! Purpose: End-to-end coverage for corpus loading and batch classification.
//! Exports: Integration tests only.
//! Role: Verify the corpus-file-to-report flow over a stub-backed reference.
//! Invariants: Test numbers in reports correlate back to corpus positions.
//! Invariants: Corpus problems surface as the could-not-run error state,
//!   never as classified results.

use std::io::Write;

use serde_json::json;
use tempfile::NamedTempFile;
use urlparity::api::{
    encode_payload, load_corpus, BackendException, BatchHarness, ErrorKind, ReferenceParser,
    StubBackend, TestFailure,
};

const CORPUS: &str = r##"[
    "# WPT-style constructor corpus",
    {
        "input": "http://example.com/a b",
        "base": null,
        "href": "http://example.com/a%20b",
        "protocol": "http:",
        "username": "",
        "password": "",
        "host": "example.com",
        "hostname": "example.com",
        "port": "",
        "pathname": "/a%20b",
        "search": "",
        "hash": ""
    },
    "# rejection section",
    { "input": "not a url", "base": "about:blank", "failure": true },
    {
        "input": "http://example.com/drifting",
        "href": "http://example.com/drifting",
        "protocol": "http:",
        "username": "",
        "password": "",
        "host": "example.com",
        "hostname": "example.com",
        "port": "",
        "pathname": "/drifting",
        "search": "",
        "hash": ""
    }
]"##;

/// A reference stub that recognizes the corpus inputs by their encoded
/// payloads, the same way the generated scripts carry them.
fn scripted_reference() -> StubBackend {
    let space_case = encode_payload("http://example.com/a b");
    let rejected_case = encode_payload("not a url");
    let drifting_case = encode_payload("http://example.com/drifting");
    StubBackend::new(move |script| {
        if script.contains(&space_case) {
            Ok(json!({
                "href": "http://example.com/a%20b",
                "protocol": "http:",
                "username": "",
                "password": "",
                "host": "example.com",
                "hostname": "example.com",
                "port": "",
                "pathname": "/a%20b",
                "search": "",
                "hash": ""
            }))
        } else if script.contains(&rejected_case) {
            Err(BackendException::new(Some("TypeError"), "Invalid URL"))
        } else if script.contains(&drifting_case) {
            Ok(json!({
                "href": "http://example.com/drifted",
                "protocol": "http:",
                "username": "",
                "password": "",
                "host": "example.com",
                "hostname": "example.com",
                "port": "",
                "pathname": "/drifted",
                "search": "",
                "hash": ""
            }))
        } else {
            Err(BackendException::new(Some("TypeError"), "Invalid URL"))
        }
    })
}

fn corpus_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp corpus");
    file.write_all(contents.as_bytes()).expect("write corpus");
    file
}

#[tokio::test]
async fn corpus_file_runs_to_a_numbered_mismatch_report() {
    let file = corpus_file(CORPUS);
    let entries = load_corpus(file.path()).unwrap();

    let parser = ReferenceParser::new(scripted_reference()).unwrap();
    let harness = BatchHarness::against_reference(parser);
    let report = harness.run_all(&entries).await.unwrap();

    assert_eq!(report.total_entries, 5);
    assert_eq!(report.cases_run, 3);

    // Case 0 matches and case 1 correctly fails to parse; only the
    // drifting pathname survives into the report, numbered by corpus
    // position among test cases.
    assert_eq!(report.mismatches.len(), 1);
    let mismatch = &report.mismatches[0];
    assert_eq!(mismatch.test_number, 2);
    assert_eq!(mismatch.case.input, "http://example.com/drifting");
    assert!(mismatch.failures.contains(TestFailure::PropertyMismatch));
    assert_eq!(
        mismatch.actual.as_ref().unwrap().pathname,
        "/drifted"
    );
}

#[tokio::test]
async fn reference_infrastructure_faults_abort_the_run() {
    let file = corpus_file(CORPUS);
    let entries = load_corpus(file.path()).unwrap();

    let backend = StubBackend::raising("ReferenceError", "whatwgURL is not defined");
    let parser = ReferenceParser::new(backend).unwrap();
    let harness = BatchHarness::against_reference(parser);

    let err = harness.run_all(&entries).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Engine);
    assert_eq!(err.test_number(), Some(0));
}

#[test]
fn malformed_corpus_is_could_not_run() {
    let file = corpus_file("{ not json ]");
    let err = load_corpus(file.path()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Corpus);
}

#[test]
fn missing_corpus_file_is_could_not_run() {
    let err = load_corpus(std::path::Path::new("/nonexistent/corpus.json")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
}
