//! Purpose: Smoke coverage for the browser_tester-hosted engine backend.
//! Exports: Integration tests only.
//! Role: Prove the safe-encoding pipeline and the reference bridge against
//!   a real script runtime, not a stub.
//! Invariants: Strings cross into the engine and back byte-identical.
//! Invariants: The runtime's URL rejection surfaces as `None`, never as a
//!   harness error.

use serde_json::Value;
use urlparity::api::{decode_expr, BrowserBackend, ReferenceParser, ScriptEngine};

async fn engine_round_trip(input: &str) -> String {
    let engine = ScriptEngine::new(BrowserBackend::new(), Vec::new()).unwrap();
    let script = format!("return {};", decode_expr(input));
    match engine.evaluate(script).await.unwrap() {
        Value::String(text) => text,
        other => panic!("expected a string back, got {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn encoded_strings_survive_the_engine() {
    let cases = [
        "plain",
        "it's a 'quoted' string",
        "\"double\" and `backtick`",
        "back\\slash",
        "two\nlines",
        "emoji \u{1F980}",
        "atob('injected')//",
    ];
    for case in cases {
        assert_eq!(engine_round_trip(case).await, case);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn reference_parses_a_simple_url() {
    let parser = ReferenceParser::new(BrowserBackend::new()).unwrap();
    let values = parser
        .parse("http://example.com/path?q#f", None)
        .await
        .unwrap()
        .expect("reference should accept a plain absolute URL");
    assert_eq!(values.protocol, "http:");
    assert_eq!(values.hostname, "example.com");
    assert_eq!(values.pathname, "/path");
    assert_eq!(values.search, "?q");
    assert_eq!(values.hash, "#f");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn reference_rejects_garbage_as_invalid_url() {
    let parser = ReferenceParser::new(BrowserBackend::new()).unwrap();
    let outcome = parser.parse("not a url", None).await.unwrap();
    assert!(outcome.is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn undefined_results_map_to_null() {
    let engine = ScriptEngine::new(BrowserBackend::new(), Vec::new()).unwrap();
    let value = engine.evaluate("var unused = 1;").await.unwrap();
    assert_eq!(value, Value::Null);
}
