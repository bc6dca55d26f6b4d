//! Purpose: Load the labeled constructor-test corpus.
//! Exports: `FileEntry`, `TestCase`, `Expectation`, `load_corpus`,
//!   `parse_corpus`, `ordered_cases`.
//! Role: Decode the WPT-style JSON array of comments and test cases.
//! Invariants: Corpus problems surface as the distinct could-not-run state
//!   (`Io`/`Corpus`), never as test failures.
//! Invariants: Test numbers count test-case entries only and are stable
//!   across marker and pass filtering.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::core::error::{Error, ErrorKind};
use crate::core::values::UrlValues;

/// What a test case expects of the parse.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Expectation {
    /// The input must be rejected.
    Failure,
    /// The input must parse to exactly these values.
    Values(UrlValues),
}

/// One labeled fixture from the corpus.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TestCase {
    pub input: String,
    pub base: Option<String>,
    pub expectation: Expectation,
}

/// One corpus entry: a comment/section marker or a test case.
///
/// Markers are preserved so positions can be correlated back to the source
/// file, but they do not consume test numbers.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FileEntry {
    Comment(String),
    Case(TestCase),
}

#[derive(Deserialize)]
struct RawCase {
    input: String,
    #[serde(default)]
    base: Option<String>,
    #[serde(default)]
    failure: bool,
    #[serde(default)]
    href: Option<String>,
    #[serde(default)]
    origin: Option<String>,
    #[serde(default)]
    protocol: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    hostname: Option<String>,
    #[serde(default)]
    port: Option<String>,
    #[serde(default)]
    pathname: Option<String>,
    #[serde(default)]
    search: Option<String>,
    #[serde(default)]
    hash: Option<String>,
}

impl RawCase {
    fn into_case(self, position: usize) -> Result<TestCase, Error> {
        let expectation = if self.failure {
            Expectation::Failure
        } else {
            let required = |field: Option<String>, name: &str| {
                field.ok_or_else(|| {
                    Error::new(ErrorKind::Corpus).with_message(format!(
                        "entry {position} expects success but lacks '{name}'"
                    ))
                })
            };
            Expectation::Values(UrlValues {
                href: required(self.href, "href")?,
                origin: self.origin,
                protocol: required(self.protocol, "protocol")?,
                username: required(self.username, "username")?,
                password: required(self.password, "password")?,
                host: self.host,
                hostname: required(self.hostname, "hostname")?,
                port: required(self.port, "port")?,
                pathname: required(self.pathname, "pathname")?,
                search: required(self.search, "search")?,
                hash: required(self.hash, "hash")?,
            })
        };
        Ok(TestCase {
            input: self.input,
            base: self.base,
            expectation,
        })
    }
}

/// Reads and decodes a corpus file.
pub fn load_corpus(path: &Path) -> Result<Vec<FileEntry>, Error> {
    let text = fs::read_to_string(path).map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to read corpus file")
            .with_path(path)
            .with_source(err)
    })?;
    parse_corpus(&text).map_err(|err| err.with_path(path))
}

/// Decodes corpus text: a JSON array of string markers and test cases.
pub fn parse_corpus(text: &str) -> Result<Vec<FileEntry>, Error> {
    let raw: Vec<Value> = serde_json::from_str(text).map_err(|err| {
        Error::new(ErrorKind::Corpus)
            .with_message("corpus is not a JSON array")
            .with_source(err)
    })?;
    let mut entries = Vec::with_capacity(raw.len());
    for (position, value) in raw.into_iter().enumerate() {
        match value {
            Value::String(comment) => entries.push(FileEntry::Comment(comment)),
            Value::Object(_) => {
                let case: RawCase = serde_json::from_value(value).map_err(|err| {
                    Error::new(ErrorKind::Corpus)
                        .with_message(format!("entry {position} is not a test case"))
                        .with_source(err)
                })?;
                entries.push(FileEntry::Case(case.into_case(position)?));
            }
            other => {
                return Err(Error::new(ErrorKind::Corpus).with_message(format!(
                    "entry {position} is neither a marker nor a test case: {other}"
                )));
            }
        }
    }
    Ok(entries)
}

/// Numbers the test cases in corpus order, skipping markers.
///
/// The numbering assigned here is the one `ClassifiedResult` carries; it
/// never changes when passing cases are dropped from a report.
pub fn ordered_cases(entries: &[FileEntry]) -> Vec<(usize, &TestCase)> {
    entries
        .iter()
        .filter_map(|entry| match entry {
            FileEntry::Case(case) => Some(case),
            FileEntry::Comment(_) => None,
        })
        .enumerate()
        .collect()
}
