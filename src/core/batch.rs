//! Purpose: Classify an entire labeled corpus against one implementation.
//! Exports: `TestFailure`, `TestFailures`, `ClassifiedResult`,
//!   `BatchReport`, `BatchHarness`.
//! Role: The batch state machine; walks the corpus in order, sequentially.
//! Invariants: Only mismatching cases are retained; passing cases are
//!   dropped to bound memory on large corpora.
//! Invariants: Test numbers come from corpus load order and are never
//!   reassigned; markers do not consume numbers.
//! Invariants: The six failure tags are independent; the schema holds all
//!   of them even though this harness computes only the parse-and-compare
//!   subset.

use std::fmt;

use crate::core::corpus::{ordered_cases, Expectation, FileEntry, TestCase};
use crate::core::error::Error;
use crate::core::reference::ReferenceParser;
use crate::core::sut::SystemUnderTest;
use crate::core::values::{diff, UrlValues};

/// One independent failure tag.
///
/// The first three are reserved for the fuller constructor-test protocol
/// (base-URL validation and reparse idempotence); this harness records the
/// last three.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TestFailure {
    BaseUrlFailedToParse,
    InputDidNotFailWhenUsedAsBase,
    NotIdempotent,
    UnexpectedFailureToParse,
    UnexpectedSuccessfulParse,
    PropertyMismatch,
}

impl TestFailure {
    pub const ALL: [TestFailure; 6] = [
        TestFailure::BaseUrlFailedToParse,
        TestFailure::InputDidNotFailWhenUsedAsBase,
        TestFailure::NotIdempotent,
        TestFailure::UnexpectedFailureToParse,
        TestFailure::UnexpectedSuccessfulParse,
        TestFailure::PropertyMismatch,
    ];

    /// Stable report label.
    pub fn label(self) -> &'static str {
        match self {
            TestFailure::BaseUrlFailedToParse => "base-url-failed-to-parse",
            TestFailure::InputDidNotFailWhenUsedAsBase => "input-did-not-fail-as-base-url",
            TestFailure::NotIdempotent => "not-idempotent",
            TestFailure::UnexpectedFailureToParse => "unexpected-failure-to-parse",
            TestFailure::UnexpectedSuccessfulParse => "unexpected-successful-parse",
            TestFailure::PropertyMismatch => "property-mismatch",
        }
    }

    fn bit(self) -> u8 {
        match self {
            TestFailure::BaseUrlFailedToParse => 1 << 0,
            TestFailure::InputDidNotFailWhenUsedAsBase => 1 << 1,
            TestFailure::NotIdempotent => 1 << 2,
            TestFailure::UnexpectedFailureToParse => 1 << 3,
            TestFailure::UnexpectedSuccessfulParse => 1 << 4,
            TestFailure::PropertyMismatch => 1 << 5,
        }
    }
}

/// Set of independent failure tags for one test case.
#[derive(Clone, Copy, Default, Eq, PartialEq)]
pub struct TestFailures(u8);

impl TestFailures {
    pub fn insert(&mut self, failure: TestFailure) {
        self.0 |= failure.bit();
    }

    pub fn contains(self, failure: TestFailure) -> bool {
        self.0 & failure.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = TestFailure> {
        TestFailure::ALL
            .into_iter()
            .filter(move |failure| self.contains(*failure))
    }
}

impl fmt::Debug for TestFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// One mismatching test case with everything needed to inspect it.
#[derive(Clone, Debug)]
pub struct ClassifiedResult {
    pub test_number: usize,
    pub case: TestCase,
    pub actual: Option<UrlValues>,
    pub failures: TestFailures,
}

/// Outcome of a batch run that ran to completion.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub total_entries: usize,
    pub cases_run: usize,
    pub mismatches: Vec<ClassifiedResult>,
}

impl BatchReport {
    pub fn is_clean(&self) -> bool {
        self.mismatches.is_empty()
    }
}

enum Subject {
    Reference(ReferenceParser),
    SystemUnderTest(Box<dyn SystemUnderTest>),
}

/// Runs a corpus against one implementation and classifies every case.
///
/// The harness is symmetric over which side is being validated: point it at
/// the reference parser to vet the corpus labels, or at a system under test
/// to vet the implementation.
pub struct BatchHarness {
    subject: Subject,
}

impl BatchHarness {
    pub fn against_reference(parser: ReferenceParser) -> Self {
        Self {
            subject: Subject::Reference(parser),
        }
    }

    pub fn against_sut(sut: impl SystemUnderTest + 'static) -> Self {
        Self {
            subject: Subject::SystemUnderTest(Box::new(sut)),
        }
    }

    /// Walks `entries` in corpus order, sequentially; one engine serves the
    /// whole run, so in-run concurrency would buy nothing.
    ///
    /// Infrastructure faults abort the run; mismatches do not.
    pub async fn run_all(&self, entries: &[FileEntry]) -> Result<BatchReport, Error> {
        let cases = ordered_cases(entries);
        let cases_run = cases.len();
        let mut mismatches = Vec::new();
        for (test_number, case) in cases {
            let actual = match &self.subject {
                Subject::Reference(parser) => parser
                    .parse(&case.input, case.base.as_deref())
                    .await
                    .map_err(|err| err.with_test_number(test_number))?,
                Subject::SystemUnderTest(sut) => sut.parse(&case.input, case.base.as_deref()),
            };
            let failures = classify(case, actual.as_ref());
            if failures.is_empty() {
                continue;
            }
            tracing::debug!(test_number, failures = ?failures, "mismatch");
            mismatches.push(ClassifiedResult {
                test_number,
                case: case.clone(),
                actual,
                failures,
            });
        }
        Ok(BatchReport {
            total_entries: entries.len(),
            cases_run,
            mismatches,
        })
    }
}

fn classify(case: &TestCase, actual: Option<&UrlValues>) -> TestFailures {
    let mut failures = TestFailures::default();
    match (actual, &case.expectation) {
        (None, Expectation::Failure) => {}
        (None, Expectation::Values(_)) => failures.insert(TestFailure::UnexpectedFailureToParse),
        (Some(_), Expectation::Failure) => failures.insert(TestFailure::UnexpectedSuccessfulParse),
        (Some(actual), Expectation::Values(expected)) => {
            if !diff(Some(expected), Some(actual)).is_empty() {
                failures.insert(TestFailure::PropertyMismatch);
            }
        }
    }
    failures
}
