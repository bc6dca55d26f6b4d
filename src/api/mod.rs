//! Purpose: Define the stable public Rust API boundary for urlparity.
//! Exports: Engine bridge, reference parser, comparison, and batch types.
//! Role: Public, additive-only surface; hides internal module layout.
//! Invariants: This module is the only public path embedders should use.
//! Invariants: Internal module moves must not change these re-exports.

pub use crate::core::batch::{
    BatchHarness, BatchReport, ClassifiedResult, TestFailure, TestFailures,
};
pub use crate::core::browser::BrowserBackend;
pub use crate::core::corpus::{
    load_corpus, ordered_cases, parse_corpus, Expectation, FileEntry, TestCase,
};
pub use crate::core::encode::{decode_expr, decode_payload, encode_payload};
pub use crate::core::engine::{
    BackendException, EngineBackend, EvaluateError, JsErrorKind, RaisedException, ScriptEngine,
};
pub use crate::core::engine_stub::{Gate, StubBackend};
#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::live::{LiveComparison, LiveSink, LiveUpdate};
pub use crate::core::reference::{ReferenceParser, DEFAULT_CONSTRUCTOR};
pub use crate::core::sut::{RustUrl, SystemUnderTest};
pub use crate::core::values::{diff, UrlProperty, UrlValues};
