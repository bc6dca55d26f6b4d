//! Purpose: Interactive comparison with latest-submission-wins delivery.
//! Exports: `LiveComparison`, `LiveUpdate`, `LiveSink`.
//! Role: Sequence rapidly reissued (input, base) pairs through the system
//!   under test and the reference parser.
//! Invariants: The sink only ever observes the most recently submitted
//!   request's result; superseded results are dropped after completion.
//! Invariants: The generation token is a staleness epoch, not cancellation;
//!   superseded engine work runs to completion unobserved.

use std::sync::{Arc, Mutex};

use serde::Serialize;
use tokio::task::JoinHandle;

use crate::core::error::Error;
use crate::core::reference::ReferenceParser;
use crate::core::sut::SystemUnderTest;
use crate::core::values::{diff, UrlProperty, UrlValues};

/// One delivered comparison.
#[derive(Clone, Debug, Serialize)]
pub struct LiveUpdate {
    pub generation: u64,
    pub input: String,
    pub base: Option<String>,
    pub sut: Option<UrlValues>,
    pub reference: Option<UrlValues>,
    pub diff: Vec<UrlProperty>,
}

/// Receives comparison results and engine faults.
///
/// `deliver` and `fault` are called while the controller holds its
/// submission lock; implementations must not call back into `submit`.
pub trait LiveSink: Send + Sync {
    fn deliver(&self, update: LiveUpdate);

    /// An infrastructure fault from the reference side. Faults from stale
    /// requests land here too; they must not be silently lost.
    fn fault(&self, error: Error) {
        tracing::error!(%error, "reference engine fault");
    }
}

impl<T: LiveSink + ?Sized> LiveSink for Arc<T> {
    fn deliver(&self, update: LiveUpdate) {
        (**self).deliver(update);
    }

    fn fault(&self, error: Error) {
        (**self).fault(error);
    }
}

/// Compares live-edited inputs against the reference implementation.
///
/// Submissions may overlap; each one captures a fresh generation token and
/// the sink sees a result only if no newer submission exists by the time
/// the reference parse completes.
pub struct LiveComparison {
    parser: Arc<ReferenceParser>,
    sut: Arc<dyn SystemUnderTest>,
    sink: Arc<dyn LiveSink>,
    generation: Arc<Mutex<u64>>,
}

impl LiveComparison {
    pub fn new(
        parser: ReferenceParser,
        sut: impl SystemUnderTest + 'static,
        sink: impl LiveSink + 'static,
    ) -> Self {
        Self {
            parser: Arc::new(parser),
            sut: Arc::new(sut),
            sink: Arc::new(sink),
            generation: Arc::new(Mutex::new(0)),
        }
    }

    /// Submits one (input, base) pair.
    ///
    /// The system under test runs synchronously here; the reference parse
    /// is spawned and suspends on the engine queue. The returned handle
    /// resolves when this submission's outcome is delivered or dropped.
    pub fn submit(&self, input: &str, base: Option<&str>) -> JoinHandle<()> {
        let token = {
            let mut generation = self.generation.lock().unwrap();
            *generation += 1;
            *generation
        };
        let sut_values = self.sut.parse(input, base);

        let parser = Arc::clone(&self.parser);
        let sink = Arc::clone(&self.sink);
        let generation = Arc::clone(&self.generation);
        let input = input.to_string();
        let base = base.map(str::to_string);
        tokio::spawn(async move {
            let outcome = parser.parse(&input, base.as_deref()).await;

            // Check-and-deliver is atomic with respect to submit, so a
            // completion racing a newer submission can never win.
            let current = generation.lock().unwrap();
            match outcome {
                Ok(reference) => {
                    if *current != token {
                        tracing::debug!(token, current = *current, "dropping superseded result");
                        return;
                    }
                    let diff = diff(sut_values.as_ref(), reference.as_ref());
                    sink.deliver(LiveUpdate {
                        generation: token,
                        input,
                        base,
                        sut: sut_values,
                        reference,
                        diff,
                    });
                }
                Err(error) => sink.fault(error),
            }
        })
    }
}
