//! Purpose: Serialized access to a single embedded scripting engine.
//! Exports: `EngineBackend`, `BackendException`, `JsErrorKind`,
//!   `RaisedException`, `EvaluateError`, `ScriptEngine`.
//! Role: The only path to the engine; owns the worker thread and queue.
//! Invariants: One evaluation in flight per engine; requests served FIFO.
//! Invariants: Bootstrap failure aborts construction; no partial engine.
//! Invariants: Exception classification is total and never fails.

use std::error::Error as StdError;
use std::fmt;
use std::thread;

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use crate::core::error::{Error, ErrorKind};

/// An exception reported by an engine backend.
///
/// `name` is the thrown value's error-constructor name when the engine can
/// report one (`"TypeError"`, `"RangeError"`, ...); backends that cannot
/// name the thrown value leave it `None`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BackendException {
    pub name: Option<String>,
    pub message: String,
}

impl BackendException {
    pub fn new(name: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            name: name.map(str::to_string),
            message: message.into(),
        }
    }
}

impl fmt::Display for BackendException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name}: {}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl StdError for BackendException {}

/// The external-engine capability.
///
/// `script` is evaluated as the body of a function; the value it returns,
/// encoded as JSON, is the evaluation result (`undefined` maps to JSON
/// null). Implementations are driven from a single worker thread and are
/// never invoked reentrantly.
pub trait EngineBackend: Send {
    fn evaluate(&mut self, script: &str) -> Result<Value, BackendException>;
}

/// Closed classification of engine exceptions.
///
/// Anything the engine throws that is not one of the built-in error types
/// lands on `UnknownOrCustom`; call sites must handle that arm.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum JsErrorKind {
    UnknownOrCustom,
    Eval,
    Range,
    Reference,
    Syntax,
    Type,
    Uri,
    Aggregate,
    Internal,
}

impl JsErrorKind {
    /// Maps a reported error name onto the closed set. Total: unrecognized
    /// or missing names classify as `UnknownOrCustom`.
    pub fn classify(name: Option<&str>) -> Self {
        match name {
            Some("EvalError") => JsErrorKind::Eval,
            Some("RangeError") => JsErrorKind::Range,
            Some("ReferenceError") => JsErrorKind::Reference,
            Some("SyntaxError") => JsErrorKind::Syntax,
            Some("TypeError") => JsErrorKind::Type,
            Some("URIError") => JsErrorKind::Uri,
            Some("AggregateError") => JsErrorKind::Aggregate,
            Some("InternalError") => JsErrorKind::Internal,
            _ => JsErrorKind::UnknownOrCustom,
        }
    }
}

/// A classified exception raised by a script evaluation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RaisedException {
    pub kind: JsErrorKind,
    pub name: Option<String>,
    pub message: String,
}

impl fmt::Display for RaisedException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name}: {}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl StdError for RaisedException {}

/// Outcome of `ScriptEngine::evaluate` other than a value.
#[derive(Debug)]
pub enum EvaluateError {
    /// The script threw; the exception has been classified.
    Raised(RaisedException),
    /// The engine itself failed (worker gone, reply dropped).
    Engine(Error),
}

impl fmt::Display for EvaluateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvaluateError::Raised(raised) => write!(f, "script raised {raised}"),
            EvaluateError::Engine(err) => write!(f, "{err}"),
        }
    }
}

impl StdError for EvaluateError {}

struct EvalRequest {
    script: String,
    reply: oneshot::Sender<Result<Value, EvaluateError>>,
}

/// Owns one engine instance behind a FIFO request queue.
///
/// The backend lives on a dedicated worker thread; callers suspend on a
/// oneshot reply. All evaluations on one `ScriptEngine` execute strictly in
/// request order, one at a time. There is no cancellation: a request that
/// has been queued will run to completion even if its caller went away.
#[derive(Debug)]
pub struct ScriptEngine {
    tx: mpsc::UnboundedSender<EvalRequest>,
}

impl ScriptEngine {
    /// Moves `backend` onto a worker thread and evaluates `bootstrap`
    /// scripts in order. Any bootstrap exception fails construction.
    pub fn new(
        backend: impl EngineBackend + 'static,
        bootstrap: Vec<String>,
    ) -> Result<Self, Error> {
        let (tx, rx) = mpsc::unbounded_channel();
        let (ready_tx, ready_rx) = std::sync::mpsc::channel();
        thread::Builder::new()
            .name("script-engine".to_string())
            .spawn(move || worker(backend, bootstrap, rx, ready_tx))
            .map_err(|err| {
                Error::new(ErrorKind::Internal)
                    .with_message("failed to spawn engine worker")
                    .with_source(err)
            })?;
        ready_rx.recv().map_err(|_| {
            Error::new(ErrorKind::Internal).with_message("engine worker exited during startup")
        })??;
        Ok(Self { tx })
    }

    /// Evaluates `script` on the owned engine.
    ///
    /// Suspends while queued and while the engine runs. Concurrent callers
    /// are served first-requested, first-served.
    pub async fn evaluate(&self, script: impl Into<String>) -> Result<Value, EvaluateError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let request = EvalRequest {
            script: script.into(),
            reply: reply_tx,
        };
        if self.tx.send(request).is_err() {
            return Err(EvaluateError::Engine(worker_gone()));
        }
        match reply_rx.await {
            Ok(outcome) => outcome,
            Err(_) => Err(EvaluateError::Engine(worker_gone())),
        }
    }
}

fn worker_gone() -> Error {
    Error::new(ErrorKind::Engine).with_message("engine worker is gone")
}

fn worker(
    mut backend: impl EngineBackend,
    bootstrap: Vec<String>,
    mut rx: mpsc::UnboundedReceiver<EvalRequest>,
    ready_tx: std::sync::mpsc::Sender<Result<(), Error>>,
) {
    for (index, script) in bootstrap.iter().enumerate() {
        if let Err(raised) = backend.evaluate(script) {
            let _ = ready_tx.send(Err(Error::new(ErrorKind::Bootstrap)
                .with_message(format!("bootstrap script {index} raised: {raised}"))));
            return;
        }
    }
    tracing::debug!(scripts = bootstrap.len(), "engine worker ready");
    if ready_tx.send(Ok(())).is_err() {
        return;
    }

    while let Some(request) = rx.blocking_recv() {
        let outcome = backend.evaluate(&request.script).map_err(|exception| {
            let kind = JsErrorKind::classify(exception.name.as_deref());
            EvaluateError::Raised(RaisedException {
                kind,
                name: exception.name,
                message: exception.message,
            })
        });
        // The caller may have given up on the reply; that is its business.
        let _ = request.reply.send(outcome);
    }
    tracing::debug!("engine worker shutting down");
}
