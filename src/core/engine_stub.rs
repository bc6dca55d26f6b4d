// Scripted engine backend for harness tests.
//
// Deterministic stand-in for a real scripting engine: a programmable handler
// answers each script, an optional gate holds evaluations until the test
// releases them, and a script log records exactly what the worker ran, in
// order.

use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::core::engine::{BackendException, EngineBackend};

type Handler = Box<dyn FnMut(&str) -> Result<Value, BackendException> + Send>;

pub struct StubBackend {
    handler: Handler,
    log: Arc<Mutex<Vec<String>>>,
    gate: Option<Receiver<()>>,
    observer: Option<Sender<String>>,
}

/// Releases one gated evaluation per `release` call.
pub struct Gate {
    tx: Sender<()>,
}

impl Gate {
    pub fn release(&self) {
        let _ = self.tx.send(());
    }
}

impl StubBackend {
    pub fn new(
        handler: impl FnMut(&str) -> Result<Value, BackendException> + Send + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            log: Arc::new(Mutex::new(Vec::new())),
            gate: None,
            observer: None,
        }
    }

    /// A backend that answers every script with `value`.
    pub fn returning(value: Value) -> Self {
        Self::new(move |_script| Ok(value.clone()))
    }

    /// A backend that raises the same exception for every script.
    pub fn raising(name: &str, message: &str) -> Self {
        let exception = BackendException::new(Some(name), message);
        Self::new(move |_script| Err(exception.clone()))
    }

    /// Shared handle on the ordered log of evaluated scripts.
    pub fn script_log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.log)
    }

    /// Holds every evaluation (bootstrap included) until the returned gate
    /// releases it. The engine worker thread blocks while held.
    pub fn with_gate(mut self) -> (Self, Gate) {
        let (tx, rx) = channel();
        self.gate = Some(rx);
        (self, Gate { tx })
    }

    /// Sends each script to the returned receiver before evaluating it, so
    /// tests can wait for a request to reach the engine.
    pub fn with_observer(mut self) -> (Self, Receiver<String>) {
        let (tx, rx) = channel();
        self.observer = Some(tx);
        (self, rx)
    }
}

impl EngineBackend for StubBackend {
    fn evaluate(&mut self, script: &str) -> Result<Value, BackendException> {
        self.log.lock().unwrap().push(script.to_string());
        if let Some(observer) = &self.observer {
            let _ = observer.send(script.to_string());
        }
        if let Some(gate) = &self.gate {
            // A dropped gate means the test is done holding us back.
            let _ = gate.recv();
        }
        (self.handler)(script)
    }
}

#[cfg(test)]
mod tests {
    use super::StubBackend;
    use crate::core::engine::EngineBackend;
    use serde_json::json;

    #[test]
    fn logs_scripts_in_order() {
        let mut backend = StubBackend::returning(json!(null));
        let log = backend.script_log();
        backend.evaluate("first").unwrap();
        backend.evaluate("second").unwrap();
        assert_eq!(log.lock().unwrap().clone(), vec!["first", "second"]);
    }

    #[test]
    fn raising_reports_name_and_message() {
        let mut backend = StubBackend::raising("TypeError", "Invalid URL");
        let err = backend.evaluate("return new URL('x');").unwrap_err();
        assert_eq!(err.name.as_deref(), Some("TypeError"));
        assert_eq!(err.message, "Invalid URL");
    }
}
