//! Purpose: Production engine backend over the `browser_tester` runtime.
//! Exports: `BrowserBackend`.
//! Role: Adapts a page-scoped script runtime to the `EngineBackend`
//!   capability.
//! Invariants: Scripts and bootstrap blocks execute in document order; the
//!   request script's return value leaves the page through the sink node.
//! Invariants: Runtime error messages are normalized to error names before
//!   classification; the URL constructor's bare "Invalid URL" is a
//!   type-error per the WHATWG contract.
//! Notes: The runtime only executes scripts at page load, so every
//!   evaluation renders a one-shot page and replays the persistent scripts;
//!   the observable engine contract is unchanged.

use serde_json::Value;

use crate::core::engine::{BackendException, EngineBackend};
use crate::core::error::{Error, ErrorKind};

const SINK_ID: &str = "__engine_result";
const SINK_PREFIX: &str = "<pre id=\"__engine_result\">";
const SINK_SUFFIX: &str = "</pre>";

/// Engine backend hosted by `browser_tester`.
///
/// The runtime ships a WHATWG `URL` constructor, `atob`, and
/// `decodeURIComponent` as built-ins, so the default reference parser needs
/// no bootstrap scripts; `persistent` scripts, when given, are validated at
/// construction and replayed ahead of every evaluation.
pub struct BrowserBackend {
    persistent: Vec<String>,
}

impl BrowserBackend {
    pub fn new() -> Self {
        Self {
            persistent: Vec::new(),
        }
    }

    /// A backend whose pages run `persistent` scripts (polyfills, a
    /// bundled URL implementation) before each evaluated script. Fails if
    /// any of them cannot run on its own.
    pub fn with_persistent_scripts(persistent: Vec<String>) -> Result<Self, Error> {
        let backend = Self { persistent };
        let html = backend
            .page_html(None)
            .map_err(|err| Error::new(ErrorKind::Bootstrap).with_source(err))?;
        browser_tester::Harness::from_html(&html).map_err(|err| {
            Error::new(ErrorKind::Bootstrap)
                .with_message("persistent script failed to load")
                .with_source(normalize(err))
        })?;
        Ok(backend)
    }

    fn page_html(&self, script: Option<&str>) -> Result<String, BackendException> {
        let mut html = String::from("<html><body>");
        html.push_str(SINK_PREFIX);
        html.push_str(SINK_SUFFIX);
        for block in &self.persistent {
            push_script_block(&mut html, block)?;
        }
        if let Some(script) = script {
            let wrapped = format!(
                "function __engine_main() {{\n{script}\n}}\n\
                 var __engine_value = __engine_main();\n\
                 if (__engine_value !== undefined) {{\n\
                 document.getElementById(\"{SINK_ID}\").textContent = \
                 JSON.stringify(__engine_value);\n}}"
            );
            push_script_block(&mut html, &wrapped)?;
        }
        html.push_str("</body></html>");
        Ok(html)
    }
}

impl Default for BrowserBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn push_script_block(html: &mut String, script: &str) -> Result<(), BackendException> {
    // A literal close tag would end the block mid-script; no generated
    // script contains one (arguments cross as base64 payloads).
    if script.contains("</script") {
        return Err(BackendException::new(
            None,
            "script contains a literal close tag and cannot be embedded",
        ));
    }
    html.push_str("<script>\n");
    html.push_str(script);
    html.push_str("\n</script>");
    Ok(())
}

/// Maps runtime error messages onto error-constructor names.
fn error_name(message: &str) -> Option<&'static str> {
    const NAMES: [&str; 8] = [
        "EvalError",
        "RangeError",
        "ReferenceError",
        "SyntaxError",
        "TypeError",
        "URIError",
        "AggregateError",
        "InternalError",
    ];
    if message == "Invalid URL" {
        return Some("TypeError");
    }
    let prefix = message.split(':').next()?;
    NAMES.into_iter().find(|name| *name == prefix)
}

fn normalize(err: browser_tester::Error) -> BackendException {
    match err {
        browser_tester::Error::ScriptRuntime(message) => {
            BackendException::new(error_name(&message), message)
        }
        browser_tester::Error::ScriptParse(message) => {
            BackendException::new(Some("SyntaxError"), message)
        }
        other => BackendException::new(None, other.to_string()),
    }
}

fn extract_sink_text(dump: &str) -> Option<&str> {
    let body = dump.strip_prefix(SINK_PREFIX)?;
    body.strip_suffix(SINK_SUFFIX)
}

impl EngineBackend for BrowserBackend {
    fn evaluate(&mut self, script: &str) -> Result<Value, BackendException> {
        let html = self.page_html(Some(script))?;
        let harness = browser_tester::Harness::from_html(&html).map_err(normalize)?;
        let dump = harness
            .dump_dom(&format!("#{SINK_ID}"))
            .map_err(|err| BackendException::new(None, format!("result sink is gone: {err}")))?;
        let text = extract_sink_text(&dump).ok_or_else(|| {
            BackendException::new(None, format!("result sink dump is malformed: {dump}"))
        })?;
        if text.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(text).map_err(|err| {
            BackendException::new(None, format!("result is not valid JSON ({err}): {text}"))
        })
    }
}
