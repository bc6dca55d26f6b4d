//! Purpose: Parse URLs with the reference implementation in the engine.
//! Exports: `ReferenceParser`, `DEFAULT_CONSTRUCTOR`.
//! Role: Bridge from (input, base) pairs to `UrlValues` via `ScriptEngine`.
//! Invariants: A type-error from the engine means "invalid URL", never a
//!   harness error; every other exception kind is a harness fault.
//! Invariants: Inputs reach generated source only through the safe encoder.

use serde_json::Value;

use crate::core::encode::decode_expr;
use crate::core::engine::{EngineBackend, EvaluateError, JsErrorKind, ScriptEngine};
use crate::core::error::{Error, ErrorKind};
use crate::core::values::{UrlProperty, UrlValues};

/// Constructor expression used when no bootstrap provides one: the engine's
/// global WHATWG `URL`.
pub const DEFAULT_CONSTRUCTOR: &str = "URL";

/// Parses URLs using the reference implementation hosted in a script engine.
pub struct ReferenceParser {
    engine: ScriptEngine,
    constructor: String,
}

impl ReferenceParser {
    /// A parser over the engine's built-in `URL` constructor, with no
    /// bootstrap scripts.
    pub fn new(backend: impl EngineBackend + 'static) -> Result<Self, Error> {
        Self::with_scripts(backend, Vec::new(), DEFAULT_CONSTRUCTOR)
    }

    /// A parser whose engine is bootstrapped with `bootstrap` (polyfills
    /// first, then the reference URL implementation) and which constructs
    /// URLs via the `constructor` expression.
    pub fn with_scripts(
        backend: impl EngineBackend + 'static,
        bootstrap: Vec<String>,
        constructor: impl Into<String>,
    ) -> Result<Self, Error> {
        let engine = ScriptEngine::new(backend, bootstrap)?;
        Ok(Self {
            engine,
            constructor: constructor.into(),
        })
    }

    /// Parses `input` against `base` with the reference implementation.
    ///
    /// Returns `Ok(None)` when the reference rejects the input as an
    /// invalid URL (a type-error, its contractual rejection signal). Any
    /// other engine exception is an infrastructure fault and surfaces as an
    /// error; it is never folded into `None`.
    pub async fn parse(&self, input: &str, base: Option<&str>) -> Result<Option<UrlValues>, Error> {
        let script = parse_script(&self.constructor, input, base);
        match self.engine.evaluate(script).await {
            Ok(value) => values_from_json(&value).map(Some),
            Err(EvaluateError::Raised(raised)) if raised.kind == JsErrorKind::Type => Ok(None),
            Err(EvaluateError::Raised(raised)) => Err(Error::new(ErrorKind::Engine)
                .with_message(format!("reference engine raised {raised}"))),
            Err(EvaluateError::Engine(err)) => Err(err),
        }
    }
}

/// Builds the parse script. Both strings cross into source text encoded;
/// the generated text contains no characters from either input.
fn parse_script(constructor: &str, input: &str, base: Option<&str>) -> String {
    let mut script = format!("var url = new {constructor}({}", decode_expr(input));
    if let Some(base) = base {
        script.push_str(", ");
        script.push_str(&decode_expr(base));
    }
    script.push_str(");\nreturn {\n");
    for property in UrlProperty::ALL {
        let name = property.name();
        script.push_str(&format!("  {name}: url.{name},\n"));
    }
    script.push_str("};");
    script
}

fn values_from_json(value: &Value) -> Result<UrlValues, Error> {
    let object = value.as_object().ok_or_else(|| {
        Error::new(ErrorKind::Engine)
            .with_message(format!("reference script returned a non-object: {value}"))
    })?;
    let required =
        |name: &str| -> String { object.get(name).and_then(Value::as_str).unwrap_or("").to_string() };
    let optional = |name: &str| -> Option<String> {
        object.get(name).and_then(Value::as_str).map(str::to_string)
    };
    Ok(UrlValues {
        href: required("href"),
        origin: optional("origin"),
        protocol: required("protocol"),
        username: required("username"),
        password: required("password"),
        host: optional("host"),
        hostname: required("hostname"),
        port: required("port"),
        pathname: required("pathname"),
        search: required("search"),
        hash: required("hash"),
    })
}
