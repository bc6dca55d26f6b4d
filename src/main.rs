//! Purpose: `urlparity` CLI entry point and command dispatch.
//! Role: Binary crate root; parses args, runs the harness, emits reports.
//! Invariants: Reports go to stdout; non-interactive errors are emitted as
//!   JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`; a run
//!   that completes and finds mismatches exits 1 with a report, not an
//!   error payload.

use std::io::{self, BufRead, IsTerminal};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{json, Map, Value};
use tracing_subscriber::EnvFilter;

use urlparity::api::{
    diff, load_corpus, to_exit_code, BatchHarness, BatchReport, BrowserBackend, ClassifiedResult,
    Error, ErrorKind, Expectation, LiveComparison, LiveSink, LiveUpdate, ReferenceParser, RustUrl,
    UrlValues,
};

#[derive(Parser)]
#[command(
    name = "urlparity",
    version,
    about = "Check URL parsers against an embedded reference implementation"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a labeled corpus and report every mismatching test case.
    Batch {
        /// WPT-style constructor-test corpus (JSON array).
        corpus: PathBuf,
        /// Which side to validate against the corpus labels.
        #[arg(long, value_enum, default_value = "sut")]
        target: Target,
        /// Emit the full report as JSON instead of a summary.
        #[arg(long)]
        json: bool,
    },
    /// Compare stdin lines live against the reference implementation.
    Live {
        /// Base URL applied to every input line.
        #[arg(long, default_value = "about:blank")]
        base: String,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Target {
    /// The bundled `url`-crate adapter.
    Sut,
    /// The reference implementation itself (vets the corpus labels).
    Reference,
}

fn main() {
    init_tracing();
    let exit_code = match run() {
        Ok(code) => code,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_env("URLPARITY_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run() -> Result<i32, Error> {
    let cli = Cli::parse();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| {
            Error::new(ErrorKind::Internal)
                .with_message("failed to start runtime")
                .with_source(err)
        })?;

    match cli.command {
        Command::Batch {
            corpus,
            target,
            json,
        } => {
            let entries = load_corpus(&corpus)?;
            let harness = match target {
                Target::Sut => BatchHarness::against_sut(RustUrl),
                Target::Reference => {
                    BatchHarness::against_reference(ReferenceParser::new(BrowserBackend::new())?)
                }
            };
            let report = runtime.block_on(harness.run_all(&entries))?;
            if json {
                let text = serde_json::to_string_pretty(&report_json(&corpus, &report))
                    .map_err(|err| {
                        Error::new(ErrorKind::Internal)
                            .with_message("failed to encode report")
                            .with_source(err)
                    })?;
                println!("{text}");
            } else {
                print_summary(&report);
            }
            Ok(if report.is_clean() { 0 } else { 1 })
        }
        Command::Live { base } => {
            let parser = ReferenceParser::new(BrowserBackend::new())?;
            let live = LiveComparison::new(parser, RustUrl, StdoutSink);
            runtime.block_on(async move {
                let stdin = io::stdin();
                let mut handles = Vec::new();
                for line in stdin.lock().lines() {
                    let line = line.map_err(|err| {
                        Error::new(ErrorKind::Io)
                            .with_message("failed to read stdin")
                            .with_source(err)
                    })?;
                    let input = line.trim_end_matches(['\r', '\n']);
                    if input.is_empty() {
                        continue;
                    }
                    handles.push(live.submit(input, Some(&base)));
                }
                for handle in handles {
                    let _ = handle.await;
                }
                Ok(0)
            })
        }
    }
}

struct StdoutSink;

impl LiveSink for StdoutSink {
    fn deliver(&self, update: LiveUpdate) {
        match serde_json::to_string(&update) {
            Ok(line) => println!("{line}"),
            Err(err) => tracing::error!(%err, "failed to encode live update"),
        }
    }

    fn fault(&self, error: Error) {
        emit_error(&error);
    }
}

fn print_summary(report: &BatchReport) {
    if report.is_clean() {
        println!(
            "no mismatches found ({} cases, {} corpus entries)",
            report.cases_run, report.total_entries
        );
        return;
    }
    println!(
        "{} mismatches out of {} cases",
        report.mismatches.len(),
        report.cases_run
    );
    for result in &report.mismatches {
        let tags: Vec<&str> = result.failures.iter().map(|tag| tag.label()).collect();
        let mut line = format!(
            "test {}: {:?} [{}]",
            result.test_number,
            result.case.input,
            tags.join(", ")
        );
        if let Expectation::Values(expected) = &result.case.expectation {
            let differing = diff(Some(expected), result.actual.as_ref());
            if !differing.is_empty() {
                let names: Vec<&str> = differing.iter().map(|property| property.name()).collect();
                line.push_str(&format!(" diff: {}", names.join(", ")));
            }
        }
        println!("{line}");
    }
}

fn report_json(corpus: &Path, report: &BatchReport) -> Value {
    json!({
        "time": time_now(),
        "corpus": corpus.display().to_string(),
        "total_entries": report.total_entries,
        "cases_run": report.cases_run,
        "mismatch_count": report.mismatches.len(),
        "mismatches": report
            .mismatches
            .iter()
            .map(result_json)
            .collect::<Vec<Value>>(),
    })
}

fn result_json(result: &ClassifiedResult) -> Value {
    let expected = match &result.case.expectation {
        Expectation::Failure => json!({ "failure": true }),
        Expectation::Values(values) => values_json(values),
    };
    json!({
        "test_number": result.test_number,
        "input": result.case.input,
        "base": result.case.base,
        "failures": result
            .failures
            .iter()
            .map(|tag| tag.label())
            .collect::<Vec<&str>>(),
        "expected": expected,
        "actual": result.actual.as_ref().map(values_json),
    })
}

fn values_json(values: &UrlValues) -> Value {
    serde_json::to_value(values).unwrap_or(Value::Null)
}

fn time_now() -> Option<String> {
    use time::format_description::well_known::Rfc3339;
    let duration = SystemTime::now().duration_since(UNIX_EPOCH).ok()?;
    let ts = time::OffsetDateTime::from_unix_timestamp_nanos(duration.as_nanos() as i128).ok()?;
    ts.format(&Rfc3339).ok()
}

fn emit_error(err: &Error) {
    if io::stderr().is_terminal() {
        eprintln!("error: {err}");
        return;
    }
    let json = serde_json::to_string(&error_json(err)).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::Io => "i/o error".to_string(),
        ErrorKind::Corpus => "corpus could not be read".to_string(),
        ErrorKind::Bootstrap => "engine bootstrap failed".to_string(),
        ErrorKind::Engine => "engine fault".to_string(),
    }
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(path) = err.path() {
        inner.insert("path".to_string(), json!(path.display().to_string()));
    }
    if let Some(test_number) = err.test_number() {
        inner.insert("test_number".to_string(), json!(test_number));
    }
    let mut causes = Vec::new();
    let mut current = std::error::Error::source(err);
    while let Some(source) = current {
        causes.push(source.to_string());
        current = source.source();
    }
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}
