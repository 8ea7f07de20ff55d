use std::io::Write;
use std::path::PathBuf;
use std::pin::pin;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use colored::Colorize;
use futures::{StreamExt, TryStreamExt, stream};
use html_validator::{
    AnnotatedRecord, CheckerOptions, FsSourceConfig, PipelineError, Reporter,
    ValidationReport, ValidatorConfig, load_records, output, set_checker_endpoint, validate,
};
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Check HTML files against a Nu HTML checker.
#[derive(Debug, Parser)]
#[command(name = "html-validator", version, about)]
pub struct Cli {
    /// Files or directories to validate
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Base directory for relative paths in output
    #[arg(long)]
    pub base: Option<PathBuf>,

    /// Glob patterns to exclude (repeatable)
    #[arg(long, value_name = "GLOB")]
    pub exclude: Vec<String>,

    /// Keep informational messages in the output
    #[arg(long)]
    pub show_info: bool,

    /// Ignore checker messages matching this regex (repeatable)
    #[arg(long, value_name = "REGEX")]
    pub ignore: Vec<String>,

    /// Do not fail files on non-document errors
    #[arg(long)]
    pub relaxed: bool,

    /// Checker endpoint
    #[arg(long, env = "HTML_VALIDATOR_ENDPOINT")]
    pub endpoint: Option<String>,

    /// HTTP(S) proxy for checker requests
    #[arg(long)]
    pub proxy: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Stop at the first failing file
    #[arg(long)]
    pub fail_fast: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    fn fs_config(&self) -> FsSourceConfig {
        let mut cfg = FsSourceConfig::default();
        cfg.paths.clone_from(&self.paths);
        cfg.base.clone_from(&self.base);
        cfg.exclude.clone_from(&self.exclude);
        cfg
    }

    fn validator_config(&self) -> Result<ValidatorConfig> {
        let ignore = self
            .ignore
            .iter()
            .map(|pattern| {
                Regex::new(pattern).with_context(|| format!("Invalid --ignore pattern '{pattern}'"))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut checker = CheckerOptions::default();
        checker.relaxed_non_document_errors = self.relaxed;
        checker.proxy.clone_from(&self.proxy);
        checker.timeout = self.timeout_secs.map(Duration::from_secs);

        let config = ValidatorConfig::default()
            .with_show_info(self.show_info)
            .with_checker_options(checker);
        if ignore.is_empty() {
            return Ok(config);
        }
        Ok(config.with_verify_message(move |_, message| {
            !ignore.iter().any(|re| re.is_match(message))
        }))
    }
}

/// Parse arguments and run the pipeline. Returns whether every file passed.
///
/// # Errors
///
/// Returns an error for bad arguments, unusable paths, or checker failures.
pub async fn run() -> Result<bool> {
    let cli = Cli::parse();
    crate::logging::init(cli.verbose);
    run_with(&cli, &mut std::io::stdout()).await
}

/// Run the pipeline for parsed arguments, writing the report to `out`.
///
/// A report is written for passing, failing and fail-fast runs alike;
/// transport errors propagate without one.
///
/// # Errors
///
/// Returns an error for bad `--ignore` patterns, unusable paths, or checker failures.
pub async fn run_with(cli: &Cli, out: &mut dyn Write) -> Result<bool> {
    if let Some(endpoint) = &cli.endpoint {
        set_checker_endpoint(endpoint.clone());
    }

    let config = cli.validator_config()?;
    let (records, scan_errors) = load_records(&cli.fs_config())?;
    for scan_error in &scan_errors {
        tracing::warn!("{}", scan_error.format_human_readable());
    }
    tracing::info!(files = records.len(), "Validating files");

    let validated = validate(config)?.validate(stream::iter(records));

    let report = if cli.fail_fast {
        let mut reported = pin!(Reporter::default().report(validated));
        let mut passed = Vec::new();
        let mut stopped_at = None;
        while let Some(outcome) = reported.next().await {
            match outcome {
                Ok(annotated) => passed.push(annotated),
                Err(PipelineError::ValidationFailed { path }) => {
                    eprintln!(
                        "{} {}: {}",
                        "\u{2717}".red(),
                        path.display(),
                        html_validator::VALIDATION_FAILED_MESSAGE.red()
                    );
                    stopped_at = Some(path);
                }
                Err(e) => return Err(e.into()),
            }
        }
        let report = ValidationReport::collect(&passed, scan_errors);
        match stopped_at {
            Some(path) => report.with_stop(path),
            None => report,
        }
    } else {
        let records: Vec<AnnotatedRecord> = validated.try_collect().await?;
        ValidationReport::collect(&records, scan_errors)
    };

    write_report(&report, cli.format, out)?;
    Ok(report.ok)
}

fn write_report(report: &ValidationReport, format: OutputFormat, out: &mut dyn Write) -> Result<()> {
    match format {
        OutputFormat::Human => output::write_human(report, out),
        OutputFormat::Json => output::write_json(report, out),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use axum::Router;
    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::routing::post;
    use clap::CommandFactory;
    use html_validator::MessageType;
    use serde_json::{Value, json};
    use tempfile::TempDir;

    const VALID_HTML: &str = "<!doctype html>\n<title>ok</title>\n<h1>Hello</h1>\n";
    const INVALID_HTML: &str = "<!doctype html>\n<title>broken</title>\n<h1>Hello\n";

    /// Local checker: an `<h1>` without `</h1>` is an error.
    async fn nu(State(hits): State<Arc<AtomicUsize>>, body: String) -> axum::Json<Value> {
        hits.fetch_add(1, Ordering::SeqCst);
        let messages = if body.contains("<h1>") && !body.contains("</h1>") {
            vec![json!({
                "type": "error",
                "lastLine": 3,
                "lastColumn": 4,
                "message": "Unclosed element \u{201c}h1\u{201d}."
            })]
        } else {
            Vec::new()
        };
        axum::Json(json!({ "messages": messages }))
    }

    async fn spawn_checker() -> (String, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route("/nu/", post(nu))
            .route("/down/", post(|| async { StatusCode::SERVICE_UNAVAILABLE }))
            .with_state(Arc::clone(&hits));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), hits)
    }

    fn site() -> TempDir {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("a.html"), VALID_HTML).unwrap();
        std::fs::write(tmp.path().join("b.html"), INVALID_HTML).unwrap();
        std::fs::write(tmp.path().join("c.html"), VALID_HTML).unwrap();
        tmp
    }

    async fn run_json(args: &[&str]) -> (Result<bool>, Value) {
        let cli = parse(args);
        let mut out = Vec::new();
        let outcome = run_with(&cli, &mut out).await;
        let value = if out.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&out).unwrap()
        };
        (outcome, value)
    }

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("html-validator").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_paths_are_required() {
        assert!(Cli::try_parse_from(["html-validator"]).is_err());
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&["site"]);
        assert_eq!(cli.paths, vec![PathBuf::from("site")]);
        assert_eq!(cli.format, OutputFormat::Human);
        assert!(!cli.fail_fast);

        let config = cli.validator_config().unwrap();
        assert!(!config.show_info);
        assert!(config.accepts(&MessageType::Error, "anything"));
        assert_eq!(config.checker, CheckerOptions::default());
    }

    #[test]
    fn test_ignore_patterns_build_predicate() {
        let cli = parse(&[
            "site",
            "--ignore",
            "^End tag for  .body. seen",
            "--ignore",
            "^Unclosed element .h1.",
            "--show-info",
        ]);
        let config = cli.validator_config().unwrap();
        assert!(config.show_info);
        assert!(!config.accepts(
            &MessageType::Error,
            "Unclosed element \u{201c}h1\u{201d}."
        ));
        assert!(config.accepts(&MessageType::Error, "Stray end tag"));
    }

    #[test]
    fn test_invalid_ignore_pattern_is_an_error() {
        let cli = parse(&["site", "--ignore", "(unclosed"]);
        let err = cli.validator_config().unwrap_err();
        assert!(err.to_string().contains("Invalid --ignore pattern"));
    }

    #[test]
    fn test_checker_options_from_flags() {
        let cli = parse(&[
            "site",
            "--relaxed",
            "--timeout-secs",
            "30",
            "--proxy",
            "http://proxy.local:3128",
            "--format",
            "json",
            "-vv",
        ]);
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.verbose, 2);

        let config = cli.validator_config().unwrap();
        assert!(config.checker.relaxed_non_document_errors);
        assert_eq!(config.checker.timeout, Some(Duration::from_secs(30)));
        assert_eq!(
            config.checker.proxy.as_deref(),
            Some("http://proxy.local:3128")
        );
    }

    #[test]
    fn test_fs_config_from_flags() {
        let cli = parse(&["a", "b", "--base", "a", "--exclude", "draft*.html"]);
        let cfg = cli.fs_config();
        assert_eq!(cfg.paths, vec![PathBuf::from("a"), PathBuf::from("b")]);
        assert_eq!(cfg.base, Some(PathBuf::from("a")));
        assert_eq!(cfg.exclude, vec!["draft*.html".to_owned()]);
    }

    #[test]
    fn test_write_report_json() {
        let report = ValidationReport::collect(&[], Vec::new());
        let mut out = Vec::new();
        write_report(&report, OutputFormat::Json, &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["ok"], serde_json::json!(true));
    }

    // The checker endpoint is process-wide, so every run against the local
    // checker lives in this one test.
    #[tokio::test]
    async fn test_run_outcomes_against_local_checker() {
        let (base, hits) = spawn_checker().await;
        let endpoint = format!("{base}/nu/");
        let site = site();
        let dir = site.path().to_str().unwrap();
        let valid = site.path().join("a.html");
        let valid = valid.to_str().unwrap();

        // Passing run.
        let (outcome, report) =
            run_json(&[valid, "--endpoint", endpoint.as_str(), "--format", "json"]).await;
        assert!(outcome.unwrap());
        assert_eq!(report["ok"], json!(true));
        assert_eq!(report["scanned_files"], json!(1));

        // Failing run checks every file.
        let before = hits.load(Ordering::SeqCst);
        let (outcome, report) =
            run_json(&[dir, "--endpoint", endpoint.as_str(), "--format", "json"]).await;
        assert!(!outcome.unwrap());
        assert_eq!(hits.load(Ordering::SeqCst) - before, 3);
        assert_eq!(report["ok"], json!(false));
        assert_eq!(report["scanned_files"], json!(3));
        assert_eq!(report["failed_files"], json!(1));
        assert_eq!(report["files"][1]["relative"], json!("b.html"));
        assert!(report.get("stopped_at").is_none());

        // Fail-fast stops at b.html and still writes a report.
        let before = hits.load(Ordering::SeqCst);
        let (outcome, report) = run_json(&[
            dir,
            "--endpoint",
            endpoint.as_str(),
            "--format",
            "json",
            "--fail-fast",
        ])
        .await;
        assert!(!outcome.unwrap());
        assert_eq!(hits.load(Ordering::SeqCst) - before, 2);
        assert_eq!(report["ok"], json!(false));
        assert_eq!(report["files"].as_array().unwrap().len(), 1);
        assert_eq!(report["files"][0]["relative"], json!("a.html"));
        assert!(
            report["stopped_at"]
                .as_str()
                .unwrap()
                .ends_with("b.html")
        );

        // Fail-fast with nothing failing behaves like a normal run.
        let (outcome, report) = run_json(&[
            valid,
            "--endpoint",
            endpoint.as_str(),
            "--format",
            "json",
            "--fail-fast",
        ])
        .await;
        assert!(outcome.unwrap());
        assert!(report.get("stopped_at").is_none());

        // Human output for a stopped run.
        let cli = parse(&[dir, "--endpoint", endpoint.as_str(), "--fail-fast"]);
        let mut out = Vec::new();
        assert!(!run_with(&cli, &mut out).await.unwrap());
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Stopped at"));

        // Transport errors propagate without a report.
        let down = format!("{base}/down/");
        let (outcome, report) =
            run_json(&[dir, "--endpoint", down.as_str(), "--format", "json"]).await;
        assert!(outcome.unwrap_err().to_string().contains("503"));
        assert_eq!(report, Value::Null);
    }

    #[tokio::test]
    async fn test_run_with_missing_path_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("missing");
        let cli = parse(&[missing.to_str().unwrap()]);
        let mut out = Vec::new();
        let err = run_with(&cli, &mut out).await.unwrap_err();
        assert!(err.to_string().contains("does not exist"));
        assert!(out.is_empty());
    }
}
