use crate::cli::app_config::Cli;
use crate::trace::request::Request;
use crate::trace::response::Response;
use crate::trace::tracer;
use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;
use url::Url;

/// The document printed by `--json`, matching the web front end the
/// tracer was lifted from: a trace on success, a message on failure.
#[derive(Serialize)]
struct TraceDocument {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    trace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl TraceDocument {
    fn ok(trace: String) -> Self {
        Self {
            status: "ok",
            trace: Some(trace),
            message: None,
        }
    }

    fn err(message: String) -> Self {
        Self {
            status: "err",
            trace: None,
            message: Some(message),
        }
    }
}

pub async fn main_with_error() -> Result<(), anyhow::Error> {
    let cli: Cli = Cli::parse();

    do_trace(cli).await
}

async fn do_trace(cli: Cli) -> Result<(), anyhow::Error> {
    let log_level = match cli.verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy()
        .add_directive("hyper_util=off".parse()?);
    let subscriber = tracing_subscriber::fmt()
        .with_level(true)
        .without_time()
        .with_level(false)
        .with_target(false)
        .with_span_events(FmtSpan::NONE)
        .with_max_level(log_level)
        .with_env_filter(filter)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let target: Url = cli
        .url
        .parse()
        .with_context(|| format!("failed to parse url: {}", cli.url))?;

    let mut request = Request::new(target);
    if let Some(method) = cli.method_option {
        request.method = method;
    }
    if let Some(body) = cli.body_option {
        request.body = body;
    }
    request.headers = cli.headers;
    request.client_cert_path = cli.certificate_path_option;
    request.insecure = cli.skip_certificate_validate;
    request.only_headers = cli.header_option;
    request.follow_redirects = !cli.no_redirects;
    request.max_redirects = cli.max_redirects;

    let mut response = Response::new();
    let result = tracer::run(&mut request, &mut response).await;

    if cli.json {
        // Errors still produce a well-formed document instead of
        // failing the process.
        let document = match result {
            Ok(()) => TraceDocument::ok(response.to_string()),
            Err(e) => TraceDocument::err(e.to_string()),
        };
        println!("{}", serde_json::to_string(&document)?);
        return Ok(());
    }

    result?;
    println!("{response}");
    Ok(())
}
