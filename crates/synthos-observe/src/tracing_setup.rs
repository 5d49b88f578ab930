//! Tracing subscriber initialization with structured logging and optional
//! OpenTelemetry trace export.
//!
//! # Usage
//!
//! ```no_run
//! use synthos_observe::tracing_setup::{LogOptions, init_tracing};
//!
//! // Human-readable logs at the configured level
//! init_tracing(&LogOptions::new("info")).unwrap();
//!
//! // JSON lines plus OpenTelemetry export to stdout
//! let options = LogOptions { json: true, otel_stdout: true, ..LogOptions::new("debug") };
//! init_tracing(&options).unwrap();
//! ```

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Layer, Registry};

use std::sync::OnceLock;

/// Stores the OTel tracer provider so it can be shut down cleanly on exit.
static TRACER_PROVIDER: OnceLock<SdkTracerProvider> = OnceLock::new();

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

#[derive(Debug, Clone)]
pub struct LogOptions {
    /// Filter used when `RUST_LOG` is unset.
    pub directive: String,
    pub json: bool,
    pub otel_stdout: bool,
}

impl LogOptions {
    pub fn new(directive: impl Into<String>) -> Self {
        Self {
            directive: directive.into(),
            json: false,
            otel_stdout: false,
        }
    }
}

/// Build the level filter: `RUST_LOG` wins, otherwise `directive`.
pub fn env_filter(directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive))
}

fn fmt_layer(json: bool) -> BoxedLayer {
    // Span close events report how long each session lived.
    let layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE);
    if json {
        layer.json().with_current_span(true).boxed()
    } else {
        layer.boxed()
    }
}

fn otel_layer() -> BoxedLayer {
    let provider = SdkTracerProvider::builder()
        .with_simple_exporter(opentelemetry_stdout::SpanExporter::default())
        .build();
    let tracer = provider.tracer("synthos");

    let _ = TRACER_PROVIDER.set(provider.clone());
    opentelemetry::global::set_tracer_provider(provider);

    tracing_opentelemetry::layer().with_tracer(tracer).boxed()
}

/// Install the global tracing subscriber.
///
/// # Errors
///
/// Returns an error if a global subscriber has already been set.
pub fn init_tracing(options: &LogOptions) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut layers = vec![fmt_layer(options.json)];
    if options.otel_stdout {
        layers.push(otel_layer());
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter(&options.directive))
        .try_init()?;
    Ok(())
}

/// Flush pending traces and shut down the OpenTelemetry tracer provider.
///
/// No-op when OTel was not enabled.
pub fn shutdown_tracing() {
    if let Some(provider) = TRACER_PROVIDER.get() {
        if let Err(e) = provider.shutdown() {
            eprintln!("Warning: OTel tracer provider shutdown error: {e}");
        }
    }
}
