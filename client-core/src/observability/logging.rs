use opentelemetry::KeyValue;
use opentelemetry::trace::TraceError;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{Resource, runtime, trace as sdktrace};
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt};

/// Install the global subscriber for a command-line process.
///
/// Logs are JSON lines on stderr so stdout stays free for command output.
/// `RUST_LOG` overrides `log_level`. Spans are exported over OTLP only when
/// `otlp_endpoint` is set; an exporter that fails to start is reported and
/// skipped.
pub fn init_tracing(
    service_name: &str,
    log_level: &str,
    otlp_endpoint: Option<&str>,
) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let json_logs = fmt::layer()
        .json()
        .flatten_event(true)
        .with_current_span(false)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr);

    let otlp = otlp_endpoint
        .and_then(|endpoint| {
            otlp_tracer(service_name, endpoint)
                .inspect_err(|e| {
                    eprintln!("OTLP export to '{}' disabled: {}", endpoint, e);
                })
                .ok()
        })
        .map(|tracer| tracing_opentelemetry::layer().with_tracer(tracer));

    tracing_subscriber::registry()
        .with(filter)
        .with(otlp)
        .with(json_logs)
        .try_init()
}

fn otlp_tracer(service_name: &str, endpoint: &str) -> Result<sdktrace::Tracer, TraceError> {
    let resource = Resource::new([
        KeyValue::new("service.name", service_name.to_string()),
        KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
    ]);

    opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(
            opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(endpoint),
        )
        .with_trace_config(sdktrace::config().with_resource(resource))
        .install_batch(runtime::Tokio)
}
