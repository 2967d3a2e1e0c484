//! Logging and optional OpenTelemetry export for the `paypro` binary.
//!
//! Log lines go to stderr so the JSON printed on stdout stays machine-readable.
//! Verbosity follows `RUST_LOG` (default `info`). Setting any `OTEL_EXPORTER_OTLP_*`
//! variable additionally exports spans over OTLP.

use opentelemetry::{KeyValue, trace::TracerProvider as _};
use opentelemetry_sdk::{
    Resource,
    trace::{RandomIdGenerator, Sampler, SdkTracerProvider},
};
use opentelemetry_semantic_conventions::{
    SCHEMA_URL,
    attribute::{DEPLOYMENT_ENVIRONMENT_NAME, SERVICE_VERSION},
};
use std::env;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Telemetry protocol to use for OTLP export
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TelemetryProtocol {
    HTTP,
    GRPC,
}

impl TelemetryProtocol {
    /// Determines telemetry protocol from environment variables if OTEL is configured
    fn from_env() -> Option<Self> {
        let is_enabled = env::var("OTEL_EXPORTER_OTLP_ENDPOINT").is_ok()
            || env::var("OTEL_EXPORTER_OTLP_HEADERS").is_ok()
            || env::var("OTEL_EXPORTER_OTLP_PROTOCOL").is_ok();
        if !is_enabled {
            return None;
        }
        let protocol = match env::var("OTEL_EXPORTER_OTLP_PROTOCOL").as_deref() {
            Ok("grpc") => TelemetryProtocol::GRPC,
            _ => TelemetryProtocol::HTTP,
        };
        Some(protocol)
    }
}

/// Builder for the global tracing subscriber.
pub struct Telemetry {
    name: &'static str,
    version: &'static str,
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::new()
    }
}

impl Telemetry {
    pub fn new() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    pub fn with_version(mut self, version: &'static str) -> Self {
        self.version = version;
        self
    }

    fn resource(&self) -> Resource {
        let deployment_env = env::var("DEPLOYMENT_ENV").unwrap_or_else(|_| "develop".to_string());
        Resource::builder()
            .with_service_name(self.name)
            .with_schema_url(
                [
                    KeyValue::new(SERVICE_VERSION, self.version),
                    KeyValue::new(DEPLOYMENT_ENVIRONMENT_NAME, deployment_env),
                ],
                SCHEMA_URL,
            )
            .build()
    }

    fn tracer_provider(
        &self,
        protocol: TelemetryProtocol,
    ) -> Result<SdkTracerProvider, opentelemetry_otlp::ExporterBuildError> {
        let exporter = opentelemetry_otlp::SpanExporter::builder();
        let exporter = match protocol {
            TelemetryProtocol::HTTP => exporter.with_http().build(),
            TelemetryProtocol::GRPC => exporter.with_tonic().build(),
        }?;
        Ok(SdkTracerProvider::builder()
            .with_sampler(Sampler::ParentBased(Box::new(Sampler::AlwaysOn)))
            .with_id_generator(RandomIdGenerator::default())
            .with_resource(self.resource())
            .with_batch_exporter(exporter)
            .build())
    }

    /// Installs the global subscriber. Keep the returned guard alive until exit.
    pub fn register(self) -> TelemetryGuard {
        let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let fmt_layer = || tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

        let protocol = TelemetryProtocol::from_env();
        let provider = protocol.map(|protocol| (protocol, self.tracer_provider(protocol)));
        match provider {
            Some((protocol, Ok(tracer_provider))) => {
                let tracer = tracer_provider.tracer(self.name);
                tracing_subscriber::registry()
                    .with(filter())
                    .with(fmt_layer())
                    .with(OpenTelemetryLayer::new(tracer))
                    .init();
                tracing::debug!("OpenTelemetry span exporter is enabled via {:?}", protocol);
                TelemetryGuard {
                    tracer_provider: Some(tracer_provider),
                }
            }
            Some((_, Err(err))) => {
                tracing_subscriber::registry()
                    .with(filter())
                    .with(fmt_layer())
                    .init();
                tracing::warn!(error = %err, "Failed to build OTLP span exporter, logging locally only");
                TelemetryGuard {
                    tracer_provider: None,
                }
            }
            None => {
                tracing_subscriber::registry()
                    .with(filter())
                    .with(fmt_layer())
                    .init();
                TelemetryGuard {
                    tracer_provider: None,
                }
            }
        }
    }
}

/// Flushes exported spans on drop.
pub struct TelemetryGuard {
    tracer_provider: Option<SdkTracerProvider>,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(tracer_provider) = self.tracer_provider.as_ref() {
            if let Err(err) = tracer_provider.shutdown() {
                eprintln!("{err:?}");
            }
        }
    }
}
