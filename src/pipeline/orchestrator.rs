use std::collections::HashMap;
use std::time::Instant;

use chrono::{SecondsFormat, Utc};
use opentelemetry::KeyValue;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::PipelineError;
use crate::telemetry::metrics::{
    REPORT_DELIVERY_DURATION, REPORT_FAILURES, REPORT_GENERATION_DURATION, REPORTS_GENERATED,
};

use super::Payload;
use super::delivery::{self, DeliveryChannel, DeliverySpec};
use super::formatters::{self, FormattedContent, OutputFormatter};
use super::generators::{self, ContentGenerator};
use super::outbound::Outbound;
use super::registry::Registry;

#[derive(Debug, Clone, Deserialize)]
pub struct ReportRequest {
    pub report_type: String,
    #[serde(default)]
    pub payload: Payload,
    pub output_format: String,
    pub delivery_method: String,
    /// Recipient address or cloud destination. Falls back to the configured default.
    #[serde(default)]
    pub delivery_target: Option<String>,
}

/// One completed generation. Written once, after delivery succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRecord {
    pub report_type: String,
    pub output_format: String,
    pub delivery_method: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailableOptions {
    pub report_types: Vec<String>,
    pub formats: Vec<String>,
    pub delivery_methods: Vec<String>,
}

/// The constructor tables for all three axes.
pub struct Registries {
    pub generators: Registry<dyn ContentGenerator>,
    pub formatters: Registry<dyn OutputFormatter>,
    pub channels: Registry<dyn DeliveryChannel, DeliverySpec>,
}

impl Registries {
    pub fn builtin() -> Self {
        Self {
            generators: generators::builtin_registry(),
            formatters: formatters::builtin_registry(),
            channels: delivery::builtin_registry(),
        }
    }
}

/// Fallback delivery targets keyed by delivery method.
#[derive(Debug, Clone, Default)]
pub struct DeliveryDefaults {
    targets: HashMap<String, String>,
}

impl DeliveryDefaults {
    pub fn with_target(mut self, method: impl Into<String>, target: Option<String>) -> Self {
        if let Some(target) = target.filter(|t| !t.trim().is_empty()) {
            self.targets.insert(method.into(), target);
        }
        self
    }

    pub fn target_for(&self, method: &str) -> Option<&str> {
        self.targets.get(method).map(String::as_str)
    }
}

pub struct ReportOrchestrator {
    registries: Registries,
    outbound: Outbound,
    defaults: DeliveryDefaults,
    history: RwLock<Vec<ReportRecord>>,
}

impl ReportOrchestrator {
    pub fn new(outbound: Outbound, defaults: DeliveryDefaults) -> Self {
        Self::with_registries(Registries::builtin(), outbound, defaults)
    }

    /// Registries are frozen from here on.
    pub fn with_registries(
        registries: Registries,
        outbound: Outbound,
        defaults: DeliveryDefaults,
    ) -> Self {
        Self {
            registries,
            outbound,
            defaults,
            history: RwLock::new(Vec::new()),
        }
    }

    pub fn available_options(&self) -> AvailableOptions {
        AvailableOptions {
            report_types: self
                .registries
                .generators
                .available_types()
                .into_iter()
                .collect(),
            formats: self
                .registries
                .formatters
                .available_types()
                .into_iter()
                .collect(),
            delivery_methods: self
                .registries
                .channels
                .available_types()
                .into_iter()
                .collect(),
        }
    }

    /// Wraps arbitrary text in an output format without generating or delivering a report.
    /// Nothing is added to the history.
    pub fn format_only(
        &self,
        output_format: &str,
        raw: &[u8],
    ) -> Result<FormattedContent, PipelineError> {
        let formatter = self.registries.formatters.create(output_format)?;
        formatters::format_bytes(formatter.as_ref(), raw)
    }

    /// Snapshot of the audit log in chronological order.
    pub async fn history(&self) -> Vec<ReportRecord> {
        self.history.read().await.clone()
    }

    #[tracing::instrument(
        name = "pipeline report",
        skip(self, request),
        fields(
            report.report_type = %request.report_type,
            report.output_format = %request.output_format,
            report.delivery_method = %request.delivery_method,
            report.duration_ms,
            error.kind,
        )
    )]
    pub async fn generate_report(
        &self,
        request: &ReportRequest,
    ) -> Result<FormattedContent, PipelineError> {
        let start = Instant::now();
        let result = self.run(request).await;
        let elapsed = start.elapsed();

        let span = tracing::Span::current();
        span.record("report.duration_ms", elapsed.as_millis() as u64);

        match &result {
            Ok(formatted) => {
                REPORTS_GENERATED.add(1, &request_attributes(request));
                REPORT_GENERATION_DURATION.record(elapsed.as_secs_f64(), &[]);
                tracing::info!(
                    size_bytes = formatted.body.len(),
                    file_extension = %formatted.file_extension,
                    "Report generated"
                );
            }
            Err(err) => {
                span.record("error.kind", err.kind());
                let mut attributes = request_attributes(request);
                attributes.push(KeyValue::new("error.kind", err.kind()));
                REPORT_FAILURES.add(1, &attributes);
                tracing::warn!(error = %err, kind = err.kind(), "Report generation failed");
            }
        }

        result
    }

    async fn run(&self, request: &ReportRequest) -> Result<FormattedContent, PipelineError> {
        // Stage 1: content
        let generator = self.registries.generators.create(&request.report_type)?;
        let content = generate_content(generator.as_ref(), &request.payload)?;

        // Stage 2: format
        let formatter = self.registries.formatters.create(&request.output_format)?;
        let formatted = format_content(formatter.as_ref(), &content);

        // Stage 3: deliver
        let spec = DeliverySpec {
            target: self.resolve_target(request),
            outbound: self.outbound.clone(),
        };
        let channel = self
            .registries
            .channels
            .create_with(&request.delivery_method, &spec)?;

        let delivery_start = Instant::now();
        let receipt = channel
            .deliver(
                &formatted.body,
                &request.report_type,
                &formatted.file_extension,
            )
            .await?;
        REPORT_DELIVERY_DURATION.record(
            delivery_start.elapsed().as_secs_f64(),
            &[KeyValue::new(
                "delivery.method",
                request.delivery_method.clone(),
            )],
        );
        tracing::info!(
            delivery.destination = %receipt.destination,
            delivery.file_name = %receipt.file_name,
            "Report delivered"
        );

        // Audit only after delivery succeeded
        self.history.write().await.push(ReportRecord {
            report_type: request.report_type.clone(),
            output_format: request.output_format.clone(),
            delivery_method: request.delivery_method.clone(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        });

        Ok(formatted)
    }

    fn resolve_target(&self, request: &ReportRequest) -> Option<String> {
        request
            .delivery_target
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| self.defaults.target_for(&request.delivery_method))
            .map(str::to_string)
    }
}

#[tracing::instrument(
    name = "pipeline_stage generate",
    skip_all,
    fields(pipeline.stage = "generate", report.report_type = generator.report_type())
)]
fn generate_content(
    generator: &dyn ContentGenerator,
    payload: &Payload,
) -> Result<String, PipelineError> {
    generator.generate(payload)
}

#[tracing::instrument(
    name = "pipeline_stage format",
    skip_all,
    fields(pipeline.stage = "format", report.output_format = formatter.format_type())
)]
fn format_content(formatter: &dyn OutputFormatter, content: &str) -> FormattedContent {
    formatter.format(content)
}

fn request_attributes(request: &ReportRequest) -> Vec<KeyValue> {
    vec![
        KeyValue::new("report.type", request.report_type.clone()),
        KeyValue::new("report.format", request.output_format.clone()),
        KeyValue::new("delivery.method", request.delivery_method.clone()),
    ]
}
