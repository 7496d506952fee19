//! Shortcuts for the common report combinations. Everything here forwards to
//! [`ReportOrchestrator::generate_report`].

use std::sync::Arc;

use serde_json::{Value, json};

use crate::error::PipelineError;
use crate::pipeline::{
    AvailableOptions, FormattedContent, Payload, ReportOrchestrator, ReportRecord, ReportRequest,
};

#[derive(Clone)]
pub struct ReportFacade {
    orchestrator: Arc<ReportOrchestrator>,
}

impl ReportFacade {
    pub fn new(orchestrator: Arc<ReportOrchestrator>) -> Self {
        Self { orchestrator }
    }

    /// Sales report as PDF, sent by email.
    pub async fn sales_pdf_email(
        &self,
        period: &str,
        sales: Vec<Value>,
        recipient: Option<String>,
    ) -> Result<FormattedContent, PipelineError> {
        let payload = object(json!({ "period": period, "sales": sales }));
        self.forward("sales", payload, "pdf", "email", recipient)
            .await
    }

    /// Inventory report as a spreadsheet, offered as a download.
    pub async fn inventory_excel_download(
        &self,
        items: Vec<Value>,
    ) -> Result<FormattedContent, PipelineError> {
        let payload = object(json!({ "items": items }));
        self.forward("inventory", payload, "excel", "download", None)
            .await
    }

    /// Financial report as HTML, uploaded to cloud storage.
    pub async fn financial_html_cloud(
        &self,
        income: f64,
        expenses: f64,
        destination: Option<String>,
    ) -> Result<FormattedContent, PipelineError> {
        let payload = object(json!({ "income": income, "expenses": expenses }));
        self.forward("financial", payload, "html", "cloud", destination)
            .await
    }

    pub async fn custom(&self, request: &ReportRequest) -> Result<FormattedContent, PipelineError> {
        self.orchestrator.generate_report(request).await
    }

    pub fn preview_format(
        &self,
        output_format: &str,
        raw: &[u8],
    ) -> Result<FormattedContent, PipelineError> {
        self.orchestrator.format_only(output_format, raw)
    }

    pub fn available_options(&self) -> AvailableOptions {
        self.orchestrator.available_options()
    }

    pub async fn history(&self) -> Vec<ReportRecord> {
        self.orchestrator.history().await
    }

    async fn forward(
        &self,
        report_type: &str,
        payload: Payload,
        output_format: &str,
        delivery_method: &str,
        delivery_target: Option<String>,
    ) -> Result<FormattedContent, PipelineError> {
        let request = ReportRequest {
            report_type: report_type.to_string(),
            payload,
            output_format: output_format.to_string(),
            delivery_method: delivery_method.to_string(),
            delivery_target,
        };
        self.orchestrator.generate_report(&request).await
    }
}

fn object(value: Value) -> Payload {
    match value {
        Value::Object(map) => map,
        _ => Payload::new(),
    }
}
