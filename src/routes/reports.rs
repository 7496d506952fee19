use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::Value;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::pipeline::{AvailableOptions, FormattedContent, ReportRecord, ReportRequest};

#[derive(Debug, Deserialize)]
pub struct SalesReportBody {
    #[serde(default)]
    pub period: Option<String>,
    pub sales: Vec<Value>,
    #[serde(default)]
    pub recipient: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InventoryReportBody {
    pub items: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub struct FinancialReportBody {
    pub income: f64,
    pub expenses: f64,
    #[serde(default)]
    pub destination: Option<String>,
}

pub async fn create_report(
    State(state): State<AppState>,
    Json(request): Json<ReportRequest>,
) -> AppResult<Json<FormattedContent>> {
    for (field, value) in [
        ("report_type", &request.report_type),
        ("output_format", &request.output_format),
        ("delivery_method", &request.delivery_method),
    ] {
        if value.trim().is_empty() {
            return Err(AppError::Validation(format!("{field} must not be empty")));
        }
    }

    let formatted = state.facade.custom(&request).await?;
    Ok(Json(formatted))
}

pub async fn create_sales_report(
    State(state): State<AppState>,
    Json(body): Json<SalesReportBody>,
) -> AppResult<Json<FormattedContent>> {
    let period = body.period.as_deref().unwrap_or("Not specified");
    let formatted = state
        .facade
        .sales_pdf_email(period, body.sales, body.recipient)
        .await?;
    Ok(Json(formatted))
}

pub async fn create_inventory_report(
    State(state): State<AppState>,
    Json(body): Json<InventoryReportBody>,
) -> AppResult<Json<FormattedContent>> {
    let formatted = state.facade.inventory_excel_download(body.items).await?;
    Ok(Json(formatted))
}

pub async fn create_financial_report(
    State(state): State<AppState>,
    Json(body): Json<FinancialReportBody>,
) -> AppResult<Json<FormattedContent>> {
    let formatted = state
        .facade
        .financial_html_cloud(body.income, body.expenses, body.destination)
        .await?;
    Ok(Json(formatted))
}

pub async fn list_options(State(state): State<AppState>) -> Json<AvailableOptions> {
    Json(state.facade.available_options())
}

pub async fn list_history(State(state): State<AppState>) -> Json<Vec<ReportRecord>> {
    Json(state.facade.history().await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sales_body_defaults() {
        let body: SalesReportBody =
            serde_json::from_str(r#"{"sales": [{"amount": 10}]}"#).unwrap();
        assert_eq!(body.period, None);
        assert_eq!(body.recipient, None);
        assert_eq!(body.sales.len(), 1);
    }

    #[test]
    fn test_financial_body_deserialize() {
        let body: FinancialReportBody = serde_json::from_str(
            r#"{"income": 1000, "expenses": 400, "destination": "https://storage.example.com"}"#,
        )
        .unwrap();
        assert_eq!(body.income, 1000.0);
        assert_eq!(body.expenses, 400.0);
        assert_eq!(
            body.destination.as_deref(),
            Some("https://storage.example.com")
        );
    }

    #[test]
    fn test_report_request_body_deserialize() {
        let request: ReportRequest = serde_json::from_str(
            r#"{
                "report_type": "sales",
                "payload": {"sales": []},
                "output_format": "pdf",
                "delivery_method": "email",
                "delivery_target": "ops@example.com"
            }"#,
        )
        .unwrap();
        assert_eq!(request.report_type, "sales");
        assert!(request.payload.contains_key("sales"));
        assert_eq!(request.delivery_target.as_deref(), Some("ops@example.com"));
    }
}
