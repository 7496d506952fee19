//! Report content generators.
//!
//! Every generator produces `header + body + footer`. Only the body differs between report
//! types, and it is fully built (and the payload fully validated) before the header is
//! rendered, so a malformed payload never yields partial text.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

use super::Payload;
use super::registry::Registry;
use crate::error::{Axis, PipelineError};

pub const RULE: &str = "============================================================";
pub const DIVIDER: &str = "------------------------------------------------------------";
pub const GENERATED_AT_LABEL: &str = "Generated at:";

pub trait ContentGenerator: Send + Sync {
    fn report_type(&self) -> &'static str;

    fn title(&self) -> &'static str;

    fn body(&self, payload: &Payload) -> Result<String, PipelineError>;

    fn generate(&self, payload: &Payload) -> Result<String, PipelineError> {
        let body = self.body(payload)?;
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        Ok(format!(
            "{}{}{}",
            header(self.title(), &timestamp),
            body,
            footer()
        ))
    }
}

pub fn header(title: &str, timestamp: &str) -> String {
    format!("{RULE}\n           {title}\n{RULE}\n{GENERATED_AT_LABEL} {timestamp}\n\n")
}

pub fn footer() -> String {
    format!("\n{RULE}\n")
}

pub fn builtin_registry() -> Registry<dyn ContentGenerator> {
    let mut registry: Registry<dyn ContentGenerator> = Registry::new(Axis::Generator);
    registry.register("sales", |_| Ok(Box::new(SalesReport) as Box<dyn ContentGenerator>));
    registry.register("inventory", |_| {
        Ok(Box::new(InventoryReport) as Box<dyn ContentGenerator>)
    });
    registry.register("financial", |_| {
        Ok(Box::new(FinancialReport) as Box<dyn ContentGenerator>)
    });
    registry.register("audit", |_| Ok(Box::new(AuditReport) as Box<dyn ContentGenerator>));
    registry
}

pub struct SalesReport;

struct Sale<'a> {
    product: &'a str,
    amount: f64,
}

impl ContentGenerator for SalesReport {
    fn report_type(&self) -> &'static str {
        "sales"
    }

    fn title(&self) -> &'static str {
        "SALES REPORT"
    }

    fn body(&self, payload: &Payload) -> Result<String, PipelineError> {
        let entries = required_list(payload, "sales")?;
        let period = optional_str(payload, "period")?.unwrap_or("Not specified");

        let sales = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| -> Result<Sale, PipelineError> {
                let entry = entry_object(entry, "sales", i)?;
                Ok(Sale {
                    product: optional_field_str(entry, "product", "sales", i)?
                        .unwrap_or("(unnamed)"),
                    amount: required_number(entry, "amount", "sales", i)?,
                })
            })
            .collect::<Result<Vec<_>, PipelineError>>()?;

        let total: f64 = sales.iter().map(|s| s.amount).sum();

        let mut body = format!(
            "Total sales: ${total:.2}\nTransactions: {}\nPeriod: {period}\n\n\
             Sales detail:\n{DIVIDER}\n",
            sales.len()
        );
        for sale in &sales {
            body.push_str(&format!(
                "  - Product: {} - ${:.2}\n",
                sale.product, sale.amount
            ));
        }
        Ok(body)
    }
}

pub struct InventoryReport;

struct Item<'a> {
    name: &'a str,
    category: &'a str,
    quantity: Units,
}

/// A stock quantity. Integers stay exact; anything else is carried as a float.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Units {
    Whole(i64),
    Fractional(f64),
}

impl Units {
    fn parse(value: &Value, index: usize) -> Result<Self, PipelineError> {
        if let Some(n) = value.as_i64() {
            return Ok(Units::Whole(n));
        }
        value.as_f64().map(Units::Fractional).ok_or_else(|| {
            PipelineError::malformed(format!("items[{index}].quantity must be a number"))
        })
    }

    fn as_f64(self) -> f64 {
        match self {
            Units::Whole(n) => n as f64,
            Units::Fractional(f) => f,
        }
    }

    /// Exact integer sum while it fits in an `i64`, float sum otherwise.
    fn total(quantities: impl Iterator<Item = Units> + Clone) -> Units {
        quantities
            .clone()
            .try_fold(0i64, |acc, units| match units {
                Units::Whole(n) => acc.checked_add(n),
                Units::Fractional(_) => None,
            })
            .map(Units::Whole)
            .unwrap_or_else(|| Units::Fractional(quantities.map(Units::as_f64).sum()))
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Units::Whole(n) => write!(f, "{n}"),
            Units::Fractional(x) => write!(f, "{x}"),
        }
    }
}

impl ContentGenerator for InventoryReport {
    fn report_type(&self) -> &'static str {
        "inventory"
    }

    fn title(&self) -> &'static str {
        "INVENTORY REPORT"
    }

    fn body(&self, payload: &Payload) -> Result<String, PipelineError> {
        let entries = required_list(payload, "items")?;

        let items = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| -> Result<Item, PipelineError> {
                let entry = entry_object(entry, "items", i)?;
                let category = required_str(entry, "category", "items", i)?;
                let quantity = match entry.get("quantity") {
                    None | Some(Value::Null) => Units::Whole(0),
                    Some(v) => Units::parse(v, i)?,
                };
                Ok(Item {
                    name: optional_field_str(entry, "name", "items", i)?.unwrap_or("(unnamed)"),
                    category,
                    quantity,
                })
            })
            .collect::<Result<Vec<_>, PipelineError>>()?;

        let total_units = Units::total(items.iter().map(|item| item.quantity));
        let mut per_category: BTreeMap<&str, usize> = BTreeMap::new();
        for item in &items {
            *per_category.entry(item.category).or_default() += 1;
        }

        let mut body = format!(
            "Total units: {total_units}\nCategories: {}\n",
            per_category.len()
        );
        for (category, count) in &per_category {
            body.push_str(&format!("  {category}: {count} items\n"));
        }
        body.push_str(&format!("\nCurrent inventory:\n{DIVIDER}\n"));
        for item in &items {
            body.push_str(&format!(
                "  - {} ({}): {} units\n",
                item.name, item.category, item.quantity
            ));
        }
        Ok(body)
    }
}

pub struct FinancialReport;

impl ContentGenerator for FinancialReport {
    fn report_type(&self) -> &'static str {
        "financial"
    }

    fn title(&self) -> &'static str {
        "FINANCIAL REPORT"
    }

    fn body(&self, payload: &Payload) -> Result<String, PipelineError> {
        let income = top_level_number(payload, "income")?;
        let expenses = top_level_number(payload, "expenses")?;
        let balance = income - expenses;

        let status = if balance > 0.0 {
            "POSITIVE"
        } else if balance < 0.0 {
            "NEGATIVE"
        } else {
            "NEUTRAL"
        };

        Ok(format!(
            "Income: ${income:.2}\nExpenses: ${expenses:.2}\nBalance: ${balance:.2}\n\n\
             Status: {status}\n"
        ))
    }
}

pub struct AuditReport;

impl ContentGenerator for AuditReport {
    fn report_type(&self) -> &'static str {
        "audit"
    }

    fn title(&self) -> &'static str {
        "AUDIT REPORT"
    }

    fn body(&self, payload: &Payload) -> Result<String, PipelineError> {
        let entries = required_list(payload, "actions")?;

        let lines = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| -> Result<String, PipelineError> {
                match entry {
                    Value::String(text) => Ok(text.clone()),
                    Value::Object(action) => Ok(format!(
                        "[{}] {}: {}",
                        required_str(action, "timestamp", "actions", i)?,
                        required_str(action, "user", "actions", i)?,
                        required_str(action, "action", "actions", i)?
                    )),
                    _ => Err(PipelineError::malformed(format!(
                        "actions[{i}] must be a string or an object"
                    ))),
                }
            })
            .collect::<Result<Vec<_>, PipelineError>>()?;

        let mut body = format!(
            "Audited actions: {}\n\nActivity log:\n{DIVIDER}\n",
            lines.len()
        );
        for (seq, line) in lines.iter().enumerate() {
            body.push_str(&format!("  {}. {line}\n", seq + 1));
        }
        Ok(body)
    }
}

fn required_list<'a>(payload: &'a Payload, key: &str) -> Result<&'a Vec<Value>, PipelineError> {
    match payload.get(key) {
        None => Err(PipelineError::malformed(format!("missing '{key}'"))),
        Some(Value::Array(list)) => Ok(list),
        Some(_) => Err(PipelineError::malformed(format!("'{key}' must be a list"))),
    }
}

fn optional_str<'a>(payload: &'a Payload, key: &str) -> Result<Option<&'a str>, PipelineError> {
    match payload.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(PipelineError::malformed(format!("'{key}' must be a string"))),
    }
}

fn top_level_number(payload: &Payload, key: &str) -> Result<f64, PipelineError> {
    match payload.get(key) {
        None => Err(PipelineError::malformed(format!("missing '{key}'"))),
        Some(v) => v
            .as_f64()
            .ok_or_else(|| PipelineError::malformed(format!("'{key}' must be a number"))),
    }
}

fn entry_object<'a>(
    entry: &'a Value,
    list: &str,
    index: usize,
) -> Result<&'a Payload, PipelineError> {
    entry
        .as_object()
        .ok_or_else(|| PipelineError::malformed(format!("{list}[{index}] must be an object")))
}

fn required_number(
    entry: &Payload,
    key: &str,
    list: &str,
    index: usize,
) -> Result<f64, PipelineError> {
    entry.get(key).and_then(Value::as_f64).ok_or_else(|| {
        PipelineError::malformed(format!("{list}[{index}].{key} must be a number"))
    })
}

fn required_str<'a>(
    entry: &'a Payload,
    key: &str,
    list: &str,
    index: usize,
) -> Result<&'a str, PipelineError> {
    entry.get(key).and_then(Value::as_str).ok_or_else(|| {
        PipelineError::malformed(format!("{list}[{index}].{key} must be a string"))
    })
}

fn optional_field_str<'a>(
    entry: &'a Payload,
    key: &str,
    list: &str,
    index: usize,
) -> Result<Option<&'a str>, PipelineError> {
    match entry.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(PipelineError::malformed(format!(
            "{list}[{index}].{key} must be a string"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> Payload {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_sales_totals_and_count() {
        let data = payload(json!({"sales": [{"amount": 10}, {"amount": 5}]}));
        let body = SalesReport.body(&data).unwrap();
        assert!(body.contains("Total sales: $15.00"));
        assert!(body.contains("Transactions: 2"));
        assert!(body.contains("Period: Not specified"));
    }

    #[test]
    fn test_sales_lists_products() {
        let data = payload(json!({
            "period": "January 2024",
            "sales": [
                {"product": "Laptop", "amount": 899.99},
                {"product": "Mouse", "amount": 25.5}
            ]
        }));
        let body = SalesReport.body(&data).unwrap();
        assert!(body.contains("Period: January 2024"));
        assert!(body.contains("  - Product: Laptop - $899.99"));
        assert!(body.contains("  - Product: Mouse - $25.50"));
        assert!(body.contains("Total sales: $925.49"));
    }

    #[test]
    fn test_sales_rejects_non_list() {
        let data = payload(json!({"sales": {"amount": 10}}));
        let err = SalesReport.generate(&data).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedPayload(_)));
    }

    #[test]
    fn test_sales_rejects_missing_amount() {
        let data = payload(json!({"sales": [{"amount": 10}, {"product": "Mouse"}]}));
        let err = SalesReport.generate(&data).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Malformed payload: sales[1].amount must be a number"
        );
    }

    #[test]
    fn test_inventory_counts_categories() {
        let data = payload(json!({"items": [
            {"name": "Laptop", "category": "Computers", "quantity": 15},
            {"name": "Mouse", "category": "Accessories", "quantity": 50},
            {"name": "Keyboard", "category": "Accessories", "quantity": 30}
        ]}));
        let body = InventoryReport.body(&data).unwrap();
        assert!(body.contains("Total units: 95"));
        assert!(body.contains("Categories: 2"));
        assert!(body.contains("  Accessories: 2 items"));
        assert!(body.contains("  Computers: 1 items"));
        assert!(body.contains("  - Mouse (Accessories): 50 units"));
    }

    #[test]
    fn test_inventory_total_past_i64_max_does_not_wrap() {
        let data = payload(json!({"items": [
            {"category": "A", "quantity": i64::MAX},
            {"category": "B", "quantity": 1}
        ]}));
        let body = InventoryReport.body(&data).unwrap();

        let total_line = body.lines().next().unwrap();
        let total: f64 = total_line
            .strip_prefix("Total units: ")
            .unwrap()
            .parse()
            .unwrap();
        assert_eq!(total, i64::MAX as f64 + 1.0);
        assert!(body.contains(&format!("(A): {} units", i64::MAX)));
    }

    #[test]
    fn test_inventory_accepts_fractional_quantities() {
        let data = payload(json!({"items": [
            {"name": "Bolt", "category": "Hardware", "quantity": 20.0},
            {"name": "Cable", "category": "Hardware", "quantity": 2.5},
            {"name": "Nut", "category": "Hardware"}
        ]}));
        let body = InventoryReport.body(&data).unwrap();
        assert!(body.contains("Total units: 22.5"));
        assert!(body.contains("  - Bolt (Hardware): 20 units"));
        assert!(body.contains("  - Cable (Hardware): 2.5 units"));
        assert!(body.contains("  - Nut (Hardware): 0 units"));
    }

    #[test]
    fn test_inventory_rejects_non_numeric_quantity() {
        let data = payload(json!({"items": [{"category": "A", "quantity": "many"}]}));
        let err = InventoryReport.body(&data).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Malformed payload: items[0].quantity must be a number"
        );
    }

    #[test]
    fn test_inventory_requires_category() {
        let data = payload(json!({"items": [{"name": "Laptop", "quantity": 1}]}));
        assert!(matches!(
            InventoryReport.body(&data),
            Err(PipelineError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_financial_balance_and_status() {
        let positive = payload(json!({"income": 1000, "expenses": 400}));
        let body = FinancialReport.body(&positive).unwrap();
        assert!(body.contains("Balance: $600.00"));
        assert!(body.contains("Status: POSITIVE"));

        let negative = payload(json!({"income": 100.5, "expenses": 200}));
        assert!(FinancialReport.body(&negative).unwrap().contains("Status: NEGATIVE"));

        let neutral = payload(json!({"income": 10, "expenses": 10}));
        assert!(FinancialReport.body(&neutral).unwrap().contains("Status: NEUTRAL"));
    }

    #[test]
    fn test_financial_missing_field() {
        let data = payload(json!({"income": 1000}));
        let err = FinancialReport.generate(&data).unwrap_err();
        assert_eq!(err.to_string(), "Malformed payload: missing 'expenses'");
    }

    #[test]
    fn test_audit_numbers_entries() {
        let data = payload(json!({"actions": [
            {"timestamp": "2024-01-15 10:30", "user": "admin", "action": "Login"},
            "manual note"
        ]}));
        let body = AuditReport.body(&data).unwrap();
        assert!(body.contains("Audited actions: 2"));
        assert!(body.contains("  1. [2024-01-15 10:30] admin: Login"));
        assert!(body.contains("  2. manual note"));
    }

    #[test]
    fn test_audit_rejects_numbers() {
        let data = payload(json!({"actions": [42]}));
        assert!(AuditReport.generate(&data).is_err());
    }

    #[test]
    fn test_generate_wraps_with_shared_header_and_footer() {
        let data = payload(json!({"income": 1, "expenses": 0}));
        let report = FinancialReport.generate(&data).unwrap();
        assert!(report.starts_with(RULE));
        assert!(report.contains("FINANCIAL REPORT"));
        assert!(report.contains(GENERATED_AT_LABEL));
        assert!(report.ends_with(&footer()));
    }

    #[test]
    fn test_builtin_registry_types() {
        let registry = builtin_registry();
        let names: Vec<String> = registry.available_types().into_iter().collect();
        assert_eq!(names, vec!["audit", "financial", "inventory", "sales"]);
        for name in names {
            let generator = registry.create(&name).unwrap();
            assert_eq!(generator.report_type(), name);
        }
    }
}
