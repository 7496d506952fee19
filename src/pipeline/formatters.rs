use serde::Serialize;

use super::registry::Registry;
use crate::error::{Axis, PipelineError};

/// Report text wrapped for a specific output format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormattedContent {
    pub body: String,
    pub format_type: String,
    pub file_extension: String,
}

/// Wraps text between a fixed prefix and suffix. Content is never escaped or rewritten, so
/// `strip(format(c)) == Some(c)` for every `c`.
pub trait OutputFormatter: Send + Sync {
    fn format_type(&self) -> &'static str;

    fn file_extension(&self) -> &'static str;

    fn markers(&self) -> (&'static str, &'static str);

    fn format(&self, content: &str) -> FormattedContent {
        let (open, close) = self.markers();
        FormattedContent {
            body: format!("{open}{content}{close}"),
            format_type: self.format_type().to_string(),
            file_extension: self.file_extension().to_string(),
        }
    }

    fn strip<'a>(&self, formatted: &'a str) -> Option<&'a str> {
        let (open, close) = self.markers();
        formatted.strip_prefix(open)?.strip_suffix(close)
    }
}

/// Formats raw bytes, rejecting anything that is not UTF-8 text.
pub fn format_bytes(
    formatter: &dyn OutputFormatter,
    raw: &[u8],
) -> Result<FormattedContent, PipelineError> {
    let content = std::str::from_utf8(raw).map_err(|e| {
        PipelineError::InvalidContent(format!("report content is not UTF-8 text: {e}"))
    })?;
    Ok(formatter.format(content))
}

pub fn builtin_registry() -> Registry<dyn OutputFormatter> {
    let mut registry: Registry<dyn OutputFormatter> = Registry::new(Axis::Formatter);
    registry.register("pdf", |_| Ok(Box::new(PdfFormatter) as Box<dyn OutputFormatter>));
    registry.register("excel", |_| {
        Ok(Box::new(ExcelFormatter) as Box<dyn OutputFormatter>)
    });
    registry.register("html", |_| Ok(Box::new(HtmlFormatter) as Box<dyn OutputFormatter>));
    registry
}

pub struct PdfFormatter;

impl OutputFormatter for PdfFormatter {
    fn format_type(&self) -> &'static str {
        "pdf"
    }

    fn file_extension(&self) -> &'static str {
        "pdf"
    }

    fn markers(&self) -> (&'static str, &'static str) {
        ("[PDF FORMAT]\n", "\n[END PDF]")
    }
}

pub struct ExcelFormatter;

impl OutputFormatter for ExcelFormatter {
    fn format_type(&self) -> &'static str {
        "excel"
    }

    fn file_extension(&self) -> &'static str {
        "xlsx"
    }

    fn markers(&self) -> (&'static str, &'static str) {
        ("[EXCEL FORMAT]\n", "\n[END EXCEL]")
    }
}

pub struct HtmlFormatter;

impl OutputFormatter for HtmlFormatter {
    fn format_type(&self) -> &'static str {
        "html"
    }

    fn file_extension(&self) -> &'static str {
        "html"
    }

    fn markers(&self) -> (&'static str, &'static str) {
        ("<html><body><pre>", "</pre></body></html>")
    }
}
