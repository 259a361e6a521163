//! The seam between the HTTP layer and the text pipeline.

use crate::error::ConversionError;
use crate::stats::TextStatistics;

/// Conversions the server exposes. Implementations must be pure: no state is
/// shared between calls.
pub trait TextPipeline: Send + Sync {
    fn html_to_markdown(&self, html: &str) -> Result<String, ConversionError>;

    fn markdown_to_html(&self, markdown: &str) -> Result<String, ConversionError>;

    fn analyze(&self, text: &str) -> Result<TextStatistics, ConversionError>;
}

/// Runs the crate's own converters with the default options.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardPipeline;

impl TextPipeline for StandardPipeline {
    fn html_to_markdown(&self, html: &str) -> Result<String, ConversionError> {
        crate::convert_html_to_markdown(html)
    }

    fn markdown_to_html(&self, markdown: &str) -> Result<String, ConversionError> {
        crate::convert_markdown_to_html(markdown)
    }

    fn analyze(&self, text: &str) -> Result<TextStatistics, ConversionError> {
        crate::analyze_text(text)
    }
}
