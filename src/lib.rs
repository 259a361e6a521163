pub mod config;
pub mod converter;
mod easy_words;
pub mod entities;
pub mod error;
pub mod markdown;
pub mod parser;
pub mod pipeline;
pub mod server;
pub mod stats;
pub mod syllables;
pub mod word_count;

pub use converter::ConvertOptions;
pub use error::ConversionError;
pub use stats::TextStatistics;

pub fn convert_html_to_markdown(html: &str) -> Result<String, ConversionError> {
    convert_html_to_markdown_with(html, &ConvertOptions::default())
}

pub fn convert_html_to_markdown_with(
    html: &str,
    options: &ConvertOptions,
) -> Result<String, ConversionError> {
    let dom = parser::parse_html(html);
    Ok(converter::convert_to_markdown(&dom, options))
}

pub fn convert_markdown_to_html(markdown: &str) -> Result<String, ConversionError> {
    Ok(markdown::render_html(markdown))
}

pub fn analyze_text(text: &str) -> Result<TextStatistics, ConversionError> {
    stats::analyze(text)
}
