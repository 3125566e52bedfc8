pub mod config;
pub mod converter;
pub mod error;
pub mod html;
pub mod lexer;
pub mod model;
pub mod parser;
pub mod theme;

use wasm_bindgen::prelude::*;

pub use config::{ConfigError, ConverterConfig, TableFilter};
pub use converter::Converter;
pub use error::Error;
pub use model::{Cardinality, Column, Relationship, Schema, Table};
pub use parser::{ParseError, parse};
pub use theme::{Theme, ThemeRegistry};

/// Convert DBML source to Mermaid with the given options.
pub fn convert(source: &str, config: ConverterConfig) -> Result<String, Error> {
    Ok(Converter::new(config).convert(source)?)
}

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

fn wasm_config(
    theme: Option<String>,
    only: Option<js_sys::Array>,
    html_output: bool,
) -> Result<ConverterConfig, Error> {
    let mut config = ConverterConfig::default().with_html_output(html_output);
    if let Some(theme) = theme {
        config = config.with_theme(theme.parse()?);
    }
    if let Some(only) = only {
        let names: Vec<String> = only.iter().filter_map(|v| v.as_string()).collect();
        config = config.with_only_tables(TableFilter::new(names)?);
    }
    Ok(config)
}

/// Convert DBML source to Mermaid `erDiagram` text
#[wasm_bindgen(js_name = "dbmlToMermaid")]
pub fn dbml_to_mermaid(
    source: &str,
    theme: Option<String>,
    only: Option<js_sys::Array>,
) -> Result<String, String> {
    let config = wasm_config(theme, only, false).map_err(|e| e.to_string())?;
    convert(source, config).map_err(|e| e.to_string())
}

/// Convert DBML source to a standalone HTML viewer page
#[wasm_bindgen(js_name = "dbmlToHtml")]
pub fn dbml_to_html(
    source: &str,
    theme: Option<String>,
    only: Option<js_sys::Array>,
) -> Result<String, String> {
    let config = wasm_config(theme, only, true).map_err(|e| e.to_string())?;
    let mut converter = Converter::new(config);
    converter.convert(source).map_err(|e| e.to_string())?;
    converter
        .render_html()
        .ok_or_else(|| "HTML output unavailable".to_string())
}
