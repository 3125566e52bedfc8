//! Schema to Mermaid `erDiagram` rendering.

use std::fmt::Write;

use tracing::{debug, warn};

use crate::config::ConverterConfig;
use crate::html;
use crate::model::{Cardinality, Column, Relationship, Schema, Table};
use crate::parser::{ParseError, parse};
use crate::theme::ThemeRegistry;

/// Crow's foot notation, left side first.
pub fn notation(cardinality: Cardinality) -> &'static str {
    match cardinality {
        Cardinality::OneToOne => "||--||",
        Cardinality::OneToMany => "||--o{",
        Cardinality::ManyToOne => "}o--||",
        Cardinality::ManyToMany => "}o--o{",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMarker {
    Pk,
    Fk,
}

impl KeyMarker {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pk => "PK",
            Self::Fk => "FK",
        }
    }
}

pub struct Converter<'t> {
    config: ConverterConfig,
    themes: &'t ThemeRegistry,
    diagram: Option<String>,
}

impl Converter<'static> {
    pub fn new(config: ConverterConfig) -> Self {
        Self::with_themes(config, ThemeRegistry::builtin())
    }
}

impl<'t> Converter<'t> {
    pub fn with_themes(config: ConverterConfig, themes: &'t ThemeRegistry) -> Self {
        Self {
            config,
            themes,
            diagram: None,
        }
    }

    /// Parse DBML source and render it. Parse errors are returned as-is.
    pub fn convert(&mut self, source: &str) -> Result<String, ParseError> {
        let schema = parse(source)?;
        Ok(self.convert_schema(&schema))
    }

    pub fn convert_schema(&mut self, schema: &Schema) -> String {
        let diagram = self.render(schema);
        self.diagram = Some(diagram.clone());
        diagram
    }

    /// The HTML viewer for the last converted diagram, when HTML output was
    /// requested.
    pub fn render_html(&self) -> Option<String> {
        if !self.config.html_output {
            return None;
        }
        self.diagram
            .as_deref()
            .map(|diagram| html::render(diagram, self.config.theme))
    }

    pub fn render(&self, schema: &Schema) -> String {
        let tables: Vec<&Table> = schema
            .tables
            .iter()
            .filter(|t| self.config.includes(&t.name))
            .collect();

        let relationships: Vec<&Relationship> = schema
            .relationships
            .iter()
            .filter(|r| self.retains(r))
            .collect();

        for rel in schema.unresolved_relationships().filter(|r| self.retains(r)) {
            warn!(
                from = %rel.from_table,
                to = %rel.to_table,
                relationship = %rel.label(),
                "relationship references an undeclared table, rendering raw names"
            );
        }

        let mut out = String::new();

        if let Some(preset) = self.themes.preset(self.config.theme) {
            writeln!(&mut out, "{}", preset.directive()).unwrap();
        }
        writeln!(&mut out, "erDiagram").unwrap();

        for table in &tables {
            self.render_table(&mut out, table, &relationships);
        }

        for rel in &relationships {
            writeln!(
                &mut out,
                "    {} {} {} : \"{}\"",
                entity_name(&rel.from_table),
                notation(rel.cardinality),
                entity_name(&rel.to_table),
                rel.label().replace('"', "'")
            )
            .unwrap();
        }

        debug!(
            theme = %self.config.theme,
            tables = tables.len(),
            relationships = relationships.len(),
            "rendered diagram"
        );

        out
    }

    /// Both endpoint tables must survive the allowlist.
    fn retains(&self, rel: &Relationship) -> bool {
        self.config.includes(&rel.from_table) && self.config.includes(&rel.to_table)
    }

    fn render_table(&self, out: &mut String, table: &Table, relationships: &[&Relationship]) {
        writeln!(out, "    {} {{", entity_name(&table.name)).unwrap();
        for column in &table.columns {
            let typ = attribute_word(&column.typ);
            let name = attribute_word(&column.name);
            match key_marker(&table.name, column, relationships) {
                Some(marker) => {
                    writeln!(out, "        {} {} {}", typ, name, marker.as_str()).unwrap()
                }
                None => writeln!(out, "        {} {}", typ, name).unwrap(),
            }
        }
        writeln!(out, "    }}").unwrap();
    }
}

/// PK wins over FK; a column carries at most one marker.
pub fn key_marker(
    table: &str,
    column: &Column,
    relationships: &[&Relationship],
) -> Option<KeyMarker> {
    if column.is_primary_key() {
        Some(KeyMarker::Pk)
    } else if relationships.iter().any(|r| r.touches(table, &column.name)) {
        Some(KeyMarker::Fk)
    } else {
        None
    }
}

/// Entity names outside `[A-Za-z0-9_-]` are quoted.
fn entity_name(name: &str) -> String {
    let plain = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if plain {
        name.to_string()
    } else {
        format!("\"{}\"", name.replace('"', "'"))
    }
}

/// Attribute types and names are single words: `decimal(10,2)` becomes
/// `decimal(10_2)`, `created at` becomes `created_at`.
fn attribute_word(word: &str) -> String {
    word.chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '_' | '-' | '(' | ')' | '[' | ']' | '*') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
