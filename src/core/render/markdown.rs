// src/core/render/markdown.rs
use std::collections::HashMap;
use chrono::Utc;
use serde::Serialize;
use tera::{Context, Tera, Value};

use crate::error::Result;
use super::super::model::{Column, Package, Routine, Table};

const PACKAGE_TEMPLATE: &str = r#"{% if include_metadata -%}
---
title: Package {{ package.name }}
schema: {{ schema }}
generated: {{ generated }}
---

{% endif -%}
{% if standalone -%}
# Standalone routines
{%- else -%}
# Package `{{ package.name }}`
{%- endif %}

## Contents

{% for routine in routines -%}
- [{{ routine.name }}](#{{ routine.name | lower }})
{% endfor %}
---
{% for routine in routines %}
## {{ routine.name }}

Kind: {{ routine.kind }}
{% if routine.description %}
{{ routine.description }}
{% endif %}
### Parameters

{% if routine.parameters -%}
| Name | Type |
|------|------|
{% for param in routine.parameters -%}
| {{ param.name | md_escape }} | {{ param.type_name | md_escape }} |
{% endfor -%}
{% else -%}
_None_
{% endif %}
### Dependencies

{% if routine.dependencies -%}
| Name | Type | Schema | Usage |
|------|------|--------|-------|
{% for dep in routine.dependencies -%}
| {{ dep.name | md_escape }} | {{ dep.kind | md_escape }} | {{ dep.schema | md_escape }} | {{ dep.usage | md_escape }} |
{% endfor -%}
{% else -%}
_None_
{% endif -%}
{% endfor %}"#;

const TABLE_TEMPLATE: &str = r#"{% if include_metadata -%}
---
title: Table {{ table.name }}
schema: {{ table.schema }}
generated: {{ generated }}
---

{% endif -%}
# Table `{{ table.schema }}.{{ table.name }}`
{% if table.comment %}
> {{ table.comment | md_escape }}
{% endif %}
## Summary

- **Columns:** {{ columns | length }}
- **Primary Key Columns:** {{ primary_key_count }}
- **Foreign Keys:** {{ foreign_key_count }}
- **Indexes:** {{ table.indexes | length }}

## Columns

| Name | Type | Nullable | Default | PK | FK | Comment |
|------|------|----------|---------|----|----|---------|
{% for col in columns -%}
| {{ col.name | md_escape }} | {{ col.display_type }} | {% if col.nullable %}Yes{% else %}No{% endif %} | {{ col.default_value | md_escape }} | {% if col.is_primary_key %}✔{% endif %} | {% if col.is_foreign_key %}→ `{{ col.foreign_key_reference | md_escape }}`{% endif %} | {{ col.comment | md_escape }} |
{% endfor -%}
{% for col in columns -%}
{% if col.sampled and col.sample_values %}
> Sample values for `{{ col.name }}`: {% for value in col.sample_values %}{{ value | md_escape }}{% if not loop.last %}, {% endif %}{% endfor %}
{% endif -%}
{% endfor -%}
{% if table.constraints %}
## Constraints

| Name | Type | Columns | Reference |
|------|------|---------|-----------|
{% for c in table.constraints -%}
| {{ c.name }} | {{ c.kind }} | {{ c.columns | join(sep=", ") }} | {% if c.kind == "FOREIGN KEY" and c.reference_table %}`{{ c.reference_table }}` ({% if c.reference_columns %}{{ c.reference_columns | join(sep=", ") }}{% endif %}){% endif %} |
{% endfor -%}
{% endif -%}
{% if table.indexes %}
## Indexes

| Name | Unique | Columns |
|------|--------|---------|
{% for i in table.indexes -%}
| {{ i.name }} | {% if i.unique %}Yes{% else %}No{% endif %} | {{ i.columns | join(sep=", ") }} |
{% endfor -%}
{% endif -%}
"#;

/// Escape the characters that break Markdown table cells and inline code
pub fn escape_markdown(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '|' | '`' | '<' | '>') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn md_escape_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    };
    Ok(Value::String(escape_markdown(&text)))
}

#[derive(Serialize)]
struct ColumnView<'a> {
    #[serde(flatten)]
    column: &'a Column,
    display_type: String,
}

/// Renders catalog packages and analyzed tables as Markdown pages
pub struct MarkdownRenderer {
    tera: Tera,
    include_metadata: bool,
}

impl MarkdownRenderer {
    pub fn new(include_metadata: bool) -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            ("package.md", PACKAGE_TEMPLATE),
            ("table.md", TABLE_TEMPLATE),
        ])?;
        tera.register_filter("md_escape", md_escape_filter);

        Ok(Self { tera, include_metadata })
    }

    fn base_context(&self) -> Context {
        let mut context = Context::new();
        context.insert("include_metadata", &self.include_metadata);
        context.insert("generated", &Utc::now().format("%Y-%m-%d").to_string());
        context
    }

    /// Contents index followed by one section per routine
    pub fn render_package(&self, package: &Package, schema: &str) -> Result<String> {
        let routines: Vec<&Routine> = package.routines().collect();

        let mut context = self.base_context();
        context.insert("package", package);
        context.insert("standalone", &package.is_standalone());
        context.insert("schema", schema);
        context.insert("routines", &routines);

        Ok(self.tera.render("package.md", &context)?)
    }

    pub fn render_table(&self, table: &Table) -> Result<String> {
        let columns: Vec<ColumnView> = table
            .columns
            .iter()
            .map(|column| ColumnView { column, display_type: column.display_type() })
            .collect();

        let mut context = self.base_context();
        context.insert("table", table);
        context.insert("columns", &columns);
        context.insert("primary_key_count", &table.columns.iter().filter(|c| c.is_primary_key).count());
        context.insert("foreign_key_count", &table.columns.iter().filter(|c| c.is_foreign_key).count());

        Ok(self.tera.render("table.md", &context)?)
    }
}
