//! Auxiliary reference tables (calibration curves and the like).
//!
//! Components fetch this data during `prepare`; the execution core itself
//! only passes the [`ReferenceStore`] handle through and never reads a
//! table. Loading rows from disk is an external concern — what lives here
//! is the in-memory shape: a [`Template`] describing column names, types
//! and key columns, and the [`ReferenceTable`]s built through it, looked up
//! by a tuple of key values.

use miette::Diagnostic;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::attributes::{AttrType, AttrValue, ValueParseError, parse_bool};
use crate::samples::AttrMap;
use crate::workflows::ConfigurationError;

/// One column of a reference-table template.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateField {
    pub name: String,
    pub ty: AttrType,
    /// Key columns together form the lookup tuple of the built table.
    pub is_key: bool,
}

/// Errors from building a table through a template.
#[derive(Debug, Error, Diagnostic)]
pub enum TemplateError {
    /// A table needs at least one key column and one value column.
    #[error("template {template:?} needs at least two fields to build a table")]
    #[diagnostic(code(coreflow::reference::too_few_fields))]
    TooFewFields { template: String },

    #[error("row {row} is missing field {field:?}")]
    #[diagnostic(code(coreflow::reference::missing_field))]
    MissingField { row: usize, field: String },

    #[error(transparent)]
    #[diagnostic(code(coreflow::reference::value))]
    Value(#[from] ValueParseError),
}

/// Describes the column layout of a reference table.
///
/// Field order is preserved; key fields iterate first.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Template {
    name: String,
    fields: Vec<TemplateField>,
}

impl Template {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_field(&mut self, name: impl Into<String>, ty: AttrType, is_key: bool) {
        self.fields.push(TemplateField {
            name: name.into(),
            ty,
            is_key,
        });
    }

    pub fn key_fields(&self) -> impl Iterator<Item = &TemplateField> {
        self.fields.iter().filter(|f| f.is_key)
    }

    pub fn value_fields(&self) -> impl Iterator<Item = &TemplateField> {
        self.fields.iter().filter(|f| !f.is_key)
    }

    /// Fields in presentation order: keys first, then the rest.
    pub fn fields(&self) -> impl Iterator<Item = &TemplateField> {
        self.key_fields().chain(self.value_fields())
    }

    /// Build a table from textual rows.
    ///
    /// Each row is keyed by the tuple of its key-column values, or by its
    /// index when the template declares no key columns. Value parsing
    /// follows the field types; integer columns accept float-formatted text
    /// by truncation, a common artifact of spreadsheet exports.
    pub fn build_table<I>(&self, name: impl Into<String>, rows: I) -> Result<ReferenceTable, TemplateError>
    where
        I: IntoIterator<Item = FxHashMap<String, String>>,
    {
        if self.fields.len() < 2 {
            return Err(TemplateError::TooFewFields {
                template: self.name.clone(),
            });
        }
        let mut table = ReferenceTable::new(name, &self.name);
        for (index, row) in rows.into_iter().enumerate() {
            let fetch = |field: &TemplateField| -> Result<AttrValue, TemplateError> {
                let raw = row
                    .get(&field.name)
                    .ok_or_else(|| TemplateError::MissingField {
                        row: index,
                        field: field.name.clone(),
                    })?;
                convert_field(field, raw)
            };
            let key: Vec<AttrValue> = if self.key_fields().next().is_some() {
                self.key_fields().map(&fetch).collect::<Result<_, _>>()?
            } else {
                vec![AttrValue::Integer(index as i64)]
            };
            let mut values = AttrMap::default();
            for field in self.value_fields() {
                values.insert(field.name.clone(), fetch(field)?);
            }
            table.insert(key, values);
        }
        Ok(table)
    }
}

fn convert_field(field: &TemplateField, raw: &str) -> Result<AttrValue, TemplateError> {
    let err = || ValueParseError {
        value: raw.to_owned(),
        ty: field.ty,
    };
    Ok(match field.ty {
        AttrType::String => AttrValue::String(raw.to_owned()),
        AttrType::Integer => match raw.trim().parse::<i64>() {
            Ok(i) => AttrValue::Integer(i),
            // ints sometimes arrive written as floats; truncate them
            Err(_) => AttrValue::Integer(raw.trim().parse::<f64>().map_err(|_| err())? as i64),
        },
        AttrType::Float => AttrValue::Float(raw.trim().parse::<f64>().map_err(|_| err())?),
        AttrType::Boolean => AttrValue::Boolean(parse_bool(raw).ok_or_else(err)?),
    })
}

/// A lookup table keyed by a tuple of values.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReferenceTable {
    name: String,
    template: String,
    rows: FxHashMap<Vec<AttrValue>, AttrMap>,
}

impl ReferenceTable {
    pub fn new(name: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            template: template.into(),
            rows: FxHashMap::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the template this table was built through.
    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn insert(&mut self, key: Vec<AttrValue>, values: AttrMap) {
        self.rows.insert(key, values);
    }

    pub fn lookup(&self, key: &[AttrValue]) -> Option<&AttrMap> {
        self.rows.get(key)
    }

    /// Single-value convenience: the key is tried as a 1-tuple.
    pub fn lookup_scalar(&self, key: &AttrValue) -> Option<&AttrMap> {
        self.rows.get(std::slice::from_ref(key))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Named collection of reference tables, shared read-only with components.
#[derive(Clone, Debug, Default)]
pub struct ReferenceStore {
    tables: FxHashMap<String, ReferenceTable>,
}

impl ReferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, table: ReferenceTable) {
        self.tables.insert(table.name().to_owned(), table);
    }

    pub fn get(&self, name: &str) -> Option<&ReferenceTable> {
        self.tables.get(name)
    }

    /// Lookup for component `prepare` hooks: a missing table is a
    /// configuration error that aborts binding.
    pub fn require(&self, name: &str) -> Result<&ReferenceTable, ConfigurationError> {
        self.tables
            .get(name)
            .ok_or_else(|| ConfigurationError::UnknownReference {
                table: name.to_owned(),
            })
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
