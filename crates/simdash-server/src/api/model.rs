//! Request and response bodies of the JSON API.
//!
//! The frontend never sees the internal model types directly; it works
//! with a flat field catalog and a grid-shaped export request.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use simdash::{Color, ReturnKind, Unit};

use crate::error::{ServerError, ServerResult};

pub const MAX_ROWS: usize = 10;
pub const MAX_FIELDS_PER_ROW: usize = 10;
pub const MAX_DISPLAY_NAME_LEN: usize = 50;
pub const MAX_FIELD_ID_LEN: usize = 50;

#[derive(Debug, Clone, Serialize)]
pub struct ApiUnit {
    pub id: String,
    pub display_name: String,
    pub label: String,
}

impl From<Unit> for ApiUnit {
    fn from(unit: Unit) -> Self {
        ApiUnit {
            id: unit.id().to_string(),
            display_name: unit.display_name().to_string(),
            label: unit.label().to_string(),
        }
    }
}

/// One selectable entry of the source field catalog.
#[derive(Debug, Clone, Serialize)]
pub struct ApiSourceField {
    /// Dotted field name, the key used in export requests.
    pub field_id: String,
    pub display_name: String,
    pub return_kind: ReturnKind,
    pub unit: ApiUnit,
    /// Units this field may be exported in, native unit included.
    pub convertible_units: Vec<ApiUnit>,
    pub default_decimal_digits: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiSourceModel {
    /// Every known unit, independent of whether any field can reach it.
    pub units: Vec<ApiUnit>,
    pub fields: Vec<ApiSourceField>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiColorScaleRule {
    #[serde(default)]
    pub from_value: Option<i64>,
    #[serde(default)]
    pub to_value: Option<i64>,
    pub color: Color,
}

/// One cell of the export grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiExportField {
    pub field_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub unit: Option<Unit>,
    #[serde(default)]
    pub decimal_digits: Option<u8>,
    #[serde(default)]
    pub color_scale: Vec<ApiColorScaleRule>,
}

/// The generation request: a grid of export fields, row by row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiExportModel {
    pub rows: Vec<Vec<ApiExportField>>,
}

fn display_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[\w\s.()]+$").unwrap())
}

fn field_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[\w.]+$").unwrap())
}

impl ApiExportModel {
    /// Structural validation, before any model lookup. Field existence and
    /// unit convertibility are checked against the source model later.
    pub fn validate(&self) -> ServerResult<()> {
        if self.rows.len() > MAX_ROWS {
            return Err(invalid(format!("at most {MAX_ROWS} rows are allowed")));
        }
        let mut field_count = 0;
        for (row_index, row) in self.rows.iter().enumerate() {
            if row.len() > MAX_FIELDS_PER_ROW {
                return Err(invalid(format!(
                    "row {row_index} has more than {MAX_FIELDS_PER_ROW} fields"
                )));
            }
            for field in row {
                field.validate()?;
                field_count += 1;
            }
        }
        if field_count == 0 {
            return Err(invalid("no fields selected".to_string()));
        }
        Ok(())
    }
}

impl ApiExportField {
    fn validate(&self) -> ServerResult<()> {
        if self.field_id.is_empty() || self.field_id.len() > MAX_FIELD_ID_LEN {
            return Err(invalid(format!(
                "field id must be 1 to {MAX_FIELD_ID_LEN} characters"
            )));
        }
        if !field_id_pattern().is_match(&self.field_id) {
            return Err(invalid(format!(
                "field id {} contains invalid characters",
                self.field_id
            )));
        }
        if let Some(name) = &self.display_name {
            if name.len() > MAX_DISPLAY_NAME_LEN {
                return Err(invalid(format!(
                    "display name must be at most {MAX_DISPLAY_NAME_LEN} characters"
                )));
            }
            if !name.is_empty() && !display_name_pattern().is_match(name) {
                return Err(invalid(format!(
                    "display name {name:?} contains invalid characters"
                )));
            }
        }
        for rule in &self.color_scale {
            if rule.from_value.is_none() && rule.to_value.is_none() {
                return Err(invalid(format!(
                    "color scale rule of {} has neither bound",
                    self.field_id
                )));
            }
        }
        Ok(())
    }
}

fn invalid(message: String) -> ServerError {
    ServerError::InvalidInput(message)
}
