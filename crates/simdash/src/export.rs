//! Export model: the resolved, unit-assigned, positioned set of fields a
//! user has chosen to output, plus the namespace tree driving nested-object
//! code emission.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::internal::{FieldId, InternalModel};
use crate::types::{DashError, DashResult};
use crate::units::Unit;

pub const DECIMAL_DIGITS_DEFAULT: u8 = 0;
const FIELD_NAME_NOT_RESOLVED_PREFIX: &str = "NOT_RESOLVED";

/// Semantic colors available for color-scale thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    Danger,
    Warning,
    Success,
    Info,
    Primary,
}

impl Color {
    pub const ALL: [Color; 5] = [
        Color::Danger,
        Color::Warning,
        Color::Success,
        Color::Info,
        Color::Primary,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Color::Danger => "danger",
            Color::Warning => "warning",
            Color::Success => "success",
            Color::Info => "info",
            Color::Primary => "primary",
        }
    }
}

/// One color-scale threshold rule. At least one bound must be set; when both
/// are, min must be below max.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorScaleRule {
    #[serde(default)]
    pub min: Option<i64>,
    #[serde(default)]
    pub max: Option<i64>,
    pub color: Color,
}

impl ColorScaleRule {
    pub fn validate(&self) -> DashResult<()> {
        match (self.min, self.max) {
            (None, None) => Err(DashError::InvalidExport(
                "invalid colorscale entry: min and max are both unset".into(),
            )),
            (Some(min), Some(max)) if min >= max => Err(DashError::InvalidExport(format!(
                "invalid colorscale entry: min={min} >= max={max}"
            ))),
            _ => Ok(()),
        }
    }
}

/// Settings for the generated Lua script.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LuaExportSettings {
    pub log_prefix: String,
    pub output_script_name: String,
    pub script_indentation: usize,
}

impl Default for LuaExportSettings {
    fn default() -> Self {
        LuaExportSettings {
            log_prefix: "SimdashExport".to_string(),
            output_script_name: "SimdashExport.lua".to_string(),
            script_indentation: 4,
        }
    }
}

/// Settings for the small HTTP server embedded in the generated script, the
/// companion page's polling target.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddedServerSettings {
    pub bind_address: String,
    /// Ephemeral range: 49152 to 65535.
    pub bind_port: u16,
    pub max_connections: u32,
    pub socket_timeout: u32,
}

impl Default for EmbeddedServerSettings {
    fn default() -> Self {
        EmbeddedServerSettings {
            bind_address: "127.0.0.1".to_string(),
            bind_port: 52025,
            max_connections: 5,
            socket_timeout: 0,
        }
    }
}

/// Settings for the companion browser page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiExportSettings {
    pub fetch_data_interval_ms: u32,
}

impl Default for UiExportSettings {
    fn default() -> Self {
        UiExportSettings {
            fetch_data_interval_ms: 200,
        }
    }
}

/// One resolved export descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportField {
    /// External output name. Dots (recursively) create nested objects.
    pub name: String,
    /// `InternalModel` dotted name, used for lookup.
    pub internal_field_name: String,
    /// Resolved by `ExportModel::resolve`.
    #[serde(skip)]
    pub internal_field: Option<FieldId>,
    /// Overrides the internal field's effective display name.
    #[serde(default)]
    pub display_name_override: Option<String>,
    /// Desired output unit; must be convertible from the internal unit.
    #[serde(default)]
    pub output_unit_override: Option<Unit>,
    #[serde(default)]
    pub decimal_digits: u8,
    #[serde(default)]
    pub row: Option<u32>,
    #[serde(default)]
    pub col: Option<u32>,
    #[serde(default)]
    pub color_scale: Vec<ColorScaleRule>,
}

impl ExportField {
    pub fn has_position(&self) -> bool {
        self.row.is_some() && self.col.is_some()
    }

    pub fn has_color_scale(&self) -> bool {
        !self.color_scale.is_empty()
    }

    pub fn name_chunks(&self) -> Vec<&str> {
        self.name.split('.').collect()
    }

    /// Display override if present, else the internal field's own display
    /// name, else its dotted name.
    pub fn effective_display_name(&self, model: &InternalModel) -> String {
        let Some(id) = self.internal_field else {
            return format!("{FIELD_NAME_NOT_RESOLVED_PREFIX}: {}", self.internal_field_name);
        };
        match &self.display_name_override {
            Some(name) if !name.is_empty() => name.clone(),
            _ => model.effective_display_name(id),
        }
    }

    /// Output unit if overridden, else the internal field's native unit.
    pub fn effective_unit(&self, model: &InternalModel) -> Unit {
        self.output_unit_override
            .or_else(|| self.internal_field.map(|id| model.field(id).unit))
            .unwrap_or(Unit::None)
    }

    pub fn unit_label(&self, model: &InternalModel) -> &'static str {
        self.effective_unit(model).label()
    }

    /// The list boundary this field sits inside, if any: the field itself
    /// when list-typed, else its nearest list ancestor.
    pub fn internal_list_field_ref(&self, model: &InternalModel) -> Option<FieldId> {
        let id = self.internal_field?;
        if model.field(id).is_list_field() {
            Some(id)
        } else {
            model.next_list_field_in_hierarchy(id)
        }
    }
}

/// The output structure returned to the user.
///
/// Fields are a list, not a map keyed by internal name: the same data may be
/// exported multiple times with different units (fuel in lbs and kg, TAS in
/// kts and m/s).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportModel {
    pub fields: Vec<ExportField>,
    pub lua_export_settings: LuaExportSettings,
    pub ui_export_settings: UiExportSettings,
    pub embedded_server_settings: EmbeddedServerSettings,
}

impl ExportModel {
    pub fn from_json(src: &str) -> DashResult<ExportModel> {
        let model: ExportModel = serde_json::from_str(src)?;
        for field in &model.fields {
            for rule in &field.color_scale {
                rule.validate()?;
            }
        }
        Ok(model)
    }

    /// Resolve every field against the internal model. Idempotent; fails on
    /// the first unknown field name.
    pub fn resolve(&mut self, model: &InternalModel) -> DashResult<()> {
        for field in &mut self.fields {
            if field.internal_field.is_none() {
                field.internal_field = Some(
                    model.get_field(&field.internal_field_name).ok_or_else(|| {
                        DashError::InvalidExport(format!(
                            "field {} not found in model",
                            field.internal_field_name
                        ))
                    })?,
                );
            }
        }
        Ok(())
    }

    /// Distinct root fields referenced by the export selection, keyed by
    /// root name.
    pub fn internal_root_fields(&self, model: &InternalModel) -> BTreeMap<String, FieldId> {
        self.fields
            .iter()
            .filter_map(|f| f.internal_field)
            .map(|id| {
                let root = model.root_of(id);
                (model.field(root).name.clone(), root)
            })
            .collect()
    }
}

/// Namespace node used only for code generation. A node holds either one
/// export field (leaf) or child nodes (interior), never both.
#[derive(Debug, Default)]
pub struct ExportTreeNode {
    /// Dotted name from the root; empty for the root itself.
    pub name: String,
    /// Keyed by local name (one chunk of the dotted name).
    pub children: BTreeMap<String, ExportTreeNode>,
    /// Index into `ExportModel::fields`.
    pub export_field: Option<usize>,
}

impl ExportTreeNode {
    /// Rebuild the namespace tree from the flat export field list. Errors
    /// when output paths overlap (a path is both a leaf and a prefix).
    pub fn build(model: &ExportModel) -> DashResult<ExportTreeNode> {
        let mut root = ExportTreeNode::default();
        for (idx, field) in model.fields.iter().enumerate() {
            root.insert(idx, &field.name, field.name_chunks())?;
        }
        Ok(root)
    }

    pub fn local_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or("")
    }

    fn insert(&mut self, field_idx: usize, full_name: &str, chunks: Vec<&str>) -> DashResult<()> {
        if self.export_field.is_some() {
            return Err(DashError::InvalidExport(format!(
                "cannot add node {full_name} to {}: it already holds an export field",
                self.name
            )));
        }

        let (local, rest) = chunks.split_first().ok_or_else(|| {
            DashError::InvalidExport(format!("invalid export field name: {full_name}"))
        })?;
        if local.is_empty() {
            return Err(DashError::InvalidExport(format!(
                "invalid export field name: {full_name}"
            )));
        }

        let child_name = if self.name.is_empty() {
            local.to_string()
        } else {
            format!("{}.{local}", self.name)
        };
        let child = self
            .children
            .entry(local.to_string())
            .or_insert_with(|| ExportTreeNode {
                name: child_name,
                ..Default::default()
            });

        if rest.is_empty() {
            if child.export_field.is_some() || !child.children.is_empty() {
                return Err(DashError::InvalidExport(format!(
                    "conflicting export field name: {full_name}"
                )));
            }
            child.export_field = Some(field_idx);
            Ok(())
        } else {
            child.insert(field_idx, full_name, rest.to_vec())
        }
    }
}
