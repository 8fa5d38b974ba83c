//! External model: the simulator's raw data shape as authored in JSON.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{DashError, DashResult, ReturnKind};
use crate::units::Unit;

/// One node of the simulator's raw data structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExternalField {
    /// Unset is only legal together with `prototype_ref`.
    #[serde(default)]
    pub return_kind: Option<ReturnKind>,
    /// Simulator call producing this subtree. Only meaningful at the top
    /// level of a subtree.
    #[serde(default)]
    pub function_name: Option<String>,
    #[serde(default)]
    pub unit: Unit,
    #[serde(default)]
    pub is_portion: bool,
    /// Absolute base value a portion field is a fraction of.
    #[serde(default)]
    pub abs_base_value: Option<f64>,
    #[serde(default)]
    pub fields: BTreeMap<String, ExternalField>,
    #[serde(default)]
    pub prototype_ref: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub default_decimal_digits: u8,
}

impl ExternalField {
    pub fn references_prototype(&self) -> bool {
        self.prototype_ref.is_some()
    }

    pub fn is_list_field(&self) -> bool {
        self.return_kind == Some(ReturnKind::List)
    }

    /// Enforce the cross-field invariants for this node only.
    fn validate(&self) -> DashResult<()> {
        if self.unit != Unit::None && self.return_kind != Some(ReturnKind::Number) {
            return Err(DashError::Schema(
                "unit may only be set for return_kind number".into(),
            ));
        }

        if self.is_list_field() && self.prototype_ref.is_none() && self.fields.is_empty() {
            return Err(DashError::Schema(
                "list fields must set prototype_ref or describe their element fields".into(),
            ));
        }

        if self.abs_base_value.is_some() && !self.is_portion {
            return Err(DashError::Schema(
                "abs_base_value may only be set if is_portion".into(),
            ));
        }

        if self.is_portion && self.return_kind != Some(ReturnKind::Number) {
            return Err(DashError::Schema(
                "is_portion may only be set for return_kind number".into(),
            ));
        }

        if self.is_portion && self.abs_base_value.is_none() {
            return Err(DashError::Schema(
                "abs_base_value must be set when is_portion".into(),
            ));
        }

        if self.prototype_ref.is_some() {
            if !self.fields.is_empty() {
                return Err(DashError::Schema(
                    "fields may not be set when prototype_ref is set".into(),
                ));
            }
            if !matches!(self.return_kind, None | Some(ReturnKind::List)) {
                return Err(DashError::Schema(
                    "when prototype_ref is set, the only allowed return_kind is list".into(),
                ));
            }
        } else if self.return_kind.is_none() {
            return Err(DashError::Schema(
                "return_kind must be set unless prototype_ref is set".into(),
            ));
        }

        Ok(())
    }

    /// Validate this node and all descendants, failing on the first
    /// violation.
    fn validate_tree(&self, path: &str) -> DashResult<()> {
        self.validate()
            .map_err(|e| DashError::Schema(format!("{path}: {e}")))?;
        for (name, child) in &self.fields {
            child.validate_tree(&format!("{path}.{name}"))?;
        }
        Ok(())
    }
}

/// Top-level container: named prototypes (templates, never addressable by
/// users) and named top-level fields (the tree roots).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExternalModel {
    #[serde(default)]
    pub field_prototypes: BTreeMap<String, ExternalField>,
    #[serde(default)]
    pub fields: BTreeMap<String, ExternalField>,
}

impl ExternalModel {
    /// Parse and validate a declarative model document. The whole parse
    /// fails on the first structural violation; no partial model is
    /// returned.
    pub fn from_json(src: &str) -> DashResult<ExternalModel> {
        let model: ExternalModel = serde_json::from_str(src)?;
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> DashResult<()> {
        for (name, proto) in &self.field_prototypes {
            proto.validate_tree(name)?;
        }
        for (name, field) in &self.fields {
            field.validate_tree(name)?;
        }
        Ok(())
    }
}
