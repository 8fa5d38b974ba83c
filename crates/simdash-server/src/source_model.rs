//! Source model loading and the field catalog exposed to the frontend.

use tracing::info;

use simdash::{ExternalModel, FieldId, InternalModel, Unit, UnitConverter};

use crate::api::model::{ApiSourceField, ApiSourceModel, ApiUnit};
use crate::error::{ServerError, ServerResult};
use crate::resources::{ResourceProvider, DEFAULT_EXTERNAL_MODEL_FILE};

/// The resolved simulator model plus the converter, loaded once at startup
/// and shared by all requests.
pub struct SourceModelService {
    model: InternalModel,
    converter: UnitConverter,
}

impl SourceModelService {
    pub fn load(resources: &ResourceProvider) -> ServerResult<SourceModelService> {
        let raw = resources.read_external_model_file(DEFAULT_EXTERNAL_MODEL_FILE)?;
        let external = ExternalModel::from_json(&raw)?;
        let model = InternalModel::resolve(&external)?;
        info!(
            leaves = model.leaf_fields().len(),
            "source model loaded and resolved"
        );
        Ok(SourceModelService {
            model,
            converter: UnitConverter::new(),
        })
    }

    pub fn model(&self) -> &InternalModel {
        &self.model
    }

    pub fn converter(&self) -> &UnitConverter {
        &self.converter
    }

    /// Flat catalog of exportable fields, dotted names as ids.
    pub fn catalog(&self) -> ApiSourceModel {
        let fields = self
            .model
            .leaf_fields()
            .into_iter()
            .map(|id| {
                let field = self.model.field(id);
                ApiSourceField {
                    field_id: self.model.dotted_name(id),
                    display_name: self.model.effective_display_name(id),
                    return_kind: field.return_kind,
                    unit: field.unit.into(),
                    convertible_units: self
                        .converter
                        .convertible_units(field.unit)
                        .into_iter()
                        .map(ApiUnit::from)
                        .collect(),
                    default_decimal_digits: field.default_decimal_digits,
                }
            })
            .collect();
        let units = Unit::ALL.into_iter().map(ApiUnit::from).collect();
        ApiSourceModel { units, fields }
    }

    pub fn get_field(&self, field_id: &str) -> ServerResult<FieldId> {
        self.model
            .get_field(field_id)
            .ok_or_else(|| ServerError::InvalidInput(format!("no such field {field_id}")))
    }

    /// The unit a field will be exported in, after checking convertibility
    /// against its native unit.
    pub fn unit_for_field(&self, field_id: &str, requested: Option<Unit>) -> ServerResult<Unit> {
        let id = self.get_field(field_id)?;
        let native = self.model.field(id).unit;
        match requested {
            None => Ok(native),
            Some(unit) => {
                if self.converter.convertible_units(native).contains(&unit) {
                    Ok(unit)
                } else {
                    Err(ServerError::InvalidInput(format!(
                        "no such unit {unit} for field {field_id}"
                    )))
                }
            }
        }
    }
}
