//! Export generation: API request in, zip bundle of generated files out.

use std::io::{Cursor, Write};

use tracing::info;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use simdash::{
    ColorScaleRule, ExportField, ExportModel, HtmlGenerator, HtmlGeneratorSettings, LuaGenerator,
    LuaTemplates,
};

use crate::api::model::ApiExportModel;
use crate::error::{ServerError, ServerResult};
use crate::notices::{LICENSE_FILE, README_FILE};
use crate::resources::{
    ResourceProvider, HTML_MAIN_TEMPLATE_FILE, LUA_EXPORT_TEMPLATE_FILE, LUA_MAIN_TEMPLATE_FILE,
};
use crate::settings::clamp_fetch_interval;
use crate::source_model::SourceModelService;

const EXPORT_SNIPPET_FILE_NAME: &str = "add-to-Export.lua";
const LICENSE_BUNDLE_FILE_NAME: &str = "license.txt";
const README_BUNDLE_FILE_NAME: &str = "readme.txt";

#[derive(Debug, Clone)]
pub struct GeneratedBundle {
    pub file_name: String,
    pub zip_bytes: Vec<u8>,
}

/// Stateless per-request generation over templates loaded once at startup.
pub struct GeneratorService {
    lua_generator: LuaGenerator,
    html_generator: HtmlGenerator,
    app_title: String,
    license_txt: String,
    readme_txt: String,
}

impl GeneratorService {
    pub fn load(
        resources: &ResourceProvider,
        app_title: &str,
        app_version: &str,
    ) -> ServerResult<GeneratorService> {
        let license_txt = resources.read_notice(LICENSE_FILE)?;
        let readme_txt = resources.read_notice(README_FILE)?;
        let lua_templates = LuaTemplates {
            main: resources.read_template_file(LUA_MAIN_TEMPLATE_FILE)?,
            export: resources.read_template_file(LUA_EXPORT_TEMPLATE_FILE)?,
        };
        let html_template = resources.read_template_file(HTML_MAIN_TEMPLATE_FILE)?;
        let html_settings = HtmlGeneratorSettings {
            app_title: app_title.to_string(),
            app_version: app_version.to_string(),
            ..Default::default()
        };
        Ok(GeneratorService {
            lua_generator: LuaGenerator::new(lua_templates, license_txt.clone()),
            html_generator: HtmlGenerator::new(html_settings, html_template),
            app_title: app_title.to_string(),
            license_txt,
            readme_txt,
        })
    }

    pub fn generate(
        &self,
        request: &ApiExportModel,
        source: &SourceModelService,
    ) -> ServerResult<GeneratedBundle> {
        request.validate()?;
        let mut export_model = self.map_request(request, source)?;

        let lua_output = self.lua_generator.generate(
            source.model(),
            &mut export_model,
            source.converter(),
        )?;
        let html_output = self
            .html_generator
            .generate(source.model(), &mut export_model)?;

        info!(
            fields = export_model.fields.len(),
            script = %export_model.lua_export_settings.output_script_name,
            "export bundle generated"
        );

        let zip_bytes = self.write_bundle(
            &export_model.lua_export_settings.output_script_name,
            &lua_output.script_content,
            &lua_output.export_content,
            &html_output.html_content,
        )?;
        Ok(GeneratedBundle {
            file_name: format!("{}-export.zip", self.app_title.to_lowercase()),
            zip_bytes,
        })
    }

    /// Turn the validated grid into export fields. Dotted field ids double
    /// as output names, so nested source fields come out nested again.
    fn map_request(
        &self,
        request: &ApiExportModel,
        source: &SourceModelService,
    ) -> ServerResult<ExportModel> {
        let mut export_model = ExportModel::default();
        for (row_index, row) in request.rows.iter().enumerate() {
            for (col_index, cell) in row.iter().enumerate() {
                let internal_id = source.get_field(&cell.field_id)?;
                let unit = source.unit_for_field(&cell.field_id, cell.unit)?;
                let decimal_digits = cell
                    .decimal_digits
                    .unwrap_or(source.model().field(internal_id).default_decimal_digits);
                export_model.fields.push(ExportField {
                    name: cell.field_id.clone(),
                    internal_field_name: cell.field_id.clone(),
                    internal_field: None,
                    display_name_override: cell.display_name.clone(),
                    output_unit_override: Some(unit),
                    decimal_digits,
                    row: Some(row_index as u32),
                    col: Some(col_index as u32),
                    color_scale: cell
                        .color_scale
                        .iter()
                        .map(|rule| ColorScaleRule {
                            min: rule.from_value,
                            max: rule.to_value,
                            color: rule.color,
                        })
                        .collect(),
                });
            }
        }
        for field in &export_model.fields {
            for rule in &field.color_scale {
                rule.validate()
                    .map_err(|e| ServerError::InvalidInput(e.to_string()))?;
            }
        }
        export_model.ui_export_settings.fetch_data_interval_ms =
            clamp_fetch_interval(export_model.ui_export_settings.fetch_data_interval_ms);
        Ok(export_model)
    }

    fn write_bundle(
        &self,
        script_name: &str,
        script_content: &str,
        export_content: &str,
        html_content: &str,
    ) -> ServerResult<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        let members = [
            (format!("{}.html", self.app_title), html_content),
            (script_name.to_string(), script_content),
            (EXPORT_SNIPPET_FILE_NAME.to_string(), export_content),
            (LICENSE_BUNDLE_FILE_NAME.to_string(), self.license_txt.as_str()),
            (README_BUNDLE_FILE_NAME.to_string(), self.readme_txt.as_str()),
        ];
        for (name, content) in members {
            writer
                .start_file(name, options)
                .map_err(|e| ServerError::Internal(format!("zip write failed: {e}")))?;
            writer.write_all(content.as_bytes())?;
        }
        let cursor = writer
            .finish()
            .map_err(|e| ServerError::Internal(format!("zip write failed: {e}")))?;
        Ok(cursor.into_inner())
    }
}
