//! HTML UI generator.
//!
//! Pure string-template substitution: one data-binding registration line
//! per enabled facet of each export field, accumulated into pre-declared
//! script variables, then a single pass over the template's placeholders.
//! Script insertions use comment-style markers (`//%var%`) so the template
//! stays valid standalone.

use tracing::debug;

use crate::export::{Color, ExportModel};
use crate::internal::InternalModel;
use crate::types::{DashResult, ReturnKind};

const TEMPLATE_VAR_DELIMITER: &str = "%";

/// Placeholders in the HTML main template.
#[derive(Debug, Clone, Copy)]
enum HtmlTemplateVar {
    BindAddress,
    BindPort,
    SetIntervalCall,
    TitleMapEntries,
    UnitMapEntries,
    DecimalDigitsMapEntries,
    PositionMapEntries,
    ColorScaleMapEntries,
    ColorScaleClassesEntries,
    AppTitle,
    AppVersion,
}

impl HtmlTemplateVar {
    fn as_str(self) -> &'static str {
        match self {
            HtmlTemplateVar::BindAddress => "bind_address",
            HtmlTemplateVar::BindPort => "bind_port",
            HtmlTemplateVar::SetIntervalCall => "set_interval_call",
            HtmlTemplateVar::TitleMapEntries => "title_map_entries",
            HtmlTemplateVar::UnitMapEntries => "unit_map_entries",
            HtmlTemplateVar::DecimalDigitsMapEntries => "decimal_digits_map_entries",
            HtmlTemplateVar::PositionMapEntries => "position_map_entries",
            HtmlTemplateVar::ColorScaleMapEntries => "color_scale_map_entries",
            HtmlTemplateVar::ColorScaleClassesEntries => "color_scale_classes_entries",
            HtmlTemplateVar::AppTitle => "app_title",
            HtmlTemplateVar::AppVersion => "app_version",
        }
    }
}

/// Settings independent of a specific export model.
#[derive(Debug, Clone)]
pub struct HtmlGeneratorSettings {
    pub app_title: String,
    pub app_version: String,
    pub script_indentation: usize,
    pub title_map_var_name: String,
    pub unit_map_var_name: String,
    pub decimal_digits_map_var_name: String,
    pub position_map_var_name: String,
    pub color_scale_map_var_name: String,
    pub color_scale_classes_var_name: String,
}

impl Default for HtmlGeneratorSettings {
    fn default() -> Self {
        HtmlGeneratorSettings {
            app_title: "Simdash".to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            script_indentation: 4,
            title_map_var_name: "titleMap".to_string(),
            unit_map_var_name: "unitMap".to_string(),
            decimal_digits_map_var_name: "decimalDigitsMap".to_string(),
            position_map_var_name: "positionMap".to_string(),
            color_scale_map_var_name: "colorScaleMap".to_string(),
            color_scale_classes_var_name: "colorScaleClasses".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HtmlGeneratorOutput {
    pub html_content: String,
}

/// Generates the companion browser page for an export model.
pub struct HtmlGenerator {
    settings: HtmlGeneratorSettings,
    main_template: String,
}

impl HtmlGenerator {
    pub fn new(settings: HtmlGeneratorSettings, main_template: String) -> Self {
        HtmlGenerator {
            settings,
            main_template,
        }
    }

    pub fn generate(
        &self,
        model: &InternalModel,
        export_model: &mut ExportModel,
    ) -> DashResult<HtmlGeneratorOutput> {
        export_model.resolve(model)?;
        debug!(
            fields = export_model.fields.len(),
            "generating HTML data bindings"
        );

        let title_map_entries = self.title_map_entries(model, export_model);
        let unit_map_entries = self.unit_map_entries(model, export_model);
        let decimal_digits_map_entries = self.decimal_digits_map_entries(model, export_model);
        let position_map_entries = self.position_map_entries(export_model);
        let color_scale_map_entries = self.color_scale_map_entries(export_model);
        let color_scale_classes_entries = self.color_scale_classes_entries();

        let http = &export_model.embedded_server_settings;
        let mut html = self.main_template.clone();
        html = fill(&html, HtmlTemplateVar::AppTitle, &self.settings.app_title, false);
        html = fill(&html, HtmlTemplateVar::AppVersion, &self.settings.app_version, false);
        html = fill(&html, HtmlTemplateVar::BindAddress, &http.bind_address, false);
        html = fill(&html, HtmlTemplateVar::BindPort, &http.bind_port.to_string(), false);
        html = fill(&html, HtmlTemplateVar::TitleMapEntries, &title_map_entries, true);
        html = fill(&html, HtmlTemplateVar::UnitMapEntries, &unit_map_entries, true);
        html = fill(
            &html,
            HtmlTemplateVar::DecimalDigitsMapEntries,
            &decimal_digits_map_entries,
            true,
        );
        html = fill(&html, HtmlTemplateVar::PositionMapEntries, &position_map_entries, true);
        html = fill(
            &html,
            HtmlTemplateVar::ColorScaleMapEntries,
            &color_scale_map_entries,
            true,
        );
        html = fill(
            &html,
            HtmlTemplateVar::ColorScaleClassesEntries,
            &color_scale_classes_entries,
            true,
        );
        html = fill(
            &html,
            HtmlTemplateVar::SetIntervalCall,
            &format!(
                "setInterval(updateData, {})",
                export_model.ui_export_settings.fetch_data_interval_ms
            ),
            true,
        );

        Ok(HtmlGeneratorOutput { html_content: html })
    }

    fn add_line(&self, content: &mut String, line: &str) {
        content.push('\n');
        content.push_str(&" ".repeat(self.settings.script_indentation));
        content.push_str(line);
    }

    fn title_map_entries(&self, model: &InternalModel, export_model: &ExportModel) -> String {
        let var_name = &self.settings.title_map_var_name;
        let mut content = String::new();
        for field in &export_model.fields {
            self.add_line(
                &mut content,
                &format!(
                    "{var_name}.set('data.{}', '{}');",
                    field.name,
                    field.effective_display_name(model)
                ),
            );
        }
        content
    }

    fn unit_map_entries(&self, model: &InternalModel, export_model: &ExportModel) -> String {
        let var_name = &self.settings.unit_map_var_name;
        let mut content = String::new();
        for field in &export_model.fields {
            self.add_line(
                &mut content,
                &format!(
                    "{var_name}.set('data.{}', '{}');",
                    field.name,
                    field.unit_label(model)
                ),
            );
        }
        content
    }

    /// Decimal-digit lines only apply to numeric fields.
    fn decimal_digits_map_entries(
        &self,
        model: &InternalModel,
        export_model: &ExportModel,
    ) -> String {
        let var_name = &self.settings.decimal_digits_map_var_name;
        let mut content = String::new();
        for field in &export_model.fields {
            let is_number = field
                .internal_field
                .map(|id| model.field(id).return_kind == ReturnKind::Number)
                .unwrap_or(false);
            if is_number {
                self.add_line(
                    &mut content,
                    &format!(
                        "{var_name}.set('data.{}', '{}');",
                        field.name, field.decimal_digits
                    ),
                );
            }
        }
        content
    }

    fn position_map_entries(&self, export_model: &ExportModel) -> String {
        let var_name = &self.settings.position_map_var_name;
        let mut content = String::new();
        for field in &export_model.fields {
            if let (Some(row), Some(col)) = (field.row, field.col) {
                self.add_line(
                    &mut content,
                    &format!("{var_name}.set('data.{}', [{row}, {col}]);", field.name),
                );
            }
        }
        content
    }

    fn color_scale_map_entries(&self, export_model: &ExportModel) -> String {
        let var_name = &self.settings.color_scale_map_var_name;
        let mut content = String::new();
        for field in &export_model.fields {
            if !field.has_color_scale() {
                continue;
            }
            self.add_line(
                &mut content,
                &format!("{var_name}.set('data.{}', []);", field.name),
            );
            for rule in &field.color_scale {
                let min = rule.min.map_or("null".to_string(), |v| v.to_string());
                let max = rule.max.map_or("null".to_string(), |v| v.to_string());
                let entry = format!("{{min: {min}, max: {max}, color: '{}'}}", rule.color.id());
                self.add_line(
                    &mut content,
                    &format!("{var_name}.get('data.{}').push({entry});", field.name),
                );
            }
        }
        content
    }

    fn color_scale_classes_entries(&self) -> String {
        let var_name = &self.settings.color_scale_classes_var_name;
        let mut content = String::new();
        for color in Color::ALL {
            self.add_line(&mut content, &format!("{var_name}.push('text-{}');", color.id()));
        }
        content
    }
}

fn fill(template: &str, var: HtmlTemplateVar, value: &str, comment: bool) -> String {
    let mut marker = format!("{TEMPLATE_VAR_DELIMITER}{}{TEMPLATE_VAR_DELIMITER}", var.as_str());
    if comment {
        marker = format!("//{marker}");
    }
    template.replace(&marker, value)
}
