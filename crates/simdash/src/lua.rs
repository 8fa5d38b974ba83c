//! Lua script generator.
//!
//! Emits the polling script that runs inside the simulator: one extraction
//! statement per referenced root field, then assignments mirroring the
//! export namespace tree. Template substitution is a single literal pass
//! over `%name%` markers; output byte-compatibility with the embedded Lua
//! runtime matters, so there is no escaping and no template engine.

use tracing::warn;

use crate::export::{ExportModel, ExportTreeNode, LuaExportSettings};
use crate::internal::InternalModel;
use crate::types::{DashResult, ReturnKind};
use crate::units::{lua_formatter, UnitConverter};

const TEMPLATE_VAR_DELIMITER: &str = "%";
const DATA_VAR: &str = "data";

/// Placeholders in the Lua templates.
#[derive(Debug, Clone, Copy)]
enum LuaTemplateVar {
    OutputScriptName,
    DataContent,
    SocketTimeout,
    BindAddress,
    BindPort,
    MaxConnections,
    LogPrefix,
    Copyright,
}

impl LuaTemplateVar {
    fn as_str(self) -> &'static str {
        match self {
            LuaTemplateVar::OutputScriptName => "output_script_name",
            LuaTemplateVar::DataContent => "data_content",
            LuaTemplateVar::SocketTimeout => "socket_timeout",
            LuaTemplateVar::BindAddress => "bind_address",
            LuaTemplateVar::BindPort => "bind_port",
            LuaTemplateVar::MaxConnections => "max_connections",
            LuaTemplateVar::LogPrefix => "log_prefix",
            LuaTemplateVar::Copyright => "copyright",
        }
    }
}

/// Template text consumed by the generator. Reading the files from disk is
/// the resource layer's job.
#[derive(Debug, Clone)]
pub struct LuaTemplates {
    /// The generated polling script's skeleton.
    pub main: String,
    /// The short snippet appended to the simulator's own export hook.
    pub export: String,
}

#[derive(Debug, Clone)]
pub struct LuaGeneratorOutput {
    /// Content of the output script file named per settings.
    pub script_content: String,
    /// Content to append to the simulator's export hook script. A single
    /// call line.
    pub export_content: String,
}

pub struct LuaGenerator {
    main_template: String,
    export_template: String,
    license_txt: String,
}

impl LuaGenerator {
    pub fn new(templates: LuaTemplates, license_txt: String) -> Self {
        let main_template = fill(
            &templates.main,
            LuaTemplateVar::Copyright,
            &license_txt,
        );
        LuaGenerator {
            main_template,
            export_template: templates.export,
            license_txt,
        }
    }

    /// Generate both artifacts for a resolved export selection.
    pub fn generate(
        &self,
        model: &InternalModel,
        export_model: &mut ExportModel,
        converter: &UnitConverter,
    ) -> DashResult<LuaGeneratorOutput> {
        export_model.resolve(model)?;

        let quoted_log_prefix = format!("\"{}\"", export_model.lua_export_settings.log_prefix);

        let mut export_content = fill(
            &self.export_template,
            LuaTemplateVar::OutputScriptName,
            &export_model.lua_export_settings.output_script_name,
        );
        export_content = fill(&export_content, LuaTemplateVar::Copyright, &self.license_txt);
        export_content = fill(&export_content, LuaTemplateVar::LogPrefix, &quoted_log_prefix);

        let data_content = self.build_script_content(model, export_model, converter)?;
        let http = &export_model.embedded_server_settings;
        let mut sc = fill(&self.main_template, LuaTemplateVar::DataContent, &data_content);
        sc = fill(&sc, LuaTemplateVar::LogPrefix, &quoted_log_prefix);
        sc = fill(
            &sc,
            LuaTemplateVar::SocketTimeout,
            &http.socket_timeout.to_string(),
        );
        sc = fill(
            &sc,
            LuaTemplateVar::BindAddress,
            &format!("\"{}\"", http.bind_address),
        );
        sc = fill(&sc, LuaTemplateVar::BindPort, &http.bind_port.to_string());
        sc = fill(
            &sc,
            LuaTemplateVar::MaxConnections,
            &http.max_connections.to_string(),
        );

        Ok(LuaGeneratorOutput {
            script_content: sc,
            export_content,
        })
    }

    fn build_script_content(
        &self,
        model: &InternalModel,
        export_model: &ExportModel,
        converter: &UnitConverter,
    ) -> DashResult<String> {
        let mut sc = String::new();
        sc = self.add_root_fields(model, export_model, sc);
        let tree = ExportTreeNode::build(export_model)?;
        let settings = &export_model.lua_export_settings;
        for node in tree.children.values() {
            sc = self.add_node(model, export_model, converter, node, sc, settings);
        }
        Ok(sc)
    }

    /// One call-and-default-fallback statement per distinct referenced root.
    fn add_root_fields(
        &self,
        model: &InternalModel,
        export_model: &ExportModel,
        mut sc: String,
    ) -> String {
        let settings = &export_model.lua_export_settings;
        for root_id in export_model.internal_root_fields(model).values() {
            let root = model.field(*root_id);
            let Some(function_name) = &root.function_name else {
                warn!("root field {} has no simulator function, skipping", root.name);
                continue;
            };
            let default_value = root.return_kind.default_lua_value();
            sc = add_line(
                sc,
                &format!(
                    "local {} = safe_get({function_name}, {default_value})",
                    root.name
                ),
                settings,
                1,
            );
        }
        sc
    }

    fn add_node(
        &self,
        model: &InternalModel,
        export_model: &ExportModel,
        converter: &UnitConverter,
        node: &ExportTreeNode,
        mut sc: String,
        settings: &LuaExportSettings,
    ) -> String {
        let Some(field_idx) = node.export_field else {
            sc = add_line(sc, &format!("{DATA_VAR}.{} = {{}}", node.name), settings, 1);
            for child in node.children.values() {
                sc = self.add_node(model, export_model, converter, child, sc, settings);
            }
            return sc;
        };

        // Leaf: all parent objects have been created before.
        let export_field = &export_model.fields[field_idx];
        let Some(internal_id) = export_field.internal_field else {
            return sc;
        };
        let internal = model.field(internal_id);

        if let Some(list_id) = model.next_list_field_in_hierarchy(internal_id) {
            // List fields cannot be leaves themselves; iterate the resolved
            // list and assign per index.
            let list_dotted = model.dotted_name(list_id);
            let node_at_index = match node.name.rsplit_once('.') {
                Some((parent_name, _)) => format!("{DATA_VAR}.{parent_name}"),
                None => DATA_VAR.to_string(),
            };
            let parent_dotted = match internal.parent {
                Some(parent_id) => model.dotted_name(parent_id),
                None => list_dotted.clone(),
            };
            sc = add_line(sc, &format!("for i, v in ipairs({list_dotted}) do"), settings, 1);
            sc = add_line(sc, &format!("{node_at_index}[i] = {{}}"), settings, 2);
            sc = add_line(
                sc,
                &format!(
                    "{node_at_index}[i].{} = {parent_dotted}[i].{}",
                    node.local_name(),
                    internal.name
                ),
                settings,
                2,
            );
            sc = add_line(sc, "end", settings, 1);
            return sc;
        }

        let dotted = model.dotted_name(internal_id);
        let mut line = format!("{DATA_VAR}.{} = ", node.name);
        if let Some(formatter) = lua_formatter(export_field.effective_unit(model)) {
            line.push_str(&format!("{formatter}({dotted})"));
        } else {
            if internal.return_kind == ReturnKind::Number {
                line.push_str(&format!("({dotted} or 0)"));
            } else {
                line.push_str(&dotted);
            }
            if let Some(abs_base_value) = internal.abs_base_value {
                line.push_str(&format!(" * {abs_base_value}"));
            }
            if let Some(output_unit) = export_field.output_unit_override {
                if let Some(factor) = converter.conversion_factor(internal.unit, output_unit) {
                    if factor != 1.0 {
                        line.push_str(&format!(" * {factor}"));
                    }
                }
            }
        }
        add_line(sc, &line, settings, 1)
    }
}

fn fill(template: &str, var: LuaTemplateVar, value: &str) -> String {
    let marker = format!("{TEMPLATE_VAR_DELIMITER}{}{TEMPLATE_VAR_DELIMITER}", var.as_str());
    template.replace(&marker, value)
}

/// Append a line; lines after the first are indented by the configured
/// width times `indent_factor`.
fn add_line(content: String, line: &str, settings: &LuaExportSettings, indent_factor: usize) -> String {
    let mut out = content;
    if !out.is_empty() {
        out.push('\n');
        out.push_str(&" ".repeat(settings.script_indentation * indent_factor));
    }
    out.push_str(line);
    out
}
