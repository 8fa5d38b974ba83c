//! End-to-end pipeline tests: external JSON in, resolved model, generated
//! Lua script and HTML page out.

use simdash::{
    ExportField, ExportModel, ExternalModel, HtmlGenerator, HtmlGeneratorSettings, InternalModel,
    LuaGenerator, LuaTemplates, Unit, UnitConverter,
};

const SOURCE_MODEL: &str = r#"{
    "field_prototypes": {
        "engine_proto": {
            "return_kind": "table",
            "fields": {
                "rpm": { "return_kind": "number", "display_name": "RPM" },
                "temperature": { "return_kind": "number", "unit": "degrees" }
            }
        }
    },
    "fields": {
        "altitude": {
            "return_kind": "number",
            "unit": "meters",
            "function_name": "get_altitude",
            "display_name": "Altitude ASL"
        },
        "airspeed": {
            "return_kind": "number",
            "unit": "ms",
            "function_name": "get_airspeed"
        },
        "engines": {
            "return_kind": "list",
            "function_name": "get_engines",
            "prototype_ref": "engine_proto"
        },
        "fuel": {
            "return_kind": "number",
            "unit": "kilograms",
            "function_name": "get_fuel_portion",
            "is_portion": true,
            "abs_base_value": 1450.0
        }
    }
}"#;

fn resolved_model() -> InternalModel {
    let external = ExternalModel::from_json(SOURCE_MODEL).unwrap();
    InternalModel::resolve(&external).unwrap()
}

fn export_field(name: &str, internal_name: &str, unit: Option<Unit>) -> ExportField {
    ExportField {
        name: name.to_string(),
        internal_field_name: internal_name.to_string(),
        internal_field: None,
        display_name_override: None,
        output_unit_override: unit,
        decimal_digits: 0,
        row: None,
        col: None,
        color_scale: Vec::new(),
    }
}

fn lua_templates() -> LuaTemplates {
    LuaTemplates {
        main: "-- %copyright%\nlocal PREFIX = %log_prefix%\nlocal ADDR = %bind_address%\nlocal PORT = %bind_port%\nlocal MAX = %max_connections%\nlocal TIMEOUT = %socket_timeout%\nfunction collectData()\n    local data = {}\n    %data_content%\n    return data\nend\n".to_string(),
        export: "pcall(function() dofile([[Scripts\\%output_script_name%]]) end)\n".to_string(),
    }
}

const HTML_TEMPLATE: &str = "<title>%app_title% %app_version%</title>\n\
    const URL = 'http://%bind_address%:%bind_port%/';\n\
    const titleMap = new Map();\n\
    //%title_map_entries%\n\
    const unitMap = new Map();\n\
    //%unit_map_entries%\n\
    const decimalDigitsMap = new Map();\n\
    //%decimal_digits_map_entries%\n\
    const positionMap = new Map();\n\
    //%position_map_entries%\n\
    const colorScaleMap = new Map();\n\
    //%color_scale_map_entries%\n\
    const colorScaleClasses = [];\n\
    //%color_scale_classes_entries%\n\
    //%set_interval_call%\n";

#[test]
fn leaf_fields_cover_prototype_instances() {
    let model = resolved_model();
    let leaves: Vec<String> = model
        .leaf_fields()
        .into_iter()
        .map(|id| model.dotted_name(id))
        .collect();
    assert_eq!(
        leaves,
        vec![
            "airspeed",
            "altitude",
            "engines.rpm",
            "engines.temperature",
            "fuel"
        ]
    );
}

#[test]
fn convertible_units_form_closed_families() {
    let converter = UnitConverter::new();
    let speeds = converter.convertible_units(Unit::Ms);
    for unit in [Unit::Ms, Unit::Kmh, Unit::Mph, Unit::Fts, Unit::Knots] {
        assert!(speeds.contains(&unit));
        assert!(converter.conversion_factor(Unit::Ms, unit).is_some());
    }
    assert!(!speeds.contains(&Unit::Meters));
}

#[test]
fn full_pipeline_generates_script_and_page() {
    let model = resolved_model();
    let mut export = ExportModel {
        fields: vec![
            export_field("altitude", "altitude", Some(Unit::Feet)),
            export_field("airspeed", "airspeed", Some(Unit::Knots)),
            export_field("engines.rpm", "engines.rpm", None),
            export_field("fuel", "fuel", Some(Unit::Pounds)),
        ],
        ..Default::default()
    };

    let lua = LuaGenerator::new(lua_templates(), "license text".to_string());
    let output = lua
        .generate(&model, &mut export, &UnitConverter::new())
        .unwrap();

    let sc = &output.script_content;
    assert!(sc.contains("local altitude = safe_get(get_altitude, 0)"));
    assert!(sc.contains("local engines = safe_get(get_engines, {})"));
    assert!(sc.contains("data.altitude = (altitude or 0) * 3.28084"));
    assert!(sc.contains("data.engines = {}"));
    assert!(sc.contains("for i, v in ipairs(engines) do"));
    assert!(sc.contains("data.engines[i].rpm = engines[i].rpm"));
    assert!(sc.contains("data.fuel = (fuel or 0) * 1450 * 2.20462"));
    assert!(sc.contains("local PORT = 52025"));
    assert!(sc.contains("local ADDR = \"127.0.0.1\""));
    assert!(!sc.contains('%'));
    assert!(output
        .export_content
        .contains("dofile([[Scripts\\SimdashExport.lua]])"));

    let html_generator =
        HtmlGenerator::new(HtmlGeneratorSettings::default(), HTML_TEMPLATE.to_string());
    let html = html_generator
        .generate(&model, &mut export)
        .unwrap()
        .html_content;
    assert!(html.contains("titleMap.set('data.altitude', 'Altitude ASL');"));
    assert!(html.contains("titleMap.set('data.engines.rpm', 'RPM');"));
    assert!(html.contains("unitMap.set('data.airspeed', 'kts');"));
    assert!(html.contains("decimalDigitsMap.set('data.fuel', '0');"));
    assert!(html.contains("setInterval(updateData, 200)"));
    assert!(html.contains("http://127.0.0.1:52025/"));
}

#[test]
fn generation_is_deterministic() {
    let model = resolved_model();
    let fields = vec![
        export_field("fuel", "fuel", None),
        export_field("altitude", "altitude", None),
        export_field("engines.rpm", "engines.rpm", None),
    ];
    let lua = LuaGenerator::new(lua_templates(), String::new());
    let mut first = ExportModel {
        fields: fields.clone(),
        ..Default::default()
    };
    let mut second = ExportModel {
        fields,
        ..Default::default()
    };
    let a = lua
        .generate(&model, &mut first, &UnitConverter::new())
        .unwrap();
    let b = lua
        .generate(&model, &mut second, &UnitConverter::new())
        .unwrap();
    assert_eq!(a.script_content, b.script_content);
}
