//! Simdash — core library for flight-sim telemetry export generation: model resolution, unit conversion, and Lua/HTML code generation.

pub mod export;
pub mod external;
pub mod html;
pub mod internal;
pub mod lua;
pub mod types;
pub mod units;

pub use export::{
    Color, ColorScaleRule, EmbeddedServerSettings, ExportField, ExportModel, ExportTreeNode,
    LuaExportSettings, UiExportSettings, DECIMAL_DIGITS_DEFAULT,
};
pub use external::{ExternalField, ExternalModel};
pub use html::{HtmlGenerator, HtmlGeneratorOutput, HtmlGeneratorSettings};
pub use internal::{FieldId, InternalField, InternalModel};
pub use lua::{LuaGenerator, LuaGeneratorOutput, LuaTemplates};
pub use types::*;
pub use units::{Unit, UnitConverter};
