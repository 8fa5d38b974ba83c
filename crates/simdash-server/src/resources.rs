//! File-system resource access.
//!
//! All packaged content lives under a single resources directory:
//!
//! ```text
//! resources/
//!   templates/              Lua and HTML generation templates
//!   external_models/        simulator source model definitions
//!   sample_export_models/   ready-made export model examples
//!   notices/                license and policy texts
//! ```

use std::path::{Path, PathBuf};

use crate::error::{ServerError, ServerResult};

const TEMPLATES_DIR: &str = "templates";
const EXTERNAL_MODELS_DIR: &str = "external_models";
const SAMPLE_EXPORT_MODELS_DIR: &str = "sample_export_models";
const NOTICES_DIR: &str = "notices";

pub const DEFAULT_EXTERNAL_MODEL_FILE: &str = "external_model_default.json";
pub const SAMPLE_EXPORT_MODEL_FILE: &str = "sample_export_model.json";
pub const LUA_MAIN_TEMPLATE_FILE: &str = "main.lua.template";
pub const LUA_EXPORT_TEMPLATE_FILE: &str = "export.lua.template";
pub const HTML_MAIN_TEMPLATE_FILE: &str = "template.main.html";

#[derive(Debug, Clone)]
pub struct ResourceProvider {
    base_dir: PathBuf,
}

impl ResourceProvider {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        ResourceProvider {
            base_dir: base_dir.into(),
        }
    }

    pub fn read_template_file(&self, name: &str) -> ServerResult<String> {
        self.read(&self.base_dir.join(TEMPLATES_DIR).join(name))
    }

    pub fn read_external_model_file(&self, name: &str) -> ServerResult<String> {
        self.read(&self.base_dir.join(EXTERNAL_MODELS_DIR).join(name))
    }

    pub fn read_sample_export_model_file(&self, name: &str) -> ServerResult<String> {
        self.read(&self.base_dir.join(SAMPLE_EXPORT_MODELS_DIR).join(name))
    }

    pub fn read_notice(&self, name: &str) -> ServerResult<String> {
        self.read(&self.base_dir.join(NOTICES_DIR).join(name))
    }

    fn read(&self, path: &Path) -> ServerResult<String> {
        std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                ServerError::NotFound(format!("resource {}", path.display()))
            }
            _ => ServerError::Io(e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_reads_from_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join(TEMPLATES_DIR)).unwrap();
        fs::write(dir.path().join(TEMPLATES_DIR).join("a.template"), "hello").unwrap();

        let provider = ResourceProvider::new(dir.path());
        assert_eq!(provider.read_template_file("a.template").unwrap(), "hello");
    }

    #[test]
    fn test_missing_resource_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let provider = ResourceProvider::new(dir.path());
        let err = provider.read_notice("LICENSE").unwrap_err();
        assert!(matches!(err, ServerError::NotFound(_)));
    }
}
