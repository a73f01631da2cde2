use crate::module::Module;
use crate::{IrError, Result};
use std::fs;
use std::path::Path;

pub fn module_to_json(module: &Module) -> Result<String> {
    Ok(serde_json::to_string_pretty(module)?)
}

/// Deserializes a module and re-derives its def-use and control-flow
/// relations.
pub fn module_from_json(json: &str) -> Result<Module> {
    let mut module: Module = serde_json::from_str(json)?;
    module.link()?;
    Ok(module)
}

pub fn save_module(module: &Module, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let json = module_to_json(module)?;
    fs::write(path, json).map_err(|source| IrError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_module(path: impl AsRef<Path>) -> Result<Module> {
    let path = path.as_ref();
    let json = fs::read_to_string(path).map_err(|source| IrError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let module = module_from_json(&json)?;
    tracing::debug!(
        path = %path.display(),
        functions = module.function_count(),
        values = module.value_count(),
        "loaded module"
    );
    Ok(module)
}
