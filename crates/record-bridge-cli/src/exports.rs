//! Inspecting a native library's exported symbols before it is loaded.

use std::path::Path;

use goblin::mach::Mach;
use goblin::Object;

use record_bridge_core::REQUIRED_SYMBOLS;

use crate::error::ForeignCallError;

/// Names of the symbols a binary exports. Mach-O leading underscores are stripped.
pub fn exported_symbols(buffer: &[u8]) -> Result<Vec<String>, String> {
    let object = Object::parse(buffer).map_err(|e| e.to_string())?;

    match object {
        Object::Elf(elf) => Ok(elf
            .dynsyms
            .iter()
            .filter(|sym| !sym.is_import())
            .filter_map(|sym| match elf.dynstrtab.get(sym.st_name) {
                Some(Ok(name)) => Some(name.to_string()),
                _ => None,
            })
            .collect()),
        Object::PE(pe) => Ok(pe
            .exports
            .iter()
            .filter_map(|export| export.name.map(str::to_string))
            .collect()),
        Object::Mach(Mach::Binary(macho)) => Ok(macho
            .exports()
            .map_err(|e| e.to_string())?
            .into_iter()
            .map(|export| export.name.trim_start_matches('_').to_string())
            .collect()),
        Object::Unknown(magic) => Err(format!("unknown magic: {:#x}", magic)),
        _ => Err("unsupported binary type".to_string()),
    }
}

/// Required entry symbols absent from `exported`.
pub fn missing_symbols(exported: &[String]) -> Vec<&'static str> {
    REQUIRED_SYMBOLS
        .iter()
        .copied()
        .filter(|required| !exported.iter().any(|name| name == required))
        .collect()
}

pub fn check_exports(path: &Path) -> Result<(), ForeignCallError> {
    let library = path.display().to_string();
    let load_error = |reason: String| ForeignCallError::LibraryLoad {
        library: library.clone(),
        reason,
    };

    let buffer = std::fs::read(path).map_err(|e| load_error(e.to_string()))?;
    let exported = exported_symbols(&buffer).map_err(load_error)?;
    log::debug!("{} exports {} symbols", library, exported.len());

    let missing = missing_symbols(&exported);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ForeignCallError::MissingExports { library, missing })
    }
}
