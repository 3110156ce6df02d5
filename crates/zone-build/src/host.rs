//! The module-loading capability used by the coordinator.

use std::path::Path;

use crate::ModuleError;

/// Loads a game-code module and exposes the scripts it exports.
///
/// At most one module is loaded at a time. Implementations are only ever
/// driven from the coordinator's owning thread.
pub trait ModuleHost {
    /// Load the module at `path`.
    ///
    /// # Errors
    ///
    /// [`ModuleError::MissingArtifact`] if the file does not exist, or any
    /// host-specific rejection.
    fn load(&mut self, path: &Path) -> Result<(), ModuleError>;

    /// Release the loaded module. Returns `Ok(false)` if nothing was loaded.
    fn unload(&mut self) -> Result<bool, ModuleError>;

    /// Script identifiers exported by the loaded module, in export order.
    /// Empty when nothing is loaded.
    fn script_names(&self) -> Vec<String>;

    fn is_loaded(&self) -> bool;
}
