//! Wasmtime-backed game-code module host.
//!
//! [`WasmModuleHost`] loads the WASM module produced by the project build,
//! instantiates it in a fuel-metered store with no imports, and discovers
//! scripts from its function exports: every export named
//! `<prefix><Identifier>` (default prefix `script_`) exposes the script
//! `Identifier`.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use wasmtime::{Engine, ExternType, Instance, Linker, Module, Store};

use crate::host::ModuleHost;
use crate::ModuleError;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for module loading and script discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleConfig {
    /// Export-name prefix marking a script entry point.
    pub script_export_prefix: String,

    /// Fuel granted to instantiation and to each script call. Default:
    /// 1,000,000.
    pub fuel_limit: u64,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            script_export_prefix: "script_".to_owned(),
            fuel_limit: 1_000_000,
        }
    }
}

// ---------------------------------------------------------------------------
// LoadedModule
// ---------------------------------------------------------------------------

struct LoadedModule {
    path: PathBuf,
    /// BLAKE3 hex digest of the artifact bytes.
    digest: String,
    store: Store<()>,
    instance: Instance,
    scripts: Vec<String>,
}

// ---------------------------------------------------------------------------
// WasmModuleHost
// ---------------------------------------------------------------------------

/// Loads one game-code WASM module at a time.
///
/// # Sandbox
///
/// - No imported functions: a module that imports anything fails to load.
/// - Fuel metering bounds instantiation and every script call.
pub struct WasmModuleHost {
    config: ModuleConfig,
    engine: Engine,
    loaded: Option<LoadedModule>,
}

impl WasmModuleHost {
    /// Create a host with fuel metering enabled.
    ///
    /// # Errors
    ///
    /// [`ModuleError::Rejected`] if the Wasmtime engine cannot be created.
    pub fn new(config: ModuleConfig) -> Result<Self, ModuleError> {
        let mut engine_config = wasmtime::Config::new();
        engine_config.consume_fuel(true);

        let engine = Engine::new(&engine_config)
            .map_err(|e| ModuleError::Rejected(format!("failed to create Wasmtime engine: {e}")))?;

        Ok(Self {
            config,
            engine,
            loaded: None,
        })
    }

    pub fn config(&self) -> &ModuleConfig {
        &self.config
    }

    /// Path of the loaded artifact.
    pub fn loaded_path(&self) -> Option<&Path> {
        self.loaded.as_ref().map(|m| m.path.as_path())
    }

    /// BLAKE3 digest of the loaded artifact.
    pub fn digest(&self) -> Option<&str> {
        self.loaded.as_ref().map(|m| m.digest.as_str())
    }

    /// Run a script's entry point (`() -> ()`), returning the fuel consumed.
    ///
    /// # Errors
    ///
    /// - [`ModuleError::NotLoaded`] if no module is loaded.
    /// - [`ModuleError::UnknownScript`] if the module does not export it.
    /// - [`ModuleError::Trap`] on a trap or fuel exhaustion.
    pub fn run_script(&mut self, script: &str) -> Result<u64, ModuleError> {
        let fuel_limit = self.config.fuel_limit;
        let export = format!("{}{}", self.config.script_export_prefix, script);
        let loaded = self.loaded.as_mut().ok_or(ModuleError::NotLoaded)?;

        if !loaded.scripts.iter().any(|s| s == script) {
            return Err(ModuleError::UnknownScript(script.to_owned()));
        }

        // Wasmtime's set_fuel replaces the remaining amount.
        loaded
            .store
            .set_fuel(fuel_limit)
            .map_err(|e| ModuleError::Trap(format!("failed to set fuel: {e}")))?;

        let func = loaded
            .instance
            .get_typed_func::<(), ()>(&mut loaded.store, &export)
            .map_err(|e| ModuleError::Trap(format!("failed to resolve {export}(): {e}")))?;

        func.call(&mut loaded.store, ())
            .map_err(|e| classify_trap(e, fuel_limit))?;

        let remaining = loaded
            .store
            .get_fuel()
            .map_err(|e| ModuleError::Trap(format!("failed to read fuel: {e}")))?;
        let consumed = fuel_limit.saturating_sub(remaining);

        tracing::trace!(script, fuel_consumed = consumed, "script completed");
        Ok(consumed)
    }

    fn discover_scripts(&self, module: &Module) -> Vec<String> {
        let prefix = self.config.script_export_prefix.as_str();
        module
            .exports()
            .filter(|export| matches!(export.ty(), ExternType::Func(_)))
            .filter_map(|export| export.name().strip_prefix(prefix))
            .filter(|name| !name.is_empty())
            .map(str::to_owned)
            .collect()
    }
}

impl ModuleHost for WasmModuleHost {
    fn load(&mut self, path: &Path) -> Result<(), ModuleError> {
        if self.loaded.is_some() {
            return Err(ModuleError::AlreadyLoaded);
        }
        if !path.is_file() {
            return Err(ModuleError::MissingArtifact {
                path: path.to_path_buf(),
            });
        }

        let bytes = fs::read(path).map_err(|source| ModuleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let digest = blake3::hash(&bytes).to_hex().to_string();

        let module =
            Module::new(&self.engine, &bytes).map_err(|e| ModuleError::Compile(format!("{e}")))?;
        let scripts = self.discover_scripts(&module);

        let mut store = Store::new(&self.engine, ());
        store
            .set_fuel(self.config.fuel_limit)
            .map_err(|e| ModuleError::Instantiate(format!("failed to set fuel: {e}")))?;

        // Empty linker: modules may not import anything.
        let linker: Linker<()> = Linker::new(&self.engine);
        let instance = linker
            .instantiate(&mut store, &module)
            .map_err(|e| ModuleError::Instantiate(format!("{e}")))?;

        tracing::debug!(
            path = %path.display(),
            digest = %digest,
            scripts = scripts.len(),
            "game code module instantiated"
        );

        self.loaded = Some(LoadedModule {
            path: path.to_path_buf(),
            digest,
            store,
            instance,
            scripts,
        });
        Ok(())
    }

    fn unload(&mut self) -> Result<bool, ModuleError> {
        Ok(self.loaded.take().is_some())
    }

    fn script_names(&self) -> Vec<String> {
        self.loaded
            .as_ref()
            .map(|m| m.scripts.clone())
            .unwrap_or_default()
    }

    fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }
}

impl fmt::Debug for WasmModuleHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WasmModuleHost")
            .field("config", &self.config)
            .field("loaded_path", &self.loaded_path())
            .field("digest", &self.digest())
            .finish_non_exhaustive()
    }
}

/// Map a Wasmtime call error to [`ModuleError::Trap`], naming fuel
/// exhaustion explicitly.
fn classify_trap(error: anyhow::Error, budget: u64) -> ModuleError {
    let out_of_fuel = error.downcast_ref::<wasmtime::Trap>() == Some(&wasmtime::Trap::OutOfFuel)
        || error
            .chain()
            .filter_map(|cause| cause.downcast_ref::<wasmtime::Trap>())
            .any(|trap| *trap == wasmtime::Trap::OutOfFuel);

    if out_of_fuel {
        ModuleError::Trap(format!("out of fuel (budget: {budget} units)"))
    } else {
        ModuleError::Trap(format!("{error}"))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPTS_WAT: &str = r#"
        (module
          (global $count (mut i32) (i32.const 0))
          (func (export "script_Jump")
            global.get $count
            i32.const 1
            i32.add
            global.set $count)
          (func (export "script_Move") nop)
          (func (export "helper") nop)
          (func (export "script_") nop)
          (memory (export "script_memory") 1))
    "#;

    fn write_module(dir: &Path, wat: &str) -> PathBuf {
        let path = dir.join("Game.wasm");
        fs::write(&path, wat).unwrap();
        path
    }

    #[test]
    fn load_discovers_prefixed_function_exports_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_module(dir.path(), SCRIPTS_WAT);
        let mut host = WasmModuleHost::new(ModuleConfig::default()).unwrap();

        host.load(&path).unwrap();

        assert!(host.is_loaded());
        assert_eq!(host.script_names(), vec!["Jump", "Move"]);
        assert_eq!(host.loaded_path(), Some(path.as_path()));
        assert_eq!(host.digest().map(str::len), Some(64));
    }

    #[test]
    fn missing_artifact_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = WasmModuleHost::new(ModuleConfig::default()).unwrap();

        let err = host.load(&dir.path().join("Game.wasm")).unwrap_err();
        assert!(matches!(err, ModuleError::MissingArtifact { .. }), "got {err:?}");
        assert!(!host.is_loaded());
    }

    #[test]
    fn invalid_bytes_fail_to_compile() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_module(dir.path(), "(module (func (export \"script_A\")");
        let mut host = WasmModuleHost::new(ModuleConfig::default()).unwrap();

        let err = host.load(&path).unwrap_err();
        assert!(matches!(err, ModuleError::Compile(_)), "got {err:?}");
    }

    #[test]
    fn imports_are_rejected_at_instantiation() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_module(
            dir.path(),
            r#"(module (import "env" "log" (func)) (func (export "script_A") nop))"#,
        );
        let mut host = WasmModuleHost::new(ModuleConfig::default()).unwrap();

        let err = host.load(&path).unwrap_err();
        assert!(matches!(err, ModuleError::Instantiate(_)), "got {err:?}");
        assert!(host.script_names().is_empty());
    }

    #[test]
    fn second_load_requires_unload() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_module(dir.path(), SCRIPTS_WAT);
        let mut host = WasmModuleHost::new(ModuleConfig::default()).unwrap();

        host.load(&path).unwrap();
        assert!(matches!(host.load(&path), Err(ModuleError::AlreadyLoaded)));

        assert!(host.unload().unwrap());
        assert!(!host.unload().unwrap());
        assert!(host.script_names().is_empty());
        host.load(&path).unwrap();
    }

    #[test]
    fn run_script_consumes_fuel() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_module(dir.path(), SCRIPTS_WAT);
        let mut host = WasmModuleHost::new(ModuleConfig::default()).unwrap();
        host.load(&path).unwrap();

        assert!(host.run_script("Jump").unwrap() > 0);
        assert!(matches!(
            host.run_script("helper"),
            Err(ModuleError::UnknownScript(_))
        ));
    }

    #[test]
    fn runaway_script_runs_out_of_fuel() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_module(
            dir.path(),
            r#"(module (func (export "script_Spin") (loop $l (br $l))))"#,
        );
        let config = ModuleConfig {
            fuel_limit: 10_000,
            ..ModuleConfig::default()
        };
        let mut host = WasmModuleHost::new(config).unwrap();
        host.load(&path).unwrap();

        let err = host.run_script("Spin").unwrap_err();
        assert!(
            matches!(&err, ModuleError::Trap(msg) if msg.contains("out of fuel")),
            "got {err:?}"
        );
    }

    #[test]
    fn custom_prefix_changes_discovery() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_module(dir.path(), SCRIPTS_WAT);
        let config = ModuleConfig {
            script_export_prefix: "help".to_owned(),
            ..ModuleConfig::default()
        };
        let mut host = WasmModuleHost::new(config).unwrap();
        host.load(&path).unwrap();

        assert_eq!(host.script_names(), vec!["er"]);
    }
}
