//! Zone Build -- build and hot-reload of a project's game-code module.
//!
//! The [`BuildCoordinator`] owns the lifecycle of the dynamically loaded
//! game-code module: it unloads the current module, runs the external build
//! tool on a worker thread, and on success loads the produced artifact and
//! publishes the script identifiers it exports.
//!
//! # Architecture
//!
//! - **[`ModuleHost`]**: loads/unloads a module and enumerates its scripts.
//!   [`WasmModuleHost`] is the Wasmtime-backed implementation.
//! - **[`BuildTool`]**: runs the external build for a [`BuildRequest`].
//!   [`ProcessBuildTool`] spawns a configured command line.
//! - **[`DebugProbe`]**: answers "is a debugger attached", the build guard.
//! - **[`DiagnosticSink`]**: receives `(severity, message)` pairs for the
//!   editor console; [`MessageLog`] keeps them in memory.
//!
//! Module and script state is only ever touched by the coordinator on the
//! thread that owns it. The worker thread only runs the build tool and sends
//! back a single completion message.
//!
//! # Example
//!
//! ```
//! use std::path::PathBuf;
//! use std::sync::Arc;
//! use zone_build::{BuildCoordinator, BuildReport, BuildRequest, BuildState, NoDebugger, TracingSink};
//! use zone_build::{BuildToolError, ModuleError, ModuleHost};
//!
//! struct StaticHost(bool);
//!
//! impl ModuleHost for StaticHost {
//!     fn load(&mut self, _path: &std::path::Path) -> Result<(), ModuleError> {
//!         self.0 = true;
//!         Ok(())
//!     }
//!     fn unload(&mut self) -> Result<bool, ModuleError> {
//!         Ok(std::mem::replace(&mut self.0, false))
//!     }
//!     fn script_names(&self) -> Vec<String> {
//!         vec!["Move".to_owned()]
//!     }
//!     fn is_loaded(&self) -> bool {
//!         self.0
//!     }
//! }
//!
//! let tool = |_: &BuildRequest| -> Result<BuildReport, BuildToolError> {
//!     Ok(BuildReport::success(""))
//! };
//! let mut coordinator = BuildCoordinator::new(
//!     Box::new(StaticHost(false)),
//!     Arc::new(tool),
//!     Box::new(NoDebugger),
//!     Arc::new(TracingSink),
//! );
//!
//! let request = BuildRequest {
//!     project_name: "Game".to_owned(),
//!     project_dir: PathBuf::from("/tmp/game"),
//!     configuration: "DebugEditor".to_owned(),
//!     artifact: PathBuf::from("/tmp/game/build/DebugEditor/Game.wasm"),
//!     show_output: false,
//! };
//! coordinator.request_build(request).unwrap();
//! let state = coordinator.wait().unwrap();
//! assert_eq!(state, BuildState::Loaded { scripts: vec!["Move".to_owned()] });
//! ```

#![deny(unsafe_code)]

pub mod coordinator;
pub mod debug;
pub mod diagnostics;
pub mod host;
pub mod process;
pub mod tool;
mod wasm;

use std::path::PathBuf;

pub use coordinator::{BuildCoordinator, BuildState, BuildSummary};
pub use debug::{DebugProbe, DebuggerFlag, NoDebugger, TracerProbe};
pub use diagnostics::{DiagnosticSink, LogMessage, MessageLog, Severity, TracingSink};
pub use host::ModuleHost;
pub use process::{BuildToolConfig, ProcessBuildTool};
pub use tool::{BuildReport, BuildRequest, BuildTool};
pub use wasm::{ModuleConfig, WasmModuleHost};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors returned by [`BuildCoordinator`] operations.
///
/// Expected failures of the build itself (tool failure, artifact that does
/// not load) are not errors: they end in [`BuildState::LoadFailed`] with a
/// warning diagnostic.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// A build is already in flight.
    #[error("a build is already in progress")]
    AlreadyBuilding,

    /// A debugger is attached to the editor process.
    #[error("cannot rebuild the game code module while a debugger is attached")]
    DebuggerAttached,

    /// The current module could not be unloaded, so no new build may start.
    #[error("failed to unload the game code module: {0}")]
    Unload(#[source] ModuleError),

    /// The build worker thread could not be started.
    #[error("failed to start build worker: {0}")]
    Spawn(#[source] std::io::Error),

    /// The build worker panicked or vanished before reporting a result.
    #[error("build worker failed unexpectedly: {0}")]
    WorkerPanicked(String),

    /// [`BuildCoordinator::wait`] was called with no build in flight.
    #[error("no build is in progress")]
    NoBuildPending,
}

/// Errors produced by a [`ModuleHost`].
#[derive(Debug, thiserror::Error)]
pub enum ModuleError {
    /// The build did not produce the expected artifact.
    #[error("game code module not found at {}", .path.display())]
    MissingArtifact { path: PathBuf },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The artifact is not a valid module.
    #[error("module compilation failed: {0}")]
    Compile(String),

    /// The module compiled but could not be instantiated (e.g. unsatisfied
    /// imports or a trapping start function).
    #[error("module instantiation failed: {0}")]
    Instantiate(String),

    /// A module is already loaded; unload it first.
    #[error("a game code module is already loaded")]
    AlreadyLoaded,

    #[error("no game code module is loaded")]
    NotLoaded,

    #[error("script '{0}' is not exported by the loaded module")]
    UnknownScript(String),

    /// The script trapped or ran out of fuel.
    #[error("script trapped: {0}")]
    Trap(String),

    /// Loader rejected the module for a host-specific reason.
    #[error("module rejected: {0}")]
    Rejected(String),
}

/// Errors produced while running the external build tool.
#[derive(Debug, thiserror::Error)]
pub enum BuildToolError {
    /// The tool executable could not be started.
    #[error("failed to start build tool '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("build tool error: {0}")]
    Other(String),
}
