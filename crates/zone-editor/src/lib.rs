//! Zone Editor -- editing sessions over a game project.
//!
//! An [`EditorSession`] is the open project: it threads the project data,
//! its undo/redo [`CommandLog`](zone_history::CommandLog) and the
//! [`BuildCoordinator`](zone_build::BuildCoordinator) of its game-code
//! module through one explicit value. [`EditorConfig`] holds the settings a
//! session is created with.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use zone_build::{BuildReport, BuildRequest, BuildToolError, ModuleError, ModuleHost, NoDebugger};
//! use zone_editor::EditorSession;
//! use zone_project::Project;
//!
//! struct NoModule;
//!
//! impl ModuleHost for NoModule {
//!     fn load(&mut self, path: &std::path::Path) -> Result<(), ModuleError> {
//!         Err(ModuleError::MissingArtifact { path: path.to_path_buf() })
//!     }
//!     fn unload(&mut self) -> Result<bool, ModuleError> {
//!         Ok(false)
//!     }
//!     fn script_names(&self) -> Vec<String> {
//!         Vec::new()
//!     }
//!     fn is_loaded(&self) -> bool {
//!         false
//!     }
//! }
//!
//! let tool = |_: &BuildRequest| -> Result<BuildReport, BuildToolError> {
//!     Ok(BuildReport::failure("no compiler"))
//! };
//! let project = Project::new("Game", "/tmp/game").unwrap();
//! let mut session =
//!     EditorSession::new(project, Box::new(NoModule), Arc::new(tool), Box::new(NoDebugger), None);
//!
//! let scene = session.project().active_scene().unwrap().id;
//! let player = session.add_entity(scene, "Player").unwrap();
//! session.rename_entities(&[player], "Hero").unwrap();
//! assert_eq!(session.history_labels(), ["Add Player", "Rename game entity"]);
//!
//! session.undo();
//! assert_eq!(session.project().entity(player).unwrap().name, "Player");
//! ```

#![deny(unsafe_code)]

pub mod config;
pub mod session;

pub use config::{ConfigError, EditorConfig};
pub use session::{EditorSession, SessionError};
