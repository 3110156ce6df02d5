//! Zone Project -- the persisted game project and its reversible edits.
//!
//! A [`Project`] holds the declarative data the editor saves to disk: the
//! project name and directory, the build configuration selection and the
//! scene list. Edits made through the editor are described by
//! [`EditAction`](edit::EditAction) values that implement
//! [`zone_history::Action`] over a project, so they can be recorded in a
//! [`zone_history::CommandLog`].
//!
//! # Modules
//!
//! - [`project`]: project file, build configurations and artifact paths.
//! - [`scene`]: scenes, game entities and components.
//! - [`edit`]: snapshot-based reversible edits.

#![deny(unsafe_code)]

pub mod edit;
pub mod project;
pub mod scene;

use std::path::PathBuf;

pub use edit::{EditAction, Recorded};
pub use project::{BuildConfiguration, Project};
pub use scene::{Component, ComponentKind, EntityId, GameEntity, Scene, SceneId};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced while creating, reading or writing a project.
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    /// A project file or directory could not be read or written.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The project file is not valid project JSON.
    #[error("invalid project file: {0}")]
    Json(#[from] serde_json::Error),

    /// The project name is blank or contains a path separator.
    #[error("invalid project name '{0}'")]
    InvalidName(String),
}

/// Errors produced by editing operations. None of them modify the project.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("scene {0} does not exist")]
    UnknownScene(SceneId),

    #[error("game entity {0} does not exist")]
    UnknownEntity(EntityId),

    /// A batch edit was requested with nothing selected.
    #[error("no game entities selected")]
    EmptySelection,

    /// The active scene cannot be removed.
    #[error("scene {0} is active and cannot be removed")]
    ActiveScene(SceneId),

    /// Names must contain at least one non-whitespace character.
    #[error("name must not be blank")]
    BlankName,

    /// Every selected entity refused the edit (e.g. component already present).
    #[error("no selected game entity accepted the {0} component")]
    NothingChanged(ComponentKind),

    /// Every selected entity already has the requested value.
    #[error("the selected game entities already have this value")]
    AlreadySet,

    /// The project has handed out every scene and entity id.
    #[error("the project has run out of scene and entity ids")]
    IdsExhausted,
}
