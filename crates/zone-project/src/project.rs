//! The persisted project: name, location, scenes and build configuration.
//!
//! Only declarative data lives here. Edit history and the loaded game-code
//! module belong to the editing session and are never written to disk.
//!
//! A project is stored as pretty-printed JSON in `<path>/<name>.zone`. The
//! game-code module it builds lands at a deterministic location derived from
//! the project directory, name and module configuration; see
//! [`Project::module_path`].

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::scene::{EntityId, GameEntity, Scene, SceneId};
use crate::{EditError, ProjectError};

// ---------------------------------------------------------------------------
// BuildConfiguration
// ---------------------------------------------------------------------------

/// Build configurations understood by the external build tool.
///
/// The `*Editor` variants produce the game-code module the editor loads;
/// the plain variants produce a standalone game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildConfiguration {
    Debug,
    DebugEditor,
    Release,
    ReleaseEditor,
}

impl BuildConfiguration {
    /// Name passed to the build tool and used in artifact paths.
    pub fn name(self) -> &'static str {
        match self {
            Self::Debug => "Debug",
            Self::DebugEditor => "DebugEditor",
            Self::Release => "Release",
            Self::ReleaseEditor => "ReleaseEditor",
        }
    }
}

impl fmt::Display for BuildConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Project
// ---------------------------------------------------------------------------

/// A game project.
///
/// `build_config` is the index selected in the editor: `0` means debug,
/// anything else means release.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    name: String,
    path: PathBuf,
    #[serde(default)]
    build_config: usize,
    #[serde(default)]
    scenes: Vec<Scene>,
    /// Next identifier handed out to a scene or entity. Wider than the ids
    /// so that a file holding `u32::MAX` still loads.
    #[serde(default)]
    next_id: u64,
}

impl Project {
    /// File extension of project files, without the dot.
    pub const EXTENSION: &'static str = "zone";

    /// Name given to the scene every new project starts with.
    pub const DEFAULT_SCENE_NAME: &'static str = "Default Scene";

    /// Create a project rooted at `path` with a single active default scene.
    ///
    /// # Errors
    ///
    /// [`ProjectError::InvalidName`] if `name` is blank or contains a path
    /// separator.
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Result<Self, ProjectError> {
        let name = name.into();
        validate_name(&name)?;

        let mut project = Self {
            name,
            path: path.into(),
            build_config: 0,
            scenes: Vec::new(),
            next_id: 1,
        };
        let mut scene = Scene::new(SceneId(0), Self::DEFAULT_SCENE_NAME);
        scene.is_active = true;
        project.scenes.push(scene);
        Ok(project)
    }

    /// Read a project file.
    ///
    /// The project directory is taken from the file's location, so a project
    /// folder that was moved on disk still resolves its artifacts correctly.
    pub fn load(file: impl AsRef<Path>) -> Result<Self, ProjectError> {
        let file = file.as_ref();
        let text = fs::read_to_string(file).map_err(|source| ProjectError::Io {
            path: file.to_path_buf(),
            source,
        })?;
        let mut project: Project = serde_json::from_str(&text)?;
        validate_name(&project.name)?;

        if let Some(dir) = file.parent() {
            project.path = dir.to_path_buf();
        }
        // Older files may lack the counter; never reuse an existing id.
        project.next_id = project
            .next_id
            .max(project.max_id().map_or(0, |id| u64::from(id) + 1));

        info!(project = %project.name, file = %file.display(), "project loaded");
        Ok(project)
    }

    /// Write the project to [`file_path`](Self::file_path), creating the
    /// directory if needed. Returns the written path.
    pub fn save(&self) -> Result<PathBuf, ProjectError> {
        let file = self.file_path();
        fs::create_dir_all(&self.path).map_err(|source| ProjectError::Io {
            path: self.path.clone(),
            source,
        })?;
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&file, json).map_err(|source| ProjectError::Io {
            path: file.clone(),
            source,
        })?;

        info!(file = %file.display(), "project saved");
        Ok(file)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Project directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `<path>/<name>.zone`
    pub fn file_path(&self) -> PathBuf {
        self.path.join(format!("{}.{}", self.name, Self::EXTENSION))
    }

    // -- Build configuration -------------------------------------------------

    pub fn build_config(&self) -> usize {
        self.build_config
    }

    pub fn set_build_config(&mut self, build_config: usize) {
        self.build_config = build_config;
    }

    /// Configuration for a standalone game build.
    pub fn standalone_configuration(&self) -> BuildConfiguration {
        if self.build_config == 0 {
            BuildConfiguration::Debug
        } else {
            BuildConfiguration::Release
        }
    }

    /// Configuration for the game-code module loaded by the editor.
    pub fn module_configuration(&self) -> BuildConfiguration {
        if self.build_config == 0 {
            BuildConfiguration::DebugEditor
        } else {
            BuildConfiguration::ReleaseEditor
        }
    }

    /// Where the build tool places the game-code module:
    /// `<path>/build/<module configuration>/<name>.wasm`.
    pub fn module_path(&self) -> PathBuf {
        self.path
            .join("build")
            .join(self.module_configuration().name())
            .join(format!("{}.wasm", self.name))
    }

    // -- Scenes --------------------------------------------------------------

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn scene(&self, id: SceneId) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.id == id)
    }

    pub fn scene_mut(&mut self, id: SceneId) -> Option<&mut Scene> {
        self.scenes.iter_mut().find(|s| s.id == id)
    }

    pub fn scene_index(&self, id: SceneId) -> Option<usize> {
        self.scenes.iter().position(|s| s.id == id)
    }

    /// The first scene flagged active.
    pub fn active_scene(&self) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.is_active)
    }

    /// Insert a scene at `index` (clamped to the end of the list).
    pub fn insert_scene(&mut self, index: usize, scene: Scene) {
        let index = index.min(self.scenes.len());
        self.scenes.insert(index, scene);
    }

    /// Remove a scene, returning it with its former position.
    pub fn remove_scene(&mut self, id: SceneId) -> Option<(usize, Scene)> {
        let index = self.scene_index(id)?;
        Some((index, self.scenes.remove(index)))
    }

    // -- Entities ------------------------------------------------------------

    /// Find an entity in any scene.
    pub fn entity(&self, id: EntityId) -> Option<&GameEntity> {
        self.scenes.iter().find_map(|s| s.entity(id))
    }

    /// Find an entity in any scene, mutably.
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut GameEntity> {
        self.scenes.iter_mut().find_map(|s| s.entity_mut(id))
    }

    // -- Identifiers ---------------------------------------------------------

    /// # Errors
    ///
    /// [`EditError::IdsExhausted`] once every `u32` id has been handed out.
    pub fn allocate_scene_id(&mut self) -> Result<SceneId, EditError> {
        self.allocate_id().map(SceneId)
    }

    /// # Errors
    ///
    /// [`EditError::IdsExhausted`] once every `u32` id has been handed out.
    pub fn allocate_entity_id(&mut self) -> Result<EntityId, EditError> {
        self.allocate_id().map(EntityId)
    }

    fn allocate_id(&mut self) -> Result<u32, EditError> {
        let id = u32::try_from(self.next_id).map_err(|_| EditError::IdsExhausted)?;
        self.next_id += 1;
        Ok(id)
    }

    fn max_id(&self) -> Option<u32> {
        self.scenes
            .iter()
            .flat_map(|s| std::iter::once(s.id.0).chain(s.entities.iter().map(|e| e.id.0)))
            .max()
    }
}

fn validate_name(name: &str) -> Result<(), ProjectError> {
    if name.trim().is_empty() || name.contains(['/', '\\']) {
        return Err(ProjectError::InvalidName(name.to_owned()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_project_starts_with_active_default_scene() {
        let project = Project::new("Game", "/tmp/game").unwrap();
        assert_eq!(project.scenes().len(), 1);
        let active = project.active_scene().unwrap();
        assert_eq!(active.name, Project::DEFAULT_SCENE_NAME);
    }

    #[test]
    fn blank_or_path_like_names_are_rejected() {
        assert!(matches!(
            Project::new("  ", "/tmp"),
            Err(ProjectError::InvalidName(_))
        ));
        assert!(matches!(
            Project::new("a/b", "/tmp"),
            Err(ProjectError::InvalidName(_))
        ));
    }

    #[test]
    fn configuration_follows_selection() {
        let mut project = Project::new("Game", "/tmp/game").unwrap();
        assert_eq!(project.module_configuration(), BuildConfiguration::DebugEditor);
        assert_eq!(project.standalone_configuration(), BuildConfiguration::Debug);

        project.set_build_config(1);
        assert_eq!(project.module_configuration(), BuildConfiguration::ReleaseEditor);
        assert_eq!(project.standalone_configuration(), BuildConfiguration::Release);
    }

    #[test]
    fn module_path_is_derived_from_name_and_configuration() {
        let project = Project::new("Game", "/projects/game").unwrap();
        assert_eq!(
            project.module_path(),
            PathBuf::from("/projects/game/build/DebugEditor/Game.wasm")
        );
        assert_eq!(project.file_path(), PathBuf::from("/projects/game/Game.zone"));
    }

    #[test]
    fn ids_are_unique() {
        let mut project = Project::new("Game", "/tmp/game").unwrap();
        let a = project.allocate_entity_id().unwrap();
        let b = project.allocate_entity_id().unwrap();
        let s = project.allocate_scene_id().unwrap();
        assert_ne!(a, b);
        assert_ne!(a.0, s.0);
        assert_ne!(b.0, s.0);
    }

    #[test]
    fn allocation_stops_at_the_last_u32_id() {
        let mut project = Project::new("Game", "/tmp/game").unwrap();
        project.next_id = u64::from(u32::MAX);

        assert_eq!(project.allocate_entity_id(), Ok(EntityId(u32::MAX)));
        assert_eq!(project.allocate_entity_id(), Err(EditError::IdsExhausted));
        assert_eq!(project.allocate_scene_id(), Err(EditError::IdsExhausted));
    }
}
