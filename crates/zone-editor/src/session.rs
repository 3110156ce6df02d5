//! The active project and everything attached to it while it is open.
//!
//! An [`EditorSession`] owns the [`Project`], its [`CommandLog`], the
//! [`BuildCoordinator`] for its game-code module and the console
//! [`MessageLog`]. All editing goes through the session: each operation
//! validates its input, snapshots the affected identifiers with their old
//! and new values, applies the change and records exactly one action. A
//! failed validation changes nothing and records nothing.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};
use zone_build::{
    BuildCoordinator, BuildError, BuildRequest, BuildState, BuildTool, DebugProbe,
    MessageLog, ModuleError, ModuleHost, ProcessBuildTool, TracerProbe, WasmModuleHost,
};
use zone_history::{Action, CommandLog, HistoryEntry};
use zone_project::edit::{self, EditAction};
use zone_project::{
    Component, ComponentKind, EditError, EntityId, GameEntity, Project, ProjectError, Recorded,
    Scene, SceneId,
};

use crate::config::EditorConfig;

/// Errors produced while opening a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Project(#[from] ProjectError),

    #[error("cannot create module host: {0}")]
    Module(#[from] ModuleError),
}

// ---------------------------------------------------------------------------
// EditorSession
// ---------------------------------------------------------------------------

/// An open project with its edit history and build coordinator.
pub struct EditorSession {
    project: Project,
    history: CommandLog<Project>,
    builds: BuildCoordinator,
    console: MessageLog,
}

impl EditorSession {
    /// Assemble a session from explicit collaborators.
    ///
    /// No build is started; call [`build_on_open`](Self::build_on_open) for
    /// the initial build.
    pub fn new(
        project: Project,
        host: Box<dyn ModuleHost>,
        tool: Arc<dyn BuildTool>,
        debugger: Box<dyn DebugProbe>,
        history_capacity: Option<usize>,
    ) -> Self {
        let console = MessageLog::new();
        let builds = BuildCoordinator::new(host, tool, debugger, Arc::new(console.clone()));
        let history = match history_capacity {
            Some(capacity) => CommandLog::with_capacity_limit(capacity),
            None => CommandLog::new(),
        };
        Self {
            project,
            history,
            builds,
            console,
        }
    }

    /// Session using the wasmtime host, the configured build command and
    /// tracer-based debugger detection.
    pub fn with_config(project: Project, config: &EditorConfig) -> Result<Self, SessionError> {
        let host = WasmModuleHost::new(config.module.clone())?;
        let tool = ProcessBuildTool::new(config.build.clone());
        Ok(Self::new(
            project,
            Box::new(host),
            Arc::new(tool),
            Box::new(TracerProbe),
            config.history_capacity,
        ))
    }

    /// Load a project file and open it with [`with_config`](Self::with_config).
    pub fn open(file: impl AsRef<Path>, config: &EditorConfig) -> Result<Self, SessionError> {
        let project = Project::load(file)?;
        Self::with_config(project, config)
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn console(&self) -> &MessageLog {
        &self.console
    }

    pub fn coordinator(&self) -> &BuildCoordinator {
        &self.builds
    }

    /// Write the project file.
    pub fn save(&self) -> Result<PathBuf, ProjectError> {
        self.project.save()
    }

    /// Close the project: wait out any in-flight build, unload the module
    /// and clear the edit history.
    ///
    /// # Errors
    ///
    /// [`BuildError::Unload`] if the module refuses to unload. The project
    /// stays open with its history intact.
    pub fn close(&mut self) -> Result<(), BuildError> {
        self.builds.shutdown()?;
        self.history.reset();
        info!(project = %self.project.name(), "project closed");
        Ok(())
    }

    // -- History -------------------------------------------------------------

    /// Undo the most recent edit. Returns `false` if there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let undone = self.history.undo(&mut self.project);
        if !undone {
            debug!("nothing to undo");
        }
        undone
    }

    /// Redo the next edit. Returns `false` if there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        let redone = self.history.redo(&mut self.project);
        if !redone {
            debug!("nothing to redo");
        }
        redone
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Labels of every recorded edit, oldest first.
    pub fn history_labels(&self) -> Vec<&str> {
        self.history.entries().map(|entry| entry.label).collect()
    }

    pub fn history(&self) -> impl Iterator<Item = HistoryEntry<'_>> {
        self.history.entries()
    }

    // -- Scenes --------------------------------------------------------------

    /// Append a scene named "New Scene N".
    pub fn add_scene(&mut self) -> Result<SceneId, EditError> {
        let id = self.project.allocate_scene_id()?;
        let index = self.project.scenes().len();
        let scene = Scene::new(id, format!("New Scene {index}"));
        self.commit(EditAction::AddScene { index, scene });
        Ok(id)
    }

    /// Remove a scene. The active scene cannot be removed.
    pub fn remove_scene(&mut self, id: SceneId) -> Result<(), EditError> {
        let index = self
            .project
            .scene_index(id)
            .ok_or(EditError::UnknownScene(id))?;
        let scene = self.project.scenes()[index].clone();
        if scene.is_active {
            return Err(EditError::ActiveScene(id));
        }
        self.commit(EditAction::RemoveScene { index, scene });
        Ok(())
    }

    // -- Entities ------------------------------------------------------------

    /// Append a new entity to `scene`.
    pub fn add_entity(&mut self, scene: SceneId, name: &str) -> Result<EntityId, EditError> {
        if name.trim().is_empty() {
            return Err(EditError::BlankName);
        }
        let index = self
            .project
            .scene(scene)
            .ok_or(EditError::UnknownScene(scene))?
            .entities
            .len();
        let id = self.project.allocate_entity_id()?;
        let entity = GameEntity::new(id, name);
        self.commit(EditAction::AddEntity {
            scene,
            index,
            entity,
        });
        Ok(id)
    }

    /// Remove the selected entities of `scene` as one edit.
    pub fn remove_entities(&mut self, scene: SceneId, ids: &[EntityId]) -> Result<(), EditError> {
        let ids = selection(ids)?;
        let target = self
            .project
            .scene(scene)
            .ok_or(EditError::UnknownScene(scene))?;

        // Positions are taken as each removal would see them.
        let mut remaining: Vec<EntityId> = target.entities.iter().map(|e| e.id).collect();
        let mut removed = Vec::with_capacity(ids.len());
        for id in ids {
            let index = remaining
                .iter()
                .position(|e| *e == id)
                .ok_or(EditError::UnknownEntity(id))?;
            remaining.remove(index);
            let entity = target
                .entity(id)
                .cloned()
                .ok_or(EditError::UnknownEntity(id))?;
            removed.push((index, entity));
        }

        self.commit(EditAction::RemoveEntities { scene, removed });
        Ok(())
    }

    /// Give every selected entity the same name. Entities that already
    /// carry it are left out of the recorded edit.
    pub fn rename_entities(&mut self, ids: &[EntityId], name: &str) -> Result<(), EditError> {
        let ids = selection(ids)?;
        if name.trim().is_empty() {
            return Err(EditError::BlankName);
        }
        let mut changes = Vec::new();
        for id in ids {
            let entity = self.entity(id)?;
            if entity.name != name {
                changes.push((id, entity.name.clone(), name.to_owned()));
            }
        }
        if changes.is_empty() {
            return Err(EditError::AlreadySet);
        }
        self.commit(EditAction::RenameEntities { changes });
        Ok(())
    }

    /// Enable or disable every selected entity. Entities already in the
    /// requested state are left out of the recorded edit.
    pub fn set_enabled(&mut self, ids: &[EntityId], enabled: bool) -> Result<(), EditError> {
        let ids = selection(ids)?;
        let mut changes = Vec::new();
        for id in ids {
            let was_enabled = self.entity(id)?.is_enabled;
            if was_enabled != enabled {
                changes.push((id, was_enabled, enabled));
            }
        }
        if changes.is_empty() {
            return Err(EditError::AlreadySet);
        }
        self.commit(EditAction::SetEnabled { changes });
        Ok(())
    }

    /// Attach `component` to every selected entity that does not already
    /// have one of its kind. Returns how many entities accepted it.
    pub fn add_component(
        &mut self,
        ids: &[EntityId],
        component: Component,
    ) -> Result<usize, EditError> {
        let ids = selection(ids)?;
        let kind = component.kind();
        let mut added = Vec::new();
        for id in ids {
            if self.entity(id)?.component(kind).is_none() {
                added.push((id, component.clone()));
            }
        }
        if added.is_empty() {
            return Err(EditError::NothingChanged(kind));
        }
        let count = added.len();
        self.commit(EditAction::AddComponent { added });
        Ok(count)
    }

    /// Detach the component of `kind` from every selected entity that has
    /// one. Transforms are never removed. Returns how many entities lost it.
    pub fn remove_component(
        &mut self,
        ids: &[EntityId],
        kind: ComponentKind,
    ) -> Result<usize, EditError> {
        let ids = selection(ids)?;
        let mut removed = Vec::new();
        if kind != ComponentKind::Transform {
            for id in ids {
                let entity = self.entity(id)?;
                if let Some(index) = entity.components.iter().position(|c| c.kind() == kind) {
                    removed.push((id, index, entity.components[index].clone()));
                }
            }
        }
        if removed.is_empty() {
            return Err(EditError::NothingChanged(kind));
        }
        let count = removed.len();
        self.commit(EditAction::RemoveComponent { removed });
        Ok(count)
    }

    // -- Build configuration -------------------------------------------------

    /// Select a build configuration. Selecting the current one records
    /// nothing.
    pub fn set_build_config(&mut self, build_config: usize) {
        let old = self.project.build_config();
        if old == build_config {
            return;
        }
        self.commit(EditAction::SetBuildConfig {
            old,
            new: build_config,
        });
    }

    // -- Game code -----------------------------------------------------------

    /// Request a build of the game-code module for the selected
    /// configuration. Returns once the build has started.
    pub fn build(&mut self, show_progress: bool) -> Result<(), BuildError> {
        let request = BuildRequest {
            project_name: self.project.name().to_owned(),
            project_dir: self.project.path().to_path_buf(),
            configuration: self.project.module_configuration().name().to_owned(),
            artifact: self.project.module_path(),
            show_output: show_progress,
        };
        self.builds.request_build(request)
    }

    /// The build a freshly opened project runs so its module is current.
    pub fn build_on_open(&mut self) -> Result<(), BuildError> {
        self.build(false)
    }

    /// Finish the in-flight build if it has completed.
    pub fn poll_build(&mut self) -> Option<Result<BuildState, BuildError>> {
        self.builds.poll()
    }

    /// Block until the in-flight build completes.
    pub fn wait_for_build(&mut self) -> Result<BuildState, BuildError> {
        self.builds.wait()
    }

    pub fn build_state(&self) -> &BuildState {
        self.builds.state()
    }

    pub fn can_build(&self) -> bool {
        self.builds.can_build()
    }

    /// Script identifiers of the loaded module; empty unless loaded.
    pub fn available_scripts(&self) -> &[String] {
        self.builds.available_scripts()
    }

    // -- Internal helpers ---------------------------------------------------

    fn entity(&self, id: EntityId) -> Result<&GameEntity, EditError> {
        self.project.entity(id).ok_or(EditError::UnknownEntity(id))
    }

    fn commit(&mut self, change: EditAction) {
        edit::apply(&change, &mut self.project);
        let recorded = Recorded::new(change);
        debug!(
            label = %recorded.label(),
            affected = recorded.edit().affected_count(),
            "edit recorded"
        );
        self.history.record(recorded);
    }
}

impl std::fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("project", &self.project.name())
            .field("history", &self.history)
            .field("build_state", self.builds.state())
            .finish()
    }
}

/// Selected ids with duplicates dropped, keeping first occurrences.
fn selection(ids: &[EntityId]) -> Result<Vec<EntityId>, EditError> {
    if ids.is_empty() {
        return Err(EditError::EmptySelection);
    }
    let mut unique = Vec::with_capacity(ids.len());
    for id in ids {
        if !unique.contains(id) {
            unique.push(*id);
        }
    }
    Ok(unique)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_rejects_empty_and_drops_duplicates() {
        assert_eq!(selection(&[]), Err(EditError::EmptySelection));
        assert_eq!(
            selection(&[EntityId(3), EntityId(1), EntityId(3)]).unwrap(),
            vec![EntityId(3), EntityId(1)]
        );
    }
}
