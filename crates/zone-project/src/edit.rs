//! Reversible project edits.
//!
//! [`EditAction`] is the set of structural and property edits the editor
//! records in its command log. Each variant holds owned snapshots of the
//! affected identifiers and their old/new values, taken when the edit was
//! made. Multi-selection gestures are a single variant carrying the whole
//! batch, so one undo reverts the whole gesture.
//!
//! Applying an edit to a project whose contents no longer match (an entity
//! that was removed by other means, for example) skips the stale part with a
//! warning instead of panicking.

use tracing::warn;
use zone_history::Action;

use crate::project::Project;
use crate::scene::{Component, EntityId, GameEntity, Scene, SceneId};

// ---------------------------------------------------------------------------
// EditAction
// ---------------------------------------------------------------------------

/// A recorded project edit with its undo/redo snapshots.
#[derive(Debug, Clone, PartialEq)]
pub enum EditAction {
    /// A scene was inserted at `index`.
    AddScene { index: usize, scene: Scene },
    /// A scene was removed from `index`.
    RemoveScene { index: usize, scene: Scene },
    /// An entity was inserted into `scene` at `index`.
    AddEntity {
        scene: SceneId,
        index: usize,
        entity: GameEntity,
    },
    /// Entities were removed from `scene`. Positions are the ones each entity
    /// held at removal time, in removal order.
    RemoveEntities {
        scene: SceneId,
        removed: Vec<(usize, GameEntity)>,
    },
    /// `(entity, old name, new name)` per renamed entity.
    RenameEntities {
        changes: Vec<(EntityId, String, String)>,
    },
    /// `(entity, old flag, new flag)` per toggled entity.
    SetEnabled {
        changes: Vec<(EntityId, bool, bool)>,
    },
    /// Components attached to entities that accepted them.
    AddComponent {
        added: Vec<(EntityId, Component)>,
    },
    /// Components detached from entities with their former positions.
    RemoveComponent {
        removed: Vec<(EntityId, usize, Component)>,
    },
    /// Build configuration selection change.
    SetBuildConfig { old: usize, new: usize },
}

impl EditAction {
    /// Label shown in history and menus.
    pub fn describe(&self) -> String {
        match self {
            Self::AddScene { scene, .. } => format!("Add {}", scene.name),
            Self::RemoveScene { scene, .. } => format!("Remove {}", scene.name),
            Self::AddEntity { entity, .. } => format!("Add {}", entity.name),
            Self::RemoveEntities { removed, .. } if removed.len() == 1 => {
                format!("Remove {}", removed[0].1.name)
            }
            Self::RemoveEntities { removed, .. } => {
                format!("Remove {} game entities", removed.len())
            }
            Self::RenameEntities { .. } => "Rename game entity".to_owned(),
            Self::SetEnabled { changes } => {
                if changes.iter().all(|(_, _, new)| *new) {
                    "Enable game entity".to_owned()
                } else {
                    "Disable game entity".to_owned()
                }
            }
            Self::AddComponent { added } => match added.first() {
                Some((_, component)) => format!("Add {} component", component.kind()),
                None => "Add component".to_owned(),
            },
            Self::RemoveComponent { removed } => match removed.first() {
                Some((_, _, component)) => format!("Remove {} component", component.kind()),
                None => "Remove component".to_owned(),
            },
            Self::SetBuildConfig { .. } => "Change build configuration".to_owned(),
        }
    }

    /// Number of entities (or scenes) the edit touches.
    pub fn affected_count(&self) -> usize {
        match self {
            Self::AddScene { .. }
            | Self::RemoveScene { .. }
            | Self::AddEntity { .. }
            | Self::SetBuildConfig { .. } => 1,
            Self::RemoveEntities { removed, .. } => removed.len(),
            Self::RenameEntities { changes } => changes.len(),
            Self::SetEnabled { changes } => changes.len(),
            Self::AddComponent { added } => added.len(),
            Self::RemoveComponent { removed } => removed.len(),
        }
    }
}

// ---------------------------------------------------------------------------
// Recorded
// ---------------------------------------------------------------------------

/// An [`EditAction`] together with its cached label, as stored in the log.
#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
    edit: EditAction,
    label: String,
}

impl Recorded {
    pub fn new(edit: EditAction) -> Self {
        let label = edit.describe();
        Self { edit, label }
    }

    pub fn edit(&self) -> &EditAction {
        &self.edit
    }
}

impl From<EditAction> for Recorded {
    fn from(edit: EditAction) -> Self {
        Self::new(edit)
    }
}

impl Action<Project> for Recorded {
    fn apply_undo(&mut self, project: &mut Project) {
        revert(&self.edit, project);
    }

    fn apply_redo(&mut self, project: &mut Project) {
        apply(&self.edit, project);
    }

    fn label(&self) -> &str {
        &self.label
    }
}

// ---------------------------------------------------------------------------
// Application
// ---------------------------------------------------------------------------

/// Perform `edit` on `project` (the redo direction).
pub fn apply(edit: &EditAction, project: &mut Project) {
    match edit {
        EditAction::AddScene { index, scene } => project.insert_scene(*index, scene.clone()),
        EditAction::RemoveScene { scene, .. } => {
            if project.remove_scene(scene.id).is_none() {
                warn!(scene = %scene.id, "redo: scene to remove not found, skipping");
            }
        }
        EditAction::AddEntity {
            scene,
            index,
            entity,
        } => match project.scene_mut(*scene) {
            Some(target) => target.insert_entity(*index, entity.clone()),
            None => warn!(scene = %scene, "redo: scene not found, entity not added"),
        },
        EditAction::RemoveEntities { scene, removed } => match project.scene_mut(*scene) {
            Some(target) => {
                for (_, entity) in removed {
                    if target.remove_entity(entity.id).is_none() {
                        warn!(entity = %entity.id, "redo: entity to remove not found, skipping");
                    }
                }
            }
            None => warn!(scene = %scene, "redo: scene not found, entities not removed"),
        },
        EditAction::RenameEntities { changes } => {
            for (id, _, new) in changes {
                set_name(project, *id, new);
            }
        }
        EditAction::SetEnabled { changes } => {
            for (id, _, new) in changes {
                set_enabled(project, *id, *new);
            }
        }
        EditAction::AddComponent { added } => {
            for (id, component) in added {
                match project.entity_mut(*id) {
                    Some(entity) => {
                        if !entity.add_component(component.clone()) {
                            warn!(entity = %id, kind = %component.kind(), "redo: component already present");
                        }
                    }
                    None => warn!(entity = %id, "redo: entity not found, component not added"),
                }
            }
        }
        EditAction::RemoveComponent { removed } => {
            for (id, _, component) in removed {
                let detached = project
                    .entity_mut(*id)
                    .and_then(|entity| entity.remove_component(component.kind()));
                if detached.is_none() {
                    warn!(entity = %id, kind = %component.kind(), "redo: component to remove not found");
                }
            }
        }
        EditAction::SetBuildConfig { new, .. } => project.set_build_config(*new),
    }
}

/// Restore the state `edit` replaced (the undo direction).
pub fn revert(edit: &EditAction, project: &mut Project) {
    match edit {
        EditAction::AddScene { scene, .. } => {
            if project.remove_scene(scene.id).is_none() {
                warn!(scene = %scene.id, "undo: added scene not found, skipping");
            }
        }
        EditAction::RemoveScene { index, scene } => project.insert_scene(*index, scene.clone()),
        EditAction::AddEntity { scene, entity, .. } => {
            let removed = project
                .scene_mut(*scene)
                .and_then(|target| target.remove_entity(entity.id));
            if removed.is_none() {
                warn!(entity = %entity.id, "undo: added entity not found, skipping");
            }
        }
        EditAction::RemoveEntities { scene, removed } => match project.scene_mut(*scene) {
            // Reinsert in reverse removal order so every recorded index is
            // valid again at the moment it is used.
            Some(target) => {
                for (index, entity) in removed.iter().rev() {
                    target.insert_entity(*index, entity.clone());
                }
            }
            None => warn!(scene = %scene, "undo: scene not found, entities not restored"),
        },
        EditAction::RenameEntities { changes } => {
            for (id, old, _) in changes {
                set_name(project, *id, old);
            }
        }
        EditAction::SetEnabled { changes } => {
            for (id, old, _) in changes {
                set_enabled(project, *id, *old);
            }
        }
        EditAction::AddComponent { added } => {
            for (id, component) in added {
                let detached = project
                    .entity_mut(*id)
                    .and_then(|entity| entity.remove_component(component.kind()));
                if detached.is_none() {
                    warn!(entity = %id, kind = %component.kind(), "undo: added component not found");
                }
            }
        }
        EditAction::RemoveComponent { removed } => {
            for (id, index, component) in removed.iter().rev() {
                match project.entity_mut(*id) {
                    Some(entity) => {
                        if !entity.insert_component(*index, component.clone()) {
                            warn!(entity = %id, kind = %component.kind(), "undo: component already present");
                        }
                    }
                    None => warn!(entity = %id, "undo: entity not found, component not restored"),
                }
            }
        }
        EditAction::SetBuildConfig { old, .. } => project.set_build_config(*old),
    }
}

fn set_name(project: &mut Project, id: EntityId, name: &str) {
    match project.entity_mut(id) {
        Some(entity) => entity.name = name.to_owned(),
        None => warn!(entity = %id, "entity not found, name not changed"),
    }
}

fn set_enabled(project: &mut Project, id: EntityId, enabled: bool) {
    match project.entity_mut(id) {
        Some(entity) => entity.is_enabled = enabled,
        None => warn!(entity = %id, "entity not found, enabled flag not changed"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::ComponentKind;

    fn project_with_entities(n: usize) -> (Project, SceneId, Vec<EntityId>) {
        let mut project = Project::new("Game", "/tmp/game").unwrap();
        let scene = project.scenes()[0].id;
        let mut ids = Vec::new();
        for i in 0..n {
            let id = project.allocate_entity_id().unwrap();
            project
                .scene_mut(scene)
                .unwrap()
                .insert_entity(i, GameEntity::new(id, format!("Entity {i}")));
            ids.push(id);
        }
        (project, scene, ids)
    }

    #[test]
    fn remove_entities_undo_restores_original_order() {
        let (mut project, scene, ids) = project_with_entities(4);
        let before = project.clone();

        // Remove entities 1 and 3, recording positions at removal time.
        let mut removed = Vec::new();
        for id in [ids[1], ids[3]] {
            removed.push(project.scene_mut(scene).unwrap().remove_entity(id).unwrap());
        }
        let edit = EditAction::RemoveEntities { scene, removed };

        revert(&edit, &mut project);
        assert_eq!(project, before);

        apply(&edit, &mut project);
        let names: Vec<&str> = project.scene(scene).unwrap().entities.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Entity 0", "Entity 2"]);
    }

    #[test]
    fn batch_toggle_reverts_each_entity_to_its_own_value() {
        let (mut project, _, ids) = project_with_entities(3);
        project.entity_mut(ids[1]).unwrap().is_enabled = false;

        let changes: Vec<_> = ids
            .iter()
            .map(|id| (*id, project.entity(*id).unwrap().is_enabled, true))
            .collect();
        let edit = EditAction::SetEnabled { changes };
        apply(&edit, &mut project);
        assert!(ids.iter().all(|id| project.entity(*id).unwrap().is_enabled));

        revert(&edit, &mut project);
        let flags: Vec<bool> = ids.iter().map(|id| project.entity(*id).unwrap().is_enabled).collect();
        assert_eq!(flags, vec![true, false, true]);
    }

    #[test]
    fn stale_entity_is_skipped() {
        let (mut project, scene, ids) = project_with_entities(1);
        let edit = EditAction::RenameEntities {
            changes: vec![(ids[0], "Entity 0".to_owned(), "Hero".to_owned())],
        };
        project.scene_mut(scene).unwrap().remove_entity(ids[0]);

        apply(&edit, &mut project);
        revert(&edit, &mut project);
        assert!(project.entity(ids[0]).is_none());
    }

    #[test]
    fn component_add_and_remove_round_trip() {
        let (mut project, _, ids) = project_with_entities(2);
        let edit = EditAction::AddComponent {
            added: ids.iter().map(|id| (*id, Component::script("Move"))).collect(),
        };

        apply(&edit, &mut project);
        assert!(ids
            .iter()
            .all(|id| project.entity(*id).unwrap().component(ComponentKind::Script).is_some()));

        revert(&edit, &mut project);
        assert!(ids
            .iter()
            .all(|id| project.entity(*id).unwrap().component(ComponentKind::Script).is_none()));
    }

    #[test]
    fn labels_match_editor_wording() {
        let scene = Scene::new(SceneId(7), "New Scene 1");
        assert_eq!(
            EditAction::AddScene { index: 1, scene: scene.clone() }.describe(),
            "Add New Scene 1"
        );
        assert_eq!(EditAction::RemoveScene { index: 1, scene }.describe(), "Remove New Scene 1");
        assert_eq!(
            EditAction::SetEnabled { changes: vec![(EntityId(1), true, false)] }.describe(),
            "Disable game entity"
        );
        assert_eq!(
            EditAction::AddComponent { added: vec![(EntityId(1), Component::script("Jump"))] }.describe(),
            "Add Script component"
        );
    }

    #[test]
    fn recorded_action_drives_command_log() {
        let (mut project, _, ids) = project_with_entities(1);
        let mut log = zone_history::CommandLog::new();

        project.entity_mut(ids[0]).unwrap().name = "Hero".to_owned();
        log.record(Recorded::new(EditAction::RenameEntities {
            changes: vec![(ids[0], "Entity 0".to_owned(), "Hero".to_owned())],
        }));

        assert_eq!(log.undo_label(), Some("Rename game entity"));
        log.undo(&mut project);
        assert_eq!(project.entity(ids[0]).unwrap().name, "Entity 0");
        log.redo(&mut project);
        assert_eq!(project.entity(ids[0]).unwrap().name, "Hero");
    }
}
