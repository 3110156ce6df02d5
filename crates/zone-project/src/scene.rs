//! Scenes, game entities and their components.
//!
//! A [`Scene`] owns an ordered list of [`GameEntity`] values. Each entity
//! carries at most one [`Component`] of every [`ComponentKind`]; a new entity
//! always starts with a default transform.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Stable identifier of a scene within a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneId(pub u32);

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scene#{}", self.0)
    }
}

/// Stable identifier of a game entity within a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Component
// ---------------------------------------------------------------------------

/// Discriminant of a [`Component`], used to look components up by type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    Transform,
    Script,
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transform => f.write_str("Transform"),
            Self::Script => f.write_str("Script"),
        }
    }
}

/// Data attached to a game entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Component {
    /// Placement in the scene. Rotation is Euler angles in radians.
    Transform {
        position: [f32; 3],
        rotation: [f32; 3],
        scale: [f32; 3],
    },
    /// Binds the entity to a script exported by the game-code module.
    Script {
        /// Script identifier, as reported by the loaded module.
        name: String,
    },
}

impl Component {
    /// Identity transform: origin, no rotation, unit scale.
    pub fn transform() -> Self {
        Self::Transform {
            position: [0.0; 3],
            rotation: [0.0; 3],
            scale: [1.0; 3],
        }
    }

    /// Script component bound to `name`.
    pub fn script(name: impl Into<String>) -> Self {
        Self::Script { name: name.into() }
    }

    pub fn kind(&self) -> ComponentKind {
        match self {
            Self::Transform { .. } => ComponentKind::Transform,
            Self::Script { .. } => ComponentKind::Script,
        }
    }
}

// ---------------------------------------------------------------------------
// GameEntity
// ---------------------------------------------------------------------------

/// An object placed in a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameEntity {
    pub id: EntityId,
    pub name: String,
    #[serde(default = "enabled_by_default")]
    pub is_enabled: bool,
    #[serde(default)]
    pub components: Vec<Component>,
}

fn enabled_by_default() -> bool {
    true
}

impl GameEntity {
    /// Create an enabled entity holding a default transform.
    pub fn new(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            is_enabled: true,
            components: vec![Component::transform()],
        }
    }

    /// The component of the given kind, if present.
    pub fn component(&self, kind: ComponentKind) -> Option<&Component> {
        self.components.iter().find(|c| c.kind() == kind)
    }

    /// Attach a component. Returns `false` if one of the same kind exists.
    pub fn add_component(&mut self, component: Component) -> bool {
        if self.component(component.kind()).is_some() {
            return false;
        }
        self.components.push(component);
        true
    }

    /// Insert a component at `index` (clamped). Used to restore removals in
    /// their original position. Returns `false` if the kind already exists.
    pub fn insert_component(&mut self, index: usize, component: Component) -> bool {
        if self.component(component.kind()).is_some() {
            return false;
        }
        let index = index.min(self.components.len());
        self.components.insert(index, component);
        true
    }

    /// Detach the component of the given kind, returning it with its former
    /// position.
    ///
    /// The transform is mandatory and is never removed.
    pub fn remove_component(&mut self, kind: ComponentKind) -> Option<(usize, Component)> {
        if kind == ComponentKind::Transform {
            return None;
        }
        let index = self.components.iter().position(|c| c.kind() == kind)?;
        Some((index, self.components.remove(index)))
    }
}

// ---------------------------------------------------------------------------
// Scene
// ---------------------------------------------------------------------------

/// A named collection of game entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub id: SceneId,
    pub name: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub entities: Vec<GameEntity>,
}

impl Scene {
    pub fn new(id: SceneId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            is_active: false,
            entities: Vec::new(),
        }
    }

    pub fn entity(&self, id: EntityId) -> Option<&GameEntity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut GameEntity> {
        self.entities.iter_mut().find(|e| e.id == id)
    }

    /// Position of the entity within the scene.
    pub fn entity_index(&self, id: EntityId) -> Option<usize> {
        self.entities.iter().position(|e| e.id == id)
    }

    /// Insert an entity at `index` (clamped to the end of the list).
    pub fn insert_entity(&mut self, index: usize, entity: GameEntity) {
        let index = index.min(self.entities.len());
        self.entities.insert(index, entity);
    }

    /// Remove an entity, returning it with its former position.
    pub fn remove_entity(&mut self, id: EntityId) -> Option<(usize, GameEntity)> {
        let index = self.entity_index(id)?;
        Some((index, self.entities.remove(index)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_entity_has_transform_and_is_enabled() {
        let entity = GameEntity::new(EntityId(1), "Player");
        assert!(entity.is_enabled);
        assert_eq!(entity.components, vec![Component::transform()]);
    }

    #[test]
    fn duplicate_component_kind_is_refused() {
        let mut entity = GameEntity::new(EntityId(1), "Player");
        assert!(entity.add_component(Component::script("Move")));
        assert!(!entity.add_component(Component::script("Jump")));
        assert_eq!(
            entity.component(ComponentKind::Script),
            Some(&Component::script("Move"))
        );
    }

    #[test]
    fn transform_cannot_be_removed() {
        let mut entity = GameEntity::new(EntityId(1), "Player");
        assert!(entity.remove_component(ComponentKind::Transform).is_none());
        assert_eq!(entity.components.len(), 1);
    }

    #[test]
    fn removed_component_reinserts_at_same_position() {
        let mut entity = GameEntity::new(EntityId(1), "Player");
        entity.add_component(Component::script("Move"));

        let (index, component) = entity.remove_component(ComponentKind::Script).unwrap();
        assert_eq!(index, 1);
        assert!(entity.insert_component(index, component));
        assert_eq!(entity.components[1], Component::script("Move"));
    }

    #[test]
    fn scene_insert_clamps_index() {
        let mut scene = Scene::new(SceneId(0), "Level");
        scene.insert_entity(10, GameEntity::new(EntityId(1), "A"));
        scene.insert_entity(0, GameEntity::new(EntityId(2), "B"));

        assert_eq!(scene.entity_index(EntityId(2)), Some(0));
        assert_eq!(scene.entity_index(EntityId(1)), Some(1));
        assert_eq!(scene.remove_entity(EntityId(1)).map(|(i, _)| i), Some(1));
        assert!(scene.entity(EntityId(1)).is_none());
    }

    #[test]
    fn component_serializes_with_type_tag() {
        let json = serde_json::to_value(Component::script("Jump")).unwrap();
        assert_eq!(json, serde_json::json!({"type": "Script", "name": "Jump"}));
    }
}
