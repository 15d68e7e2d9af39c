//! Entities every world bootstraps with.

use crate::ecs::Entity;

/// Component carrying `(size, alignment)` metadata.
pub const COMPONENT: Entity = Entity::from_raw(1);
/// Component carrying the display name and symbol of record.
pub const IDENTIFIER: Entity = Entity::from_raw(2);
/// Component carrying `(type, normalized)` tables.
pub const TYPE: Entity = Entity::from_raw(3);
/// Tag marking template entities.
pub const PREFAB: Entity = Entity::from_raw(4);
/// Relation from a child to its parent scope.
pub const CHILD_OF: Entity = Entity::from_raw(5);
/// Implicit subject of a term.
pub const THIS: Entity = Entity::from_raw(6);
pub const WILDCARD: Entity = Entity::from_raw(7);

pub(crate) const FIRST_USER_COMPONENT_ID: u64 = 8;

pub(crate) const NAMES: [(Entity, &str); 7] = [
    (COMPONENT, "Component"),
    (IDENTIFIER, "Identifier"),
    (TYPE, "Type"),
    (PREFAB, "Prefab"),
    (CHILD_OF, "ChildOf"),
    (THIS, "This"),
    (WILDCARD, "Wildcard"),
];
