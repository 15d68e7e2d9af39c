use crate::ecs::{Component, Entity};
use std::mem::{align_of, size_of};

/// Description of an entity, prefab or type to register.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EntityDesc {
    entity: Option<Entity>,
    name: Option<String>,
    expr: Option<String>,
}

impl EntityDesc {
    /// Anonymous descriptor. Registering it always creates a new entity.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Register under an explicit entity id.
    pub fn with_entity(mut self, entity: Entity) -> Self {
        self.entity = Some(entity);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Type expression describing the composition.
    pub fn with_expr(mut self, expr: impl Into<String>) -> Self {
        self.expr = Some(expr.into());
        self
    }

    pub fn entity(&self) -> Option<Entity> {
        self.entity
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn expr(&self) -> Option<&str> {
        self.expr.as_deref()
    }
}

/// Description of a component to register.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComponentDesc {
    entity: Option<Entity>,
    name: Option<String>,
    size: usize,
    alignment: usize,
}

impl ComponentDesc {
    pub fn new(name: impl Into<String>, size: usize, alignment: usize) -> Self {
        Self {
            entity: None,
            name: Some(name.into()),
            size,
            alignment,
        }
    }

    /// Unnamed component. Without an explicit entity every registration
    /// creates a new component.
    pub fn anonymous(size: usize, alignment: usize) -> Self {
        Self {
            entity: None,
            name: None,
            size,
            alignment,
        }
    }

    /// Descriptor for a Rust type, named after [`Component::NAME`].
    pub fn of<T: Component>() -> Self {
        Self::new(T::NAME, size_of::<T>(), align_of::<T>())
    }

    pub fn with_entity(mut self, entity: Entity) -> Self {
        self.entity = Some(entity);
        self
    }

    pub fn entity(&self) -> Option<Entity> {
        self.entity
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn alignment(&self) -> usize {
        self.alignment
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_desc_builder() {
        let desc = EntityDesc::named("Movable")
            .with_expr("Position, Velocity")
            .with_entity(Entity::from_raw(600));
        assert_eq!(desc.name(), Some("Movable"));
        assert_eq!(desc.expr(), Some("Position, Velocity"));
        assert_eq!(desc.entity(), Some(Entity::from_raw(600)));
        assert_eq!(EntityDesc::new().name(), None);
    }

    #[test]
    fn test_component_desc_from_type() {
        #[allow(dead_code)]
        struct Mass(f64);
        crate::define_component!(Mass, "Mass");

        let desc = ComponentDesc::of::<Mass>();
        assert_eq!(desc.name(), Some("Mass"));
        assert_eq!(desc.size(), 8);
        assert_eq!(desc.alignment(), align_of::<f64>());
    }
}
