// component.rs - Component registration
//
// A component is an entity with layout metadata. Registration is
// create-or-get: the same name always yields the same entity, and the layout
// must not change once registered. Component ids come from a reserved low
// range so they stay small.

use crate::ecs::builtin::COMPONENT;
use crate::ecs::{name_from_symbol, ComponentDesc, Entity, Result, World, WorldError};
use std::mem::{align_of, size_of};

/// Memory layout of a component.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ComponentMeta {
    pub size: usize,
    pub alignment: usize,
}

impl ComponentMeta {
    pub fn of<T>() -> Self {
        Self {
            size: size_of::<T>(),
            alignment: align_of::<T>(),
        }
    }
}

/// Trait for Rust types registered as components.
pub trait Component: 'static + Sized {
    /// Symbol the component is registered under.
    const NAME: &'static str;
}

/// Helper macro to implement the Component trait.
///
/// # Example
/// ```ignore
/// #[derive(Clone, Copy)]
/// struct Position { x: f32, y: f32 }
///
/// define_component!(Position, "Position");
/// ```
#[macro_export]
macro_rules! define_component {
    ($ty:ty, $name:expr) => {
        impl $crate::ecs::Component for $ty {
            const NAME: &'static str = $name;
        }
    };
}

impl World {
    /// Register a component, or return the existing one with the same name.
    pub fn new_component(&mut self, desc: &ComponentDesc) -> Result<Entity> {
        let mut world = self.immediate()?;

        let result = match world.lookup_w_id(desc.entity(), desc.name())? {
            Some(existing) => existing,
            None => {
                let created = world.new_component_id();
                if let Some(name) = desc.name() {
                    world.set_symbol(created, name)?;
                }
                created
            }
        };

        let requested = ComponentMeta {
            size: desc.size(),
            alignment: desc.alignment(),
        };
        let label = || {
            desc.name()
                .map(str::to_string)
                .unwrap_or_else(|| result.to_string())
        };

        match world.components.get(&result).copied() {
            None => {
                world.components.insert(result, requested);
                world.add_id(result, COMPONENT.to_id());
                tessera_metrics::metrics! {
                    world.counter.increment("components_registered", 1);
                }
                tracing::debug!(
                    component = %result,
                    name = %label(),
                    size = requested.size,
                    alignment = requested.alignment,
                    "registered component"
                );
            }
            Some(existing) if existing.size != requested.size => {
                tracing::warn!(component = %result, existing = existing.size, requested = requested.size, "size conflict");
                return Err(WorldError::InvalidComponentSize {
                    name: label(),
                    existing: existing.size,
                    requested: requested.size,
                });
            }
            Some(existing) if existing.alignment != requested.alignment => {
                tracing::warn!(component = %result, existing = existing.alignment, requested = requested.alignment, "alignment conflict");
                return Err(WorldError::InvalidComponentAlignment {
                    name: label(),
                    existing: existing.alignment,
                    requested: requested.alignment,
                });
            }
            Some(_) => {}
        }

        world.modified(result, COMPONENT.to_id());

        // Keep automatic allocation clear of explicitly placed components.
        if let Some(explicit) = desc.entity() {
            let id = explicit.id();
            if id >= world.last_component_id && id < world.hi_component_id {
                world.last_component_id = id + 1;
            }
        }

        Ok(result)
    }

    /// Register a Rust type as a component.
    pub fn register<T: Component>(&mut self) -> Result<Entity> {
        self.new_component(&ComponentDesc::of::<T>())
    }

    /// Entity of a registered Rust component.
    pub fn component_id<T: Component>(&self) -> Option<Entity> {
        let name = name_from_symbol(self.name_prefix.as_deref(), T::NAME);
        self.lookup(name)
            .filter(|entity| self.components.contains_key(entity))
    }

    pub fn component_meta(&self, entity: Entity) -> Option<ComponentMeta> {
        self.components.get(&entity).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldConfig;

    #[derive(Clone, Copy)]
    #[allow(dead_code)]
    struct Position {
        x: f32,
        y: f32,
    }
    crate::define_component!(Position, "Position");

    #[test]
    fn test_registration_is_idempotent() {
        let mut world = World::new();
        let a = world.new_component(&ComponentDesc::new("Position", 8, 4)).unwrap();
        let b = world.new_component(&ComponentDesc::new("Position", 8, 4)).unwrap();
        assert_eq!(a, b);
        assert!(a.id() < crate::config::HI_COMPONENT_ID);
        assert!(world.has_id(a, COMPONENT.to_id()));
        assert_eq!(
            world.component_meta(a),
            Some(ComponentMeta { size: 8, alignment: 4 })
        );
    }

    #[test]
    fn test_layout_conflicts_are_rejected() {
        let mut world = World::new();
        world.new_component(&ComponentDesc::new("Position", 8, 4)).unwrap();

        let err = world
            .new_component(&ComponentDesc::new("Position", 12, 4))
            .unwrap_err();
        assert!(matches!(
            err,
            WorldError::InvalidComponentSize { existing: 8, requested: 12, .. }
        ));

        let err = world
            .new_component(&ComponentDesc::new("Position", 8, 8))
            .unwrap_err();
        assert!(matches!(
            err,
            WorldError::InvalidComponentAlignment { existing: 4, requested: 8, .. }
        ));
    }

    #[test]
    fn test_explicit_id_advances_allocation() {
        let mut world = World::new();
        let explicit = Entity::from_raw(100);
        let placed = world
            .new_component(&ComponentDesc::new("Placed", 4, 4).with_entity(explicit))
            .unwrap();
        assert_eq!(placed, explicit);
        assert_eq!(world.stats().last_component_id, 101);

        let next = world.new_component(&ComponentDesc::new("Next", 4, 4)).unwrap();
        assert_eq!(next.id(), 101);
    }

    #[test]
    fn test_register_rust_type() {
        let mut world = World::with_config(WorldConfig::default().with_name_prefix("Ecs"));
        let e = world.register::<Position>().unwrap();
        assert_eq!(world.component_id::<Position>(), Some(e));
        assert_eq!(world.component_meta(e), Some(ComponentMeta::of::<Position>()));
    }

    #[test]
    fn test_modified_is_signalled_on_every_registration() {
        use std::cell::Cell;
        use std::rc::Rc;

        let mut world = World::new();
        let calls = Rc::new(Cell::new(0));
        let sink = Rc::clone(&calls);
        world.on_modified(move |_, id| {
            if id == COMPONENT.to_id() {
                sink.set(sink.get() + 1);
            }
        });
        world.register::<Position>().unwrap();
        world.register::<Position>().unwrap();
        assert_eq!(calls.get(), 2);
    }
}
