// registrar.rs - Registration of entities, prefabs and types

use crate::ecs::builtin::{PREFAB, TYPE};
use crate::ecs::{Entity, EntityDesc, Result, World, WorldError};

impl World {
    /// Register an entity, or return the existing one with the same name.
    ///
    /// The ids of the descriptor's expression are added to the entity, with
    /// `AND` references expanded.
    pub fn new_entity(&mut self, desc: &EntityDesc) -> Result<Entity> {
        let mut world = self.immediate()?;
        let result = world.resolve_or_create(desc.entity(), desc.name())?;
        world.add_expr(result, desc.name(), desc.expr())?;
        Ok(result)
    }

    /// Register a prefab. Same as [`World::new_entity`], tagged with `Prefab`.
    pub fn new_prefab(&mut self, desc: &EntityDesc) -> Result<Entity> {
        let mut world = self.immediate()?;
        let result = world.resolve_or_create(desc.entity(), desc.name())?;
        world.add_id(result, PREFAB.to_id());
        world.add_expr(result, desc.name(), desc.expr())?;
        Ok(result)
    }

    /// Register a type: a named entity that stands for a set of ids.
    ///
    /// Registering the same type again is a no-op, registering it with an
    /// expression that resolves to different tables is an error.
    pub fn new_type(&mut self, desc: &EntityDesc) -> Result<Entity> {
        let mut world = self.immediate()?;
        let result = world.resolve_or_create(desc.entity(), desc.name())?;
        let record = world.type_from_expr(desc.name(), desc.expr())?;

        match world.types.get(&result).copied() {
            None => {
                world.types.insert(result, record);
                world.add_id(result, TYPE.to_id());
                tessera_metrics::metrics! {
                    world.counter.increment("types_registered", 1);
                }
                tracing::debug!(
                    entity = %result,
                    raw = %world.table_str(record.raw),
                    normalized = %world.table_str(record.normalized),
                    "registered type"
                );
            }
            Some(existing) if existing != record => {
                let name = desc
                    .name()
                    .map(str::to_string)
                    .unwrap_or_else(|| result.to_string());
                tracing::warn!(entity = %result, name = %name, "type redefined");
                return Err(WorldError::AlreadyDefined { name });
            }
            Some(_) => {}
        }

        world.type_handles.insert(record.raw, result);
        Ok(result)
    }

    fn resolve_or_create(&mut self, entity: Option<Entity>, name: Option<&str>) -> Result<Entity> {
        if let Some(found) = self.lookup_w_id(entity, name)? {
            return Ok(found);
        }
        let created = self.new_id();
        if let Some(name) = name {
            self.set_symbol(created, name)?;
        }
        tessera_metrics::metrics! {
            self.counter.increment("entities_created", 1);
        }
        tracing::trace!(entity = %created, name, "created entity");
        Ok(created)
    }

    fn add_expr(&mut self, entity: Entity, name: Option<&str>, expr: Option<&str>) -> Result<()> {
        let record = self.type_from_expr(name, expr)?;
        let ids = self.tables.get(record.normalized).ids().to_vec();
        self.add_ids(entity, &ids);
        Ok(())
    }
}
