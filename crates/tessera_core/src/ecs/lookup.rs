// lookup.rs - Name lookup and identifier resolution
//
// Names are unique per parent scope. A name is looked up in the current
// scope first and then in the root scope. Only when neither holds it is a
// dotted name walked as a path from the root.

use crate::ecs::builtin::CHILD_OF;
use crate::ecs::{name_from_symbol, Entity, Id, Result, World, WorldError};

impl World {
    /// Find an entity by name or dotted path.
    ///
    /// An exact name match in the current scope or the root wins over
    /// walking the name as a path, so names containing `.` stay resolvable.
    pub fn lookup(&self, name: &str) -> Option<Entity> {
        self.scope
            .and_then(|scope| self.lookup_child(Some(scope), name))
            .or_else(|| self.lookup_child(None, name))
            .or_else(|| {
                name.contains('.')
                    .then(|| self.lookup_path(name))
                    .flatten()
            })
    }

    /// Find a direct child of `parent` (`None` for the root scope).
    pub fn lookup_child(&self, parent: Option<Entity>, name: &str) -> Option<Entity> {
        self.name_index.get(&parent)?.get(name).copied()
    }

    /// Walk a dotted path such as `"Parent.Child"` from the root scope.
    pub fn lookup_path(&self, path: &str) -> Option<Entity> {
        path.split('.')
            .try_fold(None, |parent, segment| {
                self.lookup_child(parent, segment).map(Some)
            })
            .flatten()
    }

    pub fn parent(&self, entity: Entity) -> Option<Entity> {
        self.entities.get(&entity).and_then(|record| record.parent)
    }

    pub fn scope(&self) -> Option<Entity> {
        self.scope
    }

    /// Set the scope new entities are created in. Returns the previous scope.
    pub fn set_scope(&mut self, scope: Option<Entity>) -> Option<Entity> {
        std::mem::replace(&mut self.scope, scope)
    }

    /// Resolve an entity from an explicit id, a name or both.
    ///
    /// With an explicit id the entity is made known (inside the current
    /// scope if it is new) and named when it has no name yet. A name that
    /// differs from the one already assigned is an error. With only a name
    /// the entity is looked up. `Ok(None)` means a new entity must be created.
    pub(crate) fn lookup_w_id(
        &mut self,
        entity: Option<Entity>,
        name: Option<&str>,
    ) -> Result<Option<Entity>> {
        let Some(entity) = entity else {
            let canonical = name.map(|name| name_from_symbol(self.name_prefix.as_deref(), name));
            return Ok(canonical.and_then(|name| self.lookup(name)));
        };

        if !self.exists(entity) {
            self.ensure(entity);
            if let Some(scope) = self.scope {
                self.add_id(entity, Id::pair(CHILD_OF, scope));
            }
        }

        let Some(name) = name else {
            return Ok(Some(entity));
        };

        match self.name(entity) {
            Some(existing) => {
                let canonical = name_from_symbol(self.name_prefix.as_deref(), name);
                if existing != canonical {
                    tracing::error!(%entity, existing, name, "inconsistent name");
                    return Err(WorldError::InconsistentName {
                        name: name.to_string(),
                        existing: existing.to_string(),
                    });
                }
            }
            None => self.set_symbol(entity, name)?,
        }
        Ok(Some(entity))
    }
}
