// world.rs - World state: entities, their tables and the registries
//
// The world owns every piece of registration state. Nothing is global, so
// independent worlds can coexist in one process.

use crate::config::WorldConfig;
use crate::ecs::builtin::{self, CHILD_OF, COMPONENT, IDENTIFIER, TYPE};
use crate::ecs::stage::{Command, Stage};
use crate::ecs::table::{Table, TableId, Tables};
use crate::ecs::{ComponentMeta, Entity, Id, NameRecord, Role, TypeRecord};
use std::collections::HashMap;
use tessera_metrics::Counter;

/// Where an entity lives.
#[derive(Clone, Copy, Debug)]
pub(crate) struct EntityRecord {
    pub table: TableId,
    pub parent: Option<Entity>,
}

type ModifiedHook = Box<dyn FnMut(Entity, Id)>;

/// Snapshot of registry sizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorldStats {
    pub entity_count: usize,
    pub table_count: usize,
    pub type_count: usize,
    pub component_count: usize,
    /// Next candidate for component id allocation.
    pub last_component_id: u64,
}

pub struct World {
    pub(crate) name_prefix: Option<String>,
    pub(crate) hi_component_id: u64,
    pub(crate) entities: HashMap<Entity, EntityRecord>,
    next_entity_id: u64,
    pub(crate) last_component_id: u64,
    pub(crate) tables: Tables,
    pub(crate) names: HashMap<Entity, NameRecord>,
    /// Names per parent scope. `None` is the root scope.
    pub(crate) name_index: HashMap<Option<Entity>, HashMap<String, Entity>>,
    pub(crate) components: HashMap<Entity, ComponentMeta>,
    pub(crate) types: HashMap<Entity, TypeRecord>,
    /// Type entity registered for a raw table.
    pub(crate) type_handles: HashMap<TableId, Entity>,
    pub(crate) scope: Option<Entity>,
    pub(crate) stages: Vec<Stage>,
    pub(crate) readonly: bool,
    on_modified: Vec<ModifiedHook>,
    pub(crate) counter: Counter,
}

impl World {
    pub fn new() -> Self {
        Self::with_config(WorldConfig::default())
    }

    pub fn with_config(config: WorldConfig) -> Self {
        let hi_component_id = config.hi_component_id.max(builtin::FIRST_USER_COMPONENT_ID);
        let mut world = Self {
            name_prefix: config.name_prefix,
            hi_component_id,
            entities: HashMap::new(),
            next_entity_id: hi_component_id,
            last_component_id: builtin::FIRST_USER_COMPONENT_ID,
            tables: Tables::new(),
            names: HashMap::new(),
            name_index: HashMap::new(),
            components: HashMap::new(),
            types: HashMap::new(),
            type_handles: HashMap::new(),
            scope: None,
            stages: (0..config.stage_count.max(1)).map(Stage::new).collect(),
            readonly: false,
            on_modified: Vec::new(),
            counter: Counter::new(),
        };
        world.bootstrap();
        world
    }

    fn bootstrap(&mut self) {
        for (entity, name) in builtin::NAMES {
            self.ensure(entity);
            self.names.insert(
                entity,
                NameRecord {
                    value: name.to_string(),
                    symbol: name.to_string(),
                },
            );
            self.name_index
                .entry(None)
                .or_default()
                .insert(name.to_string(), entity);
            self.apply_add(entity, IDENTIFIER.to_id());
        }

        let metas = [
            (COMPONENT, ComponentMeta::of::<ComponentMeta>()),
            (IDENTIFIER, ComponentMeta::of::<NameRecord>()),
            (TYPE, ComponentMeta::of::<TypeRecord>()),
        ];
        for (entity, meta) in metas {
            self.components.insert(entity, meta);
            self.apply_add(entity, COMPONENT.to_id());
        }
        tracing::debug!(
            hi_component_id = self.hi_component_id,
            stages = self.stages.len(),
            "world bootstrapped"
        );
    }

    pub fn exists(&self, entity: Entity) -> bool {
        self.entities.contains_key(&entity)
    }

    /// Make `entity` known to the world, keeping the allocator ahead of it.
    pub(crate) fn ensure(&mut self, entity: Entity) -> &mut EntityRecord {
        if entity.id() >= self.next_entity_id {
            self.next_entity_id = entity.id() + 1;
        }
        self.entities.entry(entity).or_insert(EntityRecord {
            table: TableId::ROOT,
            parent: None,
        })
    }

    pub(crate) fn alloc_id(&mut self) -> Entity {
        let entity = Entity::from_raw(self.next_entity_id);
        self.ensure(entity);
        entity
    }

    /// Allocate a new entity inside the current scope.
    pub fn new_id(&mut self) -> Entity {
        let entity = self.alloc_id();
        if let Some(scope) = self.scope {
            self.add_id(entity, Id::pair(CHILD_OF, scope));
        }
        entity
    }

    /// Allocate from the reserved component range, falling back to a regular
    /// entity once the range is exhausted.
    pub(crate) fn new_component_id(&mut self) -> Entity {
        while self.last_component_id < self.hi_component_id {
            let entity = Entity::from_raw(self.last_component_id);
            self.last_component_id += 1;
            if !self.exists(entity) {
                self.ensure(entity);
                return entity;
            }
        }
        tracing::warn!(
            hi_component_id = self.hi_component_id,
            "component id range exhausted"
        );
        self.alloc_id()
    }

    pub fn add_id(&mut self, entity: Entity, id: Id) {
        if self.defer(Command::Add { entity, id }) {
            return;
        }
        self.apply_add(entity, id);
    }

    /// Add several ids at once, moving the entity straight to the final table.
    pub fn add_ids(&mut self, entity: Entity, ids: &[Id]) {
        if self.readonly {
            for &id in ids {
                self.defer(Command::Add { entity, id });
            }
            return;
        }
        let pairs: Vec<Id> = ids.iter().copied().filter(|id| is_child_of(*id)).collect();
        let current = self.ensure(entity).table;
        let next = self.traverse(current, ids);
        self.ensure(entity).table = next;
        for pair in pairs {
            self.set_parent(entity, Some(pair.object()));
        }
    }

    pub fn remove_id(&mut self, entity: Entity, id: Id) {
        if self.defer(Command::Remove { entity, id }) {
            return;
        }
        self.apply_remove(entity, id);
    }

    /// Remove every id, the name and any registration records of `entity`.
    pub fn clear(&mut self, entity: Entity) {
        if self.defer(Command::Clear { entity }) {
            return;
        }
        self.apply_clear(entity);
    }

    pub(crate) fn apply_add(&mut self, entity: Entity, id: Id) {
        let current = self.ensure(entity).table;
        let next = self.traverse(current, &[id]);
        self.ensure(entity).table = next;
        if is_child_of(id) {
            self.set_parent(entity, Some(id.object()));
        }
    }

    pub(crate) fn apply_remove(&mut self, entity: Entity, id: Id) {
        let Some(record) = self.entities.get(&entity).copied() else {
            return;
        };
        let next = self.traverse_remove(record.table, id);
        self.ensure(entity).table = next;
        if is_child_of(id) && record.parent == Some(id.object()) {
            self.set_parent(entity, None);
        }
    }

    pub(crate) fn apply_clear(&mut self, entity: Entity) {
        let Some(record) = self.entities.get(&entity).copied() else {
            return;
        };
        self.unindex_name(entity, record.parent);
        self.names.remove(&entity);
        self.components.remove(&entity);
        if let Some(removed) = self.types.remove(&entity) {
            if self.type_handles.get(&removed.raw) == Some(&entity) {
                self.type_handles.remove(&removed.raw);
            }
        }
        self.ensure(entity).table = TableId::ROOT;
        self.ensure(entity).parent = None;
        tracing::trace!(%entity, "cleared entity");
    }

    /// Move `entity` to a new parent scope, carrying its name along.
    fn set_parent(&mut self, entity: Entity, parent: Option<Entity>) {
        let previous = self.ensure(entity).parent;
        if previous == parent {
            return;
        }
        if let (Some(old), Some(_)) = (previous, parent) {
            let current = self.ensure(entity).table;
            let next = self.traverse_remove(current, Id::pair(CHILD_OF, old));
            self.ensure(entity).table = next;
        }

        self.unindex_name(entity, previous);
        self.ensure(entity).parent = parent;

        let Some(name) = self.names.get(&entity).map(|record| record.value.clone()) else {
            return;
        };
        let scope = self.name_index.entry(parent).or_default();
        match scope.get(&name).copied() {
            Some(other) if other != entity => {
                tracing::warn!(%entity, %other, name = %name, "name already used in new scope");
            }
            _ => {
                scope.insert(name, entity);
            }
        }
    }

    /// Intern `ids` as a table, counting newly created tables.
    pub(crate) fn intern(&mut self, ids: &[Id]) -> TableId {
        let before = self.tables.len();
        let table = self.tables.find_or_create(ids);
        self.note_tables(before);
        table
    }

    pub(crate) fn traverse(&mut self, base: TableId, ids: &[Id]) -> TableId {
        let before = self.tables.len();
        let table = self.tables.traverse_add(base, ids);
        self.note_tables(before);
        table
    }

    fn traverse_remove(&mut self, base: TableId, id: Id) -> TableId {
        let before = self.tables.len();
        let table = self.tables.traverse_remove(base, id);
        self.note_tables(before);
        table
    }

    #[allow(unused_variables)]
    fn note_tables(&mut self, before: usize) {
        tessera_metrics::metrics! {
            let created = self.tables.len() - before;
            if created > 0 {
                self.counter.increment("tables_created", created);
            }
        }
    }

    /// Table `entity` currently lives in.
    pub fn composition(&self, entity: Entity) -> Option<TableId> {
        self.entities.get(&entity).map(|record| record.table)
    }

    pub fn has_id(&self, entity: Entity, id: Id) -> bool {
        self.composition(entity)
            .is_some_and(|table| self.tables.get(table).contains(id))
    }

    /// Table behind `table`.
    ///
    /// # Panics
    /// If `table` was not issued by this world. Use [`World::get_table`] for
    /// handles of unknown origin.
    pub fn table(&self, table: TableId) -> &Table {
        self.tables.get(table)
    }

    pub fn get_table(&self, table: TableId) -> Option<&Table> {
        self.tables.try_get(table)
    }

    /// Every table interned so far, starting with the root table.
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.iter()
    }

    /// Tables that contain `id`, in creation order.
    pub fn tables_with(&self, id: Id) -> &[TableId] {
        self.tables.tables_with(id)
    }

    /// Register a callback invoked whenever a component is marked modified.
    pub fn on_modified(&mut self, hook: impl FnMut(Entity, Id) + 'static) {
        self.on_modified.push(Box::new(hook));
    }

    /// Mark `id` of `entity` as modified.
    pub fn modified(&mut self, entity: Entity, id: Id) {
        if self.defer(Command::Modified { entity, id }) {
            return;
        }
        self.notify_modified(entity, id);
    }

    pub(crate) fn notify_modified(&mut self, entity: Entity, id: Id) {
        tracing::trace!(%entity, %id, "modified");
        for hook in self.on_modified.iter_mut() {
            hook(entity, id);
        }
    }

    pub fn stats(&self) -> WorldStats {
        WorldStats {
            entity_count: self.entities.len(),
            table_count: self.tables.len(),
            type_count: self.types.len(),
            component_count: self.components.len(),
            last_component_id: self.last_component_id,
        }
    }

    /// Registration counters. Always zero without the `metrics` feature.
    pub fn counters(&self) -> &Counter {
        &self.counter
    }

    /// Render an id using entity names where available.
    pub fn id_str(&self, id: Id) -> String {
        let label = |entity: Entity| {
            self.name(entity)
                .map(str::to_string)
                .unwrap_or_else(|| entity.to_string())
        };
        match (id.role(), id.relation()) {
            (Some(Role::Pair), Some(relation)) => {
                format!("({}, {})", label(relation), label(id.object()))
            }
            (Some(role), _) => format!("{}|{}", role.keyword(), label(id.object())),
            (None, _) => label(id.object()),
        }
    }

    /// Render the members of a table as a type expression.
    pub fn table_str(&self, table: TableId) -> String {
        self.tables
            .get(table)
            .ids()
            .iter()
            .map(|&id| self.id_str(id))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

fn is_child_of(id: Id) -> bool {
    id.relation() == Some(CHILD_OF)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::builtin::PREFAB;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_builtins_are_named_components() {
        let world = World::new();
        assert_eq!(world.lookup("Component"), Some(COMPONENT));
        assert_eq!(world.lookup("ChildOf"), Some(CHILD_OF));
        assert!(world.has_id(COMPONENT, COMPONENT.to_id()));
        assert!(world.has_id(TYPE, IDENTIFIER.to_id()));
        assert!(!world.has_id(PREFAB, COMPONENT.to_id()));
    }

    #[test]
    fn test_regular_entities_start_above_component_range() {
        let mut world = World::new();
        let e = world.new_id();
        assert!(e.id() >= crate::config::HI_COMPONENT_ID);
        assert_ne!(world.new_id(), e);
    }

    #[test]
    fn test_component_ids_come_from_reserved_range() {
        let mut world = World::new();
        let first = world.new_component_id();
        assert_eq!(first.id(), builtin::FIRST_USER_COMPONENT_ID);
        assert_eq!(world.new_component_id().id(), first.id() + 1);
    }

    #[test]
    fn test_component_range_exhaustion_falls_back() {
        let config = WorldConfig {
            hi_component_id: 10,
            ..WorldConfig::default()
        };
        let mut world = World::with_config(config);
        assert_eq!(world.new_component_id().id(), 8);
        assert_eq!(world.new_component_id().id(), 9);
        assert!(world.new_component_id().id() >= 10);
    }

    #[test]
    fn test_add_and_remove_move_between_tables() {
        let mut world = World::new();
        let e = world.new_id();
        let tag = world.new_id();
        world.add_id(e, tag.to_id());
        assert!(world.has_id(e, tag.to_id()));
        world.remove_id(e, tag.to_id());
        assert_eq!(world.composition(e), Some(TableId::ROOT));
    }

    #[test]
    fn test_child_of_moves_name_to_parent_scope() {
        let mut world = World::new();
        let parent = world.new_id();
        world.set_symbol(parent, "Parent").unwrap();
        let child = world.new_id();
        world.set_symbol(child, "Child").unwrap();

        world.add_id(child, Id::pair(CHILD_OF, parent));
        assert_eq!(world.parent(child), Some(parent));
        assert_eq!(world.lookup("Child"), None);
        assert_eq!(world.lookup("Parent.Child"), Some(child));

        world.remove_id(child, Id::pair(CHILD_OF, parent));
        assert_eq!(world.lookup("Child"), Some(child));
    }

    #[test]
    fn test_clear_drops_name_and_composition() {
        let mut world = World::new();
        let e = world.new_id();
        world.set_symbol(e, "Gone").unwrap();
        world.clear(e);
        assert_eq!(world.lookup("Gone"), None);
        assert_eq!(world.composition(e), Some(TableId::ROOT));
        assert!(world.exists(e));
    }

    #[test]
    fn test_modified_hooks_are_called() {
        let mut world = World::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        world.on_modified(move |entity, id| sink.borrow_mut().push((entity, id)));

        let e = world.new_id();
        world.modified(e, COMPONENT.to_id());
        assert_eq!(*seen.borrow(), vec![(e, COMPONENT.to_id())]);
    }

    #[test]
    fn test_foreign_table_handle_is_not_found() {
        let mut big = World::new();
        let tag = big.new_id();
        let mut handle = TableId::ROOT;
        for _ in 0..20 {
            let next = big.new_id();
            handle = big.table_from_ids(&[tag.to_id(), next.to_id()]);
        }

        let small = World::new();
        assert!(small.get_table(TableId::ROOT).is_some_and(Table::is_empty));
        assert!(small.get_table(handle).is_none());
        assert!(big.get_table(handle).is_some());
    }

    #[test]
    #[should_panic]
    fn test_foreign_table_handle_panics_on_direct_access() {
        let mut big = World::new();
        let tag = big.new_id();
        let mut handle = TableId::ROOT;
        for _ in 0..20 {
            let next = big.new_id();
            handle = big.table_from_ids(&[tag.to_id(), next.to_id()]);
        }
        World::new().table(handle);
    }

    #[test]
    fn test_id_str_uses_names() {
        let world = World::new();
        assert_eq!(world.id_str(Id::pair(CHILD_OF, TYPE)), "(ChildOf, Type)");
        assert_eq!(world.id_str(Id::with_role(Role::And, PREFAB)), "AND|Prefab");
        assert_eq!(world.id_str(Entity::from_raw(900).to_id()), "900");
    }
}
