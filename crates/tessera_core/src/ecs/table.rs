// table.rs - Structurally interned tables
//
// A table is a unique set of ids. Tables with the same ids are the same
// table, no matter in which order or with how many duplicates the ids were
// supplied. Tables live as long as the world.

use crate::ecs::Id;
use std::collections::HashMap;
use std::fmt;

/// Handle to an interned table. `TableId::ROOT` is the empty table.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableId(u32);

impl TableId {
    pub const ROOT: TableId = TableId(0);

    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A unique, sorted combination of ids.
#[derive(Clone, Debug)]
pub struct Table {
    id: TableId,
    ids: Box<[Id]>,
    /// Cached transitions: table reached by adding one id.
    add_edges: HashMap<Id, TableId>,
}

impl Table {
    pub fn id(&self) -> TableId {
        self.id
    }

    /// Sorted member ids.
    pub fn ids(&self) -> &[Id] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Check if this table contains a specific id.
    pub fn contains(&self, id: Id) -> bool {
        self.ids.binary_search(&id).is_ok()
    }
}

/// Sort and deduplicate ids into their canonical order.
pub(crate) fn canonicalize(mut ids: Vec<Id>) -> Vec<Id> {
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Registry interning every table of a world.
pub(crate) struct Tables {
    tables: Vec<Table>,
    index: HashMap<Box<[Id]>, TableId>,
    id_index: HashMap<Id, Vec<TableId>>,
}

impl Tables {
    pub fn new() -> Self {
        let mut tables = Self {
            tables: Vec::new(),
            index: HashMap::new(),
            id_index: HashMap::new(),
        };
        tables.insert(Box::default());
        tables
    }

    /// Table behind a handle issued by this registry.
    pub fn get(&self, id: TableId) -> &Table {
        &self.tables[id.0 as usize]
    }

    pub fn try_get(&self, id: TableId) -> Option<&Table> {
        self.tables.get(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Table> {
        self.tables.iter()
    }

    /// Tables containing `id`, in creation order.
    pub fn tables_with(&self, id: Id) -> &[TableId] {
        self.id_index.get(&id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Find the table for an arbitrary id list, creating it on first use.
    pub fn find_or_create(&mut self, ids: &[Id]) -> TableId {
        let ids = canonicalize(ids.to_vec());
        match self.index.get(ids.as_slice()) {
            Some(&table) => {
                tracing::trace!(table = %table, "table cache hit");
                table
            }
            None => self.insert(ids.into_boxed_slice()),
        }
    }

    /// Table reached from `base` by adding every id in `ids`.
    pub fn traverse_add(&mut self, base: TableId, ids: &[Id]) -> TableId {
        let mut current = base;
        for &id in ids {
            current = self.add_one(current, id);
        }
        current
    }

    /// Table reached from `base` by removing `id`.
    pub fn traverse_remove(&mut self, base: TableId, id: Id) -> TableId {
        let table = self.get(base);
        if !table.contains(id) {
            return base;
        }
        let remaining: Vec<Id> = table.ids.iter().copied().filter(|&i| i != id).collect();
        self.find_or_create(&remaining)
    }

    fn add_one(&mut self, base: TableId, id: Id) -> TableId {
        let table = self.get(base);
        if table.contains(id) {
            return base;
        }
        if let Some(&next) = table.add_edges.get(&id) {
            return next;
        }

        let mut ids = table.ids.to_vec();
        ids.push(id);
        let next = self.find_or_create(&ids);
        self.tables[base.0 as usize].add_edges.insert(id, next);
        next
    }

    fn insert(&mut self, ids: Box<[Id]>) -> TableId {
        let id = TableId(self.tables.len() as u32);
        for &member in ids.iter() {
            self.id_index.entry(member).or_default().push(id);
        }
        tracing::debug!(table = %id, members = ids.len(), "created table");
        self.index.insert(ids.clone(), id);
        self.tables.push(Table {
            id,
            ids,
            add_edges: HashMap::new(),
        });
        id
    }
}
