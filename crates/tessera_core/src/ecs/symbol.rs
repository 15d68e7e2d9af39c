// symbol.rs - Display names derived from symbols
//
// A symbol is the identifier an entity was registered under, e.g. the Rust
// type name `EcsPosition`. When the world has a naming prefix configured,
// the prefix is stripped to obtain the display name (`Position`). The
// original symbol is kept as the symbol of record.

use crate::ecs::builtin::IDENTIFIER;
use crate::ecs::{Entity, Result, World, WorldError};
use crate::ecs::stage::Command;

/// Display name and symbol of record of an entity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NameRecord {
    pub value: String,
    pub symbol: String,
}

/// Strip `prefix` from `symbol` when it is followed by an uppercase
/// character or `_` (which is stripped as well).
pub fn name_from_symbol<'a>(prefix: Option<&str>, symbol: &'a str) -> &'a str {
    let Some(prefix) = prefix else {
        return symbol;
    };
    let Some(rest) = symbol.strip_prefix(prefix) else {
        return symbol;
    };
    match rest.chars().next() {
        Some('_') => &rest[1..],
        Some(c) if c.is_uppercase() => rest,
        _ => symbol,
    }
}

impl World {
    /// Current naming prefix.
    pub fn name_prefix(&self) -> Option<&str> {
        self.name_prefix.as_deref()
    }

    /// Change the naming prefix. Already assigned names are not revisited.
    pub fn set_name_prefix(&mut self, prefix: Option<&str>) {
        self.name_prefix = prefix.map(str::to_string);
    }

    /// Display name of `entity`.
    pub fn name(&self, entity: Entity) -> Option<&str> {
        self.names.get(&entity).map(|record| record.value.as_str())
    }

    /// Symbol `entity` was registered under.
    pub fn symbol(&self, entity: Entity) -> Option<&str> {
        self.names.get(&entity).map(|record| record.symbol.as_str())
    }

    /// Name `entity` after `symbol`. An empty symbol leaves the entity as is.
    pub fn set_symbol(&mut self, entity: Entity, symbol: &str) -> Result<()> {
        if symbol.is_empty() {
            return Ok(());
        }
        if self.defer(Command::SetSymbol {
            entity,
            symbol: symbol.to_string(),
        }) {
            return Ok(());
        }
        self.apply_symbol(entity, symbol)
    }

    pub(crate) fn apply_symbol(&mut self, entity: Entity, symbol: &str) -> Result<()> {
        let value = name_from_symbol(self.name_prefix.as_deref(), symbol).to_string();
        let parent = self.ensure(entity).parent;

        if let Some(&existing) = self.name_index.get(&parent).and_then(|names| names.get(&value)) {
            if existing != entity {
                tracing::warn!(name = %value, %existing, %entity, "name already in use");
                return Err(WorldError::NameInUse {
                    name: value,
                    existing,
                });
            }
        }

        self.unindex_name(entity, parent);
        self.name_index
            .entry(parent)
            .or_default()
            .insert(value.clone(), entity);

        tracing::trace!(%entity, name = %value, symbol, "assigned symbol");
        self.names.insert(
            entity,
            NameRecord {
                value,
                symbol: symbol.to_string(),
            },
        );
        self.apply_add(entity, IDENTIFIER.to_id());
        Ok(())
    }

    /// Drop the index entry for the current name of `entity` under `parent`.
    pub(crate) fn unindex_name(&mut self, entity: Entity, parent: Option<Entity>) {
        let Some(record) = self.names.get(&entity) else {
            return;
        };
        if let Some(names) = self.name_index.get_mut(&parent) {
            if names.get(&record.value) == Some(&entity) {
                names.remove(&record.value);
            }
        }
    }
}
