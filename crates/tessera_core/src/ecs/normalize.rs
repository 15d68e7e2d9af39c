// normalize.rs - Types and their normalized form
//
// A type is registered with two tables: the raw table holds the ids exactly
// as written, the normalized table replaces every `AND|T` id with the
// members of T's normalized table.

use crate::ecs::table::TableId;
use crate::ecs::{Entity, Id, Result, Role, World, WorldError};

/// Tables of a registered type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TypeRecord {
    /// Ids as written in the expression.
    pub raw: TableId,
    /// Ids with every `AND` reference inlined.
    pub normalized: TableId,
}

impl TypeRecord {
    pub const EMPTY: TypeRecord = TypeRecord {
        raw: TableId::ROOT,
        normalized: TableId::ROOT,
    };
}

impl World {
    /// Build the raw and normalized tables for `ids`.
    pub(crate) fn type_from_ids(&mut self, ids: &[Id]) -> Result<TypeRecord> {
        let raw = self.intern(ids);

        let mut inlined = Vec::new();
        let mut has_and = false;
        for &id in ids {
            if !id.has_role(Role::And) {
                continue;
            }
            has_and = true;
            let entity = id.object();
            let record = self
                .types
                .get(&entity)
                .ok_or(WorldError::MissingTypeRecord { entity })?;
            inlined.extend_from_slice(self.tables.get(record.normalized).ids());
        }

        if !has_and {
            return Ok(TypeRecord {
                raw,
                normalized: raw,
            });
        }

        let base: Vec<Id> = self
            .tables
            .get(raw)
            .ids()
            .iter()
            .copied()
            .filter(|id| !id.has_role(Role::And))
            .collect();
        let base = self.intern(&base);
        let normalized = self.traverse(base, &inlined);
        tracing::trace!(%raw, %normalized, inlined = inlined.len(), "normalized type");
        Ok(TypeRecord { raw, normalized })
    }

    /// Resolve an optional expression into a type. No expression is the empty type.
    pub(crate) fn type_from_expr(
        &mut self,
        name: Option<&str>,
        expr: Option<&str>,
    ) -> Result<TypeRecord> {
        match expr {
            None => Ok(TypeRecord::EMPTY),
            Some(expr) => {
                let ids = self.ids_from_expr(name, expr)?;
                self.type_from_ids(&ids)
            }
        }
    }

    /// Normalized table of an anonymous type expression.
    pub fn type_from_str(&mut self, expr: &str) -> Result<TableId> {
        Ok(self.type_from_expr(None, Some(expr))?.normalized)
    }

    /// Table holding the ids of `expr` exactly as written.
    pub fn table_from_str(&mut self, expr: &str) -> Result<TableId> {
        let ids = self.ids_from_expr(None, expr)?;
        Ok(self.intern(&ids))
    }

    /// Table for an arbitrary id list. Order and duplicates do not matter.
    pub fn table_from_ids(&mut self, ids: &[Id]) -> TableId {
        self.intern(ids)
    }

    pub fn type_record(&self, entity: Entity) -> Option<TypeRecord> {
        self.types.get(&entity).copied()
    }

    /// Type entity registered for a raw table.
    pub fn type_entity(&self, table: TableId) -> Option<Entity> {
        self.type_handles.get(&table).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::EntityDesc;

    fn tags(world: &mut World, names: &[&str]) -> Vec<Entity> {
        names
            .iter()
            .map(|name| world.new_entity(&EntityDesc::named(*name)).unwrap())
            .collect()
    }

    #[test]
    fn test_plain_type_is_its_own_normal_form() {
        let mut world = World::new();
        tags(&mut world, &["A", "B"]);
        let record = world.type_from_expr(None, Some("B, A")).unwrap();
        assert_eq!(record.raw, record.normalized);
        assert_eq!(world.table(record.raw).len(), 2);
    }

    #[test]
    fn test_missing_expression_is_empty_type() {
        let mut world = World::new();
        assert_eq!(world.type_from_expr(None, None).unwrap(), TypeRecord::EMPTY);
        assert_eq!(world.type_from_str("").unwrap(), TableId::ROOT);
    }

    #[test]
    fn test_and_members_are_inlined() {
        let mut world = World::new();
        let e = tags(&mut world, &["X", "Y", "Z"]);
        let c = world.new_type(&EntityDesc::named("C").with_expr("X, Y")).unwrap();

        let record = world.type_from_expr(None, Some("Z, AND|C")).unwrap();
        assert!(world.table(record.raw).contains(Id::with_role(Role::And, c)));
        assert!(!world.table(record.normalized).contains(Id::with_role(Role::And, c)));
        let expected = world.table_from_ids(&[e[2].to_id(), e[0].to_id(), e[1].to_id()]);
        assert_eq!(record.normalized, expected);
    }

    #[test]
    fn test_and_without_type_record_is_reported() {
        let mut world = World::new();
        let plain = tags(&mut world, &["Plain"])[0];
        let err = world.type_from_expr(None, Some("AND|Plain")).unwrap_err();
        assert!(matches!(err, WorldError::MissingTypeRecord { entity } if entity == plain));
    }

    #[test]
    fn test_raw_table_keeps_written_ids() {
        let mut world = World::new();
        tags(&mut world, &["A", "B"]);
        let raw = world.table_from_str("A, B, A").unwrap();
        assert_eq!(world.table(raw).len(), 2);
        assert_eq!(world.table_from_str("B, A").unwrap(), raw);
    }
}
