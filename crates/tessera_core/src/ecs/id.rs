//! Entity handles and role-tagged ids
//!
//! An [`Id`] is what gets stored in a table: a plain entity, an entity tagged
//! with a [`Role`], or a relation pair.
//!
//! Format: [8-bit role | 24-bit relation | 32-bit entity/object]
//! - Role: zero for plain entities
//! - Relation: only used by pairs
//! - Entity: the entity, or the pair object

use std::fmt;

pub(crate) const ROLE_SHIFT: u32 = 56;
pub(crate) const ROLE_MASK: u64 = 0xFF << ROLE_SHIFT;
pub(crate) const RELATION_MASK: u64 = 0x00FF_FFFF << 32;
pub(crate) const ENTITY_MASK: u64 = 0xFFFF_FFFF;

/// Entity handle (opaque ID)
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity(u64);

impl Entity {
    pub const fn from_raw(id: u64) -> Self {
        Self(id & ENTITY_MASK)
    }

    pub const fn id(self) -> u64 {
        self.0
    }

    /// The entity as an id without any role.
    pub const fn to_id(self) -> Id {
        Id(self.0)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Tag combined with an id that changes its meaning inside a type.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Role {
    /// Relational id referencing an object entity.
    Pair = 0x80,
    /// Include the members of the referenced type.
    And = 0x81,
    Or = 0x82,
    Xor = 0x83,
    Not = 0x84,
    Switch = 0x85,
    Case = 0x86,
    Owned = 0x87,
    Disabled = 0x88,
}

impl Role {
    const ALL: [Role; 9] = [
        Role::Pair,
        Role::And,
        Role::Or,
        Role::Xor,
        Role::Not,
        Role::Switch,
        Role::Case,
        Role::Owned,
        Role::Disabled,
    ];

    fn from_bits(bits: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|role| *role as u8 == bits)
    }

    /// Keyword used for the role in type expressions.
    pub fn keyword(self) -> &'static str {
        match self {
            Role::Pair => "PAIR",
            Role::And => "AND",
            Role::Or => "OR",
            Role::Xor => "XOR",
            Role::Not => "NOT",
            Role::Switch => "SWITCH",
            Role::Case => "CASE",
            Role::Owned => "OWNED",
            Role::Disabled => "DISABLED",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.keyword() == keyword)
    }
}

/// Id stored in a table. Ordering is the raw integer ordering, which places
/// plain entities before role-tagged ids.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id(u64);

impl Id {
    pub const fn from_raw(bits: u64) -> Self {
        Self(bits)
    }

    pub const fn to_bits(self) -> u64 {
        self.0
    }

    /// Combine an entity with a role.
    pub const fn with_role(role: Role, entity: Entity) -> Self {
        Self(((role as u64) << ROLE_SHIFT) | entity.0)
    }

    /// Relation pair `(relation, object)`.
    pub const fn pair(relation: Entity, object: Entity) -> Self {
        Self(
            ((Role::Pair as u64) << ROLE_SHIFT)
                | ((relation.0 << 32) & RELATION_MASK)
                | object.0,
        )
    }

    pub fn role(self) -> Option<Role> {
        Role::from_bits(((self.0 & ROLE_MASK) >> ROLE_SHIFT) as u8)
    }

    #[inline]
    pub fn has_role(self, role: Role) -> bool {
        self.role() == Some(role)
    }

    pub fn is_pair(self) -> bool {
        self.has_role(Role::Pair)
    }

    /// Entity part of the id: the object for pairs, the tagged entity otherwise.
    #[inline]
    pub const fn object(self) -> Entity {
        Entity(self.0 & ENTITY_MASK)
    }

    /// Relation of a pair.
    pub fn relation(self) -> Option<Entity> {
        self.is_pair()
            .then(|| Entity((self.0 & RELATION_MASK) >> 32))
    }

    /// The id as a plain entity, if it carries no role.
    pub fn entity(self) -> Option<Entity> {
        (self.0 & !ENTITY_MASK == 0).then_some(Entity(self.0))
    }
}

impl From<Entity> for Id {
    fn from(entity: Entity) -> Self {
        entity.to_id()
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.role(), self.relation()) {
            (Some(Role::Pair), Some(relation)) => write!(f, "({}, {})", relation, self.object()),
            (Some(role), _) => write!(f, "{}|{}", role.keyword(), self.object()),
            (None, _) => write!(f, "{}", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_survives_encoding() {
        let base = Entity::from_raw(300);
        let id = Id::with_role(Role::And, base);
        assert_eq!(id.role(), Some(Role::And));
        assert_eq!(id.object(), base);
        assert_eq!(id.entity(), None);
        assert_eq!(base.to_id().entity(), Some(base));
    }

    #[test]
    fn test_pair_keeps_relation_and_object() {
        let rel = Entity::from_raw(5);
        let obj = Entity::from_raw(1024);
        let pair = Id::pair(rel, obj);
        assert!(pair.is_pair());
        assert_eq!(pair.relation(), Some(rel));
        assert_eq!(pair.object(), obj);
        assert_eq!(pair.to_string(), "(5, 1024)");
    }

    #[test]
    fn test_plain_ids_sort_before_tagged_ids() {
        let plain = Entity::from_raw(ENTITY_MASK).to_id();
        let tagged = Id::with_role(Role::And, Entity::from_raw(1));
        assert!(plain < tagged);
    }

    #[test]
    fn test_role_keywords() {
        assert_eq!(Role::from_keyword("AND"), Some(Role::And));
        assert_eq!(Role::from_keyword("and"), None);
        assert_eq!(Role::Pair.keyword(), "PAIR");
    }
}
