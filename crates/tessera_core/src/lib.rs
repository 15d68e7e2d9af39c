//! Tessera Core
//!
//! Identity and composition resolution for an entity/component runtime:
//! - Type expressions parsed into ordered id lists
//! - Structurally interned tables (archetypes)
//! - Normalized types that inline the members of referenced types
//! - Create-or-get registration of entities, prefabs, components and types

pub mod config;
pub mod ecs;

pub use config::WorldConfig;

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
