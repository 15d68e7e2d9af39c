//! Identity and composition core.
//!
//! Entities are plain ids. Their composition is a [`Table`], a structurally
//! interned set of [`Id`]s. Type expressions such as `"Position, AND|Movable"`
//! are parsed, validated against the world and resolved into tables. Types
//! referenced with the `AND` role are inlined when a type is normalized.
//!
//! Registration of entities, prefabs, components and types is create-or-get:
//! registering the same name twice yields the same entity, and conflicting
//! definitions are reported as errors.

pub mod builtin;
mod component;
mod descriptor;
mod error;
mod id;
mod lookup;
mod normalize;
pub mod parser;
mod registrar;
mod stage;
mod symbol;
mod table;
mod term;
mod world;

pub use component::{Component, ComponentMeta};
pub use descriptor::{ComponentDesc, EntityDesc};
pub use error::{ParseError, Result, WorldError};
pub use id::{Entity, Id, Role};
pub use normalize::TypeRecord;
pub use stage::{Command, Stage};
pub use symbol::{name_from_symbol, NameRecord};
pub use table::{Table, TableId};
pub use world::{World, WorldStats};
