//! Tessera Runtime
//!
//! Minimal binary that boots a world and registers a small composition

use anyhow::{Context, Result};
use tessera_core::ecs::{ComponentDesc, EntityDesc, World};
use tessera_core::{define_component, WorldConfig};

#[derive(Clone, Copy)]
#[allow(dead_code)]
struct Position {
    x: f32,
    y: f32,
}
define_component!(Position, "EcsPosition");

#[derive(Clone, Copy)]
#[allow(dead_code)]
struct Velocity {
    x: f32,
    y: f32,
}
define_component!(Velocity, "EcsVelocity");

fn load_config() -> Result<WorldConfig> {
    match std::env::var("TESSERA_CONFIG") {
        Ok(text) => WorldConfig::from_json_str(&text).context("TESSERA_CONFIG is not valid"),
        Err(_) => Ok(WorldConfig::default().with_name_prefix("Ecs")),
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    tracing::info!("Tessera v{}", tessera_core::VERSION);
    let config = load_config()?;
    tracing::info!(?config, "Creating world...");
    let mut world = World::with_config(config);

    let position = world.register::<Position>()?;
    let velocity = world.register::<Velocity>()?;
    let mass = world.new_component(&ComponentDesc::new("Mass", 4, 4))?;

    // Display names depend on the configured prefix.
    let members = [position, velocity]
        .map(|e| world.name(e).unwrap_or_default().to_string())
        .join(", ");
    let movable = world.new_type(&EntityDesc::named("Movable").with_expr(members))?;
    let ship = world.new_prefab(&EntityDesc::named("Ship").with_expr("AND(Movable), Mass"))?;
    let e1 = world.new_entity(&EntityDesc::named("e1").with_expr("AND(Movable)"))?;

    for (label, entity) in [
        ("Position", position),
        ("Velocity", velocity),
        ("Mass", mass),
        ("Movable", movable),
        ("Ship", ship),
        ("e1", e1),
    ] {
        let table = world
            .composition(entity)
            .with_context(|| format!("{} has no composition", label))?;
        tracing::info!(entity = %entity, "{} = [{}]", label, world.table_str(table));
    }

    let stats = world.stats();
    tracing::info!(
        entities = stats.entity_count,
        tables = stats.table_count,
        types = stats.type_count,
        components = stats.component_count,
        "World ready"
    );
    tracing::debug!(total = world.counters().total(), "counters: {}", world.counters());

    Ok(())
}
