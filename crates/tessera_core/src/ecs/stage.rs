// stage.rs - Deferred mutation while the world is readonly
//
// While the world is readonly, mutations are queued as commands on a stage
// and applied when the readonly phase ends. Registration calls temporarily
// lift the readonly flag so they take effect immediately, which is only
// allowed while a single stage is active.

use crate::ecs::{Entity, Id, Result, World, WorldError};
use std::ops::{Deref, DerefMut};

/// Mutation queued on a stage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Add { entity: Entity, id: Id },
    Remove { entity: Entity, id: Id },
    Clear { entity: Entity },
    SetSymbol { entity: Entity, symbol: String },
    Modified { entity: Entity, id: Id },
}

/// Queue of commands recorded by one execution context.
#[derive(Debug, Default)]
pub struct Stage {
    id: usize,
    commands: Vec<Command>,
}

impl Stage {
    pub(crate) fn new(id: usize) -> Self {
        Self {
            id,
            commands: Vec::new(),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn add(&mut self, entity: Entity, id: Id) {
        self.commands.push(Command::Add { entity, id });
    }

    pub fn remove(&mut self, entity: Entity, id: Id) {
        self.commands.push(Command::Remove { entity, id });
    }

    pub fn clear(&mut self, entity: Entity) {
        self.commands.push(Command::Clear { entity });
    }

    pub fn set_symbol(&mut self, entity: Entity, symbol: impl Into<String>) {
        self.commands.push(Command::SetSymbol {
            entity,
            symbol: symbol.into(),
        });
    }

    pub fn modified(&mut self, entity: Entity, id: Id) {
        self.commands.push(Command::Modified { entity, id });
    }

    /// Commands queued so far, in recording order.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl World {
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Replace the stages with `count` empty ones (at least one).
    pub fn set_stage_count(&mut self, count: usize) -> Result<()> {
        if self.readonly {
            return Err(WorldError::InvalidWhileReadonly);
        }
        let pending: usize = self.stages.iter().map(Stage::len).sum();
        if pending > 0 {
            tracing::warn!(pending, "discarding unmerged commands");
        }
        self.stages = (0..count.max(1)).map(Stage::new).collect();
        tracing::debug!(stages = self.stages.len(), "stage count changed");
        Ok(())
    }

    pub fn stage(&self, index: usize) -> Option<&Stage> {
        self.stages.get(index)
    }

    pub fn stage_mut(&mut self, index: usize) -> Option<&mut Stage> {
        self.stages.get_mut(index)
    }

    pub fn is_readonly(&self) -> bool {
        self.readonly
    }

    /// Whether mutations made through the world are queued instead of applied.
    pub fn is_deferred(&self) -> bool {
        self.readonly
    }

    /// Enter the readonly phase. Returns whether the world already was readonly.
    pub fn readonly_begin(&mut self) -> bool {
        let was_readonly = self.readonly;
        self.readonly = true;
        tracing::debug!(stages = self.stages.len(), "readonly begin");
        was_readonly
    }

    /// Leave the readonly phase and merge every stage.
    pub fn readonly_end(&mut self) -> Result<()> {
        self.readonly = false;
        tracing::debug!("readonly end");
        self.merge()
    }

    /// Apply queued commands stage by stage.
    ///
    /// Every command is applied even when an earlier one fails; the first
    /// failure is returned.
    pub fn merge(&mut self) -> Result<()> {
        if self.readonly {
            return Err(WorldError::InvalidWhileReadonly);
        }
        let mut first_error = None;
        for index in 0..self.stages.len() {
            let commands = std::mem::take(&mut self.stages[index].commands);
            if !commands.is_empty() {
                tracing::debug!(stage = index, commands = commands.len(), "merging stage");
            }
            for command in commands {
                if let Err(err) = self.apply(command) {
                    tracing::error!(stage = index, error = %err, "deferred command failed");
                    first_error.get_or_insert(err);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn apply(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Add { entity, id } => self.apply_add(entity, id),
            Command::Remove { entity, id } => self.apply_remove(entity, id),
            Command::Clear { entity } => self.apply_clear(entity),
            Command::SetSymbol { entity, symbol } => return self.apply_symbol(entity, &symbol),
            Command::Modified { entity, id } => self.notify_modified(entity, id),
        }
        Ok(())
    }

    /// Queue `command` on the main stage if the world is readonly.
    pub(crate) fn defer(&mut self, command: Command) -> bool {
        if !self.readonly {
            return false;
        }
        tracing::trace!(?command, "deferred");
        self.stages[0].commands.push(command);
        tessera_metrics::metrics! {
            self.counter.increment("commands_deferred", 1);
        }
        true
    }

    /// Suspend the readonly phase until the returned guard is dropped.
    pub(crate) fn immediate(&mut self) -> Result<Immediate<'_>> {
        let was_readonly = self.readonly;
        if was_readonly {
            if self.stages.len() > 1 {
                return Err(WorldError::InvalidWhileStaged {
                    stage_count: self.stages.len(),
                });
            }
            self.readonly = false;
        }
        Ok(Immediate {
            world: self,
            was_readonly,
        })
    }
}

/// World access with mutations applied immediately.
pub(crate) struct Immediate<'w> {
    world: &'w mut World,
    was_readonly: bool,
}

impl Deref for Immediate<'_> {
    type Target = World;

    fn deref(&self) -> &World {
        &*self.world
    }
}

impl DerefMut for Immediate<'_> {
    fn deref_mut(&mut self) -> &mut World {
        &mut *self.world
    }
}

impl Drop for Immediate<'_> {
    fn drop(&mut self) {
        self.world.readonly = self.was_readonly;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::builtin::PREFAB;
    use crate::ecs::EntityDesc;

    #[test]
    fn test_mutations_are_queued_while_readonly() {
        let mut world = World::new();
        let e = world.new_id();

        assert!(!world.readonly_begin());
        world.add_id(e, PREFAB.to_id());
        assert!(!world.has_id(e, PREFAB.to_id()));
        assert_eq!(world.stage(0).map(Stage::len), Some(1));

        world.readonly_end().unwrap();
        assert!(world.has_id(e, PREFAB.to_id()));
        assert!(world.stage(0).is_some_and(Stage::is_empty));
    }

    #[test]
    fn test_registration_applies_immediately_with_one_stage() {
        let mut world = World::new();
        world.readonly_begin();
        let e = world.new_entity(&EntityDesc::named("Now")).unwrap();
        assert_eq!(world.lookup("Now"), Some(e));
        assert!(world.is_readonly());
        world.readonly_end().unwrap();
    }

    #[test]
    fn test_registration_refused_with_several_stages() {
        let mut world = World::new();
        world.set_stage_count(2).unwrap();
        world.readonly_begin();
        let err = world.new_entity(&EntityDesc::named("Later")).unwrap_err();
        assert!(matches!(err, WorldError::InvalidWhileStaged { stage_count: 2 }));
        assert!(world.is_readonly());
    }

    #[test]
    fn test_stage_count_is_fixed_while_readonly() {
        let mut world = World::new();
        world.readonly_begin();
        assert!(matches!(
            world.set_stage_count(4),
            Err(WorldError::InvalidWhileReadonly)
        ));
        world.readonly_end().unwrap();
        world.set_stage_count(0).unwrap();
        assert_eq!(world.stage_count(), 1);
    }

    #[test]
    fn test_commands_recorded_on_worker_stages_are_merged() {
        let mut world = World::new();
        world.set_stage_count(2).unwrap();
        let e = world.new_id();

        world.readonly_begin();
        if let Some(stage) = world.stage_mut(1) {
            stage.set_symbol(e, "FromWorker");
            stage.add(e, PREFAB.to_id());
        }
        world.readonly_end().unwrap();

        assert_eq!(world.lookup("FromWorker"), Some(e));
        assert!(world.has_id(e, PREFAB.to_id()));
    }

    #[test]
    fn test_merge_reports_first_failure() {
        let mut world = World::new();
        let a = world.new_id();
        let b = world.new_id();
        world.set_symbol(a, "Taken").unwrap();

        world.readonly_begin();
        world.set_symbol(b, "Taken").unwrap();
        world.add_id(b, PREFAB.to_id());
        let err = world.readonly_end().unwrap_err();

        assert!(matches!(err, WorldError::NameInUse { .. }));
        assert!(world.has_id(b, PREFAB.to_id()));
    }
}
