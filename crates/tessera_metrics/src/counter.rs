//! Registration counters keyed by event name

use std::collections::BTreeMap;
use std::fmt;

/// Tally of registry events such as `tables_created` or `commands_deferred`.
///
/// Event names are static so a world can bump them on hot paths without
/// allocating. Iteration and display are sorted by name.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Counter {
    counts: BTreeMap<&'static str, usize>,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, event: &'static str, by: usize) {
        *self.counts.entry(event).or_insert(0) += by;
    }

    pub fn get(&self, event: &str) -> usize {
        self.counts.get(event).copied().unwrap_or(0)
    }

    /// Sum over every event.
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn reset_all(&mut self) {
        self.counts.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, usize)> + '_ {
        self.counts.iter().map(|(&event, &count)| (event, count))
    }
}

impl fmt::Display for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (event, count) in self.iter() {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", event, count)?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_accumulates() {
        let mut counter = Counter::new();
        counter.increment("types_registered", 1);
        counter.increment("types_registered", 2);
        assert_eq!(counter.get("types_registered"), 3);
        assert_eq!(counter.get("missing"), 0);

        counter.reset_all();
        assert_eq!(counter.get("types_registered"), 0);
        assert_eq!(counter.total(), 0);
    }

    #[test]
    fn test_events_render_sorted() {
        let mut counter = Counter::new();
        counter.increment("tables_created", 4);
        counter.increment("commands_deferred", 1);
        assert_eq!(counter.total(), 5);
        assert_eq!(counter.to_string(), "commands_deferred=1, tables_created=4");
        assert_eq!(
            counter.iter().collect::<Vec<_>>(),
            vec![("commands_deferred", 1), ("tables_created", 4)]
        );
    }
}
