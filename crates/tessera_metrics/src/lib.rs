//! Tessera Metrics - named counters for registry bookkeeping
//!
//! Counters track how often the world interns tables, registers types and
//! components, and defers commands. They completely vanish in production
//! builds via the `metrics` feature flag.
//!
//! # Usage
//!
//! ```ignore
//! use tessera_metrics::Counter;
//!
//! let mut counter = Counter::new();
//! counter.increment("tables_created", 1);
//! assert_eq!(counter.get("tables_created"), 1);
//! ```

#[cfg(feature = "metrics")]
mod counter;

#[cfg(feature = "metrics")]
pub use counter::Counter;

/// Execute code only when metrics are enabled
#[macro_export]
macro_rules! metrics {
    ($($tt:tt)*) => {
        #[cfg(feature = "metrics")]
        {
            $($tt)*
        }
    };
}

// ============================================================================
// No-op stub when metrics disabled
// ============================================================================

#[cfg(not(feature = "metrics"))]
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Counter;

#[cfg(not(feature = "metrics"))]
impl Counter {
    pub fn new() -> Self { Self }
    pub fn increment(&mut self, _event: &'static str, _by: usize) {}
    pub fn get(&self, _event: &str) -> usize { 0 }
    pub fn total(&self) -> usize { 0 }
    pub fn reset_all(&mut self) {}
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, usize)> + '_ { std::iter::empty() }
}

#[cfg(not(feature = "metrics"))]
impl std::fmt::Display for Counter {
    fn fmt(&self, _f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { Ok(()) }
}
