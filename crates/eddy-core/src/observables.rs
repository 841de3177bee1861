//! Named scalar diagnostics reported by solvers after a step.

use indexmap::IndexMap;

/// Ordered map of named scalar diagnostics (total mass, kinetic energy,
/// pressure-solve iterations, ...).
///
/// Insertion order is preserved so that drivers can print or log the
/// observables of a solver in a stable order across steps.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Observables {
    values: IndexMap<&'static str, f64>,
}

impl Observables {
    /// Create an empty set of observables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record (or overwrite) a named value.
    pub fn record(&mut self, name: &'static str, value: f64) {
        self.values.insert(name, value);
    }

    /// Look up a value by name.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// Number of recorded values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Remove every value, keeping the allocation.
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Iterate over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        self.values.iter().map(|(k, v)| (*k, *v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_insertion_order_and_overwrites() {
        let mut obs = Observables::new();
        obs.record("total_mass", 1024.0);
        obs.record("kinetic_energy", 0.5);
        obs.record("total_mass", 1023.5);

        let names: Vec<_> = obs.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["total_mass", "kinetic_energy"]);
        assert_eq!(obs.get("total_mass"), Some(1023.5));
        assert_eq!(obs.len(), 2);

        obs.clear();
        assert!(obs.is_empty());
        assert_eq!(obs.get("total_mass"), None);
    }
}
