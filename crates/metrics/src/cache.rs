//! Lazily registered gauge handles keyed by their composed name.

use std::collections::{HashMap, hash_map::Entry};

use metrics::Gauge;
use tracing::debug;

use crate::registrar::{GaugeDescriptor, GaugeRegistrar, RegistrationError};

/// Gauges created so far, keyed by fully qualified key.
///
/// Only grows: source metrics are assumed to be a roughly fixed set for the
/// lifetime of the process. Lookups take `&mut self`, so sharing one cache
/// between tasks requires an outer lock.
#[derive(Default)]
pub struct GaugeCache {
    gauges: HashMap<String, Gauge>,
}

impl GaugeCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the gauge stored under `key`, registering
    /// `namespace`/`subsystem`/`name` on a miss.
    ///
    /// A failed registration leaves the cache untouched.
    pub fn get_or_create<R>(
        &mut self,
        registrar: &R,
        key: &str,
        namespace: &str,
        subsystem: &str,
        name: &str,
    ) -> Result<&Gauge, RegistrationError>
    where
        R: GaugeRegistrar + ?Sized,
    {
        match self.gauges.entry(key.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let descriptor = GaugeDescriptor::new(namespace, subsystem, name);
                let gauge = registrar.register(&descriptor)?;
                debug!(%key, gauge = %descriptor.fq_name(), "registered gauge");
                Ok(entry.insert(gauge))
            },
        }
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.gauges.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.gauges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.gauges.is_empty()
    }

    /// Cached keys, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.gauges.keys().map(String::as_str)
    }
}
