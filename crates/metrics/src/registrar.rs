//! Target side of the bridge: registering flat gauges.
//!
//! A [`GaugeRegistrar`] turns a [`GaugeDescriptor`] into a live
//! [`metrics::Gauge`] handle. Registrars reject names the Prometheus data
//! model does not accept and refuse to hand out the same fully qualified name
//! twice, mirroring how a Prometheus registry reacts to duplicate collectors.

use std::{
    collections::{BTreeMap, HashSet},
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};

use metrics::{Gauge, Key, Level, Metadata, Recorder};
use tracing::debug;

/// Identity of a gauge in the target registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GaugeDescriptor {
    pub namespace: String,
    pub subsystem: String,
    pub name: String,
}

impl GaugeDescriptor {
    pub fn new(
        namespace: impl Into<String>,
        subsystem: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            subsystem: subsystem.into(),
            name: name.into(),
        }
    }

    /// Non-empty parts joined with `_`, or `""` when `name` is empty.
    #[must_use]
    pub fn fq_name(&self) -> String {
        if self.name.is_empty() {
            return String::new();
        }

        [
            self.namespace.as_str(),
            self.subsystem.as_str(),
            self.name.as_str(),
        ]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    #[error("invalid gauge name {name:?}")]
    InvalidName { name: String },
    #[error("gauge {name:?} is already registered")]
    AlreadyRegistered { name: String },
}

/// Whether `name` matches `[a-zA-Z_:][a-zA-Z0-9_:]*`.
#[must_use]
pub fn is_valid_metric_name(name: &str) -> bool {
    let mut bytes = name.bytes();
    match bytes.next() {
        Some(b) if b.is_ascii_alphabetic() || b == b'_' || b == b':' => {},
        _ => return false,
    }
    bytes.all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b':')
}

/// Registration surface of a target metrics system.
pub trait GaugeRegistrar {
    /// Create and register a gauge for `descriptor`.
    fn register(&self, descriptor: &GaugeDescriptor) -> Result<Gauge, RegistrationError>;
}

impl<T: GaugeRegistrar + ?Sized> GaugeRegistrar for &T {
    fn register(&self, descriptor: &GaugeDescriptor) -> Result<Gauge, RegistrationError> {
        (**self).register(descriptor)
    }
}

impl<T: GaugeRegistrar + ?Sized> GaugeRegistrar for Arc<T> {
    fn register(&self, descriptor: &GaugeDescriptor) -> Result<Gauge, RegistrationError> {
        (**self).register(descriptor)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn validated_name(descriptor: &GaugeDescriptor) -> Result<String, RegistrationError> {
    let name = descriptor.fq_name();
    if is_valid_metric_name(&name) {
        Ok(name)
    } else {
        Err(RegistrationError::InvalidName { name })
    }
}

/// In-memory target registry.
///
/// Holds gauge values as `f64` bits in atomics so handles stay cheap to set
/// while [`gather`](Self::gather) reads them from another thread.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    gauges: Mutex<BTreeMap<String, Arc<AtomicU64>>>,
}

impl MemoryRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All registered gauges as `(name, value)`, sorted by name.
    #[must_use]
    pub fn gather(&self) -> Vec<(String, f64)> {
        lock(&self.gauges)
            .iter()
            .map(|(name, cell)| (name.clone(), f64::from_bits(cell.load(Ordering::Relaxed))))
            .collect()
    }

    /// Current value of the gauge called `name`.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<f64> {
        lock(&self.gauges)
            .get(name)
            .map(|cell| f64::from_bits(cell.load(Ordering::Relaxed)))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.gauges).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        lock(&self.gauges).is_empty()
    }
}

impl GaugeRegistrar for MemoryRegistry {
    fn register(&self, descriptor: &GaugeDescriptor) -> Result<Gauge, RegistrationError> {
        let name = validated_name(descriptor)?;
        let mut gauges = lock(&self.gauges);
        if gauges.contains_key(&name) {
            return Err(RegistrationError::AlreadyRegistered { name });
        }

        let cell = Arc::new(AtomicU64::new(0.0_f64.to_bits()));
        gauges.insert(name, Arc::clone(&cell));
        Ok(Gauge::from_arc(cell))
    }
}

/// Registers gauges on any [`metrics::Recorder`].
///
/// Recorders happily return the same handle for a repeated key, so this
/// adapter tracks the names it has handed out to keep duplicate registrations
/// an error.
pub struct RecorderRegistrar<R> {
    recorder: R,
    claimed: Mutex<HashSet<String>>,
}

impl<R: Recorder> RecorderRegistrar<R> {
    pub fn new(recorder: R) -> Self {
        Self {
            recorder,
            claimed: Mutex::new(HashSet::new()),
        }
    }
}

impl<R: Recorder> GaugeRegistrar for RecorderRegistrar<R> {
    fn register(&self, descriptor: &GaugeDescriptor) -> Result<Gauge, RegistrationError> {
        let name = validated_name(descriptor)?;
        if !lock(&self.claimed).insert(name.clone()) {
            return Err(RegistrationError::AlreadyRegistered { name });
        }

        debug!(gauge = %name, "registering gauge on recorder");
        let metadata = Metadata::new(module_path!(), Level::INFO, Some(module_path!()));
        Ok(self.recorder.register_gauge(&Key::from_name(name), &metadata))
    }
}

#[cfg(feature = "prometheus")]
pub use prometheus::PrometheusRegistrar;

#[cfg(feature = "prometheus")]
mod prometheus {
    use metrics::Gauge;
    use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle, PrometheusRecorder};

    use super::{GaugeDescriptor, GaugeRegistrar, RecorderRegistrar, RegistrationError};

    /// Registrar backed by a local Prometheus recorder.
    ///
    /// The recorder is not installed globally; scrape it through
    /// [`render`](Self::render) or a cloned [`handle`](Self::handle).
    pub struct PrometheusRegistrar {
        inner: RecorderRegistrar<PrometheusRecorder>,
        handle: PrometheusHandle,
    }

    impl PrometheusRegistrar {
        #[must_use]
        pub fn new() -> Self {
            Self::from_builder(PrometheusBuilder::new())
        }

        #[must_use]
        pub fn from_builder(builder: PrometheusBuilder) -> Self {
            let recorder = builder.build_recorder();
            let handle = recorder.handle();
            Self {
                inner: RecorderRegistrar::new(recorder),
                handle,
            }
        }

        #[must_use]
        pub fn handle(&self) -> PrometheusHandle {
            self.handle.clone()
        }

        /// Prometheus text exposition of every registered gauge.
        #[must_use]
        pub fn render(&self) -> String {
            self.handle.render()
        }
    }

    impl Default for PrometheusRegistrar {
        fn default() -> Self {
            Self::new()
        }
    }

    impl GaugeRegistrar for PrometheusRegistrar {
        fn register(&self, descriptor: &GaugeDescriptor) -> Result<Gauge, RegistrationError> {
            self.inner.register(descriptor)
        }
    }
}
