//! Bridge between an in-process metrics registry and a flat gauge registry.
//!
//! On every tick the [`Exporter`] pulls a [`Snapshot`] (metric name →
//! sub-value name → raw value) from a [`SnapshotSource`], flattens each
//! sub-value into a sanitized gauge name and sets it on a gauge registered
//! lazily through a [`GaugeRegistrar`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::{sync::Arc, time::Duration};
//!
//! use metrics_bridge::{Exporter, MetricSummary, PrometheusRegistrar, SourceRegistry};
//!
//! let source = Arc::new(SourceRegistry::new());
//! source.update_metric("requests", &MetricSummary::Counter { count: 42 });
//!
//! let target = Arc::new(PrometheusRegistrar::new());
//! let interval = Duration::from_secs(10);
//! let mut exporter = Exporter::new("myapp", "http", source, Arc::clone(&target), interval);
//! exporter.export_once()?;
//!
//! // myapp_http_requests_count 42
//! println!("{}", target.render());
//! ```
//!
//! # Features
//!
//! - `prometheus` (default): [`PrometheusRegistrar`], a target backed by
//!   `metrics-exporter-prometheus`

pub mod cache;
pub mod config;
pub mod definitions;
pub mod exporter;
pub mod naming;
pub mod registrar;
pub mod source;
pub mod value;

#[cfg(feature = "prometheus")]
pub use registrar::PrometheusRegistrar;
pub use {
    cache::GaugeCache,
    config::{ConfigError, ConflictPolicy, ExporterConfig},
    exporter::{ExportError, ExportStats, Exporter},
    naming::{compose_key, compose_name, sanitize},
    registrar::{
        GaugeDescriptor, GaugeRegistrar, MemoryRegistry, RecorderRegistrar, RegistrationError,
    },
    source::{
        Distribution, MetricSummary, MetricValues, Rates, Snapshot, SnapshotSource,
        SourceRegistry,
    },
    value::RawValue,
};

// Gauge handles handed out by registrars
pub use metrics::Gauge;
