//! Periodic export of source snapshots into flat target gauges.

use std::{collections::HashSet, time::Duration};

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::{
    cache::GaugeCache,
    config::{ConflictPolicy, ExporterConfig},
    naming::{compose_key, compose_name, sanitize},
    registrar::{GaugeRegistrar, RegistrationError},
    source::SnapshotSource,
};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("cannot export {metric}/{sub_value}: {source}")]
    Registration {
        metric: String,
        sub_value: String,
        #[source]
        source: RegistrationError,
    },
}

/// Outcome of one [`Exporter::export_once`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExportStats {
    /// Gauges whose value was set, including newly created ones.
    pub updated: usize,
    /// Gauges registered during this pass.
    pub created: usize,
    /// Sub-values dropped because the target rejected their gauge.
    pub skipped: usize,
}

/// Copies every sub-value of a [`SnapshotSource`] into a gauge of a
/// [`GaugeRegistrar`], named `<namespace>_<subsystem>_<metric>_<sub_value>`.
pub struct Exporter<S, R> {
    namespace: String,
    subsystem: String,
    source: S,
    registrar: R,
    flush_interval: Duration,
    gauges: GaugeCache,
    on_conflict: ConflictPolicy,
    rejected: HashSet<String>,
}

impl<S, R> Exporter<S, R>
where
    S: SnapshotSource,
    R: GaugeRegistrar,
{
    pub fn new(
        namespace: &str,
        subsystem: &str,
        source: S,
        registrar: R,
        flush_interval: Duration,
    ) -> Self {
        Self {
            namespace: sanitize(namespace),
            subsystem: sanitize(subsystem),
            source,
            registrar,
            flush_interval,
            gauges: GaugeCache::new(),
            on_conflict: ConflictPolicy::Fail,
            rejected: HashSet::new(),
        }
    }

    pub fn from_config(config: &ExporterConfig, source: S, registrar: R) -> Self {
        Self::new(
            &config.namespace,
            &config.subsystem,
            source,
            registrar,
            config.flush_interval(),
        )
        .with_conflict_policy(config.on_conflict)
    }

    #[must_use]
    pub fn with_conflict_policy(mut self, policy: ConflictPolicy) -> Self {
        self.on_conflict = policy;
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn subsystem(&self) -> &str {
        &self.subsystem
    }

    pub fn flush_interval(&self) -> Duration {
        self.flush_interval
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn registrar(&self) -> &R {
        &self.registrar
    }

    /// Number of gauges registered so far.
    pub fn gauge_count(&self) -> usize {
        self.gauges.len()
    }

    /// Pull one snapshot and push every sub-value into its gauge.
    ///
    /// Metrics and sub-values are visited in lexicographic order. Gauges are
    /// registered on first sight; a rejected registration aborts the pass
    /// under [`ConflictPolicy::Fail`] (gauges already set in this pass keep
    /// their new values).
    pub fn export_once(&mut self) -> Result<ExportStats, ExportError> {
        let snapshot = self.source.snapshot();
        let mut stats = ExportStats::default();

        for (metric, values) in &snapshot {
            for (sub_value, raw) in values {
                let key = compose_key(&self.namespace, &self.subsystem, metric, sub_value);
                if self.rejected.contains(&key) {
                    stats.skipped += 1;
                    continue;
                }

                let known = self.gauges.contains(&key);
                let name = compose_name(metric, sub_value);
                match self.gauges.get_or_create(
                    &self.registrar,
                    &key,
                    &self.namespace,
                    &self.subsystem,
                    &name,
                ) {
                    Ok(gauge) => {
                        gauge.set(raw.as_f64());
                        stats.updated += 1;
                        if !known {
                            stats.created += 1;
                        }
                    },
                    Err(source) => match self.on_conflict {
                        ConflictPolicy::Fail => {
                            return Err(ExportError::Registration {
                                metric: metric.clone(),
                                sub_value: sub_value.clone(),
                                source,
                            });
                        },
                        ConflictPolicy::Skip => {
                            warn!(
                                %metric,
                                %sub_value,
                                error = %source,
                                "skipping gauge rejected by target registry"
                            );
                            self.rejected.insert(key);
                            stats.skipped += 1;
                        },
                    },
                }
            }
        }

        debug!(
            metrics = snapshot.len(),
            updated = stats.updated,
            created = stats.created,
            skipped = stats.skipped,
            "metrics exported"
        );
        Ok(stats)
    }

    fn log_started(&self) {
        info!(
            namespace = %self.namespace,
            subsystem = %self.subsystem,
            interval = ?self.flush_interval,
            "metrics exporter started"
        );
    }

    /// Export every `flush_interval`, forever.
    ///
    /// Each pass finishes before the next sleep starts. Only returns when a
    /// registration failure aborts an export.
    pub async fn run(&mut self) -> Result<(), ExportError> {
        self.log_started();

        loop {
            tokio::time::sleep(self.flush_interval).await;
            if let Err(e) = self.export_once() {
                error!(error = %e, "metrics exporter stopped");
                return Err(e);
            }
        }
    }

    /// Like [`run`](Self::run), but stops when `shutdown` changes or its
    /// sender is dropped, after one last export.
    pub async fn run_until(
        &mut self,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), ExportError> {
        self.log_started();

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.flush_interval) => {
                    if let Err(e) = self.export_once() {
                        error!(error = %e, "metrics exporter stopped");
                        return Err(e);
                    }
                }
                _ = shutdown.changed() => {
                    info!("metrics exporter shutting down");
                    // Final export so the target sees the last values.
                    self.export_once()?;
                    return Ok(());
                }
            }
        }
    }
}
