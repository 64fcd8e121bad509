//! Sub-value name definitions.
//!
//! Composite source metrics flatten into several named scalars. This module
//! defines the names each metric kind reports, matching the naming used by
//! `go-metrics` style registries so that existing dashboards keep working
//! after the bridge sanitizes them (`1m.rate` → `1m_rate`, `99.9%` → `99_9p`).

/// Shared by counters, meters, histograms and timers
pub const COUNT: &str = "count";

/// Point-in-time gauge reading
pub const VALUE: &str = "value";

/// Health check result (empty text when healthy)
pub const ERROR: &str = "error";

/// Exponentially weighted rates reported by meters and timers
pub mod rates {
    /// One-minute moving average rate
    pub const RATE_1M: &str = "1m.rate";
    /// Five-minute moving average rate
    pub const RATE_5M: &str = "5m.rate";
    /// Fifteen-minute moving average rate
    pub const RATE_15M: &str = "15m.rate";
    /// Mean rate since the metric was created
    pub const MEAN_RATE: &str = "mean.rate";
}

/// Distribution statistics reported by histograms and timers
pub mod distribution {
    pub const MIN: &str = "min";
    pub const MAX: &str = "max";
    pub const MEAN: &str = "mean";
    pub const STDDEV: &str = "stddev";
    pub const MEDIAN: &str = "median";
    pub const P75: &str = "75%";
    pub const P95: &str = "95%";
    pub const P99: &str = "99%";
    pub const P999: &str = "99.9%";
}
