//! End-to-end export from a source registry into target registries.

use std::{sync::Arc, time::Duration};

use metrics_bridge::{
    ConflictPolicy, Distribution, ExportError, Exporter, ExporterConfig, MemoryRegistry,
    MetricSummary, Rates, RegistrationError, SourceRegistry,
};

const INTERVAL: Duration = Duration::from_secs(1);

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("metrics_bridge=debug")
        .with_test_writer()
        .try_init();
}

fn populated_source() -> Arc<SourceRegistry> {
    let source = Arc::new(SourceRegistry::new());
    source.update_metric("mycounter", &MetricSummary::Counter { count: 1 });
    source.update_metric("mygauge", &MetricSummary::Gauge { value: 2 });
    source.update_metric("mymeter", &MetricSummary::Meter {
        count: 1,
        rates: Rates {
            mean: 0.25,
            ..Rates::default()
        },
    });
    source.update_metric("myhistogram", &MetricSummary::Histogram(Distribution {
        count: 3,
        min: 1,
        max: 9,
        mean: 4.0,
        ..Distribution::default()
    }));
    source.update_metric("db.health", &MetricSummary::HealthCheck { error: None });
    source
}

#[test]
fn every_sub_value_becomes_a_gauge() -> anyhow::Result<()> {
    init_tracing();
    let source = populated_source();
    let target = Arc::new(MemoryRegistry::new());
    let mut exporter = Exporter::new("ns", "subsys", source, Arc::clone(&target), INTERVAL);

    let stats = exporter.export_once()?;

    // counter 1 + gauge 1 + meter 5 + histogram 10 + health check 1
    assert_eq!(stats.created, 18);
    assert_eq!(target.len(), 18);
    assert_eq!(target.value("ns_subsys_mycounter_count"), Some(1.0));
    assert_eq!(target.value("ns_subsys_mygauge_value"), Some(2.0));
    assert_eq!(target.value("ns_subsys_mymeter_mean_rate"), Some(0.25));
    assert_eq!(target.value("ns_subsys_myhistogram_max"), Some(9.0));
    assert_eq!(target.value("ns_subsys_myhistogram_99_9p"), Some(0.0));
    assert_eq!(target.value("ns_subsys_db_health_error"), Some(0.0));
    Ok(())
}

#[test]
fn export_is_idempotent() -> anyhow::Result<()> {
    let source = populated_source();
    let target = Arc::new(MemoryRegistry::new());
    let mut exporter = Exporter::new("ns", "subsys", source, Arc::clone(&target), INTERVAL);

    exporter.export_once()?;
    let first = target.gather();
    let stats = exporter.export_once()?;

    assert_eq!(stats.created, 0);
    assert_eq!(target.gather(), first);
    Ok(())
}

#[test]
fn second_exporter_on_shared_target_conflicts() -> anyhow::Result<()> {
    let source = populated_source();
    let target = Arc::new(MemoryRegistry::new());
    let mut first = Exporter::new(
        "ns",
        "subsys",
        Arc::clone(&source),
        Arc::clone(&target),
        INTERVAL,
    );
    let mut second = Exporter::new(
        "ns",
        "subsys",
        Arc::clone(&source),
        Arc::clone(&target),
        INTERVAL,
    );

    first.export_once()?;
    match second.export_once() {
        Err(ExportError::Registration { source, .. }) => {
            assert!(matches!(source, RegistrationError::AlreadyRegistered { .. }));
        },
        Ok(stats) => panic!("expected a conflict, got {stats:?}"),
    }

    let config = ExporterConfig {
        namespace: "ns".into(),
        subsystem: "subsys".into(),
        on_conflict: ConflictPolicy::Skip,
        ..ExporterConfig::default()
    };
    let mut lenient = Exporter::from_config(&config, source, Arc::clone(&target));
    let stats = lenient.export_once()?;
    assert_eq!(stats.skipped, 18);
    assert_eq!(stats.updated, 0);
    Ok(())
}

#[cfg(feature = "prometheus")]
#[test]
fn prometheus_target_renders_flattened_gauges() -> anyhow::Result<()> {
    use metrics_bridge::PrometheusRegistrar;

    let source = Arc::new(SourceRegistry::new());
    source.update_metric("mycounter", &MetricSummary::Counter { count: 1 });
    source.update_metric("mytimer", &MetricSummary::Timer {
        distribution: Distribution {
            count: 1,
            max: 5,
            ..Distribution::default()
        },
        rates: Rates::default(),
    });

    let target = Arc::new(PrometheusRegistrar::new());
    let mut exporter = Exporter::new("ns", "subsys", source, Arc::clone(&target), INTERVAL);
    exporter.export_once()?;

    let text = target.render();
    let gauge_lines: Vec<&str> = text
        .lines()
        .filter(|line| line.starts_with("# TYPE ") && line.ends_with(" gauge"))
        .collect();
    assert_eq!(gauge_lines.len(), 15);

    let value_of = |name: &str| -> Option<f64> {
        text.lines()
            .find_map(|line| line.strip_prefix(name)?.strip_prefix(' '))
            .and_then(|v| v.trim().parse().ok())
    };
    assert_eq!(value_of("ns_subsys_mycounter_count"), Some(1.0));
    assert_eq!(value_of("ns_subsys_mytimer_max"), Some(5.0));
    assert_eq!(value_of("ns_subsys_mytimer_99_9p"), Some(0.0));
    Ok(())
}

#[test]
fn config_file_drives_exporter() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("bridge.toml");
    std::fs::write(
        &path,
        "namespace = \"my app\"\nsubsystem = \"jobs\"\nflush_interval_secs = 30\n",
    )?;

    let config = ExporterConfig::load(&path)?;
    let target = MemoryRegistry::new();
    let source = populated_source();
    let mut exporter = Exporter::from_config(&config, source, &target);
    exporter.export_once()?;

    assert_eq!(exporter.flush_interval(), Duration::from_secs(30));
    assert_eq!(target.value("my_app_jobs_mycounter_count"), Some(1.0));
    Ok(())
}
