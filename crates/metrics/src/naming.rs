//! Gauge name sanitization and composition.
//!
//! Source registries use free-form names (`http.requests`, `db/latency`,
//! `99.9%`). Prometheus-style targets only accept `[a-zA-Z_:][a-zA-Z0-9_:]*`,
//! so every name passes through [`sanitize`] before it reaches a registrar.

/// Name used when the raw input is empty.
pub const UNNAMED: &str = "unnamed";

/// Replace every byte that is not safe in a gauge name.
///
/// `%` becomes `p` (so `95%` reads as `95p`), every other byte outside
/// `A-Z`, `a-z` and `0-9` becomes `_`. Works on bytes, not chars: a
/// multi-byte UTF-8 sequence turns into one `_` per byte.
#[must_use]
pub fn sanitize(raw: &str) -> String {
    if raw.is_empty() {
        return UNNAMED.to_string();
    }

    raw.bytes()
        .map(|b| match b {
            b'%' => 'p',
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' => char::from(b),
            _ => '_',
        })
        .collect()
}

/// Flatten a metric and one of its sub-values into a single gauge name.
///
/// Trailing underscores are stripped, leading ones are kept.
#[must_use]
pub fn compose_name(metric: &str, sub_value: &str) -> String {
    let mut name = sanitize(&format!("{metric}_{sub_value}"));
    let kept = name.trim_end_matches('_').len();
    name.truncate(kept);
    name
}

/// Fully qualified cache key for a flattened gauge.
///
/// `namespace` and `subsystem` must already be sanitized.
#[must_use]
pub fn compose_key(namespace: &str, subsystem: &str, metric: &str, sub_value: &str) -> String {
    format!("{namespace}_{subsystem}_{}", compose_name(metric, sub_value))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("", "unnamed")]
    #[case("_", "_")]
    #[case("foo", "foo")]
    #[case("foo_bar", "foo_bar")]
    #[case("foo.bar", "foo_bar")]
    #[case("foo/bar", "foo_bar")]
    #[case("99%", "99p")]
    #[case("Mixed-Case 42", "Mixed_Case_42")]
    fn sanitize_cases(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(sanitize(raw), expected);
    }

    #[test]
    fn sanitize_is_byte_wise() {
        // 'é' is two bytes in UTF-8.
        assert_eq!(sanitize("caf\u{e9}"), "caf__");
        assert_eq!(sanitize("\u{1f600}"), "____");
    }

    #[test]
    fn sanitize_is_idempotent() {
        for raw in ["", "a.b/c", "99.9%", "__x__", "caf\u{e9}", "unnamed", "%%"] {
            let once = sanitize(raw);
            assert_eq!(sanitize(&once), once, "input {raw:?}");
        }
    }

    #[test]
    fn separators_collapse_to_the_same_name() {
        assert_eq!(sanitize("foo.bar"), sanitize("foo/bar"));
    }

    #[rstest]
    #[case("95%", "metric_95p")]
    #[case("99.9%", "metric_99_9p")]
    #[case("1m.rate", "metric_1m_rate")]
    #[case("count", "metric_count")]
    fn compose_name_cases(#[case] sub_value: &str, #[case] expected: &str) {
        assert_eq!(compose_name("metric", sub_value), expected);
    }

    #[test]
    fn compose_name_strips_only_trailing_underscores() {
        assert_eq!(compose_name("_metric", "value.."), "_metric_value");
        assert_eq!(compose_name("metric", ""), "metric");
        assert_eq!(compose_name("", ""), "");
    }

    #[test]
    fn compose_key_prefixes_namespace_and_subsystem() {
        assert_eq!(
            compose_key("ns", "subsys", "mycounter", "count"),
            "ns_subsys_mycounter_count"
        );
        assert_eq!(
            compose_key("ns", "subsys", "mytimer", "99.9%"),
            "ns_subsys_mytimer_99_9p"
        );
    }
}
