use std::collections::BTreeMap;
use std::fmt;

/// Named counters, gauges and batch-size histograms of a graph service.
///
/// Sorted maps keep the rendered summary stable across runs.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Metrics {
    counters: BTreeMap<String, u64>,
    gauges: BTreeMap<String, i64>,
    histograms: BTreeMap<String, Histogram>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Histogram {
    pub count: u64,
    pub sum: i64,
    pub min: i64,
    pub max: i64,
}

impl Histogram {
    pub fn record(&mut self, value: i64) {
        let first = self.count == 0;
        self.min = if first { value } else { self.min.min(value) };
        self.max = if first { value } else { self.max.max(value) };
        self.count += 1;
        self.sum += value;
    }

    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum as f64 / self.count as f64)
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counter(&self, name: &str) -> u64 {
        self.counters.get(name).copied().unwrap_or(0)
    }

    pub fn inc_counter(&mut self, name: impl Into<String>, by: u64) {
        *self.counters.entry(name.into()).or_insert(0) += by;
    }

    pub fn gauge(&self, name: &str) -> Option<i64> {
        self.gauges.get(name).copied()
    }

    pub fn set_gauge(&mut self, name: impl Into<String>, value: i64) {
        self.gauges.insert(name.into(), value);
    }

    pub fn record_histogram(&mut self, name: impl Into<String>, value: i64) {
        self.histograms.entry(name.into()).or_default().record(value);
    }

    pub fn histogram(&self, name: &str) -> Option<Histogram> {
        self.histograms.get(name).copied()
    }
}

/// One `name=value` pair per metric, sorted by name within each kind.
impl fmt::Display for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sep = "";
        for (name, value) in &self.counters {
            write!(f, "{sep}{name}={value}")?;
            sep = " ";
        }
        for (name, value) in &self.gauges {
            write!(f, "{sep}{name}={value}")?;
            sep = " ";
        }
        for (name, h) in &self.histograms {
            write!(f, "{sep}{name}=[n={} min={} max={}]", h.count, h.min, h.max)?;
            sep = " ";
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Histogram, Metrics};

    #[test]
    fn counters_accumulate_and_gauges_overwrite() {
        let mut m = Metrics::new();
        m.inc_counter("assets.fetch", 1);
        m.inc_counter("assets.fetch", 2);
        assert_eq!(m.counter("assets.fetch"), 3);
        assert_eq!(m.counter("missing"), 0);

        assert_eq!(m.gauge("cache.cached"), None);
        m.set_gauge("cache.cached", 10);
        m.set_gauge("cache.cached", 11);
        assert_eq!(m.gauge("cache.cached"), Some(11));
    }

    #[test]
    fn histogram_tracks_batches() {
        let mut h = Histogram::default();
        assert_eq!(h.mean(), None);
        h.record(5);
        h.record(-2);
        h.record(7);
        assert_eq!((h.count, h.sum, h.min, h.max), (3, 10, -2, 7));
        assert_eq!(h.mean(), Some(10.0 / 3.0));
    }

    #[test]
    fn summary_is_sorted() {
        let mut m = Metrics::new();
        m.inc_counter("nodes.full", 1);
        m.inc_counter("assets.fetch", 2);
        m.set_gauge("cache.cached", 1);
        m.record_histogram("fill.batch", 4);
        assert_eq!(
            m.to_string(),
            "assets.fetch=2 nodes.full=1 cache.cached=1 fill.batch=[n=1 min=4 max=4]"
        );
        assert_eq!(Metrics::new().to_string(), "");
    }
}
