use std::collections::BTreeMap;

/// Named monotonic counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricCollector {
    counters: BTreeMap<String, u64>,
}

impl MetricCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc(&mut self, name: &str, amount: u64) {
        let counter = self.counters.entry(name.to_string()).or_insert(0);
        *counter = counter.saturating_add(amount);
    }

    pub fn get(&self, name: &str) -> u64 {
        self.counters.get(name).copied().unwrap_or(0)
    }

    pub fn snapshot(&self) -> BTreeMap<String, u64> {
        self.counters.clone()
    }
}
