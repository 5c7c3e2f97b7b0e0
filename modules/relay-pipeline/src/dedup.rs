use std::collections::HashSet;

/// Identifiers already processed in the current run. Append-only, exact
/// match, no eviction. Single-writer: only the orchestrator marks.
#[derive(Debug, Default)]
pub struct DedupSet {
    seen: HashSet<String>,
}

impl DedupSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed with identifiers from outside this run (e.g. a caller that
    /// tracks history across invocations).
    pub fn preseeded<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            seen: ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn seen(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    pub fn mark(&mut self, id: &str) {
        self.seen.insert(id.to_string());
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
