/// Counters from one relay run. Mutated only by the orchestrator; read at
/// the end of the run for reporting.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    pub fetched: u32,
    pub skipped_duplicate: u32,
    pub skipped_wrong_kind: u32,
    pub skipped_rejected: u32,
    pub published: u32,
    pub failed: u32,
}

impl RunStats {
    /// Candidates fully resolved one way or another. At rest this equals
    /// `fetched` unless the run was cut short.
    pub fn accounted(&self) -> u32 {
        self.skipped_duplicate
            + self.skipped_wrong_kind
            + self.skipped_rejected
            + self.published
            + self.failed
    }
}

impl std::fmt::Display for RunStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Relay Run Complete ===")?;
        writeln!(f, "Fetched:            {}", self.fetched)?;
        writeln!(f, "Skipped duplicate:  {}", self.skipped_duplicate)?;
        writeln!(f, "Skipped wrong kind: {}", self.skipped_wrong_kind)?;
        writeln!(f, "Skipped rejected:   {}", self.skipped_rejected)?;
        writeln!(f, "Published:          {}", self.published)?;
        writeln!(f, "Failed:             {}", self.failed)
    }
}
