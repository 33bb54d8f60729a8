/// Percentage of `total` covered by `t`: `min(100, round(100 * t / total))`.
pub fn percent_at(t: f64, total: f64) -> u8 {
    if !t.is_finite() || !total.is_finite() || total <= 0.0 {
        return 0;
    }
    (t / total * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Non-decreasing progress reporter.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProgressTracker {
    last: Option<u8>,
}

impl ProgressTracker {
    /// Fresh tracker with nothing reported.
    pub fn new() -> Self {
        Self::default()
    }

    /// Last reported value, 0 before the first report.
    pub fn current(&self) -> u8 {
        self.last.unwrap_or(0)
    }

    /// Record progress at `t`; returns the value to report when it moved forward.
    pub fn update(&mut self, t: f64, total: f64) -> Option<u8> {
        self.advance_to(percent_at(t, total))
    }

    /// Record natural termination; returns `Some(100)` unless 100 was already reported.
    pub fn finish(&mut self) -> Option<u8> {
        self.advance_to(100)
    }

    fn advance_to(&mut self, p: u8) -> Option<u8> {
        match self.last {
            Some(last) if p <= last => None,
            _ => {
                self.last = Some(p);
                Some(p)
            }
        }
    }
}
