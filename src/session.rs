/// Running tally of evaluated responses for the current session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionTracker {
    attempts: u32,
    correct: u32,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_response(&mut self, is_correct: bool) {
        self.attempts += 1;
        if is_correct {
            self.correct += 1;
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn correct(&self) -> u32 {
        self.correct
    }

    pub fn incorrect(&self) -> u32 {
        self.attempts - self.correct
    }

    /// Share of correct responses in percent, `None` before the first attempt.
    pub fn percentage(&self) -> Option<f64> {
        match self.attempts {
            0 => None,
            n => Some(100.0 * self.correct as f64 / n as f64),
        }
    }

    pub fn rounded_percentage(&self) -> Option<u32> {
        self.percentage().map(|p| p.round_ties_even() as u32)
    }

    /// Ratio in `0.0..=1.0` for gauges; zero before the first attempt.
    pub fn ratio(&self) -> f64 {
        self.percentage().map_or(0.0, |p| p / 100.0)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
