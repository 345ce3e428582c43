/// Bounds how many times all channels are forced off during one inactive
/// period, so a long idle night does not flood the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffGuard {
    max_attempts: u32,
    attempts: u32,
}

impl OffGuard {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            attempts: 0,
        }
    }

    /// Claims one off round. Returns false once the budget is spent.
    pub fn try_acquire(&mut self) -> bool {
        if self.attempts < self.max_attempts {
            self.attempts += 1;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }
}
