// src/server/fault.rs

/// Decides, per request, whether the mock target answers with a 500.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaultInjector {
    error_rate: f64,
}

impl FaultInjector {
    /// `error_rate` is expected in `[0, 1]`; values outside are clamped.
    pub fn new(error_rate: f64) -> Self {
        let error_rate = if error_rate.is_nan() {
            0.0
        } else {
            error_rate.clamp(0.0, 1.0)
        };
        Self { error_rate }
    }

    pub fn error_rate(&self) -> f64 {
        self.error_rate
    }

    /// `sample` is a uniform draw from `[0, 1)`.
    pub fn is_fault(&self, sample: f64) -> bool {
        sample < self.error_rate
    }

    pub fn should_fail(&self) -> bool {
        self.is_fault(rand::random::<f64>())
    }
}
