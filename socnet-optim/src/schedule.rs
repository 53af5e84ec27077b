use std::fmt;
use std::sync::Arc;

/// A hyperparameter that is either a fixed value or a function of the global
/// step count.
///
/// Schedules are evaluated lazily at every step, so a decaying noise scale or
/// learning rate costs one closure call per step.
#[derive(Clone)]
pub enum Schedule {
    Constant(f32),
    StepFn(Arc<dyn Fn(u64) -> f32 + Send + Sync>),
}

impl Schedule {
    pub fn at(&self, step: u64) -> f32 {
        match self {
            Schedule::Constant(value) => *value,
            Schedule::StepFn(f) => f(step),
        }
    }

    pub fn step_fn<F>(f: F) -> Self
    where
        F: Fn(u64) -> f32 + Send + Sync + 'static,
    {
        Schedule::StepFn(Arc::new(f))
    }
}

impl From<f32> for Schedule {
    fn from(value: f32) -> Self {
        Schedule::Constant(value)
    }
}

// bare float literals default to f64; accept them too
impl From<f64> for Schedule {
    fn from(value: f64) -> Self {
        Schedule::Constant(value as f32)
    }
}

impl fmt::Debug for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Schedule::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
            Schedule::StepFn(_) => f.write_str("StepFn(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_ignores_step() {
        let s: Schedule = 0.01.into();
        assert_eq!(s.at(0), 0.01);
        assert_eq!(s.at(1000), 0.01);
    }

    #[test]
    fn step_fn_sees_current_step() {
        let s = Schedule::step_fn(|t| 1.0 / (1.0 + t as f32));
        assert_eq!(s.at(0), 1.0);
        assert_eq!(s.at(1), 0.5);
        assert_eq!(s.at(3), 0.25);
    }
}
