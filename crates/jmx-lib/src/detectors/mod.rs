pub mod ecg;

use crate::signal::{Events, TimeSeries};

/// A beat detector: turns a sampled recording into event sample indices.
pub trait Detector {
    /// Identifier used to key benchmark results.
    fn name(&self) -> &str;
    fn detect(&self, signal: &TimeSeries) -> Events;
}

/// Adapts a plain function or closure into a [`Detector`].
pub struct FnDetector<F> {
    name: String,
    func: F,
}

impl<F> FnDetector<F>
where
    F: Fn(&TimeSeries) -> Events,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Detector for FnDetector<F>
where
    F: Fn(&TimeSeries) -> Events,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn detect(&self, signal: &TimeSeries) -> Events {
        (self.func)(signal)
    }
}
