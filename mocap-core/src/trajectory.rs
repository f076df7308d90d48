use std::cmp::Ordering;

use crate::{Dataset, HomogeneousTransform, MocapError, Real, Result};

#[derive(Clone, Debug, PartialEq)]
pub struct TrajectorySample {
    // seconds since the start of the capture
    pub time: Real,
    // world-frame pose
    pub transform: HomogeneousTransform,
}

impl TrajectorySample {
    pub fn new(time: Real, transform: HomogeneousTransform) -> Self {
        Self { time, transform }
    }
}

/// Ordered (timestamp, transform) pairs with strictly increasing timestamps.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Trajectory {
    samples: Vec<TrajectorySample>,
}

impl Trajectory {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
        }
    }

    pub fn from_samples(samples: Vec<TrajectorySample>) -> Result<Self> {
        let mut trajectory = Self::with_capacity(samples.len());
        for sample in samples {
            trajectory.push(sample)?;
        }
        Ok(trajectory)
    }

    pub fn push(&mut self, sample: TrajectorySample) -> Result<()> {
        if let Some(last) = self.samples.last() {
            if sample.time.partial_cmp(&last.time) != Some(Ordering::Greater) {
                return Err(MocapError::NonMonotonicTime {
                    previous: last.time,
                    next: sample.time,
                });
            }
        }
        self.samples.push(sample);
        Ok(())
    }

    pub fn samples(&self) -> &[TrajectorySample] {
        &self.samples
    }

    /// Index of the latest sample with `time <= query`, clamped to the first
    /// sample when the query precedes all data. `None` only when empty.
    pub fn lookup(&self, query: Real) -> Option<usize> {
        if self.samples.is_empty() {
            return None;
        }
        let after = self.samples.partition_point(|s| s.time <= query);
        Some(after.saturating_sub(1))
    }

    /// The sample returned by [`Trajectory::lookup`] together with up to
    /// `look_back` samples preceding it, oldest first.
    pub fn window(&self, query: Real, look_back: usize) -> Option<&[TrajectorySample]> {
        let index = self.lookup(query)?;
        let start = index.saturating_sub(look_back);
        Some(&self.samples[start..=index])
    }

    pub fn duration(&self) -> Real {
        match (self.samples.first(), self.samples.last()) {
            (Some(first), Some(last)) => last.time - first.time,
            _ => 0.0,
        }
    }
}

impl Dataset<TrajectorySample> for Trajectory {
    fn get(&self, index: usize) -> Option<TrajectorySample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
