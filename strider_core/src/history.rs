// strider_core/src/history.rs

use std::collections::VecDeque;

use nalgebra::Isometry3;
use tracing::{debug, trace};

use crate::math::{is_nearly_zero, KINDA_SMALL_NUMBER};
use crate::sample::{MotionSample, MotionSampleCollection};

/// Upfront allocation; the buffer grows toward `max_samples` on demand.
const INITIAL_CAPACITY: usize = 256;

/// A bounded, time-windowed record of the agent's recent motion.
///
/// Every append re-anchors the stored samples to the newest pose, so the history
/// always reads as "relative to now". Samples older than `history_seconds` are
/// pruned, and idle periods collapse to a single zero sample.
#[derive(Debug, Clone)]
pub struct SampleHistoryBuffer {
    samples: VecDeque<MotionSample>,
    history_seconds: f64,
    max_samples: usize,
    /// The most recent append, kept even if pruning later removes it.
    last_sample: MotionSample,
    /// Host clock at the most recent append. `None` until the first sample.
    last_update_seconds: Option<f64>,
    /// Frozen pruning boundary while the agent is at rest.
    time_domain_horizon: Option<f64>,
}

impl SampleHistoryBuffer {
    pub fn new(history_seconds: f64, max_samples: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(max_samples.min(INITIAL_CAPACITY)),
            history_seconds,
            max_samples,
            last_sample: MotionSample::default(),
            last_update_seconds: None,
            time_domain_horizon: None,
        }
    }

    /// Appends `new_sample`, recorded at host time `now_seconds`.
    pub fn add_sample(&mut self, new_sample: MotionSample, now_seconds: f64) {
        if let Some(last_update) = self.last_update_seconds {
            let delta_seconds = now_seconds - last_update;
            let delta_distance = new_sample.distance_from(&self.last_sample);
            // Pose of the previous "now", expressed in the new sample's frame.
            let delta_transform: Isometry3<f64> =
                new_sample.world_transform.inverse() * self.last_sample.world_transform;

            for sample in self.samples.iter_mut() {
                sample.prepend_relative_offset(&delta_transform, -delta_seconds);
            }

            self.cull(is_nearly_zero(delta_distance, KINDA_SMALL_NUMBER), &new_sample);
        }

        self.samples.push_back(new_sample);
        while self.samples.len() > self.max_samples {
            self.samples.pop_front();
        }

        self.last_sample = new_sample;
        self.last_update_seconds = Some(now_seconds);
    }

    fn cull(&mut self, motion_is_nearly_zero: bool, latest: &MotionSample) {
        if motion_is_nearly_zero {
            if let Some(first) = self.samples.front() {
                // First tick of a stop: freeze the window so history decays smoothly.
                if !first.is_zero_sample() && self.time_domain_horizon.is_none() {
                    debug!(
                        horizon = first.accumulated_seconds,
                        "motion stopped, freezing history horizon"
                    );
                    self.time_domain_horizon = Some(first.accumulated_seconds);
                }
            }
        } else if self.time_domain_horizon.take().is_some() {
            debug!("motion resumed, history horizon cleared");
        }

        let history_seconds = self.history_seconds;
        let horizon = self.time_domain_horizon;
        let latest_is_zero = latest.is_zero_sample();
        let before = self.samples.len();

        self.samples.retain(|sample| {
            if latest_is_zero && sample.is_zero_sample() {
                return false;
            }
            if sample.accumulated_seconds < -history_seconds {
                return false;
            }
            if let Some(horizon) = horizon {
                if sample.accumulated_seconds < horizon {
                    return false;
                }
            }
            true
        });

        if self.samples.len() != before {
            trace!(removed = before - self.samples.len(), "pruned history");
        }
    }

    /// Copy of the buffer, oldest first. With `omit_latest`, the second-to-last
    /// entry is skipped so a caller can append its own "current" sample.
    pub fn history(&self, omit_latest: bool) -> MotionSampleCollection {
        let count = self.samples.len();
        let mut result = MotionSampleCollection::with_capacity(count);
        for (idx, sample) in self.samples.iter().enumerate() {
            if !omit_latest || idx + 2 != count {
                result.push(*sample);
            }
        }
        result
    }

    pub fn iter(&self) -> std::collections::vec_deque::Iter<'_, MotionSample> {
        self.samples.iter()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn last_sample(&self) -> &MotionSample {
        &self.last_sample
    }

    pub fn last_update_seconds(&self) -> Option<f64> {
        self.last_update_seconds
    }

    pub fn time_domain_horizon(&self) -> Option<f64> {
        self.time_domain_horizon
    }

    pub fn history_seconds(&self) -> f64 {
        self.history_seconds
    }

    pub fn max_samples(&self) -> usize {
        self.max_samples
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.last_sample = MotionSample::default();
        self.last_update_seconds = None;
        self.time_domain_horizon = None;
    }
}
