//! Bounded, time-ordered per-location sample storage.
//!
//! Each location owns one [`HistoryBuffer`]. Samples are kept strictly
//! increasing by timestamp; anything at or before the newest stored
//! timestamp is rejected with [`CoreError::OutOfOrder`] and the buffer is
//! left untouched. The [`RetentionPolicy`] caps both the sample count and the
//! covered time span, evicting from the oldest end.

use std::collections::vec_deque;
use std::collections::{HashMap, VecDeque};

use crate::error::CoreError;
use crate::sample::Sample;
use crate::types::{LocationId, Timestamp};

/// 24 hours of samples at the default 15-minute cadence.
pub const DEFAULT_MAX_SAMPLES: usize = 96;

/// Default maximum age of retained samples, relative to the newest one.
pub const DEFAULT_MAX_AGE_HOURS: i64 = 24;

static EMPTY: VecDeque<Sample> = VecDeque::new();

/// Ascending, restartable view over a slice of a buffer.
///
/// Cloning the iterator restarts playback from the same position.
pub type Samples<'a> = vec_deque::Iter<'a, Sample>;

/// Retention cap applied after every successful append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Hard cap on the number of samples kept per location.
    pub max_samples: usize,
    /// Samples older than `newest - max_age` are evicted. `None` disables
    /// age-based eviction.
    pub max_age: Option<chrono::Duration>,
}

impl RetentionPolicy {
    pub fn new(max_samples: usize, max_age: Option<chrono::Duration>) -> Result<Self, CoreError> {
        if max_samples == 0 {
            return Err(CoreError::Validation(
                "history cap must keep at least one sample".to_string(),
            ));
        }
        if let Some(age) = max_age {
            if age <= chrono::Duration::zero() {
                return Err(CoreError::Validation(format!(
                    "history max age must be positive, got {age}"
                )));
            }
        }
        Ok(Self {
            max_samples,
            max_age,
        })
    }

    /// Count-only cap.
    pub fn max_samples(max_samples: usize) -> Result<Self, CoreError> {
        Self::new(max_samples, None)
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            max_samples: DEFAULT_MAX_SAMPLES,
            max_age: Some(chrono::Duration::hours(DEFAULT_MAX_AGE_HOURS)),
        }
    }
}

// ---------------------------------------------------------------------------
// HistoryBuffer
// ---------------------------------------------------------------------------

/// Time-ordered samples of a single location.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    location_id: LocationId,
    samples: VecDeque<Sample>,
    retention: RetentionPolicy,
}

impl HistoryBuffer {
    pub fn new(location_id: LocationId, retention: RetentionPolicy) -> Self {
        Self {
            location_id,
            samples: VecDeque::new(),
            retention,
        }
    }

    /// Append a sample and enforce the retention cap.
    ///
    /// Returns the number of evicted samples.
    pub fn append(&mut self, sample: Sample) -> Result<usize, CoreError> {
        if sample.location_id != self.location_id {
            return Err(CoreError::Validation(format!(
                "sample for {} appended to history of {}",
                sample.location_id, self.location_id
            )));
        }
        if let Some(last) = self.samples.back() {
            if sample.timestamp <= last.timestamp {
                return Err(CoreError::OutOfOrder {
                    location_id: self.location_id.clone(),
                    timestamp: sample.timestamp,
                    last: last.timestamp,
                });
            }
        }

        self.samples.push_back(sample);
        Ok(self.evict())
    }

    fn evict(&mut self) -> usize {
        let before = self.samples.len();

        while self.samples.len() > self.retention.max_samples {
            self.samples.pop_front();
        }

        if let (Some(max_age), Some(newest)) =
            (self.retention.max_age, self.samples.back().map(|s| s.timestamp))
        {
            let cutoff = newest - max_age;
            while self.samples.front().is_some_and(|s| s.timestamp < cutoff) {
                self.samples.pop_front();
            }
        }

        before - self.samples.len()
    }

    /// Samples with `from <= timestamp <= to`, oldest first.
    ///
    /// Empty when `from > to` or nothing falls in range.
    pub fn range(&self, from: Timestamp, to: Timestamp) -> Samples<'_> {
        if from > to {
            return EMPTY.iter();
        }
        let start = self.samples.partition_point(|s| s.timestamp < from);
        let end = self.samples.partition_point(|s| s.timestamp <= to);
        self.samples.range(start..end)
    }

    pub fn latest(&self) -> Option<&Sample> {
        self.samples.back()
    }

    /// The sample recorded just before [`latest`](Self::latest).
    pub fn previous(&self) -> Option<&Sample> {
        self.samples.len().checked_sub(2).and_then(|i| self.samples.get(i))
    }

    pub fn iter(&self) -> Samples<'_> {
        self.samples.iter()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn retention(&self) -> RetentionPolicy {
        self.retention
    }
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// All per-location buffers, created lazily on first append.
#[derive(Debug, Clone, Default)]
pub struct History {
    buffers: HashMap<LocationId, HistoryBuffer>,
    retention: RetentionPolicy,
}

impl History {
    pub fn new(retention: RetentionPolicy) -> Self {
        Self {
            buffers: HashMap::new(),
            retention,
        }
    }

    pub fn append(&mut self, location_id: &LocationId, sample: Sample) -> Result<usize, CoreError> {
        let retention = self.retention;
        self.buffers
            .entry(location_id.clone())
            .or_insert_with(|| HistoryBuffer::new(location_id.clone(), retention))
            .append(sample)
    }

    pub fn range(&self, location_id: &LocationId, from: Timestamp, to: Timestamp) -> Samples<'_> {
        match self.buffers.get(location_id) {
            Some(buffer) => buffer.range(from, to),
            None => EMPTY.iter(),
        }
    }

    pub fn latest(&self, location_id: &LocationId) -> Option<&Sample> {
        self.buffers.get(location_id).and_then(HistoryBuffer::latest)
    }

    pub fn previous(&self, location_id: &LocationId) -> Option<&Sample> {
        self.buffers.get(location_id).and_then(HistoryBuffer::previous)
    }

    pub fn buffer(&self, location_id: &LocationId) -> Option<&HistoryBuffer> {
        self.buffers.get(location_id)
    }

    pub fn len(&self, location_id: &LocationId) -> usize {
        self.buffers.get(location_id).map_or(0, HistoryBuffer::len)
    }

    pub fn retention(&self) -> RetentionPolicy {
        self.retention
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
