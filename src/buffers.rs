use log::warn;

use crate::{error::FrameFault, protocol::Sample};

pub const SEQUENCE_CAPACITY: usize = 512;
pub const DEFAULT_OVERFLOW_LIMIT: usize = 300;
pub const DEFAULT_NOISE_CEILING: u8 = 240;

/// Clear-on-threshold eviction shared by every sample buffer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct OverflowPolicy {
    pub limit: usize,
    pub noise_ceiling: u8,
}

impl Default for OverflowPolicy {
    fn default() -> Self {
        Self {
            limit: DEFAULT_OVERFLOW_LIMIT,
            noise_ceiling: DEFAULT_NOISE_CEILING,
        }
    }
}

impl OverflowPolicy {
    pub const fn should_discard(&self, len: usize, incoming: u8) -> bool {
        len > self.limit && incoming <= self.noise_ceiling
    }
}

/// FIFO of payload values for one axis.
pub struct AxisSequence {
    values: heapless::Deque<u8, SEQUENCE_CAPACITY>,
    policy: OverflowPolicy,
}

impl Default for AxisSequence {
    fn default() -> Self {
        Self::new(OverflowPolicy::default())
    }
}

impl AxisSequence {
    pub fn new(policy: OverflowPolicy) -> Self {
        Self {
            values: heapless::Deque::new(),
            policy,
        }
    }

    pub fn from_values(values: &[u8]) -> Self {
        let mut sequence = Self::default();
        for value in values {
            // Seeding reports overflow the same way live pushes do; callers
            // only see the surviving values.
            let _ = sequence.push(*value);
        }
        sequence
    }

    /// Appends `value`. When the sequence is over its limit and `value` is low
    /// noise, or the sequence is full, everything is dropped, `value` included.
    pub fn push(&mut self, value: u8) -> Option<FrameFault> {
        if self.policy.should_discard(self.values.len(), value) || self.values.is_full() {
            let discarded = self.values.len();
            self.values.clear();
            warn!("buffers: axis overflow discarded={discarded}");
            return Some(FrameFault::BufferOverflow { discarded });
        }
        let pushed = self.values.push_back(value);
        debug_assert!(pushed.is_ok(), "full buffers are cleared above");
        None
    }

    pub fn pop_front(&mut self) -> Option<u8> {
        self.values.pop_front()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &u8> {
        self.values.iter()
    }

    /// Empties the sequence front to back.
    pub fn drain(&mut self) -> impl Iterator<Item = u8> + '_ {
        core::iter::from_fn(move || self.values.pop_front())
    }
}

/// X and Z sequences filled between classification passes.
#[derive(Default)]
pub struct AxisBuffers {
    pub x: AxisSequence,
    pub z: AxisSequence,
}

impl AxisBuffers {
    pub fn new(policy: OverflowPolicy) -> Self {
        Self {
            x: AxisSequence::new(policy),
            z: AxisSequence::new(policy),
        }
    }

    pub fn route(&mut self, sample: Sample) -> Option<FrameFault> {
        match sample {
            Sample::X(value) => self.x.push(value),
            Sample::Z(value) => self.z.push(value),
            Sample::Gesture(_) => None,
        }
    }

    /// Routes a decoded frame; returns the number of overflows it caused.
    pub fn route_all<'a>(&mut self, samples: impl IntoIterator<Item = &'a Sample>) -> usize {
        samples
            .into_iter()
            .filter_map(|sample| self.route(*sample))
            .count()
    }

    pub fn clear(&mut self) {
        self.x.clear();
        self.z.clear();
    }
}

/// Sign-encodes axis identity: X stays positive, Z is negated.
pub const fn flatten(sample: Sample) -> Option<i16> {
    match sample {
        Sample::X(value) => Some(value as i16),
        Sample::Z(value) => Some(-(value as i16)),
        Sample::Gesture(_) => None,
    }
}

/// Interleaved X/Z samples in arrival order, fed to the scroll classifier.
pub struct ScrollSequence {
    values: heapless::Deque<i16, SEQUENCE_CAPACITY>,
    limit: usize,
}

impl Default for ScrollSequence {
    fn default() -> Self {
        Self::new(DEFAULT_OVERFLOW_LIMIT)
    }
}

impl ScrollSequence {
    pub fn new(limit: usize) -> Self {
        Self {
            values: heapless::Deque::new(),
            limit,
        }
    }

    pub fn push(&mut self, sample: Sample) -> Option<FrameFault> {
        let value = flatten(sample)?;
        if self.values.is_full() {
            let discarded = self.values.len();
            self.values.clear();
            warn!("buffers: scroll overflow discarded={discarded}");
            return Some(FrameFault::BufferOverflow { discarded });
        }
        let pushed = self.values.push_back(value);
        debug_assert!(pushed.is_ok(), "full buffers are cleared above");
        None
    }

    pub fn extend_from_samples<'a>(
        &mut self,
        samples: impl IntoIterator<Item = &'a Sample>,
    ) -> usize {
        samples
            .into_iter()
            .filter_map(|sample| self.push(*sample))
            .count()
    }

    /// Drops the backlog when it has grown past the limit.
    pub fn clear_if_overflowed(&mut self) -> Option<FrameFault> {
        if self.values.len() <= self.limit {
            return None;
        }
        let discarded = self.values.len();
        self.values.clear();
        warn!("buffers: scroll backlog overflow discarded={discarded}");
        Some(FrameFault::BufferOverflow { discarded })
    }

    pub fn pop_front(&mut self) -> Option<i16> {
        self.values.pop_front()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}
