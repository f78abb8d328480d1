use crate::buffers::AxisSequence;

// Samples that must remain after the settling sample is dropped.
const MIN_TRAJECTORY_LEN: usize = 3;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum MotionGesture {
    #[default]
    None = 0,
    RightSwipe = 1,
    LeftSwipe = 2,
    BumpLeft = 3,
    BumpRight = 4,
}

impl MotionGesture {
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::RightSwipe => "right_swipe",
            Self::LeftSwipe => "left_swipe",
            Self::BumpLeft => "bump_left",
            Self::BumpRight => "bump_right",
        }
    }
}

/// Trajectory summary of one X sequence.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Trajectory {
    pub max: i32,
    pub min: i32,
    pub sum: i32,
    pub first: i32,
    pub second: i32,
    pub last: i32,
}

impl Trajectory {
    /// The first sample is a settling artifact: it is dropped from the
    /// extremes but still serves as the reference for the first trend step.
    pub fn measure(values: &[u8]) -> Option<Self> {
        let (&settle, rest) = values.split_first()?;
        if rest.len() < MIN_TRAJECTORY_LEN {
            return None;
        }

        let first = i32::from(rest[0]);
        let mut trajectory = Self {
            max: first,
            min: first,
            sum: 0,
            first,
            second: i32::from(rest[1]),
            last: first,
        };

        let mut previous = i32::from(settle);
        for &value in rest {
            let value = i32::from(value);
            if value > trajectory.max {
                trajectory.max = value;
            } else if value < trajectory.min {
                trajectory.min = value;
            }

            if value >= previous {
                trajectory.sum += value;
            } else {
                trajectory.sum -= value;
            }
            previous = value;
        }
        trajectory.last = previous;

        Some(trajectory)
    }

    /// First match wins; bump-left outranks both swipe tests.
    pub fn gesture(&self) -> MotionGesture {
        if self.first < self.max && self.second < self.max && self.last < self.max {
            MotionGesture::BumpLeft
        } else if self.sum > self.max {
            MotionGesture::RightSwipe
        } else if self.second > self.min && self.last > self.min {
            MotionGesture::BumpRight
        } else if self.sum < self.min {
            MotionGesture::LeftSwipe
        } else {
            MotionGesture::None
        }
    }
}

pub fn classify_motion_values(values: &[u8]) -> MotionGesture {
    Trajectory::measure(values).map_or(MotionGesture::None, |t| t.gesture())
}

/// Drains `sequence` and classifies it.
pub fn classify_motion(sequence: &mut AxisSequence) -> MotionGesture {
    let values: Vec<u8> = sequence.drain().collect();
    classify_motion_values(&values)
}
