pub mod motion;
pub mod scroll;

pub use motion::{classify_motion, classify_motion_values, MotionGesture, Trajectory};
pub use scroll::{classify_zone, ScrollDirection, ScrollZoneClassifier, ScrollZones};
