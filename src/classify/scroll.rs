use serde::Deserialize;

pub const DEFAULT_THROTTLE: u8 = 11;
pub const DEFAULT_GUARD_SAMPLES: u8 = 3;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum ScrollDirection {
    #[default]
    None = 0,
    Down = 1,
    Up = 2,
    Left = 3,
    Right = 4,
}

impl ScrollDirection {
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Down => "scroll_down",
            Self::Up => "scroll_up",
            Self::Left => "scroll_left",
            Self::Right => "scroll_right",
        }
    }
}

/// Rectangular hit-zones in sensor units. Vertical zones share the
/// `center_x` column, horizontal zones share the `band_z` row; both are
/// open intervals.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScrollZones {
    pub center_x_min: u8,
    pub center_x_max: u8,
    pub down_z_max: u8,
    pub up_z_min: u8,
    pub band_z_min: u8,
    pub band_z_max: u8,
    pub left_x_max: u8,
    pub right_x_min: u8,
}

impl Default for ScrollZones {
    fn default() -> Self {
        Self {
            center_x_min: 110,
            center_x_max: 140,
            down_z_max: 30,
            up_z_min: 70,
            band_z_min: 30,
            band_z_max: 70,
            left_x_max: 110,
            right_x_min: 140,
        }
    }
}

impl ScrollZones {
    fn in_center_column(&self, x: u8) -> bool {
        x > self.center_x_min && x < self.center_x_max
    }

    fn in_band_row(&self, z: u8) -> bool {
        z > self.band_z_min && z < self.band_z_max
    }
}

/// Zone lookup, top to bottom. Left/Right only count once the x guard is
/// armed.
pub fn classify_zone(x: u8, z: u8, horizontal_armed: bool, zones: &ScrollZones) -> ScrollDirection {
    if z <= zones.down_z_max && zones.in_center_column(x) {
        ScrollDirection::Down
    } else if z >= zones.up_z_min && zones.in_center_column(x) {
        ScrollDirection::Up
    } else if horizontal_armed && x <= zones.left_x_max && zones.in_band_row(z) {
        ScrollDirection::Left
    } else if horizontal_armed && x >= zones.right_x_min && zones.in_band_row(z) {
        ScrollDirection::Right
    } else {
        ScrollDirection::None
    }
}

/// Throttled classifier over the sign-encoded X/Z stream.
///
/// Every `throttle` samples it classifies the most recent x and z seen.
/// Horizontal directions stay disarmed until `guard` positive-x samples have
/// arrived since the last reset of the guard.
#[derive(Clone, Debug)]
pub struct ScrollZoneClassifier {
    zones: ScrollZones,
    throttle: u8,
    guard: u8,
    count: u8,
    x: u8,
    z: u8,
    positive_x: u8,
}

impl Default for ScrollZoneClassifier {
    fn default() -> Self {
        Self::new(ScrollZones::default(), DEFAULT_THROTTLE, DEFAULT_GUARD_SAMPLES)
    }
}

impl ScrollZoneClassifier {
    pub fn new(zones: ScrollZones, throttle: u8, guard: u8) -> Self {
        Self {
            zones,
            throttle: throttle.max(1),
            guard,
            count: 0,
            x: 0,
            z: 0,
            positive_x: 0,
        }
    }

    pub fn last_position(&self) -> (u8, u8) {
        (self.x, self.z)
    }

    /// Consumes one sign-encoded sample. Returns a classification on every
    /// `throttle`-th sample and `None` in between.
    pub fn push(&mut self, value: i16) -> Option<ScrollDirection> {
        let magnitude = u8::try_from(value.unsigned_abs()).unwrap_or(u8::MAX);
        if value < 0 {
            self.z = magnitude;
        } else if value > 0 {
            self.x = magnitude;
            self.positive_x = self.positive_x.saturating_add(1);
        }

        self.count += 1;
        if self.count < self.throttle {
            return None;
        }
        self.count = 0;

        let armed = self.positive_x >= self.guard;
        let direction = classify_zone(self.x, self.z, armed, &self.zones);
        if armed {
            self.positive_x = 0;
        }
        Some(direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(classifier: &mut ScrollZoneClassifier, values: &[i16]) -> Vec<ScrollDirection> {
        values.iter().filter_map(|v| classifier.push(*v)).collect()
    }

    #[test]
    fn zone_table_matches_center_column() {
        let zones = ScrollZones::default();
        assert_eq!(classify_zone(125, 20, false, &zones), ScrollDirection::Down);
        assert_eq!(classify_zone(125, 30, false, &zones), ScrollDirection::Down);
        assert_eq!(classify_zone(125, 80, false, &zones), ScrollDirection::Up);
        assert_eq!(classify_zone(125, 70, false, &zones), ScrollDirection::Up);
        assert_eq!(classify_zone(110, 20, true, &zones), ScrollDirection::None);
        assert_eq!(classify_zone(140, 80, true, &zones), ScrollDirection::None);
    }

    #[test]
    fn horizontal_zones_need_armed_guard() {
        let zones = ScrollZones::default();
        assert_eq!(classify_zone(90, 50, true, &zones), ScrollDirection::Left);
        assert_eq!(classify_zone(90, 50, false, &zones), ScrollDirection::None);
        assert_eq!(classify_zone(150, 50, true, &zones), ScrollDirection::Right);
        assert_eq!(classify_zone(140, 50, true, &zones), ScrollDirection::Right);
        assert_eq!(classify_zone(150, 30, true, &zones), ScrollDirection::None);
        assert_eq!(classify_zone(125, 50, true, &zones), ScrollDirection::None);
    }

    #[test]
    fn classifies_once_per_throttle_window() {
        let mut classifier = ScrollZoneClassifier::default();
        let values = [125, -20, 125, -20, 125, -20, 125, -20, 125, -20, 125];
        assert_eq!(window(&mut classifier, &values[..10]), vec![]);
        assert_eq!(classifier.push(values[10]), Some(ScrollDirection::Down));
    }

    #[test]
    fn uses_latest_position_in_window() {
        let mut classifier = ScrollZoneClassifier::default();
        let mut values = vec![125, -20];
        values.extend([125, -80].repeat(4));
        values.push(-80);
        assert_eq!(window(&mut classifier, &values), vec![ScrollDirection::Up]);
        assert_eq!(classifier.last_position(), (125, 80));
    }

    #[test]
    fn left_after_three_positive_x_samples() {
        let mut classifier = ScrollZoneClassifier::default();
        let mut values = vec![90, 90, 90];
        values.extend([-50; 8]);
        assert_eq!(window(&mut classifier, &values), vec![ScrollDirection::Left]);
    }

    #[test]
    fn left_is_suppressed_with_fewer_positive_x_samples() {
        let mut classifier = ScrollZoneClassifier::default();
        let mut values = vec![90];
        values.extend([-50; 10]);
        assert_eq!(window(&mut classifier, &values), vec![ScrollDirection::None]);
    }

    #[test]
    fn guard_rearms_after_each_classification() {
        let mut classifier = ScrollZoneClassifier::default();
        let mut values = vec![160, 160, 160];
        values.extend([-50; 8]);
        values.extend([-50; 11]);
        assert_eq!(
            window(&mut classifier, &values),
            vec![ScrollDirection::Right, ScrollDirection::None]
        );
    }

    #[test]
    fn zero_samples_count_toward_throttle_only() {
        let mut classifier = ScrollZoneClassifier::default();
        let mut values = vec![125, -20];
        values.extend([0; 9]);
        assert_eq!(window(&mut classifier, &values), vec![ScrollDirection::Down]);
    }
}
