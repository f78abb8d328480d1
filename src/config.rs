use std::{fs, path::Path, time::Duration};

use serde::Deserialize;

use crate::{
    buffers::{OverflowPolicy, DEFAULT_NOISE_CEILING, DEFAULT_OVERFLOW_LIMIT, SEQUENCE_CAPACITY},
    classify::{
        scroll::{DEFAULT_GUARD_SAMPLES, DEFAULT_THROTTLE},
        ScrollZoneClassifier, ScrollZones,
    },
    error::ConfigError,
    events::{DEFAULT_ENQUEUE_RETRIES, DEFAULT_ENQUEUE_RETRY_MS, DEFAULT_QUEUE_DEPTH},
    protocol::wire::{DEFAULT_BAUD, EOF},
};

pub const DEFAULT_READ_TIMEOUT_MS: u64 = 25;

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GestureConfig {
    pub serial: SerialConfig,
    pub overflow: OverflowConfig,
    pub scroll: ScrollConfig,
    pub sink: SinkConfig,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SerialConfig {
    pub port: Option<String>,
    pub baud: u32,
    pub read_timeout_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud: DEFAULT_BAUD,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
        }
    }
}

impl SerialConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OverflowConfig {
    pub limit: usize,
    pub noise_ceiling: u8,
}

impl Default for OverflowConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_OVERFLOW_LIMIT,
            noise_ceiling: DEFAULT_NOISE_CEILING,
        }
    }
}

impl OverflowConfig {
    pub fn policy(&self) -> OverflowPolicy {
        OverflowPolicy {
            limit: self.limit,
            noise_ceiling: self.noise_ceiling,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScrollConfig {
    pub throttle: u8,
    pub guard_samples: u8,
    pub zones: ScrollZones,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            throttle: DEFAULT_THROTTLE,
            guard_samples: DEFAULT_GUARD_SAMPLES,
            zones: ScrollZones::default(),
        }
    }
}

impl ScrollConfig {
    pub fn classifier(&self) -> ScrollZoneClassifier {
        ScrollZoneClassifier::new(self.zones, self.throttle, self.guard_samples)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SinkConfig {
    pub queue_depth: usize,
    pub enqueue_retries: u8,
    pub enqueue_retry_ms: u64,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            queue_depth: DEFAULT_QUEUE_DEPTH,
            enqueue_retries: DEFAULT_ENQUEUE_RETRIES,
            enqueue_retry_ms: DEFAULT_ENQUEUE_RETRY_MS,
        }
    }
}

impl SinkConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.enqueue_retry_ms)
    }
}

impl GestureConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let fail = |msg: &str| Err(ConfigError::Validation(msg.to_string()));

        if self.serial.baud == 0 {
            return fail("serial.baud must be > 0");
        }
        if self.serial.read_timeout_ms == 0 {
            return fail("serial.read_timeout_ms must be > 0");
        }
        if self.overflow.limit == 0 || self.overflow.limit >= SEQUENCE_CAPACITY {
            return fail("overflow.limit must be within 1..512");
        }
        if self.overflow.noise_ceiling == EOF {
            return fail("overflow.noise_ceiling must be below the EOF byte");
        }
        if self.scroll.throttle == 0 {
            return fail("scroll.throttle must be > 0");
        }

        let zones = &self.scroll.zones;
        if zones.center_x_min >= zones.center_x_max {
            return fail("scroll.zones.center_x_min must be < scroll.zones.center_x_max");
        }
        if zones.band_z_min >= zones.band_z_max {
            return fail("scroll.zones.band_z_min must be < scroll.zones.band_z_max");
        }
        if zones.down_z_max >= zones.up_z_min {
            return fail("scroll.zones.down_z_max must be < scroll.zones.up_z_min");
        }
        if zones.left_x_max >= zones.right_x_min {
            return fail("scroll.zones.left_x_max must be < scroll.zones.right_x_min");
        }

        if self.sink.queue_depth == 0 {
            return fail("sink.queue_depth must be > 0");
        }
        Ok(())
    }
}
