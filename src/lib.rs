//! Host-side decoder for the ZX gesture sensor's serial byte stream.
//!
//! Bytes from a [`protocol::ByteSource`] are framed by
//! [`protocol::FrameDecoder`], buffered per axis, classified into motion
//! gestures or scroll directions, and handed to an [`events::EventSink`].

pub mod buffers;
pub mod classify;
pub mod config;
pub mod error;
pub mod events;
pub mod pipeline;
pub mod protocol;
#[cfg(feature = "serial")]
pub mod serial;

pub use classify::{MotionGesture, ScrollDirection};
pub use config::GestureConfig;
pub use error::{ConfigError, DecodeError, FrameFault};
pub use events::{EventSink, GestureEvent, SinkAck};
pub use pipeline::{Pipeline, PipelineMode, PipelineStats, StopSignal};
pub use protocol::{ByteSource, FrameDecoder, Sample};
#[cfg(feature = "serial")]
pub use serial::SerialLink;
