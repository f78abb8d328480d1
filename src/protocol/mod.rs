pub mod decoder;
pub mod source;
pub mod wire;

pub use decoder::{
    decode_frame, DecodeEvent, DecodeOutput, DecodeStats, FrameDecoder, FrameReader,
    FrameSamples, GestureCodeReader, GestureReport,
};
pub use source::{ByteSource, IterSource, ReadSource};
pub use wire::{Marker, Sample};
