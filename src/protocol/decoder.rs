use log::{debug, warn};
use statig::{blocking::IntoStateMachineExt as _, prelude::*};

use super::{
    source::ByteSource,
    wire::{is_gesture_code, is_payload, Marker, Sample, EOF, IDLE},
};
use crate::{
    buffers::{OverflowPolicy, SEQUENCE_CAPACITY},
    error::{DecodeError, FrameFault},
};

pub const MAX_GESTURE_PARAMS: usize = 8;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DecodeEvent {
    Sample(Sample),
    EndOfFrame,
    Fault(FrameFault),
}

/// Events produced by a single byte. A truncated marker followed by EOF is
/// the worst case and yields two.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DecodeOutput {
    events: heapless::Vec<DecodeEvent, 2>,
}

impl DecodeOutput {
    fn push(&mut self, event: DecodeEvent) {
        let pushed = self.events.push(event);
        debug_assert!(pushed.is_ok(), "a byte yields at most two events");
    }

    pub fn iter(&self) -> impl Iterator<Item = &DecodeEvent> {
        self.events.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn sample(&self) -> Option<Sample> {
        self.iter().find_map(|event| match event {
            DecodeEvent::Sample(sample) => Some(*sample),
            _ => None,
        })
    }

    pub fn fault(&self) -> Option<FrameFault> {
        self.iter().find_map(|event| match event {
            DecodeEvent::Fault(fault) => Some(*fault),
            _ => None,
        })
    }

    pub fn is_end_of_frame(&self) -> bool {
        self.iter()
            .any(|event| matches!(event, DecodeEvent::EndOfFrame))
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DecodeStats {
    pub frames: u64,
    pub samples: u64,
    pub truncated: u64,
    pub noise: u64,
    pub overflows: u64,
    pub idle: u64,
}

#[derive(Clone, Copy, Debug)]
enum FrameHsmEvent {
    Byte(u8),
    Reset,
}

#[derive(Default)]
struct DecodeContext {
    output: DecodeOutput,
}

struct FrameHsm {
    stats: DecodeStats,
}

impl FrameHsm {
    fn truncated(&mut self, context: &mut DecodeContext, marker: Marker, next: u8) {
        self.stats.truncated += 1;
        debug!(
            "decoder: truncated marker=0x{:02X} next=0x{:02X}",
            marker.as_u8(),
            next
        );
        context
            .output
            .push(DecodeEvent::Fault(FrameFault::StreamTruncated {
                marker: marker.as_u8(),
                next,
            }));
    }
}

#[state_machine(initial = "State::scanning()")]
impl FrameHsm {
    #[state(superstate = "framing")]
    fn scanning(&mut self, event: &FrameHsmEvent) -> Outcome<State> {
        match event {
            FrameHsmEvent::Byte(EOF) => Super,
            FrameHsmEvent::Byte(byte) => match Marker::from_byte(*byte) {
                Some(marker) => Transition(State::awaiting_payload(marker)),
                None => {
                    self.stats.noise += 1;
                    Handled
                }
            },
            FrameHsmEvent::Reset => Super,
        }
    }

    #[state(superstate = "framing")]
    fn awaiting_payload(
        &mut self,
        marker: &Marker,
        context: &mut DecodeContext,
        event: &FrameHsmEvent,
    ) -> Outcome<State> {
        match event {
            FrameHsmEvent::Byte(EOF) => {
                self.truncated(context, *marker, EOF);
                Super
            }
            FrameHsmEvent::Byte(byte) => {
                if let Some(next) = Marker::from_byte(*byte) {
                    self.truncated(context, *marker, *byte);
                    return Transition(State::awaiting_payload(next));
                }
                if is_payload(*byte) {
                    self.stats.samples += 1;
                    context
                        .output
                        .push(DecodeEvent::Sample(marker.sample(*byte)));
                } else {
                    self.stats.noise += 1;
                }
                Transition(State::scanning())
            }
            FrameHsmEvent::Reset => Super,
        }
    }

    #[superstate]
    fn framing(&mut self, context: &mut DecodeContext, event: &FrameHsmEvent) -> Outcome<State> {
        match event {
            FrameHsmEvent::Byte(EOF) => {
                self.stats.frames += 1;
                context.output.push(DecodeEvent::EndOfFrame);
                Transition(State::scanning())
            }
            FrameHsmEvent::Reset => Transition(State::scanning()),
            FrameHsmEvent::Byte(_) => Handled,
        }
    }
}

/// Byte-at-a-time sentinel framing. Pairs each marker with the payload byte
/// that follows it and reports frame ends and truncated markers.
pub struct FrameDecoder {
    machine: statig::blocking::StateMachine<FrameHsm>,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self {
            machine: FrameHsm {
                stats: DecodeStats::default(),
            }
            .state_machine(),
        }
    }

    pub fn push(&mut self, byte: u8) -> DecodeOutput {
        self.dispatch(FrameHsmEvent::Byte(byte))
    }

    /// Drops any half-read sample and returns to scanning for a marker.
    pub fn reset(&mut self) {
        let _ = self.dispatch(FrameHsmEvent::Reset);
    }

    pub fn stats(&self) -> DecodeStats {
        self.machine.inner().stats
    }

    fn dispatch(&mut self, event: FrameHsmEvent) -> DecodeOutput {
        let mut context = DecodeContext::default();
        self.machine.handle_with_context(&event, &mut context);
        context.output
    }
}

pub type FrameSamples = heapless::Vec<Sample, SEQUENCE_CAPACITY>;

/// Accumulates decoded samples until EOF, applying the overflow policy
/// to the unconsumed samples of the current frame.
pub struct FrameReader {
    decoder: FrameDecoder,
    pending: FrameSamples,
    policy: OverflowPolicy,
    at_boundary: bool,
    overflows: u64,
    idle: u64,
    last_fault: Option<FrameFault>,
}

impl Default for FrameReader {
    fn default() -> Self {
        Self::new(OverflowPolicy::default())
    }
}

impl FrameReader {
    pub fn new(policy: OverflowPolicy) -> Self {
        Self {
            decoder: FrameDecoder::new(),
            pending: FrameSamples::new(),
            policy,
            at_boundary: true,
            overflows: 0,
            idle: 0,
            last_fault: None,
        }
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn take_fault(&mut self) -> Option<FrameFault> {
        self.last_fault.take()
    }

    pub fn stats(&self) -> DecodeStats {
        DecodeStats {
            overflows: self.overflows,
            idle: self.idle,
            ..self.decoder.stats()
        }
    }

    /// Feeds one byte. Returns the completed frame when `byte` is EOF.
    pub fn push(&mut self, byte: u8) -> Option<FrameSamples> {
        if self.at_boundary && byte == IDLE {
            self.idle += 1;
            return None;
        }
        self.at_boundary = false;

        if self.policy.should_discard(self.pending.len(), byte) {
            self.discard_pending("noise");
            return None;
        }

        let output = self.decoder.push(byte);
        for event in output.iter() {
            match event {
                DecodeEvent::Sample(sample) => {
                    if self.pending.push(*sample).is_err() {
                        self.discard_pending("capacity");
                    }
                }
                DecodeEvent::Fault(fault) => self.last_fault = Some(*fault),
                DecodeEvent::EndOfFrame => {}
            }
        }

        if output.is_end_of_frame() {
            self.at_boundary = true;
            return Some(core::mem::take(&mut self.pending));
        }
        None
    }

    /// Blocks on `source` until one frame has been read.
    pub fn read_frame<S: ByteSource + ?Sized>(
        &mut self,
        source: &mut S,
    ) -> Result<FrameSamples, DecodeError> {
        loop {
            let byte = source.read_byte()?;
            if let Some(frame) = self.push(byte) {
                return Ok(frame);
            }
        }
    }

    /// Reads frames back to back, re-arming after each EOF.
    pub fn frames<'a, S: ByteSource + ?Sized>(&'a mut self, source: &'a mut S) -> Frames<'a, S> {
        Frames {
            reader: self,
            source,
            done: false,
        }
    }

    fn discard_pending(&mut self, cause: &str) {
        let discarded = self.pending.len();
        self.pending.clear();
        self.decoder.reset();
        self.overflows += 1;
        self.last_fault = Some(FrameFault::BufferOverflow { discarded });
        warn!(
            "decoder: overflow cause={cause} discarded={discarded}; clear any obstruction from the sensor field of view"
        );
    }
}

pub struct Frames<'a, S: ?Sized> {
    reader: &'a mut FrameReader,
    source: &'a mut S,
    done: bool,
}

impl<S: ByteSource + ?Sized> Iterator for Frames<'_, S> {
    type Item = Result<FrameSamples, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let result = self.reader.read_frame(self.source);
        self.done = result.is_err();
        Some(result)
    }
}

/// Reads bytes up to and including the next EOF and returns the samples
/// decoded from them.
pub fn decode_frame<S: ByteSource + ?Sized>(source: &mut S) -> Result<Vec<Sample>, DecodeError> {
    let frame = FrameReader::default().read_frame(source)?;
    Ok(frame.into_iter().collect())
}

/// Gesture code together with the parameter bytes that trail it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GestureReport {
    pub code: u8,
    pub params: heapless::Vec<u8, MAX_GESTURE_PARAMS>,
}

/// Scans for gesture-code samples, ignoring interleaved axis traffic.
#[derive(Default)]
pub struct GestureCodeReader {
    decoder: FrameDecoder,
    // The previous answer came from the middle of a frame whose EOF is
    // still in the stream.
    drain_tail: bool,
}

impl GestureCodeReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> DecodeStats {
        self.decoder.stats()
    }

    /// Returns the next gesture code, or `None` when a frame ends before one
    /// is seen or the code is outside the valid range.
    pub fn read_code<S: ByteSource + ?Sized>(
        &mut self,
        source: &mut S,
    ) -> Result<Option<u8>, DecodeError> {
        Ok(self
            .next_gesture_sample(source)?
            .filter(|code| is_gesture_code(*code)))
    }

    /// Like [`read_code`](Self::read_code) but also collects the bytes
    /// `<= 240` that directly follow the code.
    pub fn read_code_with_params<S: ByteSource + ?Sized>(
        &mut self,
        source: &mut S,
    ) -> Result<Option<GestureReport>, DecodeError> {
        let Some(code) = self.read_code(source)? else {
            return Ok(None);
        };

        let mut params = heapless::Vec::new();
        loop {
            let byte = source.read_byte()?;
            if is_gesture_code(byte) && params.push(byte).is_ok() {
                continue;
            }
            // The terminator belongs to the frame; the decoder keeps framing it.
            if self.decoder.push(byte).is_end_of_frame() {
                self.drain_tail = false;
            }
            break;
        }
        Ok(Some(GestureReport { code, params }))
    }

    fn next_gesture_sample<S: ByteSource + ?Sized>(
        &mut self,
        source: &mut S,
    ) -> Result<Option<u8>, DecodeError> {
        loop {
            let byte = source.read_byte()?;
            let output = self.decoder.push(byte);
            if let Some(Sample::Gesture(code)) = output.sample() {
                self.drain_tail = true;
                return Ok(Some(code));
            }
            if output.is_end_of_frame() {
                if self.drain_tail {
                    self.drain_tail = false;
                    continue;
                }
                return Ok(None);
            }
        }
    }
}

#[cfg(test)]
mod tests;
