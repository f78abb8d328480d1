use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use log::{debug, info};

use crate::{
    buffers::{AxisBuffers, ScrollSequence},
    classify::{classify_motion, MotionGesture, ScrollDirection},
    config::GestureConfig,
    error::{DecodeError, FrameFault},
    events::{EventSink, GestureEvent, SinkAck},
    protocol::{ByteSource, DecodeStats, FrameReader, GestureCodeReader},
};

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Clone, Debug, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PipelineMode {
    Motion,
    Codes,
    CodesWithParams,
    Scroll,
}

impl PipelineMode {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Motion => "motion",
            Self::Codes => "codes",
            Self::CodesWithParams => "codes_with_params",
            Self::Scroll => "scroll",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PipelineStats {
    pub frames: u64,
    pub events: u64,
    pub overflows: u64,
    pub truncated: u64,
    pub hard_stops: u64,
}

impl PipelineStats {
    fn absorb(&mut self, decode: DecodeStats) {
        self.frames = decode.frames;
        self.truncated = decode.truncated;
        self.overflows += decode.overflows;
    }
}

fn deliver<K: EventSink + ?Sized>(
    sink: &mut K,
    event: GestureEvent,
    stats: &mut PipelineStats,
) -> SinkAck {
    stats.events += 1;
    let ack = sink.emit(event);
    if ack != SinkAck::Accepted {
        stats.hard_stops += 1;
        debug!("pipeline: sink answered {ack:?} event={}", event.label());
    }
    ack
}

/// Single-consumer decode/classify loop. Owns no buffers between runs; each
/// `run_*` call builds its own and drops them on return.
pub struct Pipeline {
    config: GestureConfig,
    stop: StopSignal,
    end_on_close: bool,
}

impl Pipeline {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            stop: StopSignal::new(),
            end_on_close: false,
        }
    }

    pub fn with_stop(mut self, stop: StopSignal) -> Self {
        self.stop = stop;
        self
    }

    /// Treat closure of the byte source as the end of input. Used when
    /// replaying captures.
    pub fn ending_on_close(mut self) -> Self {
        self.end_on_close = true;
        self
    }

    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    pub fn run<S, K>(
        &self,
        mode: PipelineMode,
        source: &mut S,
        sink: &mut K,
    ) -> Result<PipelineStats, DecodeError>
    where
        S: ByteSource + ?Sized,
        K: EventSink + ?Sized,
    {
        info!("pipeline: start mode={}", mode.label());
        let result = match mode {
            PipelineMode::Motion => self.run_motion(source, sink),
            PipelineMode::Codes => self.run_codes(source, sink, false),
            PipelineMode::CodesWithParams => self.run_codes(source, sink, true),
            PipelineMode::Scroll => self.run_scroll(source, sink),
        };
        if let Ok(stats) = &result {
            info!(
                "pipeline: done mode={} frames={} events={} overflows={} truncated={}",
                mode.label(),
                stats.frames,
                stats.events,
                stats.overflows,
                stats.truncated
            );
        }
        result
    }

    /// One motion classification per frame over that frame's X samples.
    pub fn run_motion<S, K>(&self, source: &mut S, sink: &mut K) -> Result<PipelineStats, DecodeError>
    where
        S: ByteSource + ?Sized,
        K: EventSink + ?Sized,
    {
        let policy = self.config.overflow.policy();
        let mut reader = FrameReader::new(policy);
        let mut buffers = AxisBuffers::new(policy);
        let mut stats = PipelineStats::default();

        while !self.stop.is_stopped() {
            let frame = match reader.read_frame(source) {
                Ok(frame) => frame,
                Err(err) => return self.finish(err, stats, reader.stats()),
            };
            stats.overflows += buffers.route_all(&frame) as u64;
            buffers.z.clear();

            let gesture = classify_motion(&mut buffers.x);
            if gesture != MotionGesture::None
                && deliver(sink, GestureEvent::Motion(gesture), &mut stats) != SinkAck::Accepted
            {
                break;
            }
        }
        stats.absorb(reader.stats());
        Ok(stats)
    }

    /// Emits every valid gesture code; frames without one are skipped.
    pub fn run_codes<S, K>(
        &self,
        source: &mut S,
        sink: &mut K,
        with_params: bool,
    ) -> Result<PipelineStats, DecodeError>
    where
        S: ByteSource + ?Sized,
        K: EventSink + ?Sized,
    {
        let mut reader = GestureCodeReader::new();
        let mut stats = PipelineStats::default();

        while !self.stop.is_stopped() {
            let code = if with_params {
                reader.read_code_with_params(source).map(|report| {
                    report.map(|report| {
                        debug!("pipeline: code={} params={:?}", report.code, report.params);
                        report.code
                    })
                })
            } else {
                reader.read_code(source)
            };
            let code = match code {
                Ok(code) => code,
                Err(err) => return self.finish(err, stats, reader.stats()),
            };
            if let Some(code) = code {
                if deliver(sink, GestureEvent::Code(code), &mut stats) != SinkAck::Accepted {
                    break;
                }
            }
        }
        stats.absorb(reader.stats());
        Ok(stats)
    }

    /// Feeds the sign-encoded X/Z stream through the throttled zone
    /// classifier. After each classification, a `Stop` from the sink or a
    /// backlog past the overflow limit clears the pending samples before the
    /// next read.
    pub fn run_scroll<S, K>(&self, source: &mut S, sink: &mut K) -> Result<PipelineStats, DecodeError>
    where
        S: ByteSource + ?Sized,
        K: EventSink + ?Sized,
    {
        let mut reader = FrameReader::new(self.config.overflow.policy());
        let mut sequence = ScrollSequence::new(self.config.overflow.limit);
        let mut classifier = self.config.scroll.classifier();
        let mut stats = PipelineStats::default();

        'frames: while !self.stop.is_stopped() {
            let frame = match reader.read_frame(source) {
                Ok(frame) => frame,
                Err(err) => return self.finish(err, stats, reader.stats()),
            };
            stats.overflows += sequence.extend_from_samples(&frame) as u64;

            while let Some(value) = sequence.pop_front() {
                let Some(direction) = classifier.push(value) else {
                    continue;
                };
                if direction != ScrollDirection::None {
                    match deliver(sink, GestureEvent::Scroll(direction), &mut stats) {
                        SinkAck::Accepted => {}
                        SinkAck::Stop => {
                            debug!("pipeline: sink stop, dropping backlog={}", sequence.len());
                            sequence.clear();
                            break;
                        }
                        SinkAck::Closed => break 'frames,
                    }
                }
                if let Some(FrameFault::BufferOverflow { .. }) = sequence.clear_if_overflowed() {
                    stats.overflows += 1;
                    break;
                }
            }
        }
        stats.absorb(reader.stats());
        Ok(stats)
    }

    fn finish(
        &self,
        err: DecodeError,
        mut stats: PipelineStats,
        decode: DecodeStats,
    ) -> Result<PipelineStats, DecodeError> {
        stats.absorb(decode);
        match err {
            DecodeError::Cancelled => Ok(stats),
            DecodeError::ConnectionClosed(_) if self.end_on_close || self.stop.is_stopped() => {
                Ok(stats)
            }
            err => Err(err),
        }
    }
}
