use std::{
    sync::mpsc::{self, Receiver, SyncSender, TrySendError},
    thread,
    time::Duration,
};

use log::warn;

use crate::classify::{MotionGesture, ScrollDirection};

pub const DEFAULT_QUEUE_DEPTH: usize = 32;
pub const DEFAULT_ENQUEUE_RETRY_MS: u64 = 25;
pub const DEFAULT_ENQUEUE_RETRIES: u8 = 4;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum GestureEvent {
    Motion(MotionGesture),
    Scroll(ScrollDirection),
    Code(u8),
}

impl GestureEvent {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Motion(gesture) => gesture.label(),
            Self::Scroll(direction) => direction.label(),
            Self::Code(_) => "gesture_code",
        }
    }

    pub fn value(&self) -> u8 {
        match self {
            Self::Motion(gesture) => gesture.as_u8(),
            Self::Scroll(direction) => direction.as_u8(),
            Self::Code(code) => *code,
        }
    }

    pub fn key_action(&self) -> Option<KeyAction> {
        match self {
            Self::Motion(MotionGesture::RightSwipe) => Some(KeyAction::press(Key::Right, 1)),
            Self::Motion(MotionGesture::LeftSwipe) => Some(KeyAction::press(Key::Left, 1)),
            Self::Motion(MotionGesture::BumpLeft) => Some(KeyAction::press(Key::Left, 2)),
            Self::Motion(MotionGesture::BumpRight) => Some(KeyAction::press(Key::Right, 2)),
            Self::Scroll(ScrollDirection::Down) => Some(KeyAction::scroll(Key::Down)),
            Self::Scroll(ScrollDirection::Up) => Some(KeyAction::scroll(Key::Up)),
            Self::Scroll(ScrollDirection::Left) => Some(KeyAction::scroll(Key::Left)),
            Self::Scroll(ScrollDirection::Right) => Some(KeyAction::scroll(Key::Right)),
            Self::Motion(MotionGesture::None) | Self::Scroll(ScrollDirection::None) => None,
            Self::Code(_) => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
}

/// Keystroke a host integration would send for an event. Description only.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct KeyAction {
    pub key: Key,
    pub repeat: u8,
    pub scroll_lock: bool,
}

impl KeyAction {
    const fn press(key: Key, repeat: u8) -> Self {
        Self {
            key,
            repeat,
            scroll_lock: false,
        }
    }

    const fn scroll(key: Key) -> Self {
        Self {
            key,
            repeat: 1,
            scroll_lock: true,
        }
    }
}

/// Sink's verdict on an event. `Stop` ends a motion or code run and makes the
/// scroll pipeline drop its backlog before the next read. `Closed` means the
/// sink can take no more events and ends every run.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SinkAck {
    #[default]
    Accepted,
    Stop,
    Closed,
}

pub trait EventSink {
    fn emit(&mut self, event: GestureEvent) -> SinkAck;
}

/// Hands events to another thread over a bounded channel.
pub struct ChannelSink {
    tx: SyncSender<GestureEvent>,
    retries: u8,
    retry_delay: Duration,
    dropped: u64,
}

impl ChannelSink {
    pub fn new(tx: SyncSender<GestureEvent>, retries: u8, retry_delay: Duration) -> Self {
        Self {
            tx,
            retries,
            retry_delay,
            dropped: 0,
        }
    }

    pub fn channel(depth: usize, retries: u8, retry_delay: Duration) -> (Self, Receiver<GestureEvent>) {
        let (tx, rx) = mpsc::sync_channel(depth);
        (Self::new(tx, retries, retry_delay), rx)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl EventSink for ChannelSink {
    fn emit(&mut self, event: GestureEvent) -> SinkAck {
        for attempt in 0..=self.retries {
            match self.tx.try_send(event) {
                Ok(()) => return SinkAck::Accepted,
                Err(TrySendError::Disconnected(_)) => {
                    warn!("sink: receiver gone, closing event={}", event.label());
                    return SinkAck::Closed;
                }
                Err(TrySendError::Full(_)) => {
                    if attempt == self.retries {
                        break;
                    }
                    thread::sleep(self.retry_delay);
                }
            }
        }
        self.dropped += 1;
        warn!(
            "sink: queue full, dropped event={} dropped_total={}",
            event.label(),
            self.dropped
        );
        SinkAck::Accepted
    }
}

/// Collects events in memory; optionally answers `Stop` for chosen events.
#[derive(Default)]
pub struct VecSink {
    pub events: Vec<GestureEvent>,
    stop_on: Vec<GestureEvent>,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stopping_on(events: impl IntoIterator<Item = GestureEvent>) -> Self {
        Self {
            events: Vec::new(),
            stop_on: events.into_iter().collect(),
        }
    }
}

impl EventSink for VecSink {
    fn emit(&mut self, event: GestureEvent) -> SinkAck {
        self.events.push(event);
        if self.stop_on.contains(&event) {
            SinkAck::Stop
        } else {
            SinkAck::Accepted
        }
    }
}
