use std::{
    fs::File,
    io::{self, Read, Write},
    time::Duration,
};

use log::{info, warn};
use serialport::{DataBits, Parity, SerialPort, StopBits};

use crate::{config::SerialConfig, error::DecodeError, pipeline::StopSignal, protocol::ByteSource};

const RX_CHUNK: usize = 64;

/// Serial connection to the sensor, 8N1. Created closed; [`open`](Self::open)
/// attaches to the device.
pub struct SerialLink {
    path: String,
    baud: u32,
    timeout: Duration,
    port: Option<Box<dyn SerialPort>>,
    stop: StopSignal,
    capture: Option<File>,
    buf: [u8; RX_CHUNK],
    pos: usize,
    len: usize,
}

impl SerialLink {
    pub fn new(path: impl Into<String>, config: &SerialConfig) -> Self {
        Self {
            path: path.into(),
            baud: config.baud,
            timeout: config.read_timeout(),
            port: None,
            stop: StopSignal::new(),
            capture: None,
            buf: [0; RX_CHUNK],
            pos: 0,
            len: 0,
        }
    }

    pub fn with_stop(mut self, stop: StopSignal) -> Self {
        self.stop = stop;
        self
    }

    /// Mirrors every received byte into `file`.
    pub fn with_capture(mut self, file: File) -> Self {
        self.capture = Some(file);
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.port.is_some()
    }

    pub fn open(&mut self) -> Result<(), DecodeError> {
        let port = serialport::new(&self.path, self.baud)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .timeout(self.timeout)
            .open()
            .map_err(|e| DecodeError::ConnectionClosed(io::Error::from(e)))?;
        info!("serial: open port={} baud={}", self.path, self.baud);
        self.port = Some(port);
        self.pos = 0;
        self.len = 0;
        Ok(())
    }

    pub fn close(&mut self) {
        if self.port.take().is_some() {
            info!("serial: closed port={}", self.path);
        }
    }

    fn record(&mut self, n: usize) {
        let Some(file) = &mut self.capture else {
            return;
        };
        if let Err(err) = file.write_all(&self.buf[..n]) {
            warn!("serial: capture write failed, disabling capture: {err}");
            self.capture = None;
        }
    }
}

impl ByteSource for SerialLink {
    fn read_byte(&mut self) -> Result<u8, DecodeError> {
        loop {
            if self.pos < self.len {
                let byte = self.buf[self.pos];
                self.pos += 1;
                return Ok(byte);
            }

            let port = self.port.as_mut().ok_or(DecodeError::ConnectionNotOpen)?;
            if self.stop.is_stopped() {
                return Err(DecodeError::Cancelled);
            }

            if let Some(n) = read_chunk(&mut **port, &mut self.buf)? {
                self.pos = 0;
                self.len = n;
                self.record(n);
            }
        }
    }
}

/// One read attempt. `None` means the read timed out and the caller should
/// check for cancellation and wait again.
fn read_chunk<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> Result<Option<usize>, DecodeError> {
    match reader.read(buf) {
        Ok(0) => Err(DecodeError::closed("serial port returned end of stream")),
        Ok(n) => Ok(Some(n)),
        Err(err)
            if matches!(
                err.kind(),
                io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
            ) =>
        {
            Ok(None)
        }
        Err(err) => Err(DecodeError::ConnectionClosed(err)),
    }
}
