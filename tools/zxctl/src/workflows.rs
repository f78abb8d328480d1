use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
    thread,
    time::Duration,
};

use anyhow::{anyhow, bail, Context, Result};
use chrono::Local;
use log::info;
use zx_gesture::{
    events::{ChannelSink, VecSink},
    protocol::ReadSource,
    ByteSource, DecodeError, GestureConfig, GestureEvent, Pipeline, PipelineMode, SerialLink,
    StopSignal,
};

use crate::{env_utils, logging::ensure_parent_dir, port_detect};

pub struct LiveOptions {
    pub mode: PipelineMode,
    pub config: GestureConfig,
    pub seconds: Option<u64>,
}

pub struct CaptureOptions {
    pub config: GestureConfig,
    pub output_path: Option<PathBuf>,
    pub seconds: u64,
}

pub struct ReplayOptions {
    pub config: GestureConfig,
    pub dump_path: PathBuf,
    pub mode: PipelineMode,
    pub expect_path: Option<PathBuf>,
}

const EVENT_LABELS: &[&str] = &[
    "right_swipe",
    "left_swipe",
    "bump_left",
    "bump_right",
    "scroll_down",
    "scroll_up",
    "scroll_left",
    "scroll_right",
    "gesture_code",
];

fn open_link(config: &GestureConfig, stop: &StopSignal, capture: Option<File>) -> Result<SerialLink> {
    let port = env_utils::require_port(&config.serial)?;
    let mut link = SerialLink::new(port, &config.serial).with_stop(stop.clone());
    if let Some(file) = capture {
        link = link.with_capture(file);
    }
    link.open()
        .with_context(|| format!("failed to open {} @ {}", link.path(), config.serial.baud))?;
    Ok(link)
}

fn stop_after(stop: &StopSignal, seconds: u64) {
    let stop = stop.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_secs(seconds));
        stop.stop();
    });
}

pub fn event_line(event: &GestureEvent) -> String {
    format!("event,{},{}", event.label(), event.value())
}

pub fn default_capture_path() -> PathBuf {
    PathBuf::from(format!(
        "logs/zx_capture_{}.bin",
        Local::now().format("%Y%m%d_%H%M%S")
    ))
}

/// Runs a pipeline on the serial port. Events cross to a printer thread
/// through the bounded channel sink.
pub fn run_live(opts: LiveOptions) -> Result<()> {
    let stop = StopSignal::new();
    let mut link = open_link(&opts.config, &stop, None)?;
    if let Some(seconds) = opts.seconds {
        stop_after(&stop, seconds);
    }

    let sink_config = opts.config.sink;
    let (mut sink, rx) = ChannelSink::channel(
        sink_config.queue_depth,
        sink_config.enqueue_retries,
        sink_config.retry_delay(),
    );
    let printer = thread::spawn(move || {
        for event in rx {
            println!("{}", event_line(&event));
        }
    });

    let port = link.path().to_string();
    let stats = Pipeline::new(opts.config)
        .with_stop(stop)
        .run(opts.mode, &mut link, &mut sink)
        .with_context(|| format!("{} pipeline failed on {port}", opts.mode.label()))?;

    let dropped = sink.dropped();
    drop(sink);
    printer
        .join()
        .map_err(|_| anyhow!("event printer thread panicked"))?;

    info!(
        "zxctl: {} finished port={port} frames={} events={} overflows={} dropped={dropped}",
        opts.mode.label(),
        stats.frames,
        stats.events,
        stats.overflows
    );
    Ok(())
}

pub fn run_capture(opts: CaptureOptions) -> Result<PathBuf> {
    let output_path = opts.output_path.unwrap_or_else(default_capture_path);
    ensure_parent_dir(&output_path)?;
    let file = File::create(&output_path)
        .with_context(|| format!("failed to create {}", output_path.display()))?;

    let stop = StopSignal::new();
    let mut link = open_link(&opts.config, &stop, Some(file))?;
    stop_after(&stop, opts.seconds);

    let mut count = 0u64;
    loop {
        match link.read_byte() {
            Ok(_) => count += 1,
            Err(DecodeError::Cancelled) => break,
            Err(err) => return Err(err).context("capture read failed"),
        }
    }
    link.close();

    info!(
        "zxctl: captured bytes={count} seconds={} path={}",
        opts.seconds,
        output_path.display()
    );
    Ok(output_path)
}

pub fn replay_events(
    dump_path: &Path,
    mode: PipelineMode,
    config: GestureConfig,
) -> Result<Vec<GestureEvent>> {
    let file = File::open(dump_path)
        .with_context(|| format!("failed to open {}", dump_path.display()))?;
    let mut source = ReadSource::new(file);
    let mut sink = VecSink::new();
    let stats = Pipeline::new(config)
        .ending_on_close()
        .run(mode, &mut source, &mut sink)
        .with_context(|| format!("failed to replay {}", dump_path.display()))?;
    info!(
        "zxctl: replayed frames={} events={} truncated={} overflows={}",
        stats.frames, stats.events, stats.truncated, stats.overflows
    );
    Ok(sink.events)
}

pub fn run_replay(opts: ReplayOptions) -> Result<()> {
    let events = replay_events(&opts.dump_path, opts.mode, opts.config)?;

    println!("event,kind,value");
    for event in &events {
        println!("{}", event_line(event));
    }

    if let Some(expect_path) = opts.expect_path {
        let expected = parse_expected_labels(&expect_path)?;
        let actual: Vec<&'static str> = events.iter().map(GestureEvent::label).collect();
        if actual != expected {
            eprintln!("expected kinds: {}", expected.join(","));
            eprintln!("actual kinds:   {}", actual.join(","));
            bail!("event sequence mismatch");
        }
    }
    Ok(())
}

pub fn parse_expected_labels(path: &Path) -> Result<Vec<&'static str>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let reader = BufReader::new(file);

    let mut labels = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line_no = line_no + 1;
        let line = line.with_context(|| format!("failed to read {}:{line_no}", path.display()))?;
        let token = line.trim();
        if token.is_empty() || token.starts_with('#') {
            continue;
        }

        let normalized = token.to_ascii_lowercase();
        let Some(label) = EVENT_LABELS.iter().find(|label| **label == normalized) else {
            bail!(
                "{}:{line_no} invalid expected event kind: {token}",
                path.display()
            );
        };
        labels.push(*label);
    }
    Ok(labels)
}

pub fn run_ports() -> Result<()> {
    let candidates = port_detect::list_candidates();
    if candidates.is_empty() {
        info!("zxctl: no serial candidates found");
        return Ok(());
    }
    for candidate in &candidates {
        println!("port,{candidate}");
    }
    match port_detect::detect_port() {
        Some(port) => info!("zxctl: autodetect would pick {port}"),
        None => info!("zxctl: autodetect is ambiguous; set ZXCTL_PORT or ZXCTL_PORT_HINT"),
    }
    Ok(())
}
