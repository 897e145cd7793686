//! Background streaming of still or animated frames.
//!
//! An [`AnimatedStreamer`] owns one [`FrameTransport`].  [`start`] moves the
//! transport onto a worker thread that encodes and sends frames at a fixed
//! pace; [`wait`] joins the worker and hands the transport back.  While a
//! session runs, nothing else can write to the transport, so no locking is
//! needed.
//!
//! # Session lifetime
//!
//! ```text
//! Idle ──start──► Streaming ──(timeout reached at end of pass)──► Idle
//!                     │
//!                     └──stop / encode error────────────────────► Idle
//! ```
//!
//! A still image (one frame) is resent every interval until the timeout has
//! elapsed.  An animation always finishes the pass it is in: the session ends
//! only when the last frame has been sent *and* the timeout has elapsed.  A
//! timeout of zero therefore sends a still image once and an animation once
//! through.
//!
//! [`start`]: AnimatedStreamer::start
//! [`wait`]: AnimatedStreamer::wait

use std::borrow::Cow;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    mpsc, Arc,
};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use ft_core::{FrameBuffer, FrameError, Offset, MAX_DATAGRAM_SIZE};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::infrastructure::network::FrameTransport;

/// Interval used when a caller asks for zero.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(100);

/// Upper bound on one pacing sleep.
const PACING_SLICE: Duration = Duration::from_millis(10);

/// Errors from starting or joining a streaming session.
#[derive(Debug, Error)]
pub enum StreamError {
    /// A session is already streaming on this target.
    #[error("a streaming session is already running")]
    AlreadyRunning,

    /// [`AnimatedStreamer::wait`] was called with no session started.
    #[error("no streaming session has been started")]
    NotStarted,

    /// The frame source has no frames.
    #[error("frame source is empty")]
    EmptySource,

    /// The target was lost when a previous worker panicked.
    #[error("stream target was lost by a failed session")]
    TargetLost,

    /// The worker thread could not be spawned.
    #[error("failed to spawn stream worker: {0}")]
    Spawn(#[source] std::io::Error),

    /// The worker thread panicked; the target is gone.
    #[error("stream worker panicked")]
    WorkerPanicked,

    /// A frame could not be encoded; the session ended.
    #[error("failed to encode frame {index}: {source}")]
    Encode {
        index: usize,
        #[source]
        source: FrameError,
    },
}

/// Wire format for streamed frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamFormat {
    /// Q7 header with a PNG payload, one datagram per frame.
    #[default]
    Q7,
    /// Uncompressed offset frames, tiled to fit the datagram limit.
    Raw,
}

/// Pacing and placement for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamOptions {
    /// Minimum time between the starts of consecutive transmissions.
    /// Zero means [`DEFAULT_INTERVAL`].
    pub interval: Duration,
    /// How long to keep resending after the session starts.
    pub timeout: Duration,
    pub format: StreamFormat,
    /// Placement on the server; `z` is the layer.
    pub offset: Offset,
    /// Largest datagram for raw tiling, capped at [`MAX_DATAGRAM_SIZE`].
    pub max_datagram: usize,
}

impl StreamOptions {
    /// The interval actually used, with zero replaced by the default.
    pub fn effective_interval(&self) -> Duration {
        if self.interval.is_zero() {
            DEFAULT_INTERVAL
        } else {
            self.interval
        }
    }
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            timeout: Duration::ZERO,
            format: StreamFormat::Q7,
            offset: Offset::default(),
            max_datagram: MAX_DATAGRAM_SIZE,
        }
    }
}

/// Outcome of a finished session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamSummary {
    /// Frames whose every datagram was accepted by the transport.
    pub frames_sent: u64,
    /// Frames with at least one failed datagram.
    pub send_failures: u64,
    /// The session ended because of [`AnimatedStreamer::stop`].
    pub stopped_early: bool,
}

// ── Frame sources ─────────────────────────────────────────────────────────────

/// A finite, indexable sequence of frames.
///
/// Frames are requested in order `0, 1, …, count - 1, 0, 1, …`, so a source
/// may generate them lazily.
pub trait FrameSource: Send + 'static {
    fn frame_count(&self) -> usize;

    /// Frame `index`, where `index < frame_count()`.
    fn frame(&mut self, index: usize) -> Cow<'_, FrameBuffer>;
}

impl FrameSource for FrameBuffer {
    fn frame_count(&self) -> usize {
        1
    }

    fn frame(&mut self, _index: usize) -> Cow<'_, FrameBuffer> {
        Cow::Borrowed(self)
    }
}

impl FrameSource for Vec<FrameBuffer> {
    fn frame_count(&self) -> usize {
        self.len()
    }

    fn frame(&mut self, index: usize) -> Cow<'_, FrameBuffer> {
        Cow::Borrowed(&self[index])
    }
}

/// Frames produced on demand by a closure.
pub struct GeneratedFrames<F> {
    count: usize,
    generate: F,
}

impl<F> GeneratedFrames<F>
where
    F: FnMut(usize) -> FrameBuffer + Send + 'static,
{
    pub fn new(count: usize, generate: F) -> Self {
        Self { count, generate }
    }
}

impl<F> FrameSource for GeneratedFrames<F>
where
    F: FnMut(usize) -> FrameBuffer + Send + 'static,
{
    fn frame_count(&self) -> usize {
        self.count
    }

    fn frame(&mut self, index: usize) -> Cow<'_, FrameBuffer> {
        Cow::Owned((self.generate)(index))
    }
}

// ── Streamer ──────────────────────────────────────────────────────────────────

/// `None` only if the worker never received its target.
type WorkerOutput<T> = Option<(T, Result<StreamSummary, StreamError>)>;

struct Session<T> {
    handle: JoinHandle<WorkerOutput<T>>,
    running: Arc<AtomicBool>,
    stop: Arc<AtomicBool>,
}

/// Streams frames to one transport from a background thread.
pub struct AnimatedStreamer<T: FrameTransport + 'static> {
    target: Option<T>,
    session: Option<Session<T>>,
}

impl<T: FrameTransport + 'static> AnimatedStreamer<T> {
    pub fn new(target: T) -> Self {
        Self {
            target: Some(target),
            session: None,
        }
    }

    /// Starts a session streaming `source` with `options`.
    ///
    /// A finished session that was never waited on is reaped first.
    ///
    /// # Errors
    ///
    /// - [`StreamError::AlreadyRunning`] while a session is streaming.
    /// - [`StreamError::EmptySource`] if `source` has no frames.
    /// - [`StreamError::Spawn`] if the worker thread cannot be created; the
    ///   target stays with the streamer.
    pub fn start<S: FrameSource>(&mut self, source: S, options: StreamOptions) -> Result<(), StreamError> {
        if self.is_running() {
            return Err(StreamError::AlreadyRunning);
        }
        if source.frame_count() == 0 {
            return Err(StreamError::EmptySource);
        }
        if self.session.is_some() {
            match self.wait() {
                Ok(previous) => debug!(?previous, "reaped finished session"),
                Err(e) => debug!("reaped finished session: {e}"),
            }
        }
        let target = self.target.take().ok_or(StreamError::TargetLost)?;

        let running = Arc::new(AtomicBool::new(true));
        let stop = Arc::new(AtomicBool::new(false));
        let (handoff_tx, handoff_rx) = mpsc::sync_channel::<(T, S)>(1);

        let worker_running = Arc::clone(&running);
        let worker_stop = Arc::clone(&stop);
        let spawned = thread::Builder::new()
            .name("ft-stream".to_string())
            .spawn(move || {
                let _running = RunningGuard(worker_running);
                let (mut target, mut source) = handoff_rx.recv().ok()?;
                let result = stream_loop(&mut target, &mut source, options, &worker_stop);
                Some((target, result))
            });

        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                running.store(false, Ordering::Release);
                self.target = Some(target);
                return Err(StreamError::Spawn(e));
            }
        };
        if let Err(mpsc::SendError((target, _))) = handoff_tx.send((target, source)) {
            // The worker died before receiving; keep the target.
            self.target = Some(target);
            let _ = handle.join();
            return Err(StreamError::WorkerPanicked);
        }

        self.session = Some(Session {
            handle,
            running,
            stop,
        });
        Ok(())
    }

    /// Asks the session to end at its next cycle boundary.
    pub fn stop(&self) {
        if let Some(session) = &self.session {
            session.stop.store(true, Ordering::Release);
        }
    }

    /// `true` while a session is streaming.
    pub fn is_running(&self) -> bool {
        self.session
            .as_ref()
            .map_or(false, |s| s.running.load(Ordering::Acquire))
    }

    /// Blocks until the current session ends and reclaims the target.
    ///
    /// # Errors
    ///
    /// - [`StreamError::NotStarted`] if there is no session.
    /// - [`StreamError::WorkerPanicked`] if the worker panicked.
    /// - [`StreamError::Encode`] if the session ended on an encode failure.
    pub fn wait(&mut self) -> Result<StreamSummary, StreamError> {
        let session = self.session.take().ok_or(StreamError::NotStarted)?;
        let (target, result) = session
            .handle
            .join()
            .map_err(|_| StreamError::WorkerPanicked)?
            .ok_or(StreamError::TargetLost)?;
        self.target = Some(target);
        result
    }

    /// Stops any session and returns the target.
    ///
    /// # Errors
    ///
    /// [`StreamError::WorkerPanicked`] or [`StreamError::TargetLost`] when the
    /// target did not survive a failed session.
    pub fn into_target(mut self) -> Result<T, StreamError> {
        if self.session.is_some() {
            self.stop();
            match self.wait() {
                Ok(_) | Err(StreamError::Encode { .. }) => {}
                Err(e) => return Err(e),
            }
        }
        self.target.take().ok_or(StreamError::TargetLost)
    }
}

impl<T: FrameTransport + 'static> Drop for AnimatedStreamer<T> {
    fn drop(&mut self) {
        if self.session.is_some() {
            self.stop();
            let _ = self.wait();
        }
    }
}

/// Clears the running flag when the worker exits, including by panic.
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// ── Worker ────────────────────────────────────────────────────────────────────

fn stream_loop<T: FrameTransport, S: FrameSource>(
    target: &mut T,
    source: &mut S,
    options: StreamOptions,
    stop: &AtomicBool,
) -> Result<StreamSummary, StreamError> {
    let interval = options.effective_interval();
    let count = source.frame_count();
    let animated = count > 1;
    let mut animation_running = animated;
    let mut summary = StreamSummary::default();

    info!(
        to = %target.endpoint(),
        frames = count,
        interval_ms = interval.as_millis() as u64,
        timeout_ms = options.timeout.as_millis() as u64,
        format = ?options.format,
        "stream session started"
    );

    let started = Instant::now();
    let mut elapsed = Duration::ZERO;
    let mut last_transmit: Option<Instant> = None;
    let mut index = 0;

    while elapsed <= options.timeout || animation_running {
        if stop.load(Ordering::Acquire) {
            summary.stopped_early = true;
            break;
        }

        let current = index;
        if animated && index == count - 1 {
            index = 0;
            if elapsed > options.timeout {
                animation_running = false;
            }
        } else if animated {
            index += 1;
        }

        let datagrams = encode(&source.frame(current), options)
            .map_err(|e| StreamError::Encode { index: current, source: e })?;

        if let Some(last) = last_transmit {
            if !pace(last, interval, stop) {
                summary.stopped_early = true;
                break;
            }
        }

        last_transmit = Some(Instant::now());
        match transmit_all(target, &datagrams) {
            Ok(()) => {
                summary.frames_sent += 1;
                debug!(frame = current, datagrams = datagrams.len(), "frame sent");
            }
            Err(e) => {
                summary.send_failures += 1;
                warn!(frame = current, "frame send failed: {e}");
            }
        }
        elapsed = started.elapsed();
    }

    info!(
        sent = summary.frames_sent,
        failed = summary.send_failures,
        stopped = summary.stopped_early,
        "stream session ended"
    );
    Ok(summary)
}

fn encode(frame: &FrameBuffer, options: StreamOptions) -> Result<Vec<Vec<u8>>, FrameError> {
    match options.format {
        StreamFormat::Q7 => Ok(vec![frame.encode_q7(options.offset)?]),
        StreamFormat::Raw => frame.encode_tiles(
            options.offset,
            options.max_datagram.min(MAX_DATAGRAM_SIZE),
        ),
    }
}

fn transmit_all<T: FrameTransport>(
    target: &mut T,
    datagrams: &[Vec<u8>],
) -> Result<(), ft_core::TransmissionError> {
    for datagram in datagrams {
        target.transmit(datagram)?;
    }
    Ok(())
}

/// Sleeps in short slices until `interval` has passed since `last`.
///
/// Returns `false` if `stop` was raised while waiting.
fn pace(last: Instant, interval: Duration, stop: &AtomicBool) -> bool {
    loop {
        if stop.load(Ordering::Acquire) {
            return false;
        }
        let waited = last.elapsed();
        if waited >= interval {
            return true;
        }
        thread::sleep((interval - waited).min(PACING_SLICE));
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
