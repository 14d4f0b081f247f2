//! Playback engine for a timed-lyrics document.
//!
//! [`LyricsPlayer`] owns an immutable [`Lyrics`] document and a mutable
//! playback session: a millisecond position, the index of the active line,
//! and a playing flag. While playing, a single background tick task advances
//! the position at a fixed interval, carrying scheduler jitter between
//! segments so the position stays locked to wall time. Consumers poll the
//! accessors or subscribe to the event stream, and drive the session through
//! `play`/`pause`/`seek_to`/`seek_to_line`.

use std::sync::Arc;

use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::config::PlayerConfig;
use crate::error::{LyricSyncError, Result};
use crate::lyrics::{clamped_i32, Lyrics};
use crate::time::{millis_to_duration, DurationExt};

/// Default interval between position updates, in milliseconds.
pub const DEFAULT_TICK_INTERVAL_MILLIS: i64 = 50;

/// Events published by [`LyricsPlayer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    /// Playback (re)started at the given position.
    Started { position: i64 },
    /// Playback was paused; position and active line keep their values.
    Paused { position: i64 },
    /// The clock was moved by a seek.
    Seeked { position: i64 },
    /// The clock advanced by one tick.
    PositionChanged { position: i64 },
    /// The active line changed; `-1` means no line is active.
    LineChanged { index: i32 },
    /// Playback ran to the end of the document.
    Finished { position: i64 },
}

/// Mutable session state shared between command handlers and the tick task.
struct Session {
    position: i64,
    current_line: i32,
    playing: bool,
    playback: Option<PlaybackTask>,
}

/// Handle to the in-flight tick task.
struct PlaybackTask {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl PlaybackTask {
    /// Cancel the task and wait for it to wind down.
    async fn shutdown(self) {
        self.token.cancel();
        let _ = self.handle.await;
    }
}

/// Playback clock over a [`Lyrics`] document.
pub struct LyricsPlayer {
    lyrics: Option<Arc<Lyrics>>,
    line_count: i32,
    tick_millis: i64,
    session: Arc<RwLock<Session>>,
    // Serializes command handlers end to end. The session lock cannot be
    // held across the shutdown await (the ticker needs it to wind down), so
    // takeover atomicity comes from this mutex instead.
    commands: Mutex<()>,
    event_tx: broadcast::Sender<PlayerEvent>,
}

impl LyricsPlayer {
    /// Create a player with the default tick interval.
    #[must_use]
    pub fn new(lyrics: Option<Lyrics>) -> Self {
        Self::build(lyrics, DEFAULT_TICK_INTERVAL_MILLIS)
    }

    /// Create a player ticking every `tick_millis` milliseconds.
    ///
    /// # Errors
    ///
    /// Returns [`LyricSyncError::InvalidTickInterval`] when `tick_millis <= 0`.
    pub fn with_tick_interval(lyrics: Option<Lyrics>, tick_millis: i64) -> Result<Self> {
        if tick_millis <= 0 {
            return Err(LyricSyncError::InvalidTickInterval {
                millis: tick_millis,
            });
        }
        Ok(Self::build(lyrics, tick_millis))
    }

    /// Create a player from a [`PlayerConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`LyricSyncError::InvalidTickInterval`] when the configured
    /// interval is not positive.
    pub fn from_config(lyrics: Option<Lyrics>, config: &PlayerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(lyrics, config.tick_interval_millis))
    }

    fn build(lyrics: Option<Lyrics>, tick_millis: i64) -> Self {
        // Playback walks the lines in start order regardless of input order.
        let lyrics = lyrics.map(|l| Arc::new(l.sorted_by_start()));
        let line_count = lyrics.as_ref().map_or(0, |l| clamped_i32(l.lines.len()));
        let (event_tx, _) = broadcast::channel(64);
        Self {
            lyrics,
            line_count,
            tick_millis,
            session: Arc::new(RwLock::new(Session {
                position: 0,
                current_line: -1,
                playing: false,
                playback: None,
            })),
            commands: Mutex::new(()),
            event_tx,
        }
    }

    /// The document this player was created with, lines sorted by start time.
    #[must_use]
    pub fn lyrics(&self) -> Option<&Lyrics> {
        self.lyrics.as_deref()
    }

    /// Subscribe to state-change events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.event_tx.subscribe()
    }

    /// Current playback position in milliseconds.
    pub async fn position(&self) -> i64 {
        self.session.read().await.position
    }

    /// Index of the active line, or `-1` before the first line and in gaps.
    pub async fn current_line_index(&self) -> i32 {
        self.session.read().await.current_line
    }

    /// Whether the tick task is advancing the position.
    pub async fn is_playing(&self) -> bool {
        self.session.read().await.playing
    }

    /// Start or restart ticking from the current position.
    ///
    /// A silent no-op when there is nothing to play: no document, no lines,
    /// or a position outside `[0, optimal_duration_millis]`.
    pub async fn play(&self) {
        let _commands = self.commands.lock().await;
        self.start_playback().await;
    }

    /// The takeover itself; callers must hold the command mutex.
    async fn start_playback(&self) {
        let Some(lyrics) = self.lyrics.as_ref() else {
            return;
        };
        if lyrics.lines.is_empty() {
            return;
        }

        let previous = {
            let mut session = self.session.write().await;
            if session.position < 0 || session.position > lyrics.optimal_duration_millis() {
                debug!(position = session.position, "position out of range, not starting");
                return;
            }
            session.playback.take()
        };
        // At most one tick task may be alive; wait the old one out before
        // spawning its replacement.
        if let Some(task) = previous {
            task.shutdown().await;
        }

        let mut session = self.session.write().await;
        session.playing = true;
        session.current_line = lyrics.line_index_at(session.position);
        let position = session.position;

        let token = CancellationToken::new();
        let ticker = Ticker {
            lyrics: Arc::clone(lyrics),
            line_count: self.line_count,
            end_at: lyrics.optimal_duration_millis(),
            tick_millis: self.tick_millis,
            token: token.clone(),
            session: Arc::clone(&self.session),
            event_tx: self.event_tx.clone(),
        };
        let handle = tokio::spawn(ticker.run());
        session.playback = Some(PlaybackTask { token, handle });
        drop(session);

        debug!(position, "playback started");
        let _ = self.event_tx.send(PlayerEvent::Started { position });
    }

    /// Stop ticking; position and the active line keep their last values.
    ///
    /// Idempotent: a second call finds nothing to cancel and emits nothing.
    pub async fn pause(&self) {
        let _commands = self.commands.lock().await;
        let (was_playing, position, task) = {
            let mut session = self.session.write().await;
            let was_playing = session.playing;
            session.playing = false;
            (was_playing, session.position, session.playback.take())
        };
        if let Some(task) = task {
            task.shutdown().await;
        }
        if was_playing {
            debug!(position, "playback paused");
            let _ = self.event_tx.send(PlayerEvent::Paused { position });
        }
    }

    /// Move the clock to `position`, resuming playback if it was running.
    ///
    /// The position is taken as-is, without clamping; `play` refuses to start
    /// from a position outside the document, so seeking out of range parks
    /// the player until a seek brings it back.
    pub async fn seek_to(&self, position: i64) {
        let _commands = self.commands.lock().await;
        let (was_playing, task, line_change) = {
            let mut session = self.session.write().await;
            let was_playing = session.playing;
            let task = if was_playing {
                session.playback.take()
            } else {
                None
            };
            session.position = position;
            let mut line_change = None;
            if !was_playing {
                let index = self
                    .lyrics
                    .as_ref()
                    .map_or(-1, |l| l.line_index_at(position));
                if session.current_line != index {
                    session.current_line = index;
                    line_change = Some(index);
                }
            }
            (was_playing, task, line_change)
        };
        if let Some(task) = task {
            task.shutdown().await;
        }

        debug!(position, "seek");
        let _ = self.event_tx.send(PlayerEvent::Seeked { position });
        if let Some(index) = line_change {
            let _ = self.event_tx.send(PlayerEvent::LineChanged { index });
        }
        if was_playing {
            self.start_playback().await;
        }
    }

    /// Jump to the start of the line at `index`.
    ///
    /// The index is clamped to `[-1, line_count - 1]`; `-1` seeks to
    /// position 0.
    pub async fn seek_to_line(&self, index: i32) {
        let Some(lyrics) = self.lyrics.as_ref() else {
            return;
        };
        let index = index.clamp(-1, self.line_count - 1);
        let position = usize::try_from(index)
            .ok()
            .and_then(|i| lyrics.lines.get(i))
            .map_or(0, |line| line.start_at);
        self.seek_to(position).await;
    }
}

/// Background task that advances the session clock through line and gap
/// segments.
///
/// Each segment is ticked in whole intervals plus a remainder; the measured
/// difference between intended and actual elapsed time is carried into the
/// next segment as a deviation, so cumulative scheduling jitter never drifts
/// the position away from wall time.
struct Ticker {
    lyrics: Arc<Lyrics>,
    line_count: i32,
    /// Document end, resolved once at spawn; checked on every tick.
    end_at: i64,
    tick_millis: i64,
    token: CancellationToken,
    session: Arc<RwLock<Session>>,
    event_tx: broadcast::Sender<PlayerEvent>,
}

impl Ticker {
    async fn run(self) {
        self.drive().await;
        if self.token.is_cancelled() {
            return;
        }
        // Natural completion. A concurrent pause has already cleared the
        // flag and owns the final state; leave everything alone then.
        let mut session = self.session.write().await;
        if session.playing {
            session.playing = false;
            let position = session.position;
            drop(session);
            debug!(position, "playback finished");
            let _ = self.event_tx.send(PlayerEvent::Finished { position });
        }
    }

    async fn drive(&self) {
        let lines = &self.lyrics.lines;
        let mut index = self.lyrics.line_index_at(self.position().await);
        let mut deviation: i64 = 0;

        while index < self.line_count && !self.stopped().await {
            self.publish_line(index).await;

            let duration = if index < 0 {
                // Lead-in before the first line becomes active.
                lines[0].start_at - self.position().await
            } else {
                lines[to_index(index)].duration_millis
            };
            deviation = self.tick_segment(duration.saturating_add(deviation)).await;
            if self.stopped().await {
                return;
            }

            if index >= 0 && index < self.line_count - 1 {
                let line = &lines[to_index(index)];
                let stop_at = line.start_at.saturating_add(line.duration_millis);
                let gap = lines[to_index(index + 1)].start_at - stop_at;
                if gap > 0 {
                    // No line is active between the two.
                    self.publish_line(-1).await;
                    let adjusted = gap + deviation;
                    if adjusted > 0 {
                        deviation = self.tick_segment(adjusted).await;
                    } else {
                        // The backlog swallows the whole gap; carry the
                        // excess forward instead of ticking.
                        deviation = adjusted;
                    }
                }
                if self.stopped().await {
                    return;
                }
            }

            index += 1;
        }
    }

    /// Tick through a segment of `duration` millis, returning the deviation
    /// (intended minus actually elapsed) to fold into the next segment.
    async fn tick_segment(&self, duration: i64) -> i64 {
        if duration <= 0 {
            return 0;
        }

        let ticks = duration / self.tick_millis;
        let remainder = duration % self.tick_millis;

        let started = Instant::now();
        let mut completed: i64 = 0;
        while completed < ticks && !self.stopped().await {
            if !self.wait(self.tick_millis).await {
                return completed * self.tick_millis - started.elapsed().as_millis_i64();
            }
            self.advance(self.tick_millis).await;
            completed += 1;
        }
        let mut deviation = completed * self.tick_millis - started.elapsed().as_millis_i64();
        if self.stopped().await {
            return deviation;
        }

        if remainder > 0 {
            let started = Instant::now();
            if self.wait(remainder).await {
                self.advance(remainder).await;
                deviation += remainder - started.elapsed().as_millis_i64();
            }
        }
        deviation
    }

    /// Sleep for `millis` unless cancelled first; true when the wait ran out.
    async fn wait(&self, millis: i64) -> bool {
        tokio::select! {
            () = self.token.cancelled() => false,
            () = tokio::time::sleep(millis_to_duration(millis)) => true,
        }
    }

    async fn advance(&self, millis: i64) {
        let position = {
            let mut session = self.session.write().await;
            session.position += millis;
            session.position
        };
        trace!(position, "tick");
        let _ = self.event_tx.send(PlayerEvent::PositionChanged { position });
    }

    async fn publish_line(&self, index: i32) {
        let changed = {
            let mut session = self.session.write().await;
            let changed = session.current_line != index;
            session.current_line = index;
            changed
        };
        if changed {
            trace!(index, "active line changed");
            let _ = self.event_tx.send(PlayerEvent::LineChanged { index });
        }
    }

    async fn position(&self) -> i64 {
        self.session.read().await.position
    }

    /// Cooperative stop condition, checked after every suspension point.
    async fn stopped(&self) -> bool {
        if self.token.is_cancelled() {
            return true;
        }
        let session = self.session.read().await;
        !session.playing || session.position >= self.end_at
    }
}

fn to_index(index: i32) -> usize {
    usize::try_from(index).unwrap_or_default()
}
