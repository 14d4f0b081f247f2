//! Timed-lyrics parsing and playback synchronization.
//!
//! Two pieces, parser feeding engine:
//!
//! - [`lrc::parse`] turns LRC-formatted text into an immutable [`Lyrics`]
//!   document with lines sorted by start time and durations derived from the
//!   gaps between them.
//! - [`LyricsPlayer`] drives a document: it owns a millisecond playback
//!   clock, resolves the active line, and runs a cancellable, drift-corrected
//!   tick task with idempotent play/pause/seek commands.
//!
//! Rendering, effects, and input handling live elsewhere; they observe the
//! player's state (position, active line index, playing flag) through the
//! accessors or the event stream and issue commands back into it.
//!
//! ```no_run
//! use lyricsync::{lrc, LyricsPlayer, PlayerEvent};
//!
//! # async fn demo() -> lyricsync::Result<()> {
//! let lyrics = lrc::parse("[length:00:10.00]\n[00:01.00]Hello\n[00:04.00]World")?;
//! let player = LyricsPlayer::new(lyrics);
//! let mut events = player.subscribe();
//! player.play().await;
//! while let Ok(event) = events.recv().await {
//!     if let PlayerEvent::LineChanged { index } = event {
//!         println!("active line: {index}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod lrc;
pub mod lyrics;
pub mod player;
pub mod time;

pub use config::PlayerConfig;
pub use error::{LyricSyncError, Result};
pub use lyrics::{Line, Lyrics, DURATION_INFINITE};
pub use player::{LyricsPlayer, PlayerEvent, DEFAULT_TICK_INTERVAL_MILLIS};
pub use time::DurationExt;
