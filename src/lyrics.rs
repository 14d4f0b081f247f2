//! The immutable lyrics document.

use crate::error::{LyricSyncError, Result};

/// Duration of a line that stays active until the end of playback.
///
/// Used for the final line when no explicit `[length:..]` tag bounds it.
pub const DURATION_INFINITE: i64 = i64::MAX;

/// A single lyric utterance with an activation window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// Trimmed lyric text.
    pub content: String,
    /// Milliseconds from playback start at which the line becomes active.
    pub start_at: i64,
    /// How long the line remains active, or [`DURATION_INFINITE`].
    pub duration_millis: i64,
}

impl Line {
    pub fn new(content: impl Into<String>, start_at: i64, duration_millis: i64) -> Self {
        Self {
            content: content.into(),
            start_at,
            duration_millis,
        }
    }
}

/// A parsed lyrics document: metadata plus lines in playback order.
///
/// The document is a value type and never mutated by playback; seeking and
/// ticking only touch the player's session state. Fields are only written by
/// the validating constructor, so every document a consumer can hold
/// satisfies the non-negativity invariant; reads go through the accessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lyrics {
    pub(crate) title: String,
    pub(crate) artist: Option<String>,
    pub(crate) album: Option<String>,
    /// Author-declared total length from the `[length:..]` tag.
    pub(crate) duration_millis: Option<i64>,
    pub(crate) lines: Vec<Line>,
}

impl Lyrics {
    /// Construct a document, validating that every line has a non-negative
    /// start time and duration.
    ///
    /// # Errors
    ///
    /// Returns [`LyricSyncError::InvalidLine`] when a line violates the
    /// non-negativity invariant.
    pub fn new(
        title: impl Into<String>,
        artist: Option<String>,
        album: Option<String>,
        duration_millis: Option<i64>,
        lines: Vec<Line>,
    ) -> Result<Self> {
        for line in &lines {
            if line.start_at < 0 {
                return Err(LyricSyncError::InvalidLine {
                    reason: format!("start_at must be >= 0, got {}", line.start_at),
                });
            }
            if line.duration_millis < 0 {
                return Err(LyricSyncError::InvalidLine {
                    reason: format!("duration_millis must be >= 0, got {}", line.duration_millis),
                });
            }
        }
        Ok(Self {
            title: title.into(),
            artist,
            album,
            duration_millis,
            lines,
        })
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn artist(&self) -> Option<&str> {
        self.artist.as_deref()
    }

    #[must_use]
    pub fn album(&self) -> Option<&str> {
        self.album.as_deref()
    }

    /// Author-declared total length, when a `[length:..]` tag was present.
    #[must_use]
    pub fn duration_millis(&self) -> Option<i64> {
        self.duration_millis
    }

    /// Lines in playback order.
    #[must_use]
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Total playback length in milliseconds.
    ///
    /// The explicit `[length:..]` value wins when present; otherwise the
    /// furthest line end is used. A line carrying the infinite sentinel
    /// contributes only its start time, so the fallback never overflows.
    #[must_use]
    pub fn optimal_duration_millis(&self) -> i64 {
        if let Some(duration) = self.duration_millis {
            return duration;
        }
        self.lines
            .iter()
            .map(|line| {
                if line.duration_millis == DURATION_INFINITE {
                    line.start_at
                } else {
                    line.start_at + line.duration_millis
                }
            })
            .max()
            .unwrap_or(0)
    }

    /// Index of the line active at `position`: the greatest index whose start
    /// time is at or before it, or `-1` when no line qualifies.
    #[must_use]
    pub fn line_index_at(&self, position: i64) -> i32 {
        if position < 0 {
            return -1;
        }
        for (i, line) in self.lines.iter().enumerate().rev() {
            if line.start_at <= position {
                return clamped_i32(i);
            }
        }
        -1
    }

    /// Copy of the document with lines stably sorted by start time.
    pub(crate) fn sorted_by_start(&self) -> Self {
        let mut sorted = self.clone();
        sorted.lines.sort_by_key(|line| line.start_at);
        sorted
    }
}

/// Narrow a line index to i32, saturating for absurdly long documents.
pub(crate) fn clamped_i32(value: usize) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}
