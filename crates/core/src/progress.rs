//! Progress inference from worker output lines.
//!
//! The worker has no structured progress channel; it prints lines such as
//! `[3/10] 处理: ...` and finally a completion phrase. A [`ProgressParser`]
//! turns a single line into an optional [`ProgressState`] and holds no state
//! between calls, so it can be swapped without touching process code.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Phrases the worker prints once it reports itself done.
pub const DEFAULT_COMPLETION_MARKERS: [&str; 2] = ["翻译完成", "translation complete"];

/// Regex pattern matching a `[current/total]` counter.
const COUNTER_PATTERN: &str = r"\[(\d+)/(\d+)\]";

static COUNTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(COUNTER_PATTERN).expect("valid regex"));

// ---------------------------------------------------------------------------
// ProgressState
// ---------------------------------------------------------------------------

/// A progress update derived from one line of worker output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressState {
    pub current: u64,
    pub total: u64,
    /// Always within `0..=100`.
    pub percent: u8,
}

impl ProgressState {
    /// Build a counted update. Returns `None` when `total` is zero.
    pub fn counted(current: u64, total: u64) -> Option<Self> {
        percent_of(current, total).map(|percent| Self {
            current,
            total,
            percent,
        })
    }

    /// The "force to 100%" update emitted for a completion marker.
    ///
    /// `total` is the counter seen on the same line, if any.
    pub fn finished(total: Option<u64>) -> Self {
        let total = total.unwrap_or(0);
        Self {
            current: total,
            total,
            percent: 100,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.percent >= 100
    }
}

/// Rounded percentage of `current` over `total`, clamped to 100.
///
/// Rounds half up, computed in integer arithmetic so large counters cannot
/// overflow or lose precision.
pub fn percent_of(current: u64, total: u64) -> Option<u8> {
    if total == 0 {
        return None;
    }
    let total = u128::from(total);
    let scaled = (u128::from(current) * 100 + total / 2) / total;
    Some(scaled.min(100) as u8)
}

/// Extract the first `[current/total]` counter on a line.
///
/// Counters that do not fit in a `u64` are treated as absent.
pub fn parse_counter(line: &str) -> Option<(u64, u64)> {
    let caps = COUNTER_RE.captures(line)?;
    let current = caps[1].parse().ok()?;
    let total = caps[2].parse().ok()?;
    Some((current, total))
}

// ---------------------------------------------------------------------------
// ProgressParser
// ---------------------------------------------------------------------------

/// Strategy for deriving progress from a single output line.
///
/// Implementations must be pure functions of the line.
pub trait ProgressParser: Send + Sync {
    fn interpret(&self, line: &str) -> Option<ProgressState>;
}

/// Default parser: `[current/total]` counters plus completion phrases.
#[derive(Debug, Clone)]
pub struct BracketCounterParser {
    /// Lower-cased completion phrases.
    completion_markers: Vec<String>,
}

impl BracketCounterParser {
    /// Create a parser recognising the given completion phrases.
    ///
    /// Matching is case-insensitive. Blank phrases are ignored.
    pub fn new<I, S>(completion_markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let completion_markers = completion_markers
            .into_iter()
            .map(|m| m.as_ref().trim().to_lowercase())
            .filter(|m| !m.is_empty())
            .collect();
        Self { completion_markers }
    }

    fn has_completion_marker(&self, line: &str) -> bool {
        if self.completion_markers.is_empty() {
            return false;
        }
        let lowered = line.to_lowercase();
        self.completion_markers
            .iter()
            .any(|marker| lowered.contains(marker.as_str()))
    }
}

impl Default for BracketCounterParser {
    fn default() -> Self {
        Self::new(DEFAULT_COMPLETION_MARKERS)
    }
}

impl ProgressParser for BracketCounterParser {
    fn interpret(&self, line: &str) -> Option<ProgressState> {
        let counter = parse_counter(line);
        if self.has_completion_marker(line) {
            return Some(ProgressState::finished(counter.map(|(_, total)| total)));
        }
        let (current, total) = counter?;
        ProgressState::counted(current, total)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
