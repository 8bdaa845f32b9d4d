//! Loaded session snapshot

use serde::{Deserialize, Serialize};
use std::fmt;

use super::LapTable;

/// Identifies one session at the data provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
pub struct SessionKey {
    pub year: u16,
    /// Grand Prix name or location
    pub event: String,
    /// FP1, FP2, FP3, Q, S or R
    pub session_type: String,
}

impl SessionKey {
    pub fn new(year: u16, event: impl Into<String>, session_type: impl Into<String>) -> Self {
        Self { year, event: event.into(), session_type: session_type.into() }
    }

    /// Whether the session is a race, where gap analysis applies.
    pub fn is_race(&self) -> bool {
        matches!(self.session_type.to_ascii_uppercase().as_str(), "R" | "RACE" | "S" | "SPRINT")
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.year, self.event, self.session_type)
    }
}

/// Corner marker along the lap, used by presentation overlays.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct Corner {
    pub number: u32,
    /// Metres from the start line
    pub distance: f64,
}

/// Kind of event weekend a session belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionMode {
    TestDay,
    RaceWeekend,
}

impl SessionMode {
    /// Classify a session by its display name.
    pub fn detect(session_name: &str) -> Self {
        let name = session_name.to_lowercase();
        if name.contains("test") || name.contains("shakedown") {
            SessionMode::TestDay
        } else {
            SessionMode::RaceWeekend
        }
    }
}

/// Immutable snapshot of one loaded session.
///
/// Analysis functions receive this explicitly; nothing in the crate holds a
/// "current" session, so any number of sessions can be analysed at once.
#[derive(Debug, Clone)]
pub struct Session {
    pub key: SessionKey,
    pub laps: LapTable,
    pub corners: Vec<Corner>,
}

impl Session {
    pub fn new(key: SessionKey, laps: LapTable) -> Self {
        Self { key, laps, corners: Vec::new() }
    }

    pub fn with_corners(mut self, corners: Vec<Corner>) -> Self {
        self.corners = corners;
        self
    }
}
