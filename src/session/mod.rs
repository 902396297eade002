pub mod provider;

use std::{fmt, time::Duration};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

pub use provider::{FileSessionProvider, MockSessionProvider, ProviderMode, SessionProvider};

/// Opaque participant identifier (car or driver number). Stable for the whole session and
/// used as the join key across every view.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub String);

impl ParticipantId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ParticipantId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    pub x: f64,
    pub y: f64,
    /// Milliseconds since the start of the session
    pub timestamp_ms: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LapRecord {
    pub participant: ParticipantId,
    pub lap_number: Option<u32>,
    /// Lap time in seconds. Missing for laps the provider could not time.
    pub lap_time_s: Option<f64>,
    /// Tire compounds used on this lap, in fitting order
    pub tire_compounds: Vec<String>,
    /// Classified position at the end of the lap
    pub position: Option<u32>,
    pub position_samples: Vec<PositionSample>,
}

impl LapRecord {
    /// The lap time as a `Duration`, or `None` when it is missing or cannot be represented as a
    /// positive, finite number of seconds.
    pub fn lap_time(&self) -> Option<Duration> {
        let seconds = self.lap_time_s?;
        if seconds <= 0. {
            return None;
        }
        Duration::try_from_secs_f64(seconds).ok()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub year: u16,
    pub event_name: String,
    pub session_name: String,
}

impl Default for SessionInfo {
    fn default() -> Self {
        Self {
            year: 0,
            event_name: "Unknown".to_string(),
            session_name: "Race".to_string(),
        }
    }
}

/// Everything the provider reports for one refresh tick. Built fresh every tick and only ever
/// handed out by shared reference.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSnapshot {
    pub info: SessionInfo,
    /// Participants in the provider's reported order
    pub participants: Vec<ParticipantId>,
    pub laps: Vec<LapRecord>,
    pub track_geometry: Option<Vec<(f64, f64)>>,
}

impl SessionSnapshot {
    /// Participants in reported order, each id once even when the provider repeats it.
    pub fn unique_participants(&self) -> impl Iterator<Item = &ParticipantId> {
        self.participants.iter().unique()
    }

    /// Laps for one participant, in the order the provider reported them.
    pub fn laps_for<'s>(
        &'s self,
        participant: &ParticipantId,
    ) -> impl Iterator<Item = &'s LapRecord> {
        self.laps
            .iter()
            .filter(move |lap| &lap.participant == participant)
    }

    /// The participant's fastest lap among the laps with a usable lap time. Ties keep the first
    /// lap in reported order.
    pub fn fastest_lap(&self, participant: &ParticipantId) -> Option<&LapRecord> {
        let mut fastest: Option<(&LapRecord, Duration)> = None;
        for lap in self.laps_for(participant) {
            let Some(lap_time) = lap.lap_time() else {
                continue;
            };
            match fastest {
                Some((_, best)) if lap_time >= best => {}
                _ => fastest = Some((lap, lap_time)),
            }
        }
        fastest.map(|(lap, _)| lap)
    }
}
