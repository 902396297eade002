pub(crate) mod lap_times;
pub(crate) mod positions;
pub(crate) mod standings;
pub(crate) mod tire_strategy;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::session::{ParticipantId, SessionSnapshot};

pub use lap_times::{LapTimesDeriver, derive_lap_times};
pub use positions::{LivePositionsDeriver, PositionsDeriver, derive_positions, live_positions};
pub use standings::{StandingsDeriver, StandingsWeighting, derive_standings};
pub use tire_strategy::{TireStrategyDeriver, derive_tire_strategy};

/// Separator used when printing a tire strategy as a path.
pub const STRATEGY_SEPARATOR: &str = " → ";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ViewKind {
    Positions,
    TireStrategy,
    LapTimes,
    Standings,
}

impl ViewKind {
    pub const ALL: [ViewKind; 4] = [
        ViewKind::Positions,
        ViewKind::TireStrategy,
        ViewKind::LapTimes,
        ViewKind::Standings,
    ];

    /// Panel title shown above the view.
    pub fn title(&self) -> &'static str {
        match self {
            ViewKind::Positions => "Live Driver Positions",
            ViewKind::TireStrategy => "Tyre Strategies",
            ViewKind::LapTimes => "Current Lap Times",
            ViewKind::Standings => "Driver Positions",
        }
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ViewKind::Positions => "positions",
            ViewKind::TireStrategy => "tire strategy",
            ViewKind::LapTimes => "lap times",
            ViewKind::Standings => "standings",
        };
        f.write_str(name)
    }
}

/// Result of deriving one panel's content from a snapshot. There is no third state: a view is
/// either ready to draw or unavailable with a reason.
#[derive(Clone, Debug, PartialEq)]
pub enum ViewModel {
    Ready(ViewPayload),
    Unavailable(String),
}

impl ViewModel {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable(reason.into())
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ViewModel::Ready(_))
    }

    pub fn payload(&self) -> Option<&ViewPayload> {
        match self {
            ViewModel::Ready(payload) => Some(payload),
            ViewModel::Unavailable(_) => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ViewPayload {
    Positions(PositionsView),
    TireStrategy(TireStrategyView),
    LapTimes(LapTimesView),
    Standings(StandingsView),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParticipantTrace {
    pub participant: ParticipantId,
    pub points: Vec<(f64, f64)>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PositionsView {
    pub traces: Vec<ParticipantTrace>,
    pub track_outline: Option<Vec<(f64, f64)>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StrategyRow {
    pub participant: ParticipantId,
    pub compounds: Vec<String>,
}

impl StrategyRow {
    /// Human readable strategy, e.g. "Soft → Medium → Hard".
    pub fn path(&self) -> String {
        self.compounds.join(STRATEGY_SEPARATOR)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TireStrategyView {
    pub rows: Vec<StrategyRow>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LapTimeEntry {
    pub participant: ParticipantId,
    pub seconds: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LapTimesView {
    pub entries: Vec<LapTimeEntry>,
}

impl LapTimesView {
    pub fn seconds_for(&self, participant: &ParticipantId) -> Option<f64> {
        self.entries
            .iter()
            .find(|entry| &entry.participant == participant)
            .map(|entry| entry.seconds)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct StandingsSlice {
    pub participant: ParticipantId,
    pub rank: u32,
    pub weight: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct StandingsView {
    pub slices: Vec<StandingsSlice>,
}

/// A chart kind's derivation from a session snapshot.
///
/// Implementations must be pure with respect to the snapshot: the same snapshot always yields the
/// same view. Insufficient data is reported as `ViewModel::Unavailable`, never as a panic.
pub trait ViewDeriver: Send {
    fn kind(&self) -> ViewKind;
    fn derive(&self, snapshot: &SessionSnapshot) -> ViewModel;
}

/// The four standard dashboard views, primary panel first.
pub fn default_derivers(weighting: StandingsWeighting) -> Vec<Box<dyn ViewDeriver>> {
    vec![
        Box::new(PositionsDeriver),
        Box::new(TireStrategyDeriver),
        Box::new(LapTimesDeriver),
        Box::new(StandingsDeriver::new(weighting)),
    ]
}

/// Shared Unavailable for a snapshot that has no participants at all.
pub(crate) fn no_participants() -> ViewModel {
    ViewModel::unavailable("no participants in session")
}
