use serde::{Deserialize, Serialize};

use crate::session::SessionSnapshot;

use super::{
    StandingsSlice, StandingsView, ViewDeriver, ViewKind, ViewModel, ViewPayload, no_participants,
};

/// How a rank turns into a share of the standings chart.
///
/// Ranks are ordinal, so no weighting makes the slice sizes numerically meaningful. `Equal` draws
/// one identical slice per ranked participant and is the default; `InverseRank` gives leading
/// participants visibly larger slices.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StandingsWeighting {
    #[default]
    Equal,
    InverseRank,
}

impl StandingsWeighting {
    pub fn weight(&self, rank: u32) -> f64 {
        match self {
            StandingsWeighting::Equal => 1.,
            StandingsWeighting::InverseRank => 1. / rank.max(1) as f64,
        }
    }
}

pub struct StandingsDeriver {
    weighting: StandingsWeighting,
}

impl StandingsDeriver {
    pub fn new(weighting: StandingsWeighting) -> Self {
        Self { weighting }
    }
}

impl ViewDeriver for StandingsDeriver {
    fn kind(&self) -> ViewKind {
        ViewKind::Standings
    }

    fn derive(&self, snapshot: &SessionSnapshot) -> ViewModel {
        derive_standings(snapshot, self.weighting)
    }
}

/// Rank of every participant's fastest lap, weighted into chart slices.
pub fn derive_standings(snapshot: &SessionSnapshot, weighting: StandingsWeighting) -> ViewModel {
    if snapshot.participants.is_empty() {
        return no_participants();
    }

    let slices = snapshot
        .unique_participants()
        .filter_map(|participant| {
            let rank = snapshot.fastest_lap(participant)?.position?;
            Some(StandingsSlice {
                participant: participant.clone(),
                rank,
                weight: weighting.weight(rank),
            })
        })
        .collect::<Vec<_>>();

    if slices.is_empty() {
        return ViewModel::unavailable("no ranked laps");
    }
    ViewModel::Ready(ViewPayload::Standings(StandingsView { slices }))
}
