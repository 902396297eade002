use crate::session::{LapRecord, ParticipantId, SessionSnapshot};

use super::{
    ParticipantTrace, PositionsView, ViewDeriver, ViewKind, ViewModel, ViewPayload,
    no_participants,
};

pub struct PositionsDeriver;

impl ViewDeriver for PositionsDeriver {
    fn kind(&self) -> ViewKind {
        ViewKind::Positions
    }

    fn derive(&self, snapshot: &SessionSnapshot) -> ViewModel {
        derive_positions(snapshot)
    }
}

/// Follows every participant's fastest lap, for the standalone live positions feed.
pub struct LivePositionsDeriver;

impl ViewDeriver for LivePositionsDeriver {
    fn kind(&self) -> ViewKind {
        ViewKind::Positions
    }

    fn derive(&self, snapshot: &SessionSnapshot) -> ViewModel {
        live_positions(snapshot)
    }
}

/// Latest known car positions: for every participant, the samples of the most recent lap that
/// has any. Participants without samples are left out.
pub fn derive_positions(snapshot: &SessionSnapshot) -> ViewModel {
    traces_view(snapshot, |participant| {
        snapshot
            .laps_for(participant)
            .filter(|lap| !lap.position_samples.is_empty())
            .last()
    })
}

/// Positions as shown by the live positions feed: the samples of each participant's fastest lap.
pub fn live_positions(snapshot: &SessionSnapshot) -> ViewModel {
    traces_view(snapshot, |participant| {
        snapshot
            .fastest_lap(participant)
            .filter(|lap| !lap.position_samples.is_empty())
    })
}

fn traces_view<'s>(
    snapshot: &'s SessionSnapshot,
    pick_lap: impl Fn(&ParticipantId) -> Option<&'s LapRecord>,
) -> ViewModel {
    if snapshot.participants.is_empty() {
        return no_participants();
    }

    let traces = snapshot
        .unique_participants()
        .filter_map(|participant| {
            let lap = pick_lap(participant)?;
            Some(ParticipantTrace {
                participant: participant.clone(),
                points: lap
                    .position_samples
                    .iter()
                    .map(|sample| (sample.x, sample.y))
                    .collect(),
            })
        })
        .collect::<Vec<_>>();

    if traces.is_empty() {
        return ViewModel::unavailable("no position samples for any participant");
    }

    ViewModel::Ready(ViewPayload::Positions(PositionsView {
        traces,
        track_outline: snapshot
            .track_geometry
            .clone()
            .filter(|outline| !outline.is_empty()),
    }))
}
