use crate::session::SessionSnapshot;

use super::{
    LapTimeEntry, LapTimesView, ViewDeriver, ViewKind, ViewModel, ViewPayload, no_participants,
};

pub struct LapTimesDeriver;

impl ViewDeriver for LapTimesDeriver {
    fn kind(&self) -> ViewKind {
        ViewKind::LapTimes
    }

    fn derive(&self, snapshot: &SessionSnapshot) -> ViewModel {
        derive_lap_times(snapshot)
    }
}

/// Fastest lap time in seconds for every participant that has a usable one.
pub fn derive_lap_times(snapshot: &SessionSnapshot) -> ViewModel {
    if snapshot.participants.is_empty() {
        return no_participants();
    }

    let entries = snapshot
        .unique_participants()
        .filter_map(|participant| {
            let seconds = snapshot.fastest_lap(participant)?.lap_time_s?;
            Some(LapTimeEntry {
                participant: participant.clone(),
                seconds,
            })
        })
        .collect::<Vec<_>>();

    if entries.is_empty() {
        return ViewModel::unavailable("no valid lap times");
    }
    ViewModel::Ready(ViewPayload::LapTimes(LapTimesView { entries }))
}
