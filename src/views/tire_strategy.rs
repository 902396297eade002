use itertools::Itertools;

use crate::session::SessionSnapshot;

use super::{
    StrategyRow, TireStrategyView, ViewDeriver, ViewKind, ViewModel, ViewPayload, no_participants,
};

pub struct TireStrategyDeriver;

impl ViewDeriver for TireStrategyDeriver {
    fn kind(&self) -> ViewKind {
        ViewKind::TireStrategy
    }

    fn derive(&self, snapshot: &SessionSnapshot) -> ViewModel {
        derive_tire_strategy(snapshot)
    }
}

/// Compound sequence per participant across all of its laps. Laps report the compounds they ran
/// on, so consecutive repeats of the same compound are a single stint.
pub fn derive_tire_strategy(snapshot: &SessionSnapshot) -> ViewModel {
    if snapshot.participants.is_empty() {
        return no_participants();
    }

    let rows = snapshot
        .unique_participants()
        .filter_map(|participant| {
            let compounds = snapshot
                .laps_for(participant)
                .flat_map(|lap| lap.tire_compounds.iter())
                .map(|compound| compound.trim())
                .filter(|compound| !compound.is_empty())
                .dedup()
                .map(str::to_string)
                .collect::<Vec<_>>();
            (!compounds.is_empty()).then(|| StrategyRow {
                participant: participant.clone(),
                compounds,
            })
        })
        .collect::<Vec<_>>();

    if rows.is_empty() {
        return ViewModel::unavailable("no tire strategy data");
    }
    ViewModel::Ready(ViewPayload::TireStrategy(TireStrategyView { rows }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{LapRecord, ParticipantId};

    fn lap(participant: &str, compounds: &[&str]) -> LapRecord {
        LapRecord {
            participant: participant.into(),
            tire_compounds: compounds.iter().map(|c| c.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_stints_are_collapsed_into_a_path() {
        let snapshot = SessionSnapshot {
            participants: vec!["1".into(), "44".into(), "16".into()],
            laps: vec![
                lap("1", &["Soft"]),
                lap("44", &["Medium", "Hard"]),
                lap("1", &["Soft"]),
                lap("1", &["Medium"]),
                lap("1", &[" Hard ", ""]),
                lap("16", &[]),
            ],
            ..Default::default()
        };

        let ViewModel::Ready(ViewPayload::TireStrategy(view)) = derive_tire_strategy(&snapshot)
        else {
            panic!("expected a ready tire strategy view");
        };

        assert_eq!(view.rows.len(), 2);
        assert_eq!(view.rows[0].participant, ParticipantId::from("1"));
        assert_eq!(view.rows[0].path(), "Soft → Medium → Hard");
        assert_eq!(view.rows[1].path(), "Medium → Hard");
    }

    #[test]
    fn test_no_strategy_for_anyone_is_unavailable() {
        let snapshot = SessionSnapshot {
            participants: vec!["1".into()],
            laps: vec![lap("1", &[])],
            ..Default::default()
        };
        assert_eq!(
            derive_tire_strategy(&snapshot),
            ViewModel::unavailable("no tire strategy data")
        );
    }
}
