// End to end refresh cycles against scripted session data
//
// Each test drives `Dashboard::refresh_once` directly and checks what ends up in the composed
// frame, without any timer thread involved.

use pitwall::{
    Dashboard, DashboardConfig, MockSessionProvider, PanelStatus, PitwallError, SessionSnapshot,
    ViewDeriver, ViewKind, ViewModel,
    panel::{DrawCommand, PLACEHOLDER_TEXT},
    session::{LapRecord, PositionSample, SessionInfo},
    views::{self, StandingsWeighting, ViewPayload},
};

/// Two cars, one lap each, as seen mid race.
fn two_car_snapshot() -> SessionSnapshot {
    SessionSnapshot {
        info: SessionInfo {
            year: 2024,
            event_name: "Japanese Grand Prix".to_string(),
            session_name: "Race".to_string(),
        },
        participants: vec!["1".into(), "44".into()],
        laps: vec![
            LapRecord {
                participant: "1".into(),
                lap_number: Some(12),
                lap_time_s: Some(92.5),
                tire_compounds: vec!["Soft".to_string(), "Medium".to_string()],
                position: Some(2),
                ..Default::default()
            },
            LapRecord {
                participant: "44".into(),
                lap_number: Some(12),
                lap_time_s: Some(91.8),
                tire_compounds: vec!["Medium".to_string(), "Hard".to_string()],
                position: Some(1),
                ..Default::default()
            },
        ],
        track_geometry: None,
    }
}

fn is_placeholder(status: &PanelStatus) -> bool {
    matches!(status, PanelStatus::Placeholder { .. })
}

struct FailingDeriver;

impl ViewDeriver for FailingDeriver {
    fn kind(&self) -> ViewKind {
        ViewKind::Standings
    }

    fn derive(&self, _: &SessionSnapshot) -> ViewModel {
        ViewModel::unavailable("standings feed dropped")
    }
}

struct PanickingDeriver;

impl ViewDeriver for PanickingDeriver {
    fn kind(&self) -> ViewKind {
        ViewKind::LapTimes
    }

    fn derive(&self, snapshot: &SessionSnapshot) -> ViewModel {
        let first = &snapshot.laps[snapshot.laps.len() + 1];
        ViewModel::unavailable(first.participant.to_string())
    }
}

#[test]
fn test_lap_times_and_equal_standings() {
    let mut dashboard = Dashboard::initialize(
        &DashboardConfig::default(),
        MockSessionProvider::always(two_car_snapshot()),
    )
    .unwrap();

    let frame = dashboard.refresh_once();
    assert_eq!(frame.title, "F1 Live Dashboard - 2024 Japanese Grand Prix");
    assert_eq!(frame.placeholder_count(), 1);

    let lap_times = dashboard.panel(ViewKind::LapTimes).unwrap();
    let Some(ViewPayload::LapTimes(view)) = lap_times.last_good_view() else {
        panic!("lap times should be drawn");
    };
    assert_eq!(view.seconds_for(&"1".into()), Some(92.5));
    assert_eq!(view.seconds_for(&"44".into()), Some(91.8));
    assert_eq!(view.entries.len(), 2);

    let standings = dashboard.panel(ViewKind::Standings).unwrap();
    let Some(ViewPayload::Standings(view)) = standings.last_good_view() else {
        panic!("standings should be drawn");
    };
    assert_eq!(view.slices.len(), 2);
    assert!(view.slices.iter().all(|slice| slice.weight == 1.));

    let strategy = dashboard.panel(ViewKind::TireStrategy).unwrap();
    assert_eq!(
        strategy.display_list().commands(),
        [
            DrawCommand::Text("1: Soft → Medium".to_string()),
            DrawCommand::Text("44: Medium → Hard".to_string()),
        ]
    );

    // no position samples in this snapshot
    let positions = frame.cell(ViewKind::Positions).unwrap();
    assert!(is_placeholder(&positions.status));
}

#[test]
fn test_repeated_participant_ids_draw_once() {
    let mut snapshot = two_car_snapshot();
    snapshot.participants = vec!["1".into(), "44".into(), "1".into(), "44".into()];
    let mut dashboard = Dashboard::initialize(
        &DashboardConfig::default(),
        MockSessionProvider::always(snapshot),
    )
    .unwrap();
    dashboard.refresh_once();

    let lap_times = dashboard.panel(ViewKind::LapTimes).unwrap();
    let [DrawCommand::Bars { labels, .. }] = lap_times.display_list().commands() else {
        panic!("lap times should be one bar chart");
    };
    assert_eq!(labels, &["1", "44"]);

    let standings = dashboard.panel(ViewKind::Standings).unwrap();
    let [DrawCommand::Pie { labels, weights }] = standings.display_list().commands() else {
        panic!("standings should be one pie");
    };
    assert_eq!(labels.len(), 2);
    assert_eq!(weights, &[1., 1.]);

    let strategy = dashboard.panel(ViewKind::TireStrategy).unwrap();
    assert_eq!(strategy.display_list().commands().len(), 2);
}

#[test]
fn test_inverse_rank_weighting() {
    let config = DashboardConfig {
        standings_weighting: StandingsWeighting::InverseRank,
        ..Default::default()
    };
    let mut dashboard =
        Dashboard::initialize(&config, MockSessionProvider::always(two_car_snapshot())).unwrap();
    dashboard.refresh_once();

    let Some(ViewPayload::Standings(view)) = dashboard
        .panel(ViewKind::Standings)
        .and_then(|panel| panel.last_good_view())
    else {
        panic!("standings should be drawn");
    };
    let leader = view.slices.iter().find(|s| s.rank == 1).unwrap();
    let second = view.slices.iter().find(|s| s.rank == 2).unwrap();
    assert!(leader.weight > second.weight);
}

#[test]
fn test_provider_failure_then_recovery() {
    let provider = MockSessionProvider::new(vec![
        Err("timing feed offline".to_string()),
        Ok(two_car_snapshot()),
    ]);
    let mut dashboard = Dashboard::initialize(&DashboardConfig::default(), provider).unwrap();

    let failed = dashboard.refresh_once();
    assert_eq!(failed.cells.len(), 4);
    assert_eq!(failed.placeholder_count(), 4);
    for cell in &failed.cells {
        assert_eq!(
            cell.status,
            PanelStatus::Placeholder {
                reason: "timing feed offline".to_string()
            }
        );
        assert_eq!(
            cell.display_list.commands(),
            [DrawCommand::Text(PLACEHOLDER_TEXT.to_string())]
        );
    }
    assert_eq!(failed.title, "F1 Live Dashboard");

    let recovered = dashboard.refresh_once();
    assert!(recovered.cell(ViewKind::LapTimes).unwrap().status.is_ready());
    assert!(recovered.cell(ViewKind::Standings).unwrap().status.is_ready());
    assert!(recovered.cell(ViewKind::TireStrategy).unwrap().status.is_ready());
    assert_eq!(recovered.tick, 2);
}

#[test]
fn test_empty_session_still_composes() {
    let mut dashboard = Dashboard::initialize(
        &DashboardConfig::default(),
        MockSessionProvider::always(SessionSnapshot::default()),
    )
    .unwrap();

    let frame = dashboard.refresh_once();

    assert_eq!(frame.cells.len(), 4);
    assert_eq!(frame.placeholder_count(), 4);
    assert!(
        frame
            .cells
            .iter()
            .all(|cell| cell.rect.width > 0. && cell.rect.height > 0.)
    );
    assert!(dashboard.panels().all(|panel| panel.last_good_view().is_none()));
}

#[test]
fn test_failing_derivers_are_isolated() {
    let derivers: Vec<Box<dyn ViewDeriver>> = vec![
        Box::new(views::TireStrategyDeriver),
        Box::new(views::PositionsDeriver),
        Box::new(PanickingDeriver),
        Box::new(FailingDeriver),
    ];
    let mut dashboard = Dashboard::with_derivers(
        &DashboardConfig::default(),
        MockSessionProvider::always(two_car_snapshot()),
        derivers,
    )
    .unwrap();

    for tick in 1..=3 {
        let frame = dashboard.refresh_once();
        assert_eq!(frame.tick, tick);
        assert!(frame.cell(ViewKind::TireStrategy).unwrap().status.is_ready());
        assert!(is_placeholder(&frame.cell(ViewKind::LapTimes).unwrap().status));
        assert_eq!(
            frame.cell(ViewKind::Standings).unwrap().status,
            PanelStatus::Placeholder {
                reason: "standings feed dropped".to_string()
            }
        );
    }
}

#[test]
fn test_identical_ticks_render_identically() {
    let mut dashboard = Dashboard::initialize(
        &DashboardConfig::default(),
        MockSessionProvider::always(two_car_snapshot()),
    )
    .unwrap();

    let first = dashboard.refresh_once();
    let second = dashboard.refresh_once();

    assert_eq!(first.cells, second.cells);
    assert_eq!(first.title, second.title);
    assert_ne!(first.tick, second.tick);
}

#[test]
fn test_last_good_view_survives_outage() {
    let provider = MockSessionProvider::new(vec![
        Ok(two_car_snapshot()),
        Err("timing feed offline".to_string()),
    ]);
    let mut dashboard = Dashboard::initialize(&DashboardConfig::default(), provider).unwrap();

    dashboard.refresh_once();
    let frame = dashboard.refresh_once();

    assert_eq!(frame.placeholder_count(), 4);
    let lap_times = dashboard.panel(ViewKind::LapTimes).unwrap();
    assert!(matches!(
        lap_times.last_good_view(),
        Some(ViewPayload::LapTimes(_))
    ));
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = DashboardConfig {
        refresh_interval_ms: 0,
        ..Default::default()
    };
    let result = Dashboard::initialize(&config, MockSessionProvider::always(two_car_snapshot()));
    assert!(matches!(result, Err(PitwallError::InvalidConfig { .. })));
}

#[test]
fn test_one_failing_view_leaves_the_rest_ready() {
    let mut snapshot = two_car_snapshot();
    snapshot.laps[0].position_samples = vec![PositionSample {
        x: 120.,
        y: -40.,
        timestamp_ms: 1_000,
    }];
    snapshot.track_geometry = Some(vec![(0., 0.), (200., 0.), (200., -80.)]);
    let derivers: Vec<Box<dyn ViewDeriver>> = vec![
        Box::new(views::PositionsDeriver),
        Box::new(views::TireStrategyDeriver),
        Box::new(views::LapTimesDeriver),
        Box::new(FailingDeriver),
    ];
    let mut dashboard = Dashboard::with_derivers(
        &DashboardConfig::default(),
        MockSessionProvider::always(snapshot),
        derivers,
    )
    .unwrap();

    for _ in 0..3 {
        let frame = dashboard.refresh_once();
        assert_eq!(frame.placeholder_count(), 1);
        assert!(is_placeholder(&frame.cell(ViewKind::Standings).unwrap().status));
    }

    let positions = dashboard.panel(ViewKind::Positions).unwrap();
    let DrawCommand::Points(series) = &positions.display_list().commands()[0] else {
        panic!("positions should be drawn as points");
    };
    assert_eq!(series.len(), 2);
    assert_eq!(series[0].label, "Track");
    assert_eq!(series[1].label, "1");
}
