pub mod task;

use std::{ops::ControlFlow, sync::mpsc::Sender, time::Instant};

use log::{debug, info, warn};
use simple_moving_average::{SMA, SumTreeSMA};

pub use task::{CancelToken, PollingTask, TickSchedule};

use crate::{
    PitwallError,
    compose::{FrameComposer, RenderedFrame},
    config::{DashboardConfig, PanelLayout},
    panel::{Panel, isolate},
    session::{SessionInfo, SessionProvider, SessionSnapshot},
    views::{self, ViewDeriver, ViewKind, ViewModel},
};

const DASHBOARD_TITLE: &str = "F1 Live Dashboard";
const TICK_HISTORY: usize = 20;

/// Controller states for one refresh cycle. `Stopped` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DashboardState {
    Idle,
    Fetching,
    Deriving,
    Rendering,
    Composed,
    Stopped,
}

struct PanelSlot {
    deriver: Box<dyn ViewDeriver>,
    panel: Panel,
}

/// Drives the fetch, derive, render and compose cycle for one session.
pub struct Dashboard<P: SessionProvider> {
    provider: P,
    slots: Vec<PanelSlot>,
    composer: FrameComposer,
    config: DashboardConfig,
    state: DashboardState,
    title: String,
    tick_count: u64,
    tick_durations_ms: SumTreeSMA<f64, f64, TICK_HISTORY>,
}

impl<P: SessionProvider> Dashboard<P> {
    /// The standard four-panel dashboard.
    pub fn initialize(config: &DashboardConfig, provider: P) -> Result<Self, PitwallError> {
        Self::with_derivers(
            config,
            provider,
            views::default_derivers(config.standings_weighting),
        )
    }

    /// A single-panel dashboard following every participant's fastest lap, refreshed at the live
    /// positions interval.
    pub fn live_positions(config: &DashboardConfig, provider: P) -> Result<Self, PitwallError> {
        let config = DashboardConfig {
            refresh_interval_ms: config.live_positions_interval_ms,
            panel_layout: PanelLayout::single(),
            ..config.clone()
        };
        Self::with_derivers(&config, provider, vec![Box::new(views::LivePositionsDeriver)])
    }

    /// Builds a dashboard with one panel per deriver, in order. The first deriver feeds the
    /// primary panel.
    pub fn with_derivers(
        config: &DashboardConfig,
        provider: P,
        derivers: Vec<Box<dyn ViewDeriver>>,
    ) -> Result<Self, PitwallError> {
        config.validate()?;
        let composer = FrameComposer::new(
            config.panel_layout,
            config.frame_size,
            config.dark_mode,
            derivers.len(),
        )?;
        let slots = derivers
            .into_iter()
            .map(|deriver| PanelSlot {
                panel: Panel::new(deriver.kind()),
                deriver,
            })
            .collect();

        Ok(Self {
            provider,
            slots,
            composer,
            config: config.clone(),
            state: DashboardState::Idle,
            title: DASHBOARD_TITLE.to_string(),
            tick_count: 0,
            tick_durations_ms: SumTreeSMA::new(),
        })
    }

    pub fn state(&self) -> DashboardState {
        self.state
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn panels(&self) -> impl Iterator<Item = &Panel> {
        self.slots.iter().map(|slot| &slot.panel)
    }

    pub fn panel(&self, kind: ViewKind) -> Option<&Panel> {
        self.panels().find(|panel| panel.kind() == kind)
    }

    /// Rolling average duration of the last refresh cycles.
    pub fn average_tick_ms(&self) -> f64 {
        self.tick_durations_ms.get_average()
    }

    /// Runs exactly one fetch, derive, render and compose cycle. A failing provider, deriver or
    /// draw call only ever turns panels into placeholders; the frame always composes.
    ///
    /// Once stopped the dashboard no longer fetches and returns its last panels as they are.
    pub fn refresh_once(&mut self) -> RenderedFrame {
        if self.state == DashboardState::Stopped {
            warn!("Refresh requested on a stopped dashboard, skipping fetch");
            return self.compose();
        }
        let started = Instant::now();

        self.state = DashboardState::Fetching;
        let provider = &mut self.provider;
        let snapshot = isolate(|| provider.snapshot())
            .map_err(|reason| PitwallError::ProviderUnavailable { reason });

        self.state = DashboardState::Deriving;
        let views = match &snapshot {
            Ok(snapshot) => {
                self.title = frame_title(&snapshot.info);
                self.slots
                    .iter()
                    .map(|slot| derive_isolated(slot.deriver.as_ref(), snapshot))
                    .collect::<Vec<_>>()
            }
            Err(e) => {
                warn!("Session data unavailable this tick: {}", e);
                vec![ViewModel::unavailable(e.reason()); self.slots.len()]
            }
        };

        self.state = DashboardState::Rendering;
        for (slot, view) in self.slots.iter_mut().zip(views.iter()) {
            slot.panel.render(view);
        }

        self.tick_count += 1;
        self.state = DashboardState::Composed;
        let frame = self.compose();

        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.;
        self.tick_durations_ms.add_sample(elapsed_ms);
        debug!(
            "Tick {} composed in {:.1}ms ({} placeholders, avg {:.1}ms)",
            self.tick_count,
            elapsed_ms,
            frame.placeholder_count(),
            self.average_tick_ms()
        );
        if elapsed_ms > self.config.refresh_interval_ms as f64 {
            warn!(
                "Tick {} took {:.0}ms, longer than the {}ms refresh interval",
                self.tick_count, elapsed_ms, self.config.refresh_interval_ms
            );
        }

        self.state = DashboardState::Idle;
        frame
    }

    fn compose(&self) -> RenderedFrame {
        self.composer
            .compose(self.panels(), &self.title, self.tick_count)
    }

    /// Moves into the terminal state. Further `refresh_once` calls no longer reach the provider.
    pub fn stop(&mut self) {
        if self.state != DashboardState::Stopped {
            info!("Dashboard stopped after {} ticks", self.tick_count);
        }
        self.state = DashboardState::Stopped;
    }
}

impl<P: SessionProvider + Send + 'static> Dashboard<P> {
    /// Starts refreshing on a dedicated timer thread, sending every composed frame to `frames`.
    /// The task ends by itself once the receiving side hangs up.
    pub fn start(self, frames: Sender<RenderedFrame>) -> Result<DashboardHandle<P>, PitwallError> {
        let interval = self.config.refresh_interval();
        info!(
            "Starting dashboard refresh every {}ms with {} panels",
            interval.as_millis(),
            self.slots.len()
        );
        let task = PollingTask::spawn("pitwall-refresh", interval, self, move |dashboard| {
            let frame = dashboard.refresh_once();
            if frames.send(frame).is_err() {
                info!("Frame receiver closed, stopping refresh");
                return ControlFlow::Break(());
            }
            ControlFlow::Continue(())
        })?;
        Ok(DashboardHandle { task })
    }
}

/// A running dashboard. Dropping the handle stops the timer as well.
pub struct DashboardHandle<P: SessionProvider + Send + 'static> {
    task: PollingTask<Dashboard<P>>,
}

impl<P: SessionProvider + Send + 'static> DashboardHandle<P> {
    pub fn cancel_token(&self) -> CancelToken {
        self.task.cancel_token()
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Cancels the timer and waits for an in-flight tick to finish. No tick starts after this
    /// returns. Gives the stopped dashboard back, unless the refresh thread panicked.
    pub fn stop(self) -> Option<Dashboard<P>> {
        let mut dashboard = self.task.stop()?;
        dashboard.stop();
        Some(dashboard)
    }
}

/// Runs a deriver inside its own failure boundary.
fn derive_isolated(deriver: &dyn ViewDeriver, snapshot: &SessionSnapshot) -> ViewModel {
    isolate(|| Ok(deriver.derive(snapshot))).unwrap_or_else(|reason| {
        let e = PitwallError::ViewDerivationFailed {
            view: deriver.kind().to_string(),
            reason,
        };
        warn!("{}", e);
        ViewModel::unavailable(e.reason())
    })
}

fn frame_title(info: &SessionInfo) -> String {
    if info.year == 0 {
        format!("{} - {}", DASHBOARD_TITLE, info.event_name)
    } else {
        format!("{} - {} {}", DASHBOARD_TITLE, info.year, info.event_name)
    }
}
