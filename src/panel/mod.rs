mod display_list;

use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
};

use log::{error, warn};

pub use display_list::{DisplayList, DrawCommand, PanelRenderer, PointSeries, SeriesStyle};

use crate::{
    PitwallError,
    views::{ViewKind, ViewModel, ViewPayload},
};

/// Text drawn in place of a view that could not be computed or drawn.
pub const PLACEHOLDER_TEXT: &str = "N/A";
const TRACK_OUTLINE_LABEL: &str = "Track";

#[derive(Clone, Debug, PartialEq)]
pub enum PanelStatus {
    Ready,
    Placeholder { reason: String },
}

impl PanelStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, PanelStatus::Ready)
    }
}

/// One region of the dashboard. A panel always has something to show: the latest view that drew
/// cleanly, or the placeholder.
#[derive(Debug)]
pub struct Panel {
    kind: ViewKind,
    title: String,
    last_good_view: Option<ViewPayload>,
    status: PanelStatus,
    target: DisplayList,
}

impl Panel {
    pub fn new(kind: ViewKind) -> Self {
        let mut panel = Self {
            kind,
            title: kind.title().to_string(),
            last_good_view: None,
            status: PanelStatus::Placeholder {
                reason: "waiting for first refresh".to_string(),
            },
            target: DisplayList::default(),
        };
        draw_placeholder(&mut panel.target);
        panel
    }

    pub fn kind(&self) -> ViewKind {
        self.kind
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn status(&self) -> &PanelStatus {
        &self.status
    }

    /// The payload of the last view that rendered successfully, kept across failed ticks.
    pub fn last_good_view(&self) -> Option<&ViewPayload> {
        self.last_good_view.as_ref()
    }

    pub fn display_list(&self) -> &DisplayList {
        &self.target
    }

    /// Replaces the panel's content with `view`. Never fails: anything that goes wrong ends with
    /// the placeholder drawn and the reason kept in the panel status.
    pub fn render(&mut self, view: &ViewModel) -> &PanelStatus {
        let status = render_isolated(&mut self.target, view);
        match (&status, view) {
            (PanelStatus::Ready, ViewModel::Ready(payload)) => {
                self.last_good_view = Some(payload.clone());
            }
            (PanelStatus::Placeholder { reason }, ViewModel::Ready(_)) => {
                let e = PitwallError::RenderFailed {
                    reason: reason.clone(),
                };
                warn!("{}: {}", self.title, e);
            }
            _ => {}
        }
        self.status = status;
        &self.status
    }
}

/// Failure isolating render policy shared by every panel: clear, draw, and fall back to the
/// placeholder on an unavailable view or on any error or panic raised while drawing.
pub fn render_isolated(renderer: &mut dyn PanelRenderer, view: &ViewModel) -> PanelStatus {
    renderer.clear();
    let reason = match view {
        ViewModel::Unavailable(reason) => reason.clone(),
        ViewModel::Ready(payload) => match isolate(|| draw_payload(&mut *renderer, payload)) {
            Ok(()) => return PanelStatus::Ready,
            Err(reason) => reason,
        },
    };
    draw_placeholder(renderer);
    PanelStatus::Placeholder { reason }
}

/// Runs `f`, turning both its error and any panic into a printable reason.
pub(crate) fn isolate<T>(f: impl FnOnce() -> Result<T, PitwallError>) -> Result<T, String> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result.map_err(|e| e.reason()),
        Err(panic) => Err(panic_message(panic.as_ref())),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn draw_placeholder(renderer: &mut dyn PanelRenderer) {
    renderer.clear();
    if let Err(e) = renderer.draw_text(PLACEHOLDER_TEXT) {
        error!("Could not draw panel placeholder: {}", e);
    }
}

fn draw_payload(renderer: &mut dyn PanelRenderer, payload: &ViewPayload) -> Result<(), PitwallError> {
    match payload {
        ViewPayload::Positions(view) => {
            let outline = view.track_outline.iter().map(|outline| PointSeries {
                label: TRACK_OUTLINE_LABEL.to_string(),
                style: SeriesStyle::Outline,
                points: outline.clone(),
            });
            let traces = view.traces.iter().map(|trace| PointSeries {
                label: trace.participant.to_string(),
                style: SeriesStyle::Markers,
                points: trace.points.clone(),
            });
            renderer.draw_points(&outline.chain(traces).collect::<Vec<_>>())
        }
        ViewPayload::TireStrategy(view) => view.rows.iter().try_for_each(|row| {
            renderer.draw_text(&format!("{}: {}", row.participant, row.path()))
        }),
        ViewPayload::LapTimes(view) => {
            let (labels, values): (Vec<String>, Vec<f64>) = view
                .entries
                .iter()
                .map(|entry| (entry.participant.to_string(), entry.seconds))
                .unzip();
            renderer.draw_bars(&labels, &values)
        }
        ViewPayload::Standings(view) => {
            let (labels, weights): (Vec<String>, Vec<f64>) = view
                .slices
                .iter()
                .map(|slice| (slice.participant.to_string(), slice.weight))
                .unzip();
            renderer.draw_pie(&labels, &weights)
        }
    }
}
