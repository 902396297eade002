use std::{f32::consts::TAU, sync::mpsc::Receiver, time::Duration};

use egui::{
    Align2, Color32, FontId, Pos2, Rect, RichText, Shape, Stroke, StrokeKind, Ui, UiBuilder, Vec2,
    ViewportCommand, Visuals, style::Widgets,
};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoints, Points};
use log::debug;
use pitwall::{
    FrameCell, RenderedFrame,
    compose::CellRect,
    dashboard::CancelToken,
    panel::{DrawCommand, PLACEHOLDER_TEXT, PointSeries, SeriesStyle},
};

pub(crate) const PALETTE_BLACK: Color32 = Color32::from_rgb(12, 12, 12);
pub(crate) const PALETTE_MAROON: Color32 = Color32::from_rgb(155, 57, 34);
const BAR_COLOR: Color32 = Color32::RED;
const OUTLINE_COLOR: Color32 = Color32::GRAY;
const SLICE_COLORS: [Color32; 8] = [
    Color32::from_rgb(242, 97, 63),
    Color32::from_rgb(54, 113, 198),
    Color32::from_rgb(39, 244, 210),
    Color32::from_rgb(255, 135, 0),
    Color32::from_rgb(100, 196, 255),
    Color32::from_rgb(232, 0, 45),
    Color32::from_rgb(82, 226, 82),
    Color32::from_rgb(182, 186, 189),
];
/// Widest wedge painted as a single triangle
const MAX_WEDGE_RAD: f32 = 0.1;
const TITLE_FONT_SIZE: f32 = 18.;
const PANEL_TITLE_FONT_SIZE: f32 = 14.;
const PLACEHOLDER_FONT_SIZE: f32 = 24.;

/// Window showing the latest frame composed by the refresh task.
///
/// The app never talks to the session provider itself, it only drains the frame channel and paints
/// whatever arrived last.
pub struct LiveDashboardApp {
    frames: Receiver<RenderedFrame>,
    cancel: CancelToken,
    latest: Option<RenderedFrame>,
    repaint_after: Duration,
}

impl LiveDashboardApp {
    pub fn new(
        frames: Receiver<RenderedFrame>,
        cancel: CancelToken,
        dark_mode: bool,
        repaint_after: Duration,
        cc: &eframe::CreationContext<'_>,
    ) -> Self {
        let visuals = if dark_mode {
            Visuals {
                hyperlink_color: PALETTE_MAROON,
                faint_bg_color: PALETTE_BLACK,
                panel_fill: PALETTE_BLACK,
                widgets: Widgets::dark(),
                striped: false,
                ..Visuals::dark()
            }
        } else {
            Visuals::light()
        };
        cc.egui_ctx.set_visuals(visuals);

        Self {
            frames,
            cancel,
            latest: None,
            repaint_after,
        }
    }
}

impl eframe::App for LiveDashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.cancel.is_cancelled() {
            ctx.send_viewport_cmd(ViewportCommand::Close);
            return;
        }

        // only the newest frame matters, older ones are dropped unseen
        while let Ok(frame) = self.frames.try_recv() {
            debug!("Received frame for tick {}", frame.tick);
            self.latest = Some(frame);
        }

        egui::CentralPanel::default().show(ctx, |ui| match &self.latest {
            Some(frame) => show_frame(ui, frame),
            None => {
                ui.centered_and_justified(|ui| ui.label("Waiting for first refresh..."));
            }
        });

        ctx.request_repaint_after(self.repaint_after);
    }
}

fn show_frame(ui: &mut Ui, frame: &RenderedFrame) {
    let area = ui.max_rect();
    let scale = (area.width() / frame.size.width).min(area.height() / frame.size.height);
    let to_screen = |rect: &CellRect| {
        Rect::from_min_size(
            area.min + Vec2::new(rect.x, rect.y) * scale,
            Vec2::new(rect.width, rect.height) * scale,
        )
    };
    let text_color = ui.visuals().text_color();

    ui.painter().text(
        Pos2::new(area.min.x + frame.size.width * scale / 2., area.min.y + 24. * scale),
        Align2::CENTER_CENTER,
        &frame.title,
        FontId::proportional(TITLE_FONT_SIZE),
        text_color,
    );

    for cell in &frame.cells {
        let rect = to_screen(&cell.rect);
        ui.painter().rect_stroke(
            rect,
            4.,
            Stroke::new(1., ui.visuals().widgets.noninteractive.bg_stroke.color),
            StrokeKind::Inside,
        );
        ui.painter().text(
            rect.center_top() + Vec2::new(0., 12. * scale),
            Align2::CENTER_CENTER,
            &cell.title,
            FontId::proportional(PANEL_TITLE_FONT_SIZE),
            text_color,
        );
        ui.scope_builder(
            UiBuilder::new().max_rect(to_screen(&cell.content_rect)),
            |ui| show_cell_content(ui, cell),
        );
    }
}

fn show_cell_content(ui: &mut Ui, cell: &FrameCell) {
    if !cell.status.is_ready() {
        ui.centered_and_justified(|ui| {
            ui.label(RichText::new(PLACEHOLDER_TEXT).size(PLACEHOLDER_FONT_SIZE))
        });
        return;
    }

    for command in cell.display_list.commands() {
        match command {
            DrawCommand::Points(series) => show_points(ui, &cell.title, series),
            DrawCommand::Bars { labels, values } => show_bars(ui, &cell.title, labels, values),
            DrawCommand::Pie { labels, weights } => show_pie(ui, labels, weights),
            DrawCommand::Text(line) => {
                ui.label(line);
            }
        }
    }
}

fn show_points(ui: &mut Ui, id: &str, series: &[PointSeries]) {
    Plot::new(id)
        .data_aspect(1.)
        .show_axes(false)
        .show_grid(false)
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .legend(Legend::default())
        .show(ui, |plot_ui| {
            for s in series {
                let points = PlotPoints::new(s.points.iter().map(|(x, y)| [*x, *y]).collect());
                match s.style {
                    SeriesStyle::Outline => {
                        plot_ui.line(Line::new(s.label.as_str(), points).color(OUTLINE_COLOR))
                    }
                    SeriesStyle::Markers => {
                        plot_ui.points(Points::new(s.label.as_str(), points).radius(3.))
                    }
                }
            }
        });
}

fn show_bars(ui: &mut Ui, id: &str, labels: &[String], values: &[f64]) {
    let bars = labels
        .iter()
        .zip(values)
        .enumerate()
        .map(|(idx, (label, value))| Bar::new(idx as f64, *value).name(label).fill(BAR_COLOR))
        .collect();
    let axis_labels = labels.to_vec();

    Plot::new(id)
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .show_grid(false)
        .y_axis_label("Lap Time (s)")
        .x_axis_formatter(move |mark, _range| {
            if mark.value.fract() != 0. || mark.value < 0. {
                return String::new();
            }
            axis_labels
                .get(mark.value as usize)
                .cloned()
                .unwrap_or_default()
        })
        .show(ui, |plot_ui| plot_ui.bar_chart(BarChart::new("Lap Time", bars)));
}

/// Pie with percentage labels, painted as a fan of narrow triangles.
fn show_pie(ui: &mut Ui, labels: &[String], weights: &[f64]) {
    let total = weights.iter().sum::<f64>();
    if total <= 0. {
        return;
    }
    let rect = ui.max_rect();
    let center = rect.center();
    let radius = rect.width().min(rect.height()) * 0.4;
    let text_color = ui.visuals().text_color();
    let painter = ui.painter();

    // start at 12 o'clock, going clockwise
    let mut start = -TAU / 4.;
    for (idx, (label, weight)) in labels.iter().zip(weights).enumerate() {
        let sweep = (weight / total) as f32 * TAU;
        let color = SLICE_COLORS[idx % SLICE_COLORS.len()];
        let wedges = (sweep / MAX_WEDGE_RAD).ceil().max(1.) as usize;
        let step = sweep / wedges as f32;
        for w in 0..wedges {
            let a0 = start + step * w as f32;
            let a1 = a0 + step;
            painter.add(Shape::convex_polygon(
                vec![
                    center,
                    center + Vec2::angled(a0) * radius,
                    center + Vec2::angled(a1) * radius,
                ],
                color,
                Stroke::NONE,
            ));
        }

        let mid = start + sweep / 2.;
        painter.text(
            center + Vec2::angled(mid) * radius * 1.15,
            Align2::CENTER_CENTER,
            format!("{}\n{:.1}%", label, weight / total * 100.),
            FontId::proportional(12.),
            text_color,
        );
        start += sweep;
    }
}
