use crate::{
    PitwallError,
    config::{FrameSize, PanelLayout},
    panel::{DisplayList, DrawCommand, Panel, PanelStatus},
    views::ViewKind,
};

const OUTER_MARGIN: f32 = 10.;
const CELL_GAP: f32 = 12.;
const HEADER_HEIGHT: f32 = 32.;
const PANEL_TITLE_HEIGHT: f32 = 24.;
const LABEL_CHAR_WIDTH: f32 = 7.;
const MAX_LABEL_MARGIN_SHARE: f32 = 0.35;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CellRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl CellRect {
    fn inset(&self, top: f32, right: f32, bottom: f32, left: f32) -> Self {
        Self {
            x: self.x + left,
            y: self.y + top,
            width: (self.width - left - right).max(0.),
            height: (self.height - top - bottom).max(0.),
        }
    }
}

/// One composed panel: what to draw and where.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameCell {
    pub kind: ViewKind,
    pub title: String,
    pub status: PanelStatus,
    pub display_list: DisplayList,
    pub row: usize,
    pub col: usize,
    /// Whole cell, title included
    pub rect: CellRect,
    /// Area left for the chart once title and label margins are taken out
    pub content_rect: CellRect,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenderedFrame {
    pub title: String,
    pub tick: u64,
    pub size: FrameSize,
    pub dark_mode: bool,
    pub cells: Vec<FrameCell>,
}

impl RenderedFrame {
    pub fn cell(&self, kind: ViewKind) -> Option<&FrameCell> {
        self.cells.iter().find(|cell| cell.kind == kind)
    }

    pub fn placeholder_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|cell| !cell.status.is_ready())
            .count()
    }
}

pub struct FrameComposer {
    layout: PanelLayout,
    size: FrameSize,
    dark_mode: bool,
}

impl FrameComposer {
    pub fn new(
        layout: PanelLayout,
        size: FrameSize,
        dark_mode: bool,
        panel_count: usize,
    ) -> Result<Self, PitwallError> {
        if panel_count > layout.capacity() {
            return Err(PitwallError::InvalidLayout {
                reason: format!(
                    "{} panels do not fit a {}x{} grid",
                    panel_count, layout.rows, layout.cols
                ),
            });
        }
        Ok(Self {
            layout,
            size,
            dark_mode,
        })
    }

    /// Lays the panels out from scratch. Nothing is carried over from previous frames since the
    /// label margins depend on what each panel drew this tick.
    pub fn compose<'p>(
        &self,
        panels: impl IntoIterator<Item = &'p Panel>,
        title: &str,
        tick: u64,
    ) -> RenderedFrame {
        let PanelLayout {
            rows,
            cols,
            primary_width_ratio,
        } = self.layout;

        let usable_width =
            self.size.width - 2. * OUTER_MARGIN - CELL_GAP * cols.saturating_sub(1) as f32;
        let usable_height = self.size.height
            - 2. * OUTER_MARGIN
            - HEADER_HEIGHT
            - CELL_GAP * rows.saturating_sub(1) as f32;
        let row_height = (usable_height / rows.max(1) as f32).max(0.);

        let cells = panels
            .into_iter()
            .enumerate()
            .map(|(idx, panel)| {
                let (row, col) = (idx / cols, idx % cols);
                let weights = (0..cols)
                    .map(|c| {
                        if row == 0 && c == 0 {
                            primary_width_ratio
                        } else {
                            1.
                        }
                    })
                    .collect::<Vec<f32>>();
                let total_weight = weights.iter().sum::<f32>();
                let unit = (usable_width / total_weight).max(0.);
                let x = OUTER_MARGIN
                    + weights[..col].iter().map(|w| w * unit).sum::<f32>()
                    + CELL_GAP * col as f32;
                let y = OUTER_MARGIN + HEADER_HEIGHT + (row_height + CELL_GAP) * row as f32;
                let rect = CellRect {
                    x,
                    y,
                    width: weights[col] * unit,
                    height: row_height,
                };

                FrameCell {
                    kind: panel.kind(),
                    title: panel.title().to_string(),
                    status: panel.status().clone(),
                    display_list: panel.display_list().clone(),
                    row,
                    col,
                    content_rect: fit_content(&rect, panel.display_list()),
                    rect,
                }
            })
            .collect();

        RenderedFrame {
            title: title.to_string(),
            tick,
            size: self.size,
            dark_mode: self.dark_mode,
            cells,
        }
    }
}

/// Content area of a cell, leaving room for the title and for the labels drawn this tick.
fn fit_content(rect: &CellRect, display_list: &DisplayList) -> CellRect {
    let max_margin = MAX_LABEL_MARGIN_SHARE * rect.width.min(rect.height);
    let label_margin = (display_list.longest_label() as f32 * LABEL_CHAR_WIDTH).min(max_margin);

    let (mut bottom, mut sides) = (0., 0.);
    for command in display_list.commands() {
        match command {
            // rotated axis labels
            DrawCommand::Bars { .. } => bottom = label_margin * std::f32::consts::FRAC_1_SQRT_2,
            DrawCommand::Pie { .. } => sides = label_margin,
            DrawCommand::Points(_) | DrawCommand::Text(_) => {}
        }
    }
    rect.inset(PANEL_TITLE_HEIGHT, sides, bottom, sides)
}
