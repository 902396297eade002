use crate::PitwallError;

/// Drawing primitives a panel can issue. Styling is entirely up to the implementation.
pub trait PanelRenderer {
    fn draw_points(&mut self, series: &[PointSeries]) -> Result<(), PitwallError>;
    fn draw_bars(&mut self, labels: &[String], values: &[f64]) -> Result<(), PitwallError>;
    fn draw_pie(&mut self, labels: &[String], weights: &[f64]) -> Result<(), PitwallError>;
    fn draw_text(&mut self, message: &str) -> Result<(), PitwallError>;
    fn clear(&mut self);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeriesStyle {
    /// Scatter markers, one per point
    Markers,
    /// Connected line through the points, e.g. a track outline
    Outline,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PointSeries {
    pub label: String,
    pub style: SeriesStyle,
    pub points: Vec<(f64, f64)>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    Points(Vec<PointSeries>),
    Bars { labels: Vec<String>, values: Vec<f64> },
    Pie { labels: Vec<String>, weights: Vec<f64> },
    Text(String),
}

impl DrawCommand {
    fn labels(&self) -> Vec<&str> {
        match self {
            DrawCommand::Points(series) => series.iter().map(|s| s.label.as_str()).collect(),
            DrawCommand::Bars { labels, .. } | DrawCommand::Pie { labels, .. } => {
                labels.iter().map(String::as_str).collect()
            }
            DrawCommand::Text(text) => vec![text.as_str()],
        }
    }
}

/// Recording renderer: validates every draw call and keeps the resulting commands so a frame can
/// be painted later, on whatever thread owns the window.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DisplayList {
    commands: Vec<DrawCommand>,
}

impl DisplayList {
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Length in characters of the longest label drawn, used to size label margins.
    pub fn longest_label(&self) -> usize {
        self.commands
            .iter()
            .flat_map(|command| command.labels())
            .map(|label| label.chars().count())
            .max()
            .unwrap_or(0)
    }
}

fn render_failed(reason: impl Into<String>) -> PitwallError {
    PitwallError::RenderFailed {
        reason: reason.into(),
    }
}

fn check_labels(labels: &[String], values: &[f64], what: &str) -> Result<(), PitwallError> {
    if labels.len() != values.len() {
        return Err(render_failed(format!(
            "{} labels for {} {}",
            labels.len(),
            values.len(),
            what
        )));
    }
    if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
        return Err(render_failed(format!("non-finite {what} value {bad}")));
    }
    Ok(())
}

impl PanelRenderer for DisplayList {
    fn draw_points(&mut self, series: &[PointSeries]) -> Result<(), PitwallError> {
        let non_finite = series
            .iter()
            .find(|s| s.points.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()));
        if let Some(series) = non_finite {
            return Err(render_failed(format!(
                "non-finite coordinates in series {}",
                series.label
            )));
        }
        self.commands.push(DrawCommand::Points(series.to_vec()));
        Ok(())
    }

    fn draw_bars(&mut self, labels: &[String], values: &[f64]) -> Result<(), PitwallError> {
        check_labels(labels, values, "bar")?;
        self.commands.push(DrawCommand::Bars {
            labels: labels.to_vec(),
            values: values.to_vec(),
        });
        Ok(())
    }

    fn draw_pie(&mut self, labels: &[String], weights: &[f64]) -> Result<(), PitwallError> {
        check_labels(labels, weights, "slice")?;
        if weights.iter().any(|w| *w < 0.) {
            return Err(render_failed("negative pie slice weight"));
        }
        if weights.iter().sum::<f64>() <= 0. {
            return Err(render_failed("pie slices have no total weight"));
        }
        self.commands.push(DrawCommand::Pie {
            labels: labels.to_vec(),
            weights: weights.to_vec(),
        });
        Ok(())
    }

    fn draw_text(&mut self, message: &str) -> Result<(), PitwallError> {
        self.commands.push(DrawCommand::Text(message.to_string()));
        Ok(())
    }

    fn clear(&mut self) {
        self.commands.clear();
    }
}
