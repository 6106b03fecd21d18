use boardview_core::chart::{ChartHandle, Rgba};
use boardview_core::BoardViewModel;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

/// Rows taken by a drawn chart: borders, the bar and the legend.
const CHART_HEIGHT: u16 = 5;

/// Horizontal share-of-total bar with a legend. At most one chart is live.
#[derive(Default)]
pub struct ProgressChart {
    handle: Option<ChartHandle>,
}

impl ProgressChart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispose of any previous chart, then draw one for `vm`.
    pub fn render_model(&mut self, vm: &BoardViewModel) -> &ChartHandle {
        self.dispose();
        self.handle.insert(ChartHandle::from_view_model(vm))
    }

    pub fn dispose(&mut self) {
        if let Some(old) = self.handle.take() {
            tracing::debug!(slices = old.slices.len(), "disposed chart");
        }
    }

    pub fn handle(&self) -> Option<&ChartHandle> {
        self.handle.as_ref()
    }

    pub fn height(&self) -> u16 {
        if self.handle.is_some() {
            CHART_HEIGHT
        } else {
            0
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let Some(handle) = &self.handle else {
            return;
        };

        let block = Block::default()
            .title(format!(
                " {} ({}: {}) ",
                handle.title,
                handle.dataset_label,
                handle.total()
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let values: Vec<usize> = handle.slices.iter().map(|s| s.value).collect();
        let widths = bar_widths(&values, inner.width);
        let bar: Vec<Span> = handle
            .slices
            .iter()
            .zip(widths)
            .filter(|(_, w)| *w > 0)
            .map(|(slice, w)| {
                Span::styled(
                    " ".repeat(w as usize),
                    Style::default().bg(slice_color(slice.color)),
                )
            })
            .collect();

        let mut legend = Vec::new();
        for (i, slice) in handle.slices.iter().enumerate() {
            if i > 0 {
                legend.push(Span::raw("  "));
            }
            legend.push(Span::styled("■ ", Style::default().fg(slice_color(slice.color))));
            legend.push(Span::raw(format!(
                "{} {} ({:.0}%)",
                slice.label,
                slice.value,
                handle.share(i) * 100.0
            )));
        }

        let text = vec![Line::from(bar), Line::default(), Line::from(legend)];
        frame.render_widget(Paragraph::new(text), inner);
    }
}

fn slice_color(c: Rgba) -> Color {
    Color::Rgb(c.r, c.g, c.b)
}

/// Split `width` cells proportionally to `values`. Boundaries are rounded
/// from cumulative sums so the widths always add up to `width` exactly.
pub fn bar_widths(values: &[usize], width: u16) -> Vec<u16> {
    let total: usize = values.iter().sum();
    if total == 0 {
        return vec![0; values.len()];
    }
    let width = width as usize;
    let mut acc = 0usize;
    let mut prev = 0usize;
    values
        .iter()
        .map(|v| {
            acc += v;
            let edge = (acc * width + total / 2) / total;
            let w = edge - prev;
            prev = edge;
            w as u16
        })
        .collect()
}
