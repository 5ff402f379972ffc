//! Series sparkline widget for chart panels

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// Block characters for partial cell heights (8 levels)
const BLOCKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// A column chart of series values, one column per cell
///
/// Series longer than the area are resampled by taking the maximum of each
/// bucket so peaks stay visible. The chart fills the whole area height in
/// eighth-cell steps.
pub struct SeriesSparkline<'a> {
    /// Values in display order; the largest fills the whole height
    values: &'a [f64],
    /// Style for the columns
    style: Style,
}

impl<'a> SeriesSparkline<'a> {
    pub fn new(values: &'a [f64]) -> Self {
        Self {
            values,
            style: Style::default().fg(Color::Cyan),
        }
    }

    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    fn scale_max(&self) -> f64 {
        self.values.iter().copied().fold(0.0, f64::max)
    }

    /// Column height in eighths of a cell for `value`
    fn level(value: f64, max: f64, rows: u16) -> usize {
        if max <= 0.0 || !value.is_finite() {
            return 0;
        }
        let normalized = (value / max).clamp(0.0, 1.0);
        (normalized * f64::from(rows) * 8.0).round() as usize
    }
}

/// Reduces `values` to at most `width` points, keeping each bucket's maximum
pub fn resample(values: &[f64], width: usize) -> Vec<f64> {
    if width == 0 {
        return Vec::new();
    }
    if values.len() <= width {
        return values.to_vec();
    }

    (0..width)
        .map(|i| {
            let start = i * values.len() / width;
            let end = ((i + 1) * values.len() / width).max(start + 1);
            values[start..end].iter().copied().fold(f64::MIN, f64::max)
        })
        .collect()
}

impl<'a> Widget for SeriesSparkline<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let max = self.scale_max();
        let columns = resample(self.values, area.width as usize);

        for (i, value) in columns.iter().enumerate() {
            let level = Self::level(*value, max, area.height);
            let x = area.x + i as u16;

            for row in 0..area.height {
                // row 0 is the bottom line of the area
                let filled = level.saturating_sub(row as usize * 8).min(8);
                let symbol = match filled {
                    0 if row == 0 => BLOCKS[0],
                    0 => continue,
                    n => BLOCKS[n - 1],
                };
                let y = area.y + area.height - 1 - row;
                if let Some(cell) = buf.cell_mut((x, y)) {
                    cell.set_char(symbol).set_style(self.style);
                }
            }
        }
    }
}
