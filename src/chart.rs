//! Bar charts of tracked time.
//!
//! The backend serves chart data in the shape a browser charting library
//! consumes (`labels` plus `datasets` with CSS colors). This module paints
//! grouped bars onto any [`Canvas2d`] and produces the legend markup.

use serde::{Deserialize, Serialize};

use crate::rendering::paint::{Canvas2d, CanvasRect, Color, Point};
use crate::rendering::raster::RasterCanvas;
use crate::rendering::Screenshot;
use crate::{CanvasSize, Error, Result};

/// Color used when a dataset color cannot be parsed
pub const FALLBACK_BAR_COLOR: Color = Color::rgb(194, 185, 162);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarDataset {
    #[serde(default)]
    pub label: String,
    pub fill_color: String,
    pub stroke_color: String,
    pub data: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BarChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<BarDataset>,
}

impl BarChartData {
    /// Number of bar groups: the label count, or the longest dataset if longer
    pub fn groups(&self) -> usize {
        self.datasets
            .iter()
            .map(|d| d.data.len())
            .max()
            .unwrap_or(0)
            .max(self.labels.len())
    }
}

/// The spark page payload: one chart per plot, with titles and section ids
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TimePlots {
    pub all_plots: Vec<BarChartData>,
    #[serde(default)]
    pub all_labels: Vec<String>,
    #[serde(default)]
    pub all_types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarChartOptions {
    /// Use the fixed scale below instead of deriving it from the data
    pub scale_override: bool,
    pub scale_steps: u32,
    pub scale_step_width: f64,
    pub scale_start_value: f64,
    /// Space on each side of a bar group
    pub bar_value_spacing: f64,
    /// Space between bars of one group
    pub bar_dataset_spacing: f64,
    pub bar_stroke_width: f64,
    /// Vertical padding above and below the plot area
    pub padding: f64,
    pub axis_color: Color,
}

impl Default for BarChartOptions {
    fn default() -> Self {
        Self {
            scale_override: false,
            scale_steps: 5,
            scale_step_width: 1.0,
            scale_start_value: 0.0,
            bar_value_spacing: 5.0,
            bar_dataset_spacing: 1.0,
            bar_stroke_width: 2.0,
            padding: 5.0,
            axis_color: Color::rgba(0, 0, 0, 26),
        }
    }
}

impl BarChartOptions {
    /// Fixed 0..1 scale in five steps, as used for the small per-feature charts
    pub fn spark() -> Self {
        Self {
            scale_override: true,
            scale_steps: 5,
            scale_step_width: 0.2,
            scale_start_value: 0.0,
            ..Default::default()
        }
    }

    fn value_range(&self, data: &BarChartData) -> (f64, f64) {
        if self.scale_override {
            let min = self.scale_start_value;
            return (min, min + self.scale_steps as f64 * self.scale_step_width);
        }
        let max = data
            .datasets
            .iter()
            .flat_map(|d| d.data.iter().copied())
            .filter(|v| v.is_finite())
            .fold(0.0_f64, f64::max);
        (0.0, if max > 0.0 { max } else { 1.0 })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartGeometry {
    /// Width of one bar
    pub bar_width: f64,
    /// Canvas y of the value axis baseline
    pub baseline: f64,
    /// Values mapped to `[min, max]` span the plot height
    pub min: f64,
    pub max: f64,
}

/// Paint `data` as grouped bars filling `size`.
pub fn paint_bar_chart<C: Canvas2d + ?Sized>(
    data: &BarChartData,
    options: &BarChartOptions,
    size: CanvasSize,
    canvas: &mut C,
) -> Result<ChartGeometry> {
    let (min, max) = options.value_range(data);
    if !(max > min) {
        return Err(Error::ConfigError(format!("empty chart scale {}..{}", min, max)));
    }

    let width = size.width as f64;
    let top = options.padding;
    let baseline = size.height as f64 - options.padding;
    let plot_height = (baseline - top).max(0.0);

    let groups = data.groups();
    let datasets = data.datasets.len();
    let mut geometry = ChartGeometry {
        bar_width: 0.0,
        baseline,
        min,
        max,
    };

    canvas.line(Point::new(0.0, baseline), Point::new(width, baseline), options.axis_color, 1.0);
    if groups == 0 || datasets == 0 {
        return Ok(geometry);
    }

    let slot = width / groups as f64;
    let gaps = 2.0 * options.bar_value_spacing + (datasets - 1) as f64 * options.bar_dataset_spacing;
    let bar_width = ((slot - gaps) / datasets as f64).max(0.0);
    geometry.bar_width = bar_width;

    let to_y = |value: f64| {
        let t = ((value - min) / (max - min)).clamp(0.0, 1.0);
        baseline - t * plot_height
    };

    for (d, dataset) in data.datasets.iter().enumerate() {
        let fill = parse_or_fallback(&dataset.fill_color);
        let stroke = parse_or_fallback(&dataset.stroke_color);
        for (g, value) in dataset.data.iter().enumerate() {
            if !value.is_finite() {
                continue;
            }
            let x = slot * g as f64 + options.bar_value_spacing + d as f64 * (bar_width + options.bar_dataset_spacing);
            let y = to_y(*value);
            let rect = CanvasRect::new(x, y, bar_width, baseline - y);
            if rect.is_empty() {
                continue;
            }
            canvas.fill_rect(rect, fill);
            if options.bar_stroke_width > 0.0 {
                canvas.stroke_rect(rect, stroke, options.bar_stroke_width);
            }
        }
    }

    Ok(geometry)
}

fn parse_or_fallback(css: &str) -> Color {
    Color::parse(css).unwrap_or_else(|| {
        log::warn!("unrecognised chart color {:?}; using fallback", css);
        FALLBACK_BAR_COLOR
    })
}

/// Render a chart to PNG on a transparent canvas
pub fn render_bar_chart_png(data: &BarChartData, options: &BarChartOptions, size: CanvasSize) -> Result<Screenshot> {
    let mut canvas = RasterCanvas::new(size.width, size.height, None);
    paint_bar_chart(data, options, size, &mut canvas)?;
    canvas.to_screenshot()
}

/// Legend markup: one list item per dataset with a color swatch and label
pub fn generate_legend(data: &BarChartData) -> String {
    let mut out = String::from("<ul class=\"bar-legend\">");
    for dataset in &data.datasets {
        out.push_str("<li><span style=\"background-color:");
        out.push_str(&escape_html(&dataset.fill_color));
        out.push_str("\"></span>");
        if !dataset.label.is_empty() {
            out.push_str(&escape_html(&dataset.label));
        }
        out.push_str("</li>");
    }
    out.push_str("</ul>");
    out
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::paint::{DisplayList, PaintCommand};

    fn sample() -> BarChartData {
        serde_json::from_str(
            r#"{"labels": ["20160209", "20160210"],
                "datasets": [
                  {"label": "code", "fillColor": "rgba(75, 173, 158, 1)", "strokeColor": "rgba(75, 173, 158, 1)", "data": [30, 60]},
                  {"label": "meeting", "fillColor": "rgba(227, 173, 53, 1)", "strokeColor": "rgba(227, 173, 53, 1)", "data": [15, 0]}
                ]}"#,
        )
        .unwrap()
    }

    fn fills(list: &DisplayList) -> Vec<(CanvasRect, Color)> {
        list.commands
            .iter()
            .filter_map(|c| match c {
                PaintCommand::FillRect { rect, color } => Some((*rect, *color)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn bars_scale_to_data_maximum() {
        let mut list = DisplayList::new();
        let size = CanvasSize { width: 300, height: 130 };
        let geo = paint_bar_chart(&sample(), &BarChartOptions::default(), size, &mut list).unwrap();
        assert_eq!((geo.min, geo.max), (0.0, 60.0));
        assert_eq!(geo.baseline, 125.0);
        // slot 150, gaps 2*5 + 1, two datasets
        assert_eq!(geo.bar_width, (150.0 - 11.0) / 2.0);

        let bars = fills(&list);
        // zero-height bar is skipped
        assert_eq!(bars.len(), 3);
        let (tallest, color) = bars[1];
        assert_eq!(color, Color::rgb(75, 173, 158));
        assert_eq!(tallest.y, 5.0);
        assert_eq!(tallest.height, 120.0);
        let (meeting, color) = bars[2];
        assert_eq!(color, Color::rgb(227, 173, 53));
        assert_eq!(meeting.x, 5.0 + geo.bar_width + 1.0);
        assert_eq!(meeting.height, 30.0);
    }

    #[test]
    fn spark_scale_clamps_to_override() {
        let mut list = DisplayList::new();
        let size = CanvasSize { width: 300, height: 130 };
        let geo = paint_bar_chart(&sample(), &BarChartOptions::spark(), size, &mut list).unwrap();
        assert_eq!((geo.min, geo.max), (0.0, 1.0));
        for (rect, _) in fills(&list) {
            assert!(rect.y >= 5.0);
        }
    }

    #[test]
    fn bad_color_uses_fallback() {
        let mut data = sample();
        data.datasets[0].fill_color = "burgundy".into();
        let mut list = DisplayList::new();
        paint_bar_chart(&data, &BarChartOptions::default(), CanvasSize::default(), &mut list).unwrap();
        assert_eq!(fills(&list)[0].1, FALLBACK_BAR_COLOR);
    }

    #[test]
    fn empty_chart_draws_axis_only() {
        let mut list = DisplayList::new();
        paint_bar_chart(&BarChartData::default(), &BarChartOptions::default(), CanvasSize::default(), &mut list)
            .unwrap();
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn degenerate_override_is_rejected() {
        let options = BarChartOptions {
            scale_override: true,
            scale_steps: 0,
            ..BarChartOptions::spark()
        };
        let mut list = DisplayList::new();
        assert!(paint_bar_chart(&sample(), &options, CanvasSize::default(), &mut list).is_err());
    }

    #[test]
    fn legend_lists_each_dataset() {
        let mut data = sample();
        data.datasets[1].label = "<b>meet</b>".into();
        data.datasets.push(BarDataset {
            label: String::new(),
            fill_color: "#fff".into(),
            stroke_color: "#fff".into(),
            data: vec![],
        });
        assert_eq!(
            generate_legend(&data),
            "<ul class=\"bar-legend\">\
             <li><span style=\"background-color:rgba(75, 173, 158, 1)\"></span>code</li>\
             <li><span style=\"background-color:rgba(227, 173, 53, 1)\"></span>&lt;b&gt;meet&lt;/b&gt;</li>\
             <li><span style=\"background-color:#fff\"></span></li>\
             </ul>"
        );
    }

    #[test]
    fn time_plots_tolerate_missing_titles() {
        let plots: TimePlots = serde_json::from_str(r#"{"all_plots": [{"labels": [], "datasets": []}]}"#).unwrap();
        assert_eq!(plots.all_plots.len(), 1);
        assert!(plots.all_labels.is_empty());
    }
}
