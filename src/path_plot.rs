// src/path_plot.rs
//
// End-of-run trajectory chart. Drawn with OpenCV primitives onto a white
// canvas: line with circle markers, ticks, title and axis labels. The Y axis
// grows downward so the chart reads like the camera image.

use crate::types::{PlotConfig, Position};
use anyhow::Result;
use opencv::{
    core::{self, Mat},
    highgui, imgproc,
    prelude::*,
};
use tracing::info;

const MARGIN_LEFT: i32 = 70;
const MARGIN_RIGHT: i32 = 30;
const MARGIN_TOP: i32 = 50;
const MARGIN_BOTTOM: i32 = 60;
const TICKS: i32 = 5;
const MARKER_RADIUS: i32 = 4;
/// Data padding on each side, as a fraction of the extent
const DATA_MARGIN: f64 = 0.05;

mod colors {
    use opencv::core::Scalar;

    pub const BACKGROUND: Scalar = Scalar::new(255.0, 255.0, 255.0, 0.0);
    pub const AXES: Scalar = Scalar::new(0.0, 0.0, 0.0, 0.0);
    pub const GRID: Scalar = Scalar::new(225.0, 225.0, 225.0, 0.0);
    pub const SERIES: Scalar = Scalar::new(180.0, 119.0, 31.0, 0.0);
}

/// Maps data coordinates onto the plot rectangle of the canvas.
#[derive(Debug, Clone, Copy)]
pub struct PlotArea {
    pub rect: core::Rect,
    x_range: (f64, f64),
    y_range: (f64, f64),
}

impl PlotArea {
    pub fn fit(path: &[Position], width: i32, height: i32) -> Self {
        let rect = core::Rect::new(
            MARGIN_LEFT,
            MARGIN_TOP,
            (width - MARGIN_LEFT - MARGIN_RIGHT).max(1),
            (height - MARGIN_TOP - MARGIN_BOTTOM).max(1),
        );

        Self {
            rect,
            x_range: padded_range(path.iter().map(|p| p.x)),
            y_range: padded_range(path.iter().map(|p| p.y)),
        }
    }

    pub fn to_canvas(&self, x: f64, y: f64) -> core::Point {
        let fx = (x - self.x_range.0) / (self.x_range.1 - self.x_range.0);
        let fy = (y - self.y_range.0) / (self.y_range.1 - self.y_range.0);
        core::Point::new(
            self.rect.x + (fx * self.rect.width as f64).round() as i32,
            self.rect.y + (fy * self.rect.height as f64).round() as i32,
        )
    }

    pub fn x_range(&self) -> (f64, f64) {
        self.x_range
    }

    pub fn y_range(&self) -> (f64, f64) {
        self.y_range
    }
}

fn padded_range(values: impl Iterator<Item = i32>) -> (f64, f64) {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v as f64), hi.max(v as f64))
    });

    if !min.is_finite() {
        return (0.0, 1.0);
    }
    if (max - min).abs() < f64::EPSILON {
        return (min - 1.0, max + 1.0);
    }

    let pad = (max - min) * DATA_MARGIN;
    (min - pad, max + pad)
}

/// Render the path chart into a BGR image.
pub fn render_path_plot(path: &[Position], config: &PlotConfig) -> Result<Mat> {
    let mut canvas = Mat::new_rows_cols_with_default(
        config.height,
        config.width,
        core::CV_8UC3,
        colors::BACKGROUND,
    )?;
    let area = PlotArea::fit(path, config.width, config.height);
    let rect = area.rect;

    draw_ticks(&mut canvas, &area)?;
    imgproc::rectangle(&mut canvas, rect, colors::AXES, 1, imgproc::LINE_8, 0)?;

    let points: Vec<core::Point> = path
        .iter()
        .map(|p| area.to_canvas(p.x as f64, p.y as f64))
        .collect();

    for pair in points.windows(2) {
        imgproc::line(
            &mut canvas,
            pair[0],
            pair[1],
            colors::SERIES,
            2,
            imgproc::LINE_AA,
            0,
        )?;
    }
    for point in &points {
        imgproc::circle(
            &mut canvas,
            *point,
            MARKER_RADIUS,
            colors::SERIES,
            -1,
            imgproc::LINE_AA,
            0,
        )?;
    }

    put_centered(&mut canvas, &config.title, config.width / 2, MARGIN_TOP - 18, 0.7)?;
    put_centered(
        &mut canvas,
        "X",
        rect.x + rect.width / 2,
        config.height - 12,
        0.6,
    )?;
    put_centered(&mut canvas, "Y", 14, rect.y + rect.height / 2, 0.6)?;

    Ok(canvas)
}

fn draw_ticks(canvas: &mut Mat, area: &PlotArea) -> Result<()> {
    let rect = area.rect;
    let (x0, x1) = area.x_range();
    let (y0, y1) = area.y_range();

    for i in 0..=TICKS {
        let t = i as f64 / TICKS as f64;

        let x_value = x0 + t * (x1 - x0);
        let px = area.to_canvas(x_value, y0).x;
        imgproc::line(
            canvas,
            core::Point::new(px, rect.y),
            core::Point::new(px, rect.y + rect.height),
            colors::GRID,
            1,
            imgproc::LINE_8,
            0,
        )?;
        put_centered(
            canvas,
            &format!("{:.0}", x_value),
            px,
            rect.y + rect.height + 20,
            0.4,
        )?;

        let y_value = y0 + t * (y1 - y0);
        let py = area.to_canvas(x0, y_value).y;
        imgproc::line(
            canvas,
            core::Point::new(rect.x, py),
            core::Point::new(rect.x + rect.width, py),
            colors::GRID,
            1,
            imgproc::LINE_8,
            0,
        )?;
        put_centered(canvas, &format!("{:.0}", y_value), rect.x - 28, py + 4, 0.4)?;
    }

    Ok(())
}

fn put_centered(canvas: &mut Mat, text: &str, cx: i32, baseline_y: i32, scale: f64) -> Result<()> {
    let mut baseline = 0;
    let size = imgproc::get_text_size(text, imgproc::FONT_HERSHEY_SIMPLEX, scale, 1, &mut baseline)?;
    imgproc::put_text(
        canvas,
        text,
        core::Point::new(cx - size.width / 2, baseline_y),
        imgproc::FONT_HERSHEY_SIMPLEX,
        scale,
        colors::AXES,
        1,
        imgproc::LINE_AA,
        false,
    )?;
    Ok(())
}

/// Show the chart and block until a key is pressed.
pub fn show_path_plot(path: &[Position], config: &PlotConfig) -> Result<()> {
    info!("Plotting path of {} points (press any key to close)", path.len());

    let chart = render_path_plot(path, config)?;
    highgui::named_window(&config.title, highgui::WINDOW_AUTOSIZE)?;
    highgui::imshow(&config.title, &chart)?;
    highgui::wait_key(0)?;
    highgui::destroy_window(&config.title)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extent_maps_inside_plot_rect() {
        let path = [Position::new(0, 0), Position::new(100, 50)];
        let area = PlotArea::fit(&path, 800, 600);
        let rect = area.rect;

        let first = area.to_canvas(0.0, 0.0);
        let last = area.to_canvas(100.0, 50.0);

        assert!(first.x > rect.x && first.x < rect.x + rect.width / 2);
        assert!(last.x < rect.x + rect.width && last.x > rect.x + rect.width / 2);
        // Y grows downward: smaller y is nearer the top
        assert!(first.y < last.y);
        assert!(first.y > rect.y);
        assert!(last.y < rect.y + rect.height);
    }

    #[test]
    fn test_single_point_is_centered() {
        let path = [Position::new(42, 17)];
        let area = PlotArea::fit(&path, 800, 600);
        let p = area.to_canvas(42.0, 17.0);
        assert_eq!(p.x, area.rect.x + area.rect.width / 2);
        assert_eq!(p.y, area.rect.y + area.rect.height / 2);
    }

    #[test]
    fn test_padded_range() {
        assert_eq!(padded_range([10, 110].into_iter()), (5.0, 115.0));
        assert_eq!(padded_range([7].into_iter()), (6.0, 8.0));
        assert_eq!(padded_range(std::iter::empty()), (0.0, 1.0));
    }

    #[test]
    fn test_render_size_and_series_drawn() {
        let config = PlotConfig::default();
        let path = [
            Position::new(100, 200),
            Position::new(150, 180),
            Position::new(220, 140),
        ];
        let chart = render_path_plot(&path, &config).unwrap();
        assert_eq!(chart.cols(), config.width);
        assert_eq!(chart.rows(), config.height);

        let area = PlotArea::fit(&path, config.width, config.height);
        let marker = area.to_canvas(150.0, 180.0);
        let px = *chart.at_2d::<core::Vec3b>(marker.y, marker.x).unwrap();
        assert_eq!((px[0], px[1], px[2]), (180, 119, 31));
    }
}
