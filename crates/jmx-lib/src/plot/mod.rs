use crate::metrics::jmx::score::{JitterScoreMap, SATURATION};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Axis {
    pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Style {
    pub width: f32,
    pub color: Color,
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
pub struct Color(pub u32);

impl Color {
    pub fn rgb(&self) -> (u8, u8, u8) {
        (
            ((self.0 >> 16) & 0xFF) as u8,
            ((self.0 >> 8) & 0xFF) as u8,
            (self.0 & 0xFF) as u8,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineSeries {
    pub name: String,
    pub points: Vec<[f64; 2]>,
    pub style: Style,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Series {
    Line(LineSeries),
}

impl Series {
    pub fn points(&self) -> &[[f64; 2]] {
        match self {
            Series::Line(line) => &line.points,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Figure {
    pub title: Option<String>,
    pub x: Axis,
    pub y: Axis,
    pub series: Vec<Series>,
}

impl Figure {
    pub fn new(title: impl Into<Option<String>>) -> Self {
        Self {
            title: title.into(),
            x: Axis { label: None },
            y: Axis { label: None },
            series: Vec::new(),
        }
    }

    pub fn add_series(&mut self, series: Series) {
        self.series.push(series);
    }

    /// `(x_min, x_max, y_min, y_max)` over all series, `None` without points.
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        let mut points = self.series.iter().flat_map(|s| s.points().iter());
        let first = points.next()?;
        Some(points.fold(
            (first[0], first[0], first[1], first[1]),
            |(x0, x1, y0, y1), p| (x0.min(p[0]), x1.max(p[0]), y0.min(p[1]), y1.max(p[1])),
        ))
    }
}

/// Samples the jitter → score map from 0 to `max_jitter_s` seconds.
pub fn figure_from_score_map(reference_jitter_s: f64, max_jitter_s: f64, points: usize) -> Figure {
    let map = JitterScoreMap::standard();
    let steps = points.max(2) - 1;
    let samples: Vec<[f64; 2]> = (0..=steps)
        .map(|i| {
            let jitter = max_jitter_s * i as f64 / steps as f64;
            [jitter, map.score(jitter / reference_jitter_s)]
        })
        .collect();
    let mut fig = Figure::new(Some(format!(
        "Jitter score (reference {:.1} ms, zero from {:.0} ms)",
        reference_jitter_s * 1e3,
        reference_jitter_s * SATURATION * 1e3
    )));
    fig.x.label = Some("jitter / s".into());
    fig.y.label = Some("score".into());
    fig.add_series(Series::Line(LineSeries {
        name: "score".into(),
        points: samples,
        style: Style {
            width: 2.0,
            color: Color(0xFF0077),
        },
    }));
    fig
}
