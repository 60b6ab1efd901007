// src/overlay.rs
use std::collections::HashMap;

use nalgebra::Point2;

use crate::config::OverlayConfig;
use crate::landmarks::LandmarkPoint;

/// Target surface the landmarks are drawn onto, in pixels.
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Maps normalized landmarks into viewport pixels and steadies them with a
/// per-index exponential moving average.
pub struct OverlayProjector {
    config: OverlayConfig,
    smoothed: HashMap<usize, Point2<f32>>,
}

impl OverlayProjector {
    pub fn new(config: OverlayConfig) -> Self {
        Self {
            config,
            smoothed: HashMap::new(),
        }
    }

    /// Drops the smoothing state, e.g. when the tracked subject changes.
    pub fn reset(&mut self) {
        self.smoothed.clear();
    }

    /// Projects one landmark list into the viewport. The scale either fills
    /// the viewport (cropping the image) or fits inside it; only x is
    /// centered, vertical slack or overflow hangs past the bottom edge. A
    /// mirrored projection flips x for front-camera display.
    pub fn project(
        &mut self,
        points: &[LandmarkPoint],
        image_width: u32,
        image_height: u32,
        viewport: Viewport,
    ) -> Vec<Point2<f32>> {
        let iw = image_width.max(1) as f32;
        let ih = image_height.max(1) as f32;
        let sx = viewport.width / iw;
        let sy = viewport.height / ih;
        let scale = if self.config.fill_viewport {
            sx.max(sy)
        } else {
            sx.min(sy)
        };
        let effective_width = iw * scale;
        let effective_height = ih * scale;
        let offset_x = (viewport.width - effective_width) / 2.0;

        let alpha = self.config.smoothing_factor;
        points
            .iter()
            .enumerate()
            .map(|(index, point)| {
                let px = point.x * effective_width;
                let x = if self.config.mirror {
                    offset_x + effective_width - px
                } else {
                    offset_x + px
                };
                let y = point.y * effective_height;
                let projected = Point2::new(x, y);

                if alpha <= 0.0 {
                    return projected;
                }
                let steadied = match self.smoothed.get(&index) {
                    Some(prev) => Point2::new(
                        prev.x * alpha + projected.x * (1.0 - alpha),
                        prev.y * alpha + projected.y * (1.0 - alpha),
                    ),
                    None => projected,
                };
                self.smoothed.insert(index, steadied);
                steadied
            })
            .collect()
    }
}

/// Pairs projected points along a connection table, skipping any edge whose
/// endpoint falls outside the list.
pub fn segments(
    points: &[Point2<f32>],
    connections: &[(usize, usize)],
) -> Vec<(Point2<f32>, Point2<f32>)> {
    connections
        .iter()
        .filter(|(a, b)| *a < points.len() && *b < points.len())
        .map(|(a, b)| (points[*a], points[*b]))
        .collect()
}
