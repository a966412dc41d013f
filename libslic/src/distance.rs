//! Joint spatial/color distance between a pixel and a cluster

use image::Rgb;

use crate::cluster::Cluster;

/// Weights that shape the distance metric
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    /// Grid spacing `s`
    pub spacing: f32,
    /// Spatial/color trade-off `m`
    pub spatial: f32,
    /// Color term scale `c`
    pub color: f32,
}

impl Weights {
    pub const fn new(spacing: f32, spatial: f32, color: f32) -> Self {
        Self {
            spacing,
            spatial,
            color,
        }
    }

    /// Combine squared color and spatial distances: `sqrt(dRGB·c/m + dXY·m/s)`
    pub fn combine(&self, d_rgb: f32, d_xy: f32) -> f32 {
        (d_rgb * self.color / self.spatial + d_xy * self.spatial / self.spacing).sqrt()
    }
}

/// Squared Euclidean distance between the cluster center and `(x, y)`
#[allow(clippy::cast_precision_loss)]
pub fn squared_spatial(cluster: &Cluster, x: u32, y: u32) -> f32 {
    let dx = cluster.x - x as f32;
    let dy = cluster.y - y as f32;
    dx * dx + dy * dy
}

/// Squared Euclidean distance between the cluster mean color and `color`
pub fn squared_color(cluster: &Cluster, color: Rgb<u8>) -> f32 {
    cluster
        .rgb
        .iter()
        .zip(color.0)
        .map(|(mean, channel)| {
            let d = mean - f32::from(channel);
            d * d
        })
        .sum()
}

/// Distance from the pixel at `(x, y)` with `color` to `cluster`
pub fn distance(cluster: &Cluster, color: Rgb<u8>, x: u32, y: u32, weights: &Weights) -> f32 {
    weights.combine(squared_color(cluster, color), squared_spatial(cluster, x, y))
}
