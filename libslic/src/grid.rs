//! Regular cluster grid and the initial partition built on it

use image::RgbImage;
use log::trace;
use rand::Rng;

use crate::cluster::Cluster;
use crate::error::{Result, SlicError};
use crate::labels::LabelGrid;

/// Pixel rectangle covered by one grid cell, half-open on both axes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellBounds {
    pub x0: u32,
    pub x1: u32,
    pub y0: u32,
    pub y1: u32,
}

impl CellBounds {
    pub const fn is_empty(&self) -> bool {
        self.x0 >= self.x1 || self.y0 >= self.y1
    }

    pub const fn area(&self) -> u32 {
        if self.is_empty() {
            0
        } else {
            (self.x1 - self.x0) * (self.y1 - self.y0)
        }
    }
}

/// Layout of clusters over an image: `cols × rows` cells of side `spacing`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterGrid {
    width: u32,
    height: u32,
    cols: usize,
    rows: usize,
    spacing: f32,
}

impl ClusterGrid {
    /// Lay out the grid; `spacing` must already be validated as positive and finite
    ///
    /// Fails with [`SlicError::InvalidParameter`] when the spacing is so small
    /// that the grid would exceed [`crate::MAX_CLUSTERS`] clusters.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn new(width: u32, height: u32, spacing: f32) -> Result<Self> {
        // Float-to-int casts saturate, so a tiny spacing yields usize::MAX here
        let cols = (width as f32 / spacing).ceil() as usize;
        let rows = (height as f32 / spacing).ceil() as usize;

        match cols.checked_mul(rows) {
            Some(count) if count <= crate::MAX_CLUSTERS => Ok(Self {
                width,
                height,
                cols,
                rows,
                spacing,
            }),
            _ => Err(SlicError::InvalidParameter {
                name: "spacing",
                value: spacing,
            }),
        }
    }

    pub const fn cols(&self) -> usize {
        self.cols
    }

    pub const fn rows(&self) -> usize {
        self.rows
    }

    pub const fn spacing(&self) -> f32 {
        self.spacing
    }

    pub const fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Total number of clusters
    pub const fn len(&self) -> usize {
        self.cols * self.rows
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Label of the cluster at grid coordinate `(row, col)`
    pub const fn index(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    /// Grid coordinate `(row, col)` of `label`
    pub const fn coords(&self, label: usize) -> (usize, usize) {
        (label / self.cols, label % self.cols)
    }

    /// Pixel rectangle of cell `(row, col)`, clipped to the image
    pub fn cell_bounds(&self, row: usize, col: usize) -> CellBounds {
        let (x0, x1) = Self::span(col, self.cols, self.spacing, self.width);
        let (y0, y1) = Self::span(row, self.rows, self.spacing, self.height);
        CellBounds { x0, x1, y0, y1 }
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn span(cell: usize, cells: usize, spacing: f32, limit: u32) -> (u32, u32) {
        let begin = ((cell as f32 * spacing) as u32).min(limit);
        // The last cell always reaches the border so the partition stays total
        let end = if cell + 1 == cells {
            limit
        } else {
            (((cell + 1) as f32 * spacing) as u32).min(limit)
        };
        (begin, end.max(begin))
    }

    /// Labels in the 3×3 neighborhood of `label`, row-major, excluding `label`
    pub fn neighbors(&self, label: usize) -> impl Iterator<Item = usize> + '_ {
        let (row, col) = self.coords(label);
        let rows = row.saturating_sub(1)..(row + 2).min(self.rows);
        let cols = col.saturating_sub(1)..(col + 2).min(self.cols);

        rows.flat_map(move |r| cols.clone().map(move |c| self.index(r, c)))
            .filter(move |&candidate| candidate != label)
    }

    /// Build the initial partition: every cell's pixels form one cluster
    ///
    /// A cell that covers no pixel (possible for spacings below one pixel)
    /// yields an empty cluster centered on its cell origin.
    #[allow(clippy::cast_precision_loss)]
    pub fn initialize<R: Rng + ?Sized>(
        &self,
        image: &RgbImage,
        rng: &mut R,
    ) -> (Vec<Cluster>, LabelGrid) {
        let mut clusters = Vec::with_capacity(self.len());
        let mut labels = LabelGrid::new(self.width, self.height);

        for row in 0..self.rows {
            for col in 0..self.cols {
                let label = self.index(row, col);
                let bounds = self.cell_bounds(row, col);
                let mut cluster = Cluster::at(bounds.x0 as f32, bounds.y0 as f32, [0.0; 3]);

                for y in bounds.y0..bounds.y1 {
                    for x in bounds.x0..bounds.x1 {
                        labels.set(x, y, label);
                        cluster.add_pixel(x, y, *image.get_pixel(x, y));
                    }
                }

                if !cluster.normalize(rng) {
                    trace!("Grid cell ({row}, {col}) covers no pixels");
                }
                clusters.push(cluster);
            }
        }

        (clusters, labels)
    }
}
