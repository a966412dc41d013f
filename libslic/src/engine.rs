//! Iterative cluster refinement and the `execute` entry points

use std::path::Path;

use image::RgbImage;
use log::{debug, info, trace, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::boundary::{detect_boundaries, render_oversegmented};
use crate::cluster::Cluster;
use crate::distance::{distance, squared_spatial, Weights};
use crate::error::{Result, SlicError};
use crate::grid::ClusterGrid;
use crate::labels::LabelGrid;
use crate::params::SlicParams;

/// Two buffers of the same shape; one is read while the other is written
#[derive(Debug)]
struct DoubleBuffer<T> {
    buffers: [T; 2],
    active: usize,
}

impl<T> DoubleBuffer<T> {
    fn new(active: T, next: T) -> Self {
        Self {
            buffers: [active, next],
            active: 0,
        }
    }

    /// Borrow `(active, next)`
    fn split(&mut self) -> (&T, &mut T) {
        let (first, second) = self.buffers.split_at_mut(1);
        if self.active == 0 {
            (&first[0], &mut second[0])
        } else {
            (&second[0], &mut first[0])
        }
    }

    /// Promote `next` to active
    fn swap(&mut self) {
        self.active ^= 1;
    }

    fn into_active(self) -> T {
        let [first, second] = self.buffers;
        if self.active == 0 {
            first
        } else {
            second
        }
    }
}

/// Summary of one segmentation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentationStats {
    pub width: u32,
    pub height: u32,
    pub spacing: f32,
    pub clusters_x: usize,
    pub clusters_y: usize,
    pub cluster_count: usize,
    /// Refinement passes actually performed
    pub iterations_run: u32,
    /// True when a pass made no reassignment; false when no pass ran
    pub converged: bool,
    /// Pixels that changed cluster in each pass
    pub reassignments: Vec<usize>,
    pub empty_clusters: usize,
    pub min_cluster_size: usize,
    pub max_cluster_size: usize,
}

/// Final partition of an image into superpixels
#[derive(Debug, Clone)]
pub struct Segmentation {
    pub grid: ClusterGrid,
    pub clusters: Vec<Cluster>,
    pub labels: LabelGrid,
    pub stats: SegmentationStats,
}

impl Segmentation {
    /// Render the mean-color image and the boundary overlay over `source`
    pub fn render(&self, source: &RgbImage) -> SlicResult {
        SlicResult {
            oversegmented: render_oversegmented(&self.clusters, &self.labels),
            edges: detect_boundaries(source, &self.clusters, &self.labels, self.grid.spacing()),
            stats: self.stats.clone(),
        }
    }

    /// Pixel count of every cluster
    pub fn cluster_sizes(&self) -> Vec<usize> {
        self.clusters.iter().map(Cluster::num_pixels).collect()
    }
}

/// The two output images of a segmentation
#[derive(Debug, Clone)]
pub struct SlicResult {
    /// Every pixel painted with its cluster's mean color
    pub oversegmented: RgbImage,
    /// The source image with superpixel boundaries highlighted
    pub edges: RgbImage,
    pub stats: SegmentationStats,
}

impl SlicResult {
    /// Image to display for the current edges toggle
    pub const fn view(&self, show_edges: bool) -> &RgbImage {
        if show_edges {
            &self.edges
        } else {
            &self.oversegmented
        }
    }

    /// Write both images; the format follows each path's extension
    pub fn save<P: AsRef<Path>, Q: AsRef<Path>>(&self, oversegmented: P, edges: Q) -> Result<()> {
        self.oversegmented.save(oversegmented)?;
        self.edges.save(edges)?;
        Ok(())
    }
}

/// SLIC superpixel engine
#[derive(Debug, Clone, Default)]
pub struct Slic {
    params: SlicParams,
}

impl Slic {
    /// Create an engine; parameters are checked when it runs
    pub const fn new(params: SlicParams) -> Self {
        Self { params }
    }

    pub const fn params(&self) -> &SlicParams {
        &self.params
    }

    fn rng(&self) -> StdRng {
        self.params
            .seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64)
    }

    /// Segment `image` and render both output images
    pub fn execute(&self, image: &RgbImage) -> Result<SlicResult> {
        let mut rng = self.rng();
        self.execute_with_rng(image, &mut rng)
    }

    /// Like [`Slic::execute`], drawing display colors from `rng`
    pub fn execute_with_rng<R: Rng + ?Sized>(
        &self,
        image: &RgbImage,
        rng: &mut R,
    ) -> Result<SlicResult> {
        let segmentation = self.segment_with_rng(image, rng)?;
        Ok(segmentation.render(image))
    }

    /// Compute the partition without rendering
    pub fn segment(&self, image: &RgbImage) -> Result<Segmentation> {
        let mut rng = self.rng();
        self.segment_with_rng(image, &mut rng)
    }

    /// Like [`Slic::segment`], drawing display colors from `rng`
    pub fn segment_with_rng<R: Rng + ?Sized>(
        &self,
        image: &RgbImage,
        rng: &mut R,
    ) -> Result<Segmentation> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(SlicError::InvalidInput { width, height });
        }
        self.params.validate()?;

        let grid = ClusterGrid::new(width, height, self.params.spacing)?;
        let weights = Weights::new(
            self.params.spacing,
            self.params.spatial_weight,
            self.params.color_weight,
        );

        debug!(
            "Segmenting {}x{} image into {}x{} clusters",
            width,
            height,
            grid.cols(),
            grid.rows()
        );

        let (clusters, labels) = grid.initialize(image, rng);
        let mut refinement = Refinement::new(&grid, weights, clusters, labels);

        let mut reassignments = Vec::new();
        let mut converged = false;
        for iteration in 0..self.params.iterations {
            let changed = refinement.step(image, rng);
            debug!("Iteration {}: {} pixels reassigned", iteration + 1, changed);
            reassignments.push(changed);

            if changed == 0 {
                converged = true;
                break;
            }
        }

        if !converged && self.params.iterations > 0 {
            warn!(
                "Iteration budget of {} exhausted before convergence",
                self.params.iterations
            );
        }

        let (clusters, labels) = refinement.finish();
        let stats = Self::stats(&grid, &clusters, reassignments, converged);

        info!(
            "Segmented {}x{} image: {} clusters, {} iterations, converged: {}",
            width, height, stats.cluster_count, stats.iterations_run, stats.converged
        );

        Ok(Segmentation {
            grid,
            clusters,
            labels,
            stats,
        })
    }

    #[allow(clippy::cast_possible_truncation)]
    fn stats(
        grid: &ClusterGrid,
        clusters: &[Cluster],
        reassignments: Vec<usize>,
        converged: bool,
    ) -> SegmentationStats {
        let (width, height) = grid.dimensions();
        let sizes = clusters.iter().map(Cluster::num_pixels);

        SegmentationStats {
            width,
            height,
            spacing: grid.spacing(),
            clusters_x: grid.cols(),
            clusters_y: grid.rows(),
            cluster_count: grid.len(),
            iterations_run: reassignments.len() as u32,
            converged,
            reassignments,
            empty_clusters: clusters.iter().filter(|c| c.is_empty()).count(),
            min_cluster_size: sizes.clone().min().unwrap_or(0),
            max_cluster_size: sizes.max().unwrap_or(0),
        }
    }
}

/// Mutable state of the refinement loop
struct Refinement<'a> {
    grid: &'a ClusterGrid,
    weights: Weights,
    clusters: DoubleBuffer<Vec<Cluster>>,
    labels: DoubleBuffer<LabelGrid>,
}

impl<'a> Refinement<'a> {
    fn new(
        grid: &'a ClusterGrid,
        weights: Weights,
        clusters: Vec<Cluster>,
        labels: LabelGrid,
    ) -> Self {
        let next_clusters = clusters.clone();
        let next_labels = labels.clone();
        Self {
            grid,
            weights,
            clusters: DoubleBuffer::new(clusters, next_clusters),
            labels: DoubleBuffer::new(labels, next_labels),
        }
    }

    /// Run one assignment pass and return the number of reassigned pixels
    fn step<R: Rng + ?Sized>(&mut self, image: &RgbImage, rng: &mut R) -> usize {
        let grid = self.grid;
        let weights = self.weights;
        let max_offset = 2.0 * weights.spacing;

        let (clusters, next_clusters) = self.clusters.split();
        let (labels, next_labels) = self.labels.split();

        for (next, current) in next_clusters.iter_mut().zip(clusters.iter()) {
            next.reset_from(current);
        }

        let mut changed = 0;
        for (x, y, &color) in image.enumerate_pixels() {
            let current_label = labels.get(x, y);
            let mut best_label = current_label;
            let mut best_distance = distance(&clusters[current_label], color, x, y, &weights);

            for candidate in grid.neighbors(current_label) {
                let cluster = &clusters[candidate];

                // Candidates whose center lies beyond 2·s cannot win
                if squared_spatial(cluster, x, y).sqrt() > max_offset {
                    continue;
                }

                let d = distance(cluster, color, x, y, &weights);
                if d < best_distance {
                    best_distance = d;
                    best_label = candidate;
                }
            }

            if best_label != current_label {
                changed += 1;
            }

            next_labels.set(x, y, best_label);
            next_clusters[best_label].add_pixel(x, y, color);
        }

        for (label, cluster) in next_clusters.iter_mut().enumerate() {
            if !cluster.normalize(rng) {
                trace!("Cluster {label} lost all its pixels; keeping its previous mean");
            }
        }

        self.clusters.swap();
        self.labels.swap();
        changed
    }

    fn finish(self) -> (Vec<Cluster>, LabelGrid) {
        (self.clusters.into_active(), self.labels.into_active())
    }
}

/// Segment `image` with the given spacing, weights and iteration budget
///
/// Display colors come from entropy; use [`Slic`] with a seed for
/// reproducible boundary colors.
pub fn execute(
    spacing: f32,
    spatial_weight: f32,
    color_weight: f32,
    image: &RgbImage,
    iterations: u32,
) -> Result<SlicResult> {
    let params = SlicParams::new(spacing)
        .with_spatial_weight(spatial_weight)
        .with_color_weight(color_weight)
        .with_iterations(iterations);
    Slic::new(params).execute(image)
}
