#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::must_use_candidate)]

//! SLIC - superpixel oversegmentation of RGB images
//!
//! This library groups the pixels of an image into compact, color-coherent
//! regions by clustering jointly in position and color, starting from a
//! regular grid and refining each pixel's assignment against its neighboring
//! clusters. It returns the image painted with per-region mean colors and a
//! copy of the source with region boundaries highlighted.

pub mod boundary;
pub mod cluster;
pub mod distance;
pub mod engine;
pub mod error;
pub mod grid;
pub mod labels;
pub mod params;

#[cfg(feature = "background")]
pub mod task;

pub use cluster::Cluster;
pub use engine::{execute, Segmentation, SegmentationStats, Slic, SlicResult};
pub use error::{Result, SlicError};
pub use grid::ClusterGrid;
pub use labels::LabelGrid;
pub use params::SlicParams;

#[cfg(feature = "background")]
pub use task::{PendingSegmentation, Session};

/// Default grid spacing in pixels
pub const DEFAULT_SPACING: f32 = 20.0;

/// Default spatial/color trade-off
pub const DEFAULT_SPATIAL_WEIGHT: f32 = 10.0;

/// Default color term scale
pub const DEFAULT_COLOR_WEIGHT: f32 = 1.0;

/// Default refinement budget
pub const DEFAULT_ITERATIONS: u32 = 10;

/// Upper bound on the number of clusters a grid may hold
pub const MAX_CLUSTERS: usize = 1 << 24;
