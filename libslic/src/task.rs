//! Single-shot background segmentation
//!
//! A [`Session`] runs one segmentation at a time on tokio's blocking pool and
//! hands back one result. There is no progress reporting and no way to stop
//! a run once it has started.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use image::RgbImage;
use log::debug;
use tokio::task::JoinHandle;

use crate::engine::{Slic, SlicResult};
use crate::error::{Result, SlicError};
use crate::params::SlicParams;

/// Host-side handle that serializes segmentation requests
#[derive(Debug, Clone, Default)]
pub struct Session {
    in_flight: Arc<AtomicBool>,
}

/// Clears the session's in-flight flag when dropped
#[derive(Debug)]
struct InFlightGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// A submitted segmentation; resolves exactly once
///
/// Dropping it detaches the run. The session stays busy until the detached
/// run finishes.
#[derive(Debug)]
pub struct PendingSegmentation {
    handle: JoinHandle<Result<SlicResult>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while a submitted segmentation is still running
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Start segmenting `image` in the background
    ///
    /// Must be called from within a tokio runtime. Fails with
    /// [`SlicError::Busy`] while an earlier submission is still pending.
    pub fn submit(&self, image: RgbImage, params: SlicParams) -> Result<PendingSegmentation> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(SlicError::Busy);
        }

        let guard = InFlightGuard {
            flag: Arc::clone(&self.in_flight),
        };

        let slic = Slic::new(params);
        debug!(
            "Submitting {}x{} image for background segmentation (spacing {}, {} iterations)",
            image.width(),
            image.height(),
            slic.params().spacing,
            slic.params().iterations
        );

        // The guard lives as long as the run itself, even if the handle is dropped
        let handle = tokio::task::spawn_blocking(move || {
            let _guard = guard;
            slic.execute(&image)
        });

        Ok(PendingSegmentation { handle })
    }
}

impl PendingSegmentation {
    /// Wait for the segmentation to finish
    pub async fn wait(self) -> Result<SlicResult> {
        self.handle
            .await
            .map_err(|e| SlicError::TaskFailed(e.to_string()))?
    }
}
