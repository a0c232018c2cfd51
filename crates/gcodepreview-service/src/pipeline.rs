//! The render pipeline: fetch G-code, render all views, store the frames.

use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use image::{ImageFormat, RgbImage};
use thiserror::Error;
use tracing::{error, info, warn};

use gcodepreview_core::{view_image_filename, PrinterBed, RenderJobRequest};
use gcodepreview_renderer::{interpret, render_views, RenderError, RgbaFrame, View};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("failed to fetch G-code for job {job_id}: {reason}")]
    Fetch { job_id: String, reason: String },
    #[error("failed to store {filename}: {reason}")]
    Store { filename: String, reason: String },
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("PNG encoding failed: {0}")]
    Encode(String),
    #[error("render task failed: {0}")]
    Task(String),
}

/// Looks up the work envelope of the machine a job targets.
#[async_trait]
pub trait BedProvider: Send + Sync {
    async fn bed_for_job(&self, job_id: &str) -> PrinterBed;
}

/// Remote storage for job G-code and rendered previews.
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn fetch_gcode(&self, job_id: &str) -> Result<String, ServiceError>;
    async fn store_image(&self, filename: &str, png: &[u8]) -> Result<(), ServiceError>;
}

/// How a processed job went: how many view images made it to storage.
///
/// A job counts as successful when at least one view was stored; partial
/// storage failures degrade the preview rather than failing the job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobOutcome {
    pub stored: usize,
    pub total: usize,
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        self.stored > 0
    }
}

/// Anything that can process one validated render job.
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn handle(&self, job: &RenderJobRequest) -> Result<JobOutcome, ServiceError>;
}

/// End-to-end processing of one render job.
pub struct RenderPipeline<S, B> {
    store: Arc<S>,
    beds: Arc<B>,
    width: u32,
    height: u32,
}

impl<S, B> RenderPipeline<S, B>
where
    S: FileStore + 'static,
    B: BedProvider + 'static,
{
    pub fn new(store: Arc<S>, beds: Arc<B>, width: u32, height: u32) -> Self {
        Self {
            store,
            beds,
            width,
            height,
        }
    }

    /// Fetch, render, and store one job.
    ///
    /// Rendering runs on the blocking pool: it owns a GL context and is
    /// CPU/GPU bound, so it must not sit on an async worker thread.
    pub async fn process_job(&self, job: &RenderJobRequest) -> Result<JobOutcome, ServiceError> {
        let job_id = job.job_id.clone();
        let bed = self.beds.bed_for_job(&job_id).await;
        let gcode = self.store.fetch_gcode(&job_id).await?;

        let (width, height) = (self.width, self.height);
        let frames = tokio::task::spawn_blocking(move || {
            let toolpath = interpret(&gcode);
            render_views(
                &toolpath.segments,
                toolpath.bounds.as_ref(),
                &bed,
                width,
                height,
            )
        })
        .await
        .map_err(|err| ServiceError::Task(err.to_string()))??;

        Ok(self.store_frames(&job_id, frames).await)
    }

    /// Encode and store every frame, counting how many survive.
    async fn store_frames(&self, job_id: &str, frames: Vec<(View, RgbaFrame)>) -> JobOutcome {
        let total = frames.len();
        let mut stored = 0;
        for (index, (view, frame)) in frames.into_iter().enumerate() {
            let filename = view_image_filename(job_id, index, view.name());
            let png = match encode_png(&frame) {
                Ok(png) => png,
                Err(err) => {
                    error!(%view, %filename, "failed to encode frame: {err}");
                    continue;
                }
            };
            match self.store.store_image(&filename, &png).await {
                Ok(()) => stored += 1,
                Err(err) => warn!(%view, %filename, "failed to store frame: {err}"),
            }
        }
        info!(job_id, stored, total, "stored preview frames");
        JobOutcome { stored, total }
    }
}

#[async_trait]
impl<S, B> JobHandler for RenderPipeline<S, B>
where
    S: FileStore + 'static,
    B: BedProvider + 'static,
{
    async fn handle(&self, job: &RenderJobRequest) -> Result<JobOutcome, ServiceError> {
        self.process_job(job).await
    }
}

/// Encode a frame as RGB PNG, compositing its alpha onto black.
///
/// Frames are rendered with a transparent clear color; flattening onto
/// black keeps the published previews opaque.
pub fn encode_png(frame: &RgbaFrame) -> Result<Vec<u8>, ServiceError> {
    let mut rgb = Vec::with_capacity(frame.width as usize * frame.height as usize * 3);
    for pixel in frame.pixels.chunks_exact(4) {
        let alpha = pixel[3] as u32;
        rgb.push((pixel[0] as u32 * alpha / 255) as u8);
        rgb.push((pixel[1] as u32 * alpha / 255) as u8);
        rgb.push((pixel[2] as u32 * alpha / 255) as u8);
    }
    let image = RgbImage::from_raw(frame.width, frame.height, rgb)
        .ok_or_else(|| ServiceError::Encode("frame dimensions do not match pixel data".into()))?;

    let mut encoded = Cursor::new(Vec::new());
    image
        .write_to(&mut encoded, ImageFormat::Png)
        .map_err(|err| ServiceError::Encode(err.to_string()))?;
    Ok(encoded.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FixedBed;

    #[async_trait]
    impl BedProvider for FixedBed {
        async fn bed_for_job(&self, _job_id: &str) -> PrinterBed {
            PrinterBed::default()
        }
    }

    /// Store stub that rejects filenames containing a marker substring.
    struct FlakyStore {
        reject_containing: &'static str,
        stored: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl FileStore for FlakyStore {
        async fn fetch_gcode(&self, _job_id: &str) -> Result<String, ServiceError> {
            Ok(String::new())
        }

        async fn store_image(&self, filename: &str, _png: &[u8]) -> Result<(), ServiceError> {
            if filename.contains(self.reject_containing) {
                return Err(ServiceError::Store {
                    filename: filename.to_string(),
                    reason: "stub rejection".to_string(),
                });
            }
            self.stored.lock().unwrap().push(filename.to_string());
            Ok(())
        }
    }

    fn frame(width: u32, height: u32) -> RgbaFrame {
        RgbaFrame {
            width,
            height,
            pixels: vec![255; (width * height * 4) as usize],
        }
    }

    #[tokio::test]
    async fn store_frames_counts_only_successful_stores() {
        let store = Arc::new(FlakyStore {
            reject_containing: "_south.png",
            stored: Mutex::new(Vec::new()),
        });
        let pipeline = RenderPipeline::new(Arc::clone(&store), Arc::new(FixedBed), 4, 4);

        let frames = vec![
            (View::NorthWest, frame(4, 4)),
            (View::West, frame(4, 4)),
            (View::South, frame(4, 4)),
        ];
        let outcome = pipeline.store_frames("7", frames).await;

        assert_eq!(outcome.total, 3);
        assert_eq!(outcome.stored, 2);
        assert!(outcome.is_success());
        assert_eq!(
            *store.stored.lock().unwrap(),
            vec!["job_7_view_0_north_west.png", "job_7_view_1_west.png"]
        );
    }

    #[tokio::test]
    async fn outcome_with_nothing_stored_is_a_failure() {
        let store = Arc::new(FlakyStore {
            reject_containing: ".png",
            stored: Mutex::new(Vec::new()),
        });
        let pipeline = RenderPipeline::new(store, Arc::new(FixedBed), 4, 4);

        let outcome = pipeline.store_frames("7", vec![(View::North, frame(4, 4))]).await;
        assert_eq!(outcome, JobOutcome { stored: 0, total: 1 });
        assert!(!outcome.is_success());
    }

    #[test]
    fn encode_png_produces_png_bytes() {
        let png = encode_png(&frame(2, 2)).unwrap();
        assert_eq!(&png[..8], &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n']);
    }

    #[test]
    fn encode_png_rejects_mismatched_dimensions() {
        let bad = RgbaFrame {
            width: 4,
            height: 4,
            pixels: vec![0; 7],
        };
        assert!(matches!(encode_png(&bad), Err(ServiceError::Encode(_))));
    }
}
