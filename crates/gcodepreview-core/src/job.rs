//! Render-job message types and output naming.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for render-job messages.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    /// The message carried no usable job id.
    #[error("render job message is missing a job id")]
    MissingJobId,
}

/// Payload of a validated render-job message.
///
/// Field naming matches the queue producer's JSON (`JobId`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderJobRequest {
    #[serde(rename = "JobId")]
    pub job_id: String,
}

impl RenderJobRequest {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
        }
    }

    /// Reject messages without a job id before any work is scheduled.
    pub fn validate(&self) -> Result<(), JobError> {
        if self.job_id.trim().is_empty() {
            return Err(JobError::MissingJobId);
        }
        Ok(())
    }
}

/// Output filename for one rendered view: `job_<id>_view_<index>_<view>.png`.
///
/// The view name is lowercased; the index is the position in the fixed
/// render order.
pub fn view_image_filename(job_id: &str, view_index: usize, view_name: &str) -> String {
    format!(
        "job_{}_view_{}_{}.png",
        job_id,
        view_index,
        view_name.to_lowercase()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_producer_payload() {
        let request: RenderJobRequest = serde_json::from_str(r#"{"JobId":"42"}"#).unwrap();
        assert_eq!(request.job_id, "42");
        assert!(request.validate().is_ok());
    }

    #[test]
    fn blank_job_id_is_rejected() {
        assert_eq!(
            RenderJobRequest::new("  ").validate(),
            Err(JobError::MissingJobId)
        );
    }

    #[test]
    fn filenames_follow_the_per_view_convention() {
        assert_eq!(
            view_image_filename("42", 3, "SOUTH"),
            "job_42_view_3_south.png"
        );
        assert_eq!(
            view_image_filename("a1b2", 0, "NORTH_WEST"),
            "job_a1b2_view_0_north_west.png"
        );
    }
}
