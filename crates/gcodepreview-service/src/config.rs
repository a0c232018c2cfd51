//! Service configuration from environment variables.

use tracing::warn;

use gcodepreview_renderer::{DEFAULT_HEIGHT, DEFAULT_WIDTH};

/// Runtime configuration of the render service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Queue the consumer subscribes to for validated render jobs.
    pub queue_name: String,
    /// Base URL of the file server that stores G-code and preview images.
    pub file_server_base_url: String,
    pub render_width: u32,
    pub render_height: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            queue_name: "GcodeRendererJobValidated".to_string(),
            file_server_base_url: "http://file-processor:80".to_string(),
            render_width: DEFAULT_WIDTH,
            render_height: DEFAULT_HEIGHT,
        }
    }
}

impl ServiceConfig {
    /// Build the configuration from the environment, falling back to the
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            queue_name: env_string("RENDER_QUEUE_NAME", defaults.queue_name),
            file_server_base_url: env_string("FILE_SERVER_BASE_URL", defaults.file_server_base_url),
            render_width: env_u32("RENDER_WIDTH", defaults.render_width),
            render_height: env_u32("RENDER_HEIGHT", defaults.render_height),
        }
    }
}

fn env_string(name: &str, default: String) -> String {
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => value,
        _ => default,
    }
}

fn env_u32(name: &str, default: u32) -> u32 {
    match std::env::var(name) {
        Ok(value) => match value.parse() {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!("ignoring {name}={value:?}: {err}");
                default
            }
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_deployment_conventions() {
        let config = ServiceConfig::default();
        assert_eq!(config.queue_name, "GcodeRendererJobValidated");
        assert_eq!(config.file_server_base_url, "http://file-processor:80");
        assert_eq!(config.render_width, 3840);
        assert_eq!(config.render_height, 2160);
    }

    #[test]
    fn unparsable_dimension_falls_back_to_default() {
        assert_eq!(env_u32("GCODEPREVIEW_TEST_UNSET_DIMENSION", 2160), 2160);
    }
}
