use serde::Deserialize;

/// Default directory for staged files inside the shared virtual filesystem.
pub const DEFAULT_STAGING_DIR: &str = "/tmp";

/// Default buffer size for the command and event channels. A session keeps a
/// single request in flight, so these never fill under normal discipline.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 8;

/// Fallback user-facing message when a worker error event carries no message.
pub const GENERIC_CONVERSION_ERROR: &str = "Conversion failed";

/// Top-level configuration for a conversion session.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Directory in the shared filesystem where request files are staged.
    pub staging_dir: String,
    /// Capacity of the coordinator-to-worker command channel.
    pub command_capacity: usize,
    /// Capacity of the worker-to-coordinator event channel.
    pub event_capacity: usize,
}

impl SessionConfig {
    /// Staged input path for a request, derived from the source extension.
    pub fn staged_input_path(&self, extension: &str) -> String {
        format!("{}/input.{}", self.staging_dir, extension)
    }

    /// Fixed staged output path; every conversion writes its PDF here.
    pub fn staged_output_path(&self) -> String {
        format!("{}/output.pdf", self.staging_dir)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            staging_dir: DEFAULT_STAGING_DIR.to_owned(),
            command_capacity: DEFAULT_CHANNEL_CAPACITY,
            event_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}
