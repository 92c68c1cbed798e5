use std::path::PathBuf;

/// Default dataset location inside the service image.
pub const DEFAULT_DATASET_PATH: &str = "/bin/data/users.json.gz";

/// Random draws allowed per directory record before `allocate_any` falls back
/// to a single sweep.
pub const DEFAULT_DRAW_ATTEMPT_FACTOR: usize = 4;

/// Startup configuration for a [`crate::directory::Directory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryConfig {
    /// Gzip-compressed JSON users catalog.
    pub dataset_path: PathBuf,
    /// Multiplier on directory size bounding the random-draw phase of
    /// unconstrained allocation. Zero skips straight to the sweep.
    pub draw_attempt_factor: usize,
    /// Seed for allocation randomness. `None` draws fresh entropy per call.
    pub seed: Option<u64>,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from(DEFAULT_DATASET_PATH),
            draw_attempt_factor: DEFAULT_DRAW_ATTEMPT_FACTOR,
            seed: None,
        }
    }
}

impl DirectoryConfig {
    pub fn with_dataset_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.dataset_path = path.into();
        self
    }

    pub fn with_draw_attempt_factor(mut self, factor: usize) -> Self {
        self.draw_attempt_factor = factor;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
