use std::path::{Path, PathBuf};

use crate::metadata::MetadataDocument;
use crate::nwb::{BackendConfiguration, NwbFile};

/// Destination and mode of one conversion run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Where to write the container; `None` keeps the result in memory only
    pub nwbfile_path: Option<PathBuf>,

    /// Existing in-memory file to write into instead of a fresh one
    pub nwbfile: Option<NwbFile>,

    /// User metadata merged over the interfaces' defaults
    pub metadata: Option<MetadataDocument>,

    /// Replace an existing file instead of appending to it
    pub overwrite: bool,

    /// Per-dataset storage settings; defaults are derived when absent
    pub backend_configuration: Option<BackendConfiguration>,

    /// Log the destination once written
    pub verbose: bool,
}

impl RunOptions {
    /// Write to `path`
    pub fn to_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            nwbfile_path: Some(path.as_ref().to_path_buf()),
            ..Self::default()
        }
    }

    /// Keep the result in memory
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Set user metadata
    pub fn with_metadata(mut self, metadata: MetadataDocument) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Set overwrite mode
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Write into an existing in-memory file
    pub fn with_nwbfile(mut self, nwbfile: NwbFile) -> Self {
        self.nwbfile = Some(nwbfile);
        self
    }

    /// Set storage settings
    pub fn with_backend_configuration(mut self, backend: BackendConfiguration) -> Self {
        self.backend_configuration = Some(backend);
        self
    }

    /// Set verbosity
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}
