use std::fmt;
use std::path::PathBuf;

use crate::metadata::MetadataDocument;
use crate::nwb::{BackendConfiguration, NwbError, NwbFile, NwbIo};

use super::RunOptions;

/// States of an output container handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    /// Nothing acquired yet
    NotAcquired,
    /// Fresh container built from metadata
    Created,
    /// Existing container opened for append
    Opened,
    /// File-level metadata applied
    MetadataApplied,
    /// Every interface has written its content
    ContentWritten,
    /// Flushed and closed, or abandoned after a failure
    Released,
}

impl fmt::Display for HandleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotAcquired => "not acquired",
            Self::Created => "created",
            Self::Opened => "opened",
            Self::MetadataApplied => "metadata applied",
            Self::ContentWritten => "content written",
            Self::Released => "released",
        };
        f.write_str(name)
    }
}

/// Exclusive handle on the output container of one conversion run.
///
/// The destination file is only replaced by [`release`](Self::release);
/// dropping the handle in any other state leaves the prior artifact untouched.
pub struct NwbFileHandle {
    path: Option<PathBuf>,
    nwbfile: Option<NwbFile>,
    state: HandleState,
    backend_configuration: Option<BackendConfiguration>,
    verbose: bool,
}

impl NwbFileHandle {
    /// Create or open the container described by `options`.
    ///
    /// - an in-memory `nwbfile` is used as is (its file-level fields are kept)
    /// - an existing file at `nwbfile_path` without `overwrite` is opened for append
    /// - otherwise a fresh container is built from `metadata`
    pub fn acquire(options: RunOptions, metadata: &MetadataDocument) -> Result<Self, NwbError> {
        let RunOptions {
            nwbfile_path,
            nwbfile,
            overwrite,
            backend_configuration,
            verbose,
            ..
        } = options;

        let existing = nwbfile_path
            .as_ref()
            .filter(|path| !overwrite && path.exists());

        let (nwbfile, state) = match (nwbfile, existing) {
            (Some(_), Some(path)) => {
                return Err(NwbError::InvalidData(format!(
                    "cannot write an in-memory NWBFile to '{}': the file exists and overwrite is false",
                    path.display()
                )));
            }
            (Some(nwbfile), None) => (nwbfile, HandleState::Opened),
            (None, Some(path)) => (NwbIo::read(path)?, HandleState::Opened),
            (None, None) => (NwbFile::create_from_metadata(metadata)?, HandleState::Created),
        };
        log::debug!("Output container {} -> {}", HandleState::NotAcquired, state);

        Ok(Self {
            path: nwbfile_path,
            nwbfile: Some(nwbfile),
            state,
            backend_configuration,
            verbose,
        })
    }

    /// Current state
    pub fn state(&self) -> HandleState {
        self.state
    }

    /// Destination path, if any
    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }

    /// Apply file-level metadata; an opened container is left unchanged
    pub fn apply_metadata(&mut self, metadata: &MetadataDocument) -> Result<(), NwbError> {
        match (self.state, self.nwbfile.as_mut()) {
            (HandleState::Created, Some(nwbfile)) => nwbfile.apply_metadata(metadata)?,
            (HandleState::Opened, _) => {}
            (other, _) => return Err(invalid_transition(other, HandleState::MetadataApplied)),
        }
        self.transition(HandleState::MetadataApplied);
        Ok(())
    }

    /// The open container, for interfaces to write into
    pub fn nwbfile_mut(&mut self) -> Result<&mut NwbFile, NwbError> {
        match (self.state, self.nwbfile.as_mut()) {
            (HandleState::MetadataApplied, Some(nwbfile)) => Ok(nwbfile),
            (other, _) => Err(NwbError::InvalidData(format!(
                "output container is not writable in state '{}'",
                other
            ))),
        }
    }

    /// Record that all content has been written
    pub fn mark_content_written(&mut self) -> Result<(), NwbError> {
        if self.state != HandleState::MetadataApplied {
            return Err(invalid_transition(self.state, HandleState::ContentWritten));
        }
        self.transition(HandleState::ContentWritten);
        Ok(())
    }

    /// Flush to the destination (if any) and return the final container
    pub fn release(mut self) -> Result<NwbFile, NwbError> {
        let nwbfile = match (self.state, self.nwbfile.take()) {
            (HandleState::ContentWritten, Some(nwbfile)) => nwbfile,
            (other, _) => return Err(invalid_transition(other, HandleState::Released)),
        };

        if let Some(path) = &self.path {
            let backend = match self.backend_configuration.take() {
                Some(backend) => {
                    let remapped = backend.find_locations_requiring_remapping(&nwbfile)?;
                    backend.build_remapped_backend(remapped)
                }
                None => BackendConfiguration::from_nwbfile(&nwbfile),
            };
            NwbIo::write(&nwbfile, path, &backend)?;
            if self.verbose {
                log::info!("NWB file saved at {}", path.display());
            }
        }

        self.transition(HandleState::Released);
        Ok(nwbfile)
    }

    fn transition(&mut self, next: HandleState) {
        log::debug!("Output container {} -> {}", self.state, next);
        self.state = next;
    }
}

impl Drop for NwbFileHandle {
    fn drop(&mut self) {
        if self.state != HandleState::Released {
            log::debug!(
                "Output container released in state '{}' without writing",
                self.state
            );
            self.state = HandleState::Released;
        }
    }
}

fn invalid_transition(from: HandleState, to: HandleState) -> NwbError {
    NwbError::InvalidData(format!(
        "invalid output container transition from '{}' to '{}'",
        from, to
    ))
}
