//! # Output-Container Lifecycle
//!
//! Every conversion run goes through one [`NwbFileHandle`]:
//!
//! ```text
//! NotAcquired ──► Created ─┐
//!      │                   ├──► MetadataApplied ──► ContentWritten ──► Released
//!      └────────► Opened ──┘
//! ```
//!
//! A failure at any step drops the handle, which moves straight to
//! `Released` without writing. Because the destination is only replaced
//! atomically on a successful release, a failed run leaves any prior file
//! untouched.
//!
//! The handle does not lock the destination: running two conversions against
//! the same path at the same time is the caller's responsibility.

mod handle;
mod options;

#[cfg(test)]
mod tests;

pub use handle::{HandleState, NwbFileHandle};
pub use options::RunOptions;

use crate::metadata::MetadataDocument;
use crate::nwb::{NwbError, NwbFile};

/// Acquire the container described by `options`, let `write` fill it, and
/// release it.
///
/// `metadata` is the fully merged Metadata Document; it seeds a fresh
/// container and is ignored when appending to an existing one. The returned
/// file is the in-memory state that was (or, without a path, would have been)
/// written.
pub fn make_or_load_nwbfile<F, E>(
    options: RunOptions,
    metadata: &MetadataDocument,
    write: F,
) -> Result<NwbFile, E>
where
    F: FnOnce(&mut NwbFile) -> Result<(), E>,
    E: From<NwbError>,
{
    let mut handle = NwbFileHandle::acquire(options, metadata)?;
    handle.apply_metadata(metadata)?;
    write(handle.nwbfile_mut()?)?;
    handle.mark_content_written()?;
    Ok(handle.release()?)
}
