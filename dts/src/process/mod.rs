use anyhow::{Result, bail};
use log::debug;

use crate::structs::header::StreamHeader;
use crate::utils::errors::SyncError;

/// RIFF/WAVE container detection.
///
/// Provides [`detect_container_offset`](container::detect_container_offset)
/// for locating the payload of DTS streams wrapped as CD audio.
pub mod container;

/// Frame-aligned reading of synchronized streams.
///
/// Provides the [`FrameReader`](demux::FrameReader) yielding timestamped
/// [`Frame`](demux::Frame) objects.
pub mod demux;

/// Frame aligned seeking.
pub mod seek;

/// Sync word search and frame header decoding.
pub mod sync;

/// URL parsing.
pub mod url;

/// Default number of bytes inspected when opening a stream.
pub const PREVIEW_SIZE: usize = 7 * 1024;

/// Options for stream recognition.
#[derive(Debug, Clone)]
pub struct ProbeOptions {
    /// Bytes read from the start of the source for recognition.
    pub preview_size: usize,
    /// Tolerated irregularities at or above this level are returned as errors.
    ///
    /// - `log::Level::Error`: only fail on errors (default)
    /// - `log::Level::Warn`: also fail on warnings (strict mode)
    pub fail_level: log::Level,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            preview_size: PREVIEW_SIZE,
            fail_level: log::Level::Error,
        }
    }
}

/// Recognizes a DTS stream from a preview of its first bytes.
///
/// Skips a RIFF/WAVE wrapper when present, then decodes the header at the
/// first sync word.
pub fn probe(preview: &[u8], opts: &ProbeOptions) -> Result<StreamHeader> {
    let preview = &preview[..preview.len().min(opts.preview_size)];

    let start = container::inspect_container(preview, opts)?;
    let Some(found) = sync::find_sync(preview, start) else {
        bail!(SyncError::NotFound(preview.len()));
    };

    let header = sync::parse_frame_header(preview, found)?;
    debug!(
        "Synchronized: {} Hz, {} byte frames, {} samples per frame, data at {}",
        header.sample_rate, header.frame_size, header.samples_per_frame, header.data_start
    );

    Ok(header)
}

/// Recognition state of a stream.
///
/// A stream is probed once when opened. Recognition failure is terminal;
/// once synchronized, the header is never revalidated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SyncState {
    #[default]
    Unrecognized,
    Synchronized(StreamHeader),
}

impl SyncState {
    pub fn from_preview(preview: &[u8], opts: &ProbeOptions) -> Self {
        match probe(preview, opts) {
            Ok(header) => SyncState::Synchronized(header),
            Err(e) => {
                debug!("Not a DTS stream: {e}");
                SyncState::Unrecognized
            }
        }
    }

    pub fn header(&self) -> Option<&StreamHeader> {
        match self {
            SyncState::Unrecognized => None,
            SyncState::Synchronized(header) => Some(header),
        }
    }

    pub fn is_synchronized(&self) -> bool {
        matches!(self, SyncState::Synchronized(_))
    }
}
