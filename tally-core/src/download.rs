//! Chunked downloader
//!
//! Streams an HTTP response body to storage in fixed-size blocks,
//! flashing the status LED around every write so an operator can see
//! the transfer making progress. The block size is a parameter: the
//! original hardware corrupted SD writes larger than one 512-byte
//! block, so that is the default, but other storage should not be
//! silently pinned to the same ceiling.

use alloc::vec;

use crate::scene::{BackgroundSource, Scene};
use crate::status::StatusColor;
use crate::traits::frame::Frame;
use crate::traits::http::{HttpClient, HttpError, HttpResponse};
use crate::traits::led::StatusLed;
use crate::traits::storage::{FileSink, Storage, StorageError};

/// Default write block size in bytes.
///
/// One SD block; historically larger single writes corrupted the card.
pub const DEFAULT_BLOCK_SIZE: usize = 512;

/// Where a downloaded background lands before being installed
pub const TEMP_IMAGE_PATH: &str = "/sd/tempimage.bmp";

/// Operator-facing hint shown when storage rejects a download
pub const STORAGE_HINT: &str =
    "No writable filesystem found for saving the datastream. Insert an SD card.";

/// Download failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DownloadError {
    /// The response declared no parsable `Content-Length`; there is no
    /// partial-content fallback
    MissingLength,
    /// The body ended before the declared length was reached
    Truncated,
    /// Reading the body failed
    Http(HttpError),
    /// Writing or closing the destination failed
    Storage(StorageError),
}

impl From<HttpError> for DownloadError {
    fn from(e: HttpError) -> Self {
        DownloadError::Http(e)
    }
}

impl From<StorageError> for DownloadError {
    fn from(e: StorageError) -> Self {
        DownloadError::Storage(e)
    }
}

impl DownloadError {
    /// Message to put in front of the operator, if this failure has one
    pub fn operator_hint(&self) -> Option<&'static str> {
        match self {
            DownloadError::Storage(_) => Some(STORAGE_HINT),
            _ => None,
        }
    }
}

/// Stream `response`'s body into `sink` in blocks of at most
/// `block_size` bytes.
///
/// Requires a declared `Content-Length`; stops after exactly that many
/// bytes (the final block is truncated to the remainder, never
/// over-read). Returns the byte count written, with the sink closed.
pub fn download<R, S, L>(
    response: &mut R,
    sink: S,
    led: &mut L,
    block_size: usize,
) -> Result<u64, DownloadError>
where
    R: HttpResponse,
    S: FileSink,
    L: StatusLed,
{
    let total = response.content_length().ok_or(DownloadError::MissingLength)?;
    let block_size = block_size.max(1);

    let mut sink = sink;
    let mut buf = vec![0u8; block_size];
    let mut remaining = total;

    led.fill(StatusColor::FETCHING);
    while remaining > 0 {
        let want = remaining.min(block_size as u64) as usize;
        let got = response.read(&mut buf[..want])?;
        if got == 0 {
            return Err(DownloadError::Truncated);
        }

        led.fill(StatusColor::CHUNK_RECEIVED);
        sink.write_all(&buf[..got])?;
        remaining -= got as u64;

        if remaining > 0 {
            led.fill(StatusColor::FETCHING);
        }
    }

    sink.close()?;
    led.fill(StatusColor::OFF);
    Ok(total)
}

/// Errors composing a download with a background install
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FetchBackgroundError {
    Http(HttpError),
    Download(DownloadError),
    Storage(StorageError),
    Scene(crate::scene::SceneError),
}

impl FetchBackgroundError {
    /// Message to put in front of the operator, if this failure has one
    pub fn operator_hint(&self) -> Option<&'static str> {
        match self {
            FetchBackgroundError::Storage(_) => Some(STORAGE_HINT),
            FetchBackgroundError::Download(e) => e.operator_hint(),
            _ => None,
        }
    }
}

/// Download a remote image to `path` on storage, then install it as
/// the scene background at `origin`.
#[allow(clippy::too_many_arguments)]
pub fn fetch_background<C, S, F, L>(
    url: &str,
    path: &str,
    http: &mut C,
    storage: &mut S,
    scene: &mut Scene,
    surface: &mut F,
    led: &mut L,
    block_size: usize,
    origin: (u16, u16),
) -> Result<(), FetchBackgroundError>
where
    C: HttpClient,
    S: Storage,
    F: Frame,
    L: StatusLed,
{
    let mut response = http.get(url).map_err(FetchBackgroundError::Http)?;
    let sink = storage.create(path).map_err(FetchBackgroundError::Storage)?;
    download(&mut response, sink, led, block_size).map_err(FetchBackgroundError::Download)?;
    drop(response);

    let bytes = storage.read(path).map_err(FetchBackgroundError::Storage)?;
    scene
        .set_background_at(BackgroundSource::Bytes(bytes), origin, surface)
        .map_err(FetchBackgroundError::Scene)?;
    Ok(())
}
