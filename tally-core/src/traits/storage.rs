//! Storage trait for the SD card (or any file-backed medium)
//!
//! The core only needs three things from storage: probe it at boot,
//! read a whole file, and stream a download into a new file.

use alloc::vec::Vec;

/// Errors from the storage medium
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageError {
    /// No card inserted / medium not mounted
    NotAvailable,
    /// The requested path does not exist
    NotFound,
    /// A write did not complete
    WriteFailed,
    /// Any other I/O failure
    Io,
}

/// An open file being written
///
/// `close` must be called to flush directory entries; dropping a sink
/// without closing it may leave a truncated file behind.
pub trait FileSink {
    fn write_all(&mut self, data: &[u8]) -> Result<(), StorageError>;
    fn close(self) -> Result<(), StorageError>;
}

/// File-backed storage capability
pub trait Storage {
    type Sink: FileSink;

    /// Check the medium is present and usable
    fn probe(&mut self) -> Result<(), StorageError>;

    /// Read an entire file into memory
    fn read(&mut self, path: &str) -> Result<Vec<u8>, StorageError>;

    /// Create (or truncate) a file for writing
    fn create(&mut self, path: &str) -> Result<Self::Sink, StorageError>;
}
