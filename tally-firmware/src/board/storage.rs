//! SD card storage
//!
//! Implements the core storage traits over embedded-sdmmc. The volume
//! manager is shared through a `RefCell` so an open file sink can keep
//! writing while the storage handle stays usable for the next probe.

use core::cell::RefCell;

use embedded_sdmmc::{
    BlockDevice, Error as SdError, Mode, RawDirectory, RawFile, RawVolume, TimeSource, Timestamp,
    VolumeIdx, VolumeManager,
};

use alloc::vec::Vec;
use tally_core::traits::storage::{FileSink, Storage, StorageError};

/// The card has no RTC to ask; timestamps are fixed
pub struct FixedTime;

impl TimeSource for FixedTime {
    fn get_timestamp(&self) -> Timestamp {
        Timestamp {
            year_since_1970: 54,
            zero_indexed_month: 0,
            zero_indexed_day: 0,
            hours: 0,
            minutes: 0,
            seconds: 0,
        }
    }
}

fn map_error<E: core::fmt::Debug>(e: SdError<E>) -> StorageError {
    match e {
        SdError::NotFound => StorageError::NotFound,
        SdError::DeviceError(_) => StorageError::NotAvailable,
        _ => StorageError::Io,
    }
}

/// Paths from the core arrive as `/sd/<name>`; the card only knows the name
fn file_name(path: &str) -> &str {
    path.strip_prefix("/sd/").unwrap_or(path)
}

/// SD-backed storage over a shared volume manager
pub struct SdStorage<'a, D: BlockDevice> {
    manager: &'a RefCell<VolumeManager<D, FixedTime>>,
}

impl<'a, D: BlockDevice> SdStorage<'a, D> {
    pub fn new(manager: &'a RefCell<VolumeManager<D, FixedTime>>) -> Self {
        Self { manager }
    }

    fn with_root<T>(
        &mut self,
        f: impl FnOnce(
            &mut VolumeManager<D, FixedTime>,
            RawDirectory,
        ) -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        let mut manager = self.manager.borrow_mut();
        let volume = manager
            .open_raw_volume(VolumeIdx(0))
            .map_err(|_| StorageError::NotAvailable)?;
        let root = match manager.open_root_dir(volume) {
            Ok(root) => root,
            Err(e) => {
                let _ = manager.close_volume(volume);
                return Err(map_error(e));
            }
        };
        let result = f(&mut manager, root);
        let _ = manager.close_dir(root);
        let _ = manager.close_volume(volume);
        result
    }
}

impl<'a, D: BlockDevice> Storage for SdStorage<'a, D> {
    type Sink = SdFileSink<'a, D>;

    fn probe(&mut self) -> Result<(), StorageError> {
        self.with_root(|_, _| Ok(()))
    }

    fn read(&mut self, path: &str) -> Result<Vec<u8>, StorageError> {
        self.with_root(|manager, root| {
            let file = manager
                .open_file_in_dir(root, file_name(path), Mode::ReadOnly)
                .map_err(map_error)?;
            let mut data = Vec::new();
            let mut block = [0u8; 512];
            let result = loop {
                match manager.read(file, &mut block) {
                    Ok(0) => break Ok(data),
                    Ok(n) => data.extend_from_slice(&block[..n]),
                    Err(SdError::EndOfFile) => break Ok(data),
                    Err(e) => break Err(map_error(e)),
                }
            };
            let _ = manager.close_file(file);
            result
        })
    }

    fn create(&mut self, path: &str) -> Result<SdFileSink<'a, D>, StorageError> {
        let mut manager = self.manager.borrow_mut();
        let volume = manager
            .open_raw_volume(VolumeIdx(0))
            .map_err(|_| StorageError::NotAvailable)?;
        let root = match manager.open_root_dir(volume) {
            Ok(root) => root,
            Err(e) => {
                let _ = manager.close_volume(volume);
                return Err(map_error(e));
            }
        };
        let file = match manager.open_file_in_dir(
            root,
            file_name(path),
            Mode::ReadWriteCreateOrTruncate,
        ) {
            Ok(file) => file,
            Err(e) => {
                let _ = manager.close_dir(root);
                let _ = manager.close_volume(volume);
                return Err(map_error(e));
            }
        };
        drop(manager);
        Ok(SdFileSink {
            manager: self.manager,
            handles: Some((volume, root, file)),
        })
    }
}

/// An open file on the card; closes its handles on drop if the caller
/// never finished the write.
pub struct SdFileSink<'a, D: BlockDevice> {
    manager: &'a RefCell<VolumeManager<D, FixedTime>>,
    handles: Option<(RawVolume, RawDirectory, RawFile)>,
}

impl<D: BlockDevice> SdFileSink<'_, D> {
    fn close_handles(&mut self) -> Result<(), StorageError> {
        if let Some((volume, root, file)) = self.handles.take() {
            let mut manager = self.manager.borrow_mut();
            let closed = manager.close_file(file).map_err(map_error);
            let _ = manager.close_dir(root);
            let _ = manager.close_volume(volume);
            closed?;
        }
        Ok(())
    }
}

impl<D: BlockDevice> FileSink for SdFileSink<'_, D> {
    fn write_all(&mut self, data: &[u8]) -> Result<(), StorageError> {
        let (_, _, file) = self.handles.as_ref().ok_or(StorageError::Io)?;
        self.manager
            .borrow_mut()
            .write(*file, data)
            .map_err(|_| StorageError::WriteFailed)
    }

    fn close(mut self) -> Result<(), StorageError> {
        self.close_handles()
    }
}

impl<D: BlockDevice> Drop for SdFileSink<'_, D> {
    fn drop(&mut self) {
        let _ = self.close_handles();
    }
}
