//! Inter-task communication channels
//!
//! The dashboard loop runs blocking on the thread executor; anything
//! it wants logged asynchronously goes through these embassy-sync
//! statics to tasks on the interrupt executor.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

/// Queued cycle summaries for the logger task
const CYCLE_LOG_SIZE: usize = 8;

/// One line of what a carousel cycle did
#[derive(Debug, Clone, Copy)]
pub struct CycleSummary {
    pub panel: &'static str,
    pub shown: bool,
}

/// Cycle summaries from the dashboard loop to the logger task
pub static CYCLE_LOG: Channel<CriticalSectionRawMutex, CycleSummary, CYCLE_LOG_SIZE> =
    Channel::new();
