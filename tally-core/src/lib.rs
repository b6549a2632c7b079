//! Board-agnostic core logic for the Tally smart dashboard firmware
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Hardware abstraction traits (HTTP, storage, display frame, LED, radio)
//! - JSON path resolver for picking counters out of API responses
//! - Chunked downloader for streaming images to storage
//! - Scene model (background slot + overlay stack) and compositor
//! - Metric panel fetch-and-render cycle
//! - Bring-up sequence and panel carousel
//! - Configuration type definitions

#![no_std]
#![deny(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

pub mod bringup;
pub mod carousel;
pub mod config;
pub mod download;
pub mod json;
pub mod panel;
pub mod scene;
pub mod status;
pub mod traits;

#[cfg(test)]
pub(crate) mod testutil;
