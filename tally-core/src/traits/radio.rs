//! Wi-Fi radio trait
//!
//! Mirrors the narrow surface the bring-up sequence needs: prove the
//! radio is alive, then associate with an access point. Socket-level
//! networking goes through [`HttpClient`](super::http::HttpClient)
//! instead.

/// Errors from the radio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RadioError {
    /// The radio did not answer a liveness probe
    Unresponsive,
    /// Association with the access point failed
    JoinFailed,
}

/// Wi-Fi radio control
pub trait WifiRadio {
    /// Liveness probe (e.g. read the co-processor firmware version)
    fn probe(&mut self) -> Result<(), RadioError>;

    /// Hard-reset the radio after a failed probe
    fn reset(&mut self);

    /// Associate with an access point (one attempt, no internal retry)
    fn join(&mut self, ssid: &str, password: &str) -> Result<(), RadioError>;

    /// Whether the radio currently holds an association
    fn is_connected(&self) -> bool;
}
