//! HTTP client trait
//!
//! The dashboard only ever issues plain GET requests and reads the
//! body, either all at once (JSON metrics) or in chunks (image
//! downloads). Everything else - sockets, DNS, TLS offload - stays
//! behind this seam.

use alloc::vec::Vec;

/// Errors that can occur while talking to a remote endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HttpError {
    /// DNS lookup or TCP connect failed
    Connect,
    /// The request could not be written or the response header not parsed
    Protocol,
    /// Read from the response body failed mid-stream
    Io,
    /// The body exceeded the caller's size cap
    TooLarge,
}

/// A single in-flight HTTP response
///
/// Dropping a response closes the underlying connection.
pub trait HttpResponse {
    /// HTTP status code (200, 404, ...)
    fn status(&self) -> u16;

    /// Declared `Content-Length`, if the server sent one
    fn content_length(&self) -> Option<u64>;

    /// Read the next slice of the body into `buf`
    ///
    /// Returns the number of bytes read; 0 means end of body.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, HttpError>;
}

/// Blocking HTTP GET capability
pub trait HttpClient {
    type Response: HttpResponse;

    /// Issue a GET request and return the response once headers are in
    fn get(&mut self, url: &str) -> Result<Self::Response, HttpError>;
}

/// Read an entire response body, capped at `max_len` bytes.
///
/// Uses the declared content length as an early reject when present;
/// otherwise reads until end of body or the cap is hit.
pub fn read_body<R: HttpResponse>(response: &mut R, max_len: usize) -> Result<Vec<u8>, HttpError> {
    if let Some(len) = response.content_length() {
        if len > max_len as u64 {
            return Err(HttpError::TooLarge);
        }
    }

    let mut body = Vec::new();
    let mut buf = [0u8; 256];
    loop {
        let n = response.read(&mut buf)?;
        if n == 0 {
            return Ok(body);
        }
        if body.len() + n > max_len {
            return Err(HttpError::TooLarge);
        }
        body.extend_from_slice(&buf[..n]);
    }
}
