/// Errors raised by an asset transport.
#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    #[error("{url}: HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("{url}: {reason}")]
    Connection { url: String, reason: String },
}

/// Blocking fetch interface the host supplies for the two asset kinds a
/// session needs: camera calibration data and marker pattern descriptors.
pub trait AssetTransport {
    /// Existence check without a body transfer. `Ok` carries the HTTP
    /// status code; transport failures are errors.
    fn head(&self, url: &str) -> Result<u16, TransportError>;

    /// Fetch the full resource body. Non-success statuses are errors.
    fn get(&self, url: &str) -> Result<Vec<u8>, TransportError>;
}
