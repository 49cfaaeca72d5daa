//! Byte transport for the operator command link.

use crate::error::Result;

mod link;
mod mock;
mod serial;

pub use link::CommandLink;
pub use mock::MockTransport;
pub use serial::SerialTransport;

/// Transport trait for byte-oriented device communication
pub trait Transport: Send {
    /// Read data into buffer, returns number of bytes read (0 when nothing
    /// is pending)
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize>;

    /// Write data from buffer, returns number of bytes written
    fn write(&mut self, data: &[u8]) -> Result<usize>;

    /// Flush any pending writes (blocking until complete)
    fn flush(&mut self) -> Result<()>;

    /// Check if data is available to read
    fn available(&mut self) -> Result<usize> {
        Ok(0) // Default implementation
    }
}
