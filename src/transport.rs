//! Byte-oriented transport boundary.

use std::io::{Read, Write};
use std::time::Duration;

use log::debug;
use serialport::ClearBuffer;

use crate::error::Result;

/// Marker trait for transports the protocol engine can drive: anything that
/// is `Read + Write + Send`. Serial ports qualify, as do in-memory fakes.
pub trait Transport: Read + Write + Send {}
impl<T: Read + Write + Send> Transport for T {}

/// Read timeout applied to the serial port. Firmata devices greet within a
/// couple of seconds of the port opening (board reset time included).
const SERIAL_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens a serial port in raw mode at the given baud rate and discards any
/// stale bytes buffered by the OS from before the open.
pub(crate) fn open_serial(path: &str, baud_rate: u32) -> Result<Box<dyn Transport>> {
    debug!("opening serial port {} at {} baud", path, baud_rate);
    let port = serialport::new(path, baud_rate)
        .timeout(SERIAL_READ_TIMEOUT)
        .open()?;
    port.clear(ClearBuffer::Input)?;
    Ok(Box::new(port))
}
