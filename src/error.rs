use thiserror::Error;

/// Errors that can occur when talking to a Firmata device.
///
/// Transport and protocol errors are fatal: after either, the byte stream is
/// at an indeterminate position and the device should be reopened. Usage
/// errors report bad arguments and leave the device usable.
#[derive(Error, Debug)]
pub enum Error {
    /// Error from the underlying serial port layer.
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),
    /// I/O error on the transport (read/write/flush failure or timeout).
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// A specific byte was required but something else arrived.
    #[error("unexpected byte 0x{actual:02X} where 0x{expected:02X} was required")]
    UnexpectedByte {
        /// The byte the protocol grammar required at this position.
        expected: u8,
        /// The byte actually read from the stream.
        actual: u8,
    },
    /// Leading command byte matched no known Firmata message.
    #[error("unknown command byte 0x{0:02X}")]
    UnknownCommand(u8),
    /// SysEx sub-command matched no known handler.
    #[error("unknown SysEx command 0x{0:02X}")]
    UnknownSysEx(u8),
    /// Pin mode code from the wire is outside the known mode table.
    #[error("unknown pin mode code 0x{0:02X}")]
    UnknownPinMode(u8),
    /// A 7-bit-pair payload had an odd byte count and cannot be paired.
    #[error("7-bit payload length {0} is odd, cannot pair losslessly")]
    OddPayloadLength(usize),
    /// A capability response described more pins than the wire can address.
    #[error("capability response describes {0} pins (protocol limit 128)")]
    TooManyPins(usize),
    /// The device reported that a queried pin does not exist.
    #[error("pin {0} does not exist on the device")]
    NoSuchPin(u8),
    /// Pin number is outside the discovered pin table.
    #[error("pin {pin} out of range (device has {count} pins)")]
    PinOutOfRange {
        /// The pin number that was requested.
        pin: u8,
        /// Number of pins discovered on the device.
        count: usize,
    },
    /// Analog pin index outside the protocol's 0-15 range.
    #[error("analog pin index {0} out of range (0-15)")]
    AnalogIndexOutOfRange(u8),
    /// The pin has no analog capability (mapping sentinel was 0x7F).
    #[error("pin {0} does not support analog input")]
    NotAnalogCapable(u8),
}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
