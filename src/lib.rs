//! # firmata-client
//!
//! A Rust client for the [Firmata](https://github.com/firmata/protocol)
//! binary protocol: control microcontroller I/O pins (Arduino and
//! compatibles running StandardFirmata) over a serial port.
//!
//! This crate uses the `serialport` crate for cross-platform serial
//! communication.
//!
//! ## Features
//!
//! *   Device opening with the full Firmata startup handshake
//!     (`Device::open`, or `Device::attach` for a custom transport).
//! *   Capability discovery: per-pin supported modes and resolutions
//!     (`get_capability`, `capabilities`, `pin_count`).
//! *   Pin mode control with synchronous state refresh (`set_pin_mode`,
//!     `update_pin`).
//! *   Digital and analog (PWM/servo) writes (`digital_write`,
//!     `analog_write`).
//! *   Analog and digital change reporting (`report_analog_pin`,
//!     `report_analog_pin_all`, `report_digital_pin`,
//!     `report_digital_port`).
//! *   Firmware and protocol version queries (`query_firmware`,
//!     `query_version`).
//! *   Pin change observers (`add_analog_observer`,
//!     `add_digital_observer`) driven by the device loop
//!     (`run`/`stop` with a [`LoopDelegate`]).
//!
//! ## Basic Usage
//!
//! ```no_run
//! use firmata_client::{Device, PinMode, Result};
//! use std::{thread, time::Duration};
//!
//! fn main() -> Result<()> {
//!     // Optional: initialize logging.
//!     // env_logger::init();
//!
//!     // Baud rate must match the firmware's (57600 for StandardFirmata).
//!     let mut device = Device::open("/dev/ttyACM0", 57600)?;
//!     println!("Firmware: {:?}", device.firmware());
//!     println!("Pins: {}", device.pin_count());
//!
//!     let led = 13;
//!     device.set_pin_mode(led, PinMode::Output)?;
//!     for _ in 0..10 {
//!         device.digital_write(led, true)?;
//!         thread::sleep(Duration::from_millis(200));
//!         device.digital_write(led, false)?;
//!         thread::sleep(Duration::from_millis(200));
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Observing pin changes
//!
//! Register a [`PinObserver`] for analog or digital changes, then drive the
//! device loop with a [`LoopDelegate`]; `run` enables reporting on every
//! analog-capable pin and drains unsolicited traffic between ticks.
//!
//! ## Concurrency model
//!
//! The device handle is single-threaded and fully synchronous: every query
//! blocks until its response is parsed, relying on Firmata's in-order
//! replies. There are no timeouts on in-flight reads beyond the serial
//! port's own; `stop()` is observed at loop iteration boundaries only.

// Internal modules; public types are re-exported below.
mod consts;
mod device;
mod error;
mod observer;
mod parser;
mod scheduler;
mod transport;

pub mod codec;
pub mod pin;
pub mod port;
pub mod stream;

pub use device::Device;
pub use error::{Error, Result};
pub use observer::PinObserver;
pub use pin::{Firmware, Pin, PinCapability, PinMode, ProtocolVersion};
pub use scheduler::{LoopDelegate, LOOP_MIN_INTERVAL};
pub use stream::{ByteStream, Expected};
pub use transport::Transport;
