//! Shared test fixtures: a scripted transport and a Firmata session builder.

#![allow(dead_code)]

use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex};

use firmata_client::Device;

/// Transport fake that serves a pre-built byte script and captures every
/// write. Reading past the end of the script reports a timeout, like a
/// serial port with no more traffic.
pub struct MockTransport {
    input: Vec<u8>,
    pos: usize,
    written: Arc<Mutex<Vec<u8>>>,
}

impl MockTransport {
    pub fn new(script: Vec<u8>) -> (Self, Arc<Mutex<Vec<u8>>>) {
        let written = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                input: script,
                pos: 0,
                written: written.clone(),
            },
            written,
        )
    }
}

impl Read for MockTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pos >= self.input.len() {
            return Err(io::Error::new(
                io::ErrorKind::TimedOut,
                "mock transport script exhausted",
            ));
        }
        let n = buf.len().min(self.input.len() - self.pos);
        buf[..n].copy_from_slice(&self.input[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

impl Write for MockTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.written.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Encodes a string into Firmata's 7-bit-pair wire form.
pub fn encode_name(name: &str) -> Vec<u8> {
    let mut wire = Vec::new();
    for b in name.bytes() {
        wire.push(b & 0x7F);
        wire.push((b >> 7) & 0x7F);
    }
    wire
}

/// Builds the byte stream a Firmata device would emit for one session.
pub struct Session {
    bytes: Vec<u8>,
}

impl Session {
    pub fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    /// The connect-time greeting: version report followed by a firmware
    /// response.
    pub fn greeting(mut self, major: u8, minor: u8, name: &str) -> Self {
        self.bytes.extend_from_slice(&[0xF9, major, minor]);
        self.bytes.extend_from_slice(&[0xF0, 0x79, major, minor]);
        self.bytes.extend_from_slice(&encode_name(name));
        self.bytes.push(0xF7);
        self
    }

    /// Capability response: one `(mode, resolution_exponent)` list per pin.
    pub fn capability(mut self, pins: &[&[(u8, u8)]]) -> Self {
        self.bytes.extend_from_slice(&[0xF0, 0x6C]);
        for modes in pins {
            for &(mode, exp) in *modes {
                self.bytes.push(mode);
                self.bytes.push(exp);
            }
            self.bytes.push(0x7F);
        }
        self.bytes.push(0xF7);
        self
    }

    /// Analog-mapping response; `0x7F` marks a pin with no analog index.
    pub fn analog_mapping(mut self, map: &[u8]) -> Self {
        self.bytes.extend_from_slice(&[0xF0, 0x6A]);
        self.bytes.extend_from_slice(map);
        self.bytes.push(0xF7);
        self
    }

    /// Pin-state response with the given 7-bit state bytes.
    pub fn pin_state(mut self, pin: u8, mode: u8, state: &[u8]) -> Self {
        self.bytes.extend_from_slice(&[0xF0, 0x6E, pin, mode]);
        self.bytes.extend_from_slice(state);
        self.bytes.push(0xF7);
        self
    }

    /// An inbound analog message for `analog_pin` carrying `value`.
    pub fn analog_message(mut self, analog_pin: u8, value: u16) -> Self {
        self.bytes.push(0xE0 | (analog_pin & 0x0F));
        self.bytes.push((value & 0x7F) as u8);
        self.bytes.push(((value >> 7) & 0x7F) as u8);
        self
    }

    /// An inbound digital message for `port`.
    pub fn digital_message(mut self, port: u8, lsb: u8, msb: u8) -> Self {
        self.bytes.push(0x90 | (port & 0x0F));
        self.bytes.push(lsb);
        self.bytes.push(msb);
        self
    }

    /// A firmware response on its own (no leading version report).
    pub fn firmware_response(mut self, name: &str, major: u8, minor: u8) -> Self {
        self.bytes.extend_from_slice(&[0xF0, 0x79, major, minor]);
        self.bytes.extend_from_slice(&encode_name(name));
        self.bytes.push(0xF7);
        self
    }

    /// A version report.
    pub fn version_report(mut self, major: u8, minor: u8) -> Self {
        self.bytes.extend_from_slice(&[0xF9, major, minor]);
        self
    }

    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.bytes
    }
}

/// A 3-pin device: pins 0-1 digital (pin 1 also PWM), pin 2 analog as A0.
/// Includes the init-time state priming responses (all pins output, low,
/// except pin 2 which is an input).
pub fn three_pin_session() -> Session {
    Session::new()
        .greeting(2, 5, "StandardFirmata")
        .capability(&[
            &[(0x00, 1), (0x01, 1)],
            &[(0x00, 1), (0x01, 1), (0x03, 8)],
            &[(0x00, 1), (0x01, 1), (0x02, 10)],
        ])
        .analog_mapping(&[0x7F, 0x7F, 0x00])
        .pin_state(0, 0x01, &[0x00])
        .pin_state(1, 0x01, &[0x00])
        .pin_state(2, 0x00, &[0x00])
}

/// An 8-pin digital-only device (one full port), every pin primed in output
/// mode; `high_pins` start with state 1.
pub fn one_port_session(high_pins: &[u8]) -> Session {
    let mut session = Session::new()
        .greeting(2, 5, "StandardFirmata")
        .capability(&[&[(0x00, 1), (0x01, 1)][..]; 8])
        .analog_mapping(&[0x7F; 8]);
    for pin in 0..8u8 {
        let state = if high_pins.contains(&pin) { 0x01 } else { 0x00 };
        session = session.pin_state(pin, 0x01, &[state]);
    }
    session
}

/// Attaches a device to a scripted transport, returning the handle and the
/// capture of everything it wrote. Set `RUST_LOG` to see the wire traffic.
pub fn attach(script: Vec<u8>) -> (Device, Arc<Mutex<Vec<u8>>>) {
    let _ = env_logger::builder().is_test(true).try_init();
    let (transport, written) = MockTransport::new(script);
    let device = Device::attach(Box::new(transport)).expect("initialization should succeed");
    (device, written)
}

/// Drops everything captured so far so a test can assert on later writes.
pub fn clear_writes(written: &Arc<Mutex<Vec<u8>>>) {
    written.lock().unwrap().clear();
}

pub fn take_writes(written: &Arc<Mutex<Vec<u8>>>) -> Vec<u8> {
    std::mem::take(&mut *written.lock().unwrap())
}
