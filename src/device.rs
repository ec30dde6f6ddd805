//! Device facade: initialization handshake and the pin-control API.

use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, warn};

use crate::codec;
use crate::consts;
use crate::error::{Error, Result};
use crate::observer::{ObserverRegistry, PinObserver};
use crate::pin::{Firmware, Pin, PinCapability, PinMode, ProtocolVersion};
use crate::port::{self, DigitalPortReport};
use crate::stream::{ByteStream, Expected};
use crate::transport::{self, Transport};

/// A handle to an initialized Firmata device.
///
/// Construction runs the full startup sequence: greeting synchronization,
/// version and firmware parsing, capability discovery, analog-pin mapping,
/// per-pin state priming, and the sampling-interval setting. A handle you
/// hold is therefore always fully initialized.
///
/// **Note:** the handle is single-threaded (`!Send`); all protocol traffic
/// happens on the caller's thread.
pub struct Device {
    pub(crate) stream: ByteStream,
    pub(crate) pins: Vec<Pin>,
    pub(crate) firmware: Firmware,
    pub(crate) version: ProtocolVersion,
    pub(crate) port_reports: HashMap<u8, DigitalPortReport>,
    pub(crate) analog_observers: ObserverRegistry,
    pub(crate) digital_observers: ObserverRegistry,
    pub(crate) capability_known: bool,
    pub(crate) pins_initialized: bool,
    pub(crate) running: bool,
    pub(crate) idle: bool,
}

impl Device {
    // --- Constructors ---

    /// Opens the serial device at `path` (e.g. `/dev/ttyACM0`, `COM3`) with
    /// the given baud rate and runs the initialization sequence. The baud
    /// rate must match the firmware's (57600 for stock StandardFirmata).
    pub fn open(path: &str, baud_rate: u32) -> Result<Self> {
        Self::attach(transport::open_serial(path, baud_rate)?)
    }

    /// Initializes a device over an already-opened transport.
    ///
    /// Any short read, timeout, or malformed byte during initialization is
    /// fatal; the device object is not constructed.
    pub fn attach(transport: Box<dyn Transport>) -> Result<Self> {
        let mut stream = ByteStream::new(transport);
        let (version, firmware) = Self::handshake(&mut stream)?;
        debug!(
            "connected to {} v{}.{} (protocol {}.{})",
            firmware.name, firmware.major, firmware.minor, version.major, version.minor
        );
        let mut device = Self {
            stream,
            pins: Vec::new(),
            firmware,
            version,
            port_reports: HashMap::new(),
            analog_observers: ObserverRegistry::default(),
            digital_observers: ObserverRegistry::default(),
            capability_known: false,
            pins_initialized: false,
            running: false,
            idle: true,
        };
        device.init_pins()?;
        Ok(device)
    }

    /// Closes the device, dropping the underlying transport.
    pub fn close(self) {}

    /// Synchronizes against the firmware's connect-time greeting.
    ///
    /// The firmware emits a version report followed by a firmware response
    /// when the port opens; scanning for the fixed frame of that pair skips
    /// whatever noise precedes it.
    fn handshake(stream: &mut ByteStream) -> Result<(ProtocolVersion, Firmware)> {
        let window = stream.wait_for_sequence(&[
            Expected::Byte(consts::REPORT_VERSION),
            Expected::Any,
            Expected::Any,
            Expected::Byte(consts::SYSEX_START),
            Expected::Byte(consts::QUERY_FIRMWARE),
        ])?;
        let major = window[1];
        let minor = window[2];
        // The firmware response repeats the version before the name.
        stream.next_byte()?;
        stream.next_byte()?;
        let name_wire = Self::read_until_sysex_end(stream)?;
        let name = codec::decode_string(&name_wire)?;
        Ok((
            ProtocolVersion { major, minor },
            Firmware { name, major, minor },
        ))
    }

    pub(crate) fn read_until_sysex_end(stream: &mut ByteStream) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        loop {
            let b = stream.next_byte()?;
            if b == consts::SYSEX_END {
                return Ok(bytes);
            }
            bytes.push(b);
        }
    }

    /// Runs capability discovery, analog mapping, per-pin state priming, and
    /// sets the sampling interval.
    fn init_pins(&mut self) -> Result<()> {
        self.stream.send(&[
            consts::SYSEX_START,
            consts::QUERY_CAPABILITY,
            consts::SYSEX_END,
        ])?;
        self.dispatch_message()?;

        self.stream.send(&[
            consts::SYSEX_START,
            consts::QUERY_ANALOG_MAPPING,
            consts::SYSEX_END,
        ])?;
        self.dispatch_message()?;

        for pin in 0..self.pins.len() as u8 {
            self.update_pin(pin)?;
        }

        let interval = consts::DEFAULT_SAMPLING_INTERVAL_MS;
        self.stream.send(&[
            consts::SYSEX_START,
            consts::SAMPLING_INTERVAL,
            (interval & 0x7F) as u8,
            ((interval >> 7) & 0x7F) as u8,
            consts::SYSEX_END,
        ])?;
        self.pins_initialized = true;
        // Fresh slate for the drain bookkeeping once construction is done.
        self.idle = true;
        Ok(())
    }

    // --- Pin table access ---

    /// Number of pins discovered on the device.
    pub fn pin_count(&self) -> usize {
        self.pins.len()
    }

    /// All discovered pins, indexed by pin number.
    pub fn pins(&self) -> &[Pin] {
        &self.pins
    }

    /// Returns the pin record, or an error for a number the device does not
    /// have. There is no safe no-op interpretation for a bad lookup.
    pub fn get_pin(&self, pin: u8) -> Result<&Pin> {
        self.pins
            .get(pin as usize)
            .ok_or(Error::PinOutOfRange {
                pin,
                count: self.pins.len(),
            })
    }

    pub(crate) fn get_pin_mut(&mut self, pin: u8) -> Result<&mut Pin> {
        let count = self.pins.len();
        self.pins
            .get_mut(pin as usize)
            .ok_or(Error::PinOutOfRange { pin, count })
    }

    /// Returns the capability of one pin.
    pub fn get_capability(&self, pin: u8) -> Result<&PinCapability> {
        Ok(self.get_pin(pin)?.capability())
    }

    /// Capabilities of all pins, in pin-number order.
    pub fn capabilities(&self) -> impl Iterator<Item = &PinCapability> {
        self.pins.iter().map(Pin::capability)
    }

    /// Looks up the pin mapped to an analog index.
    ///
    /// An index outside 0-15 is a hard error; a valid index no pin maps to
    /// returns `Ok(None)`.
    pub fn get_pin_by_analog_pin_number(&self, analog_pin: u8) -> Result<Option<&Pin>> {
        if analog_pin > 15 {
            return Err(Error::AnalogIndexOutOfRange(analog_pin));
        }
        Ok(self
            .pins
            .iter()
            .find(|p| p.analog_pin_number() == Some(analog_pin)))
    }

    // --- Pin control ---

    /// Sets a pin's operating mode, then refreshes the pin's record with a
    /// synchronous state query.
    pub fn set_pin_mode(&mut self, pin: u8, mode: PinMode) -> Result<()> {
        self.get_pin(pin)?;
        self.stream
            .send(&[consts::SET_PIN_MODE, pin, mode.code()])?;
        self.update_pin(pin)
    }

    /// Queries the device for a pin's current mode and state and waits for
    /// the response.
    pub fn update_pin(&mut self, pin: u8) -> Result<()> {
        self.get_pin(pin)?;
        self.stream.send(&[
            consts::SYSEX_START,
            consts::QUERY_PIN_STATE,
            pin,
            consts::SYSEX_END,
        ])?;
        self.dispatch_message()
    }

    /// Enables or disables change reporting for a whole digital port.
    pub fn report_digital_port(&mut self, port: u8, enable: bool) -> Result<()> {
        let command = consts::REPORT_DIGITAL | (port & 0x0F);
        self.stream.send(&[command, enable as u8])
    }

    /// Puts a pin into input mode and enables reporting for its port.
    pub fn report_digital_pin(&mut self, pin: u8, enable: bool) -> Result<()> {
        self.set_pin_mode(pin, PinMode::Input)?;
        self.report_digital_port(port::port_for_pin(pin), enable)
    }

    /// Puts a pin into analog mode and enables reporting for its analog
    /// index. Fails if the pin is not analog-capable.
    pub fn report_analog_pin(&mut self, pin: u8, enable: bool) -> Result<()> {
        let analog_pin = self
            .get_pin(pin)?
            .analog_pin_number()
            .ok_or(Error::NotAnalogCapable(pin))?;
        self.set_pin_mode(pin, PinMode::Analog)?;
        let command = consts::REPORT_ANALOG | (analog_pin & 0x0F);
        self.stream.send(&[command, enable as u8])
    }

    /// Enables or disables reporting on every analog-capable pin.
    pub fn report_analog_pin_all(&mut self, enable: bool) -> Result<()> {
        let analog_pins: Vec<u8> = self
            .pins
            .iter()
            .filter(|p| p.analog_pin_number().is_some())
            .map(Pin::number)
            .collect();
        for pin in analog_pins {
            self.report_analog_pin(pin, enable)?;
        }
        Ok(())
    }

    /// Drives a digital output pin high or low.
    ///
    /// The other seven pins of the port keep their last-known states in the
    /// emitted port message. If the pin is not in output mode the write is
    /// skipped with a warning rather than failed, so a control loop survives
    /// a transient mode-tracking mismatch.
    pub fn digital_write(&mut self, pin: u8, value: bool) -> Result<()> {
        let mode = self.get_pin(pin)?.mode();
        if mode != PinMode::Output {
            warn!(
                "skipping digital write: pin {} mode is {}, not OUTPUT",
                pin, mode
            );
            return Ok(());
        }
        let port = port::port_for_pin(pin);
        let command = consts::MESSAGE_DIGITAL | port;
        let first = self.first_byte_for_digital_write(pin, value);
        let second = self.second_byte_for_digital_write(pin, value);
        self.stream.send(&[command, first, second])?;
        self.get_pin_mut(pin)?.update_state(value as u32);
        Ok(())
    }

    /// Writes a PWM/servo value via the extended-analog SysEx.
    ///
    /// The maximum meaningful value is the pin's capability resolution minus
    /// one. Like [`digital_write`](Self::digital_write), a mode mismatch is
    /// logged and skipped rather than failed.
    pub fn analog_write(&mut self, pin: u8, value: u32) -> Result<()> {
        let mode = self.get_pin(pin)?.mode();
        if mode != PinMode::Pwm && mode != PinMode::Servo {
            warn!(
                "skipping analog write: pin {} mode is {}, not PWM/SERVO",
                pin, mode
            );
            return Ok(());
        }
        let mut message = vec![consts::SYSEX_START, consts::EXTENDED_ANALOG, pin];
        let mut v = value;
        loop {
            message.push((v & 0x7F) as u8);
            v >>= 7;
            if v == 0 {
                break;
            }
        }
        message.push(consts::SYSEX_END);
        self.stream.send(&message)?;
        self.get_pin_mut(pin)?.update_state(value);
        Ok(())
    }

    /// Packs bits for the port's first seven pins: the target pin takes its
    /// new value, the rest their stored states.
    fn first_byte_for_digital_write(&self, pin: u8, value: bool) -> u8 {
        let port = port::port_for_pin(pin);
        let mut byte = 0u8;
        for location in 0..7u8 {
            let number = port::pin_number(location, port);
            let bit = if number == pin {
                value
            } else {
                self.pins.get(number as usize).is_some_and(|p| p.state() != 0)
            };
            byte |= (bit as u8) << location;
        }
        byte
    }

    /// Carries only the eighth pin's bit, read from the last pin of the
    /// port (the literal wire rule deployed firmwares expect).
    fn second_byte_for_digital_write(&self, pin: u8, value: bool) -> u8 {
        if port::location_in_port(pin) == 7 {
            return value as u8;
        }
        let last = port::pin_number(7, port::port_for_pin(pin));
        self.pins.get(last as usize).is_some_and(|p| p.state() != 0) as u8
    }

    // --- Firmware / version ---

    /// Issues a fresh firmware query and waits for the response.
    ///
    /// The record is already populated at initialization; use
    /// [`firmware`](Self::firmware) when a round trip is not needed.
    pub fn query_firmware(&mut self) -> Result<&Firmware> {
        self.stream.send(&[
            consts::SYSEX_START,
            consts::QUERY_FIRMWARE,
            consts::SYSEX_END,
        ])?;
        self.dispatch_message()?;
        Ok(&self.firmware)
    }

    /// Firmware identity as of the last parsed response.
    pub fn firmware(&self) -> &Firmware {
        &self.firmware
    }

    /// Issues a fresh protocol-version query and waits for the response.
    pub fn query_version(&mut self) -> Result<ProtocolVersion> {
        self.stream.send(&[consts::REPORT_VERSION])?;
        self.dispatch_message()?;
        Ok(self.version)
    }

    /// Protocol version as of the last parsed report.
    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    // --- Observers ---

    /// Registers an observer for analog pin changes. Enable reporting on the
    /// pins of interest (or run the device loop, which enables all) first.
    pub fn add_analog_observer(&mut self, observer: Rc<dyn PinObserver>) {
        self.analog_observers.add(observer);
    }

    /// Removes a previously added analog observer by identity.
    pub fn remove_analog_observer(&mut self, observer: &Rc<dyn PinObserver>) {
        self.analog_observers.remove(observer);
    }

    /// Registers an observer for digital pin changes.
    pub fn add_digital_observer(&mut self, observer: Rc<dyn PinObserver>) {
        self.digital_observers.add(observer);
    }

    /// Removes a previously added digital observer by identity.
    pub fn remove_digital_observer(&mut self, observer: &Rc<dyn PinObserver>) {
        self.digital_observers.remove(observer);
    }
}
