//! Protocol dispatcher and SysEx handlers.
//!
//! One call to [`Device::dispatch_message`] consumes exactly one complete
//! message from the stream. The same dispatcher serves the synchronous
//! query/response path during initialization and the polling loop's drain of
//! unsolicited traffic.

use log::{debug, warn};

use crate::codec;
use crate::consts;
use crate::device::Device;
use crate::error::{Error, Result};
use crate::pin::{Firmware, Pin, PinMode, ProtocolVersion};
use crate::port::DigitalPortReport;

impl Device {
    /// Reads the leading command byte (peeked, then put back for the
    /// handler) and routes to the matching parser.
    pub(crate) fn dispatch_message(&mut self) -> Result<()> {
        self.idle = false;
        let command = self.stream.next_byte()?;
        self.stream.putback(command);
        match command {
            consts::SYSEX_START => self.process_sysex(),
            consts::REPORT_VERSION => self.process_version(),
            c if c >> 4 == consts::MESSAGE_ANALOG >> 4 => self.process_analog_message(),
            c if c >> 4 == consts::MESSAGE_DIGITAL >> 4 => self.process_digital_message(),
            other => Err(Error::UnknownCommand(other)),
        }
    }

    fn expect_byte(&mut self, expected: u8) -> Result<()> {
        let actual = self.stream.next_byte()?;
        if actual != expected {
            return Err(Error::UnexpectedByte { expected, actual });
        }
        Ok(())
    }

    /// Peeks the SysEx sub-command (both bytes go back on the stream) and
    /// selects the sub-handler.
    fn process_sysex(&mut self) -> Result<()> {
        let start = self.stream.next_byte()?;
        let sub_command = self.stream.next_byte()?;
        self.stream.putback(sub_command);
        self.stream.putback(start);
        match sub_command {
            consts::RESPONSE_CAPABILITY => self.process_capability_response(),
            consts::RESPONSE_PIN_STATE => self.process_pin_state_response(),
            consts::QUERY_FIRMWARE => self.process_firmware_response(),
            consts::RESPONSE_ANALOG_MAPPING => self.process_analog_mapping_response(),
            other => Err(Error::UnknownSysEx(other)),
        }
    }

    fn process_version(&mut self) -> Result<()> {
        self.expect_byte(consts::REPORT_VERSION)?;
        let major = self.stream.next_byte()?;
        let minor = self.stream.next_byte()?;
        debug!("protocol version report: {}.{}", major, minor);
        self.version = ProtocolVersion { major, minor };
        Ok(())
    }

    // --- SysEx handlers ---

    /// Sizes the pin table with a non-destructive pre-scan, then re-parses
    /// destructively to populate per-mode resolutions.
    fn process_capability_response(&mut self) -> Result<()> {
        if !self.capability_known {
            self.prescan_capability()?;
            self.capability_known = true;
        }
        self.expect_byte(consts::SYSEX_START)?;
        self.expect_byte(consts::RESPONSE_CAPABILITY)?;
        for index in 0..self.pins.len() {
            loop {
                let code = self.stream.next_byte()?;
                if code == consts::CAPABILITY_PIN_DELIMITER {
                    break;
                }
                let exponent = self.stream.next_byte()?;
                // Resolution arrives as an exponent of two. Sane firmwares
                // stay well under 32 bits; saturate on garbage.
                let resolution = 1u32
                    .checked_shl(u32::from(exponent))
                    .unwrap_or(u32::MAX);
                match PinMode::from_code(code) {
                    Ok(mode) => {
                        self.pins[index].capability_mut().set_resolution(mode, resolution)
                    }
                    // Newer firmwares report modes beyond the known table
                    // (SPI and friends); leave those out of the capability
                    // rather than aborting discovery.
                    Err(_) => warn!(
                        "pin {}: ignoring unknown capability mode code 0x{:02X}",
                        index, code
                    ),
                }
            }
        }
        self.expect_byte(consts::SYSEX_END)?;
        Ok(())
    }

    /// Counts pin blocks (each terminated by `0x7F`, message by SysEx end)
    /// while buffering every byte, then puts the whole scanned region back
    /// and allocates the pin table to size.
    fn prescan_capability(&mut self) -> Result<()> {
        let mut buffer = Vec::new();
        let mut pin_count: usize = 0;

        let b = self.stream.next_byte()?;
        buffer.push(b);
        if b != consts::SYSEX_START {
            return Err(Error::UnexpectedByte {
                expected: consts::SYSEX_START,
                actual: b,
            });
        }
        let b = self.stream.next_byte()?;
        buffer.push(b);
        if b != consts::RESPONSE_CAPABILITY {
            return Err(Error::UnexpectedByte {
                expected: consts::RESPONSE_CAPABILITY,
                actual: b,
            });
        }

        'message: loop {
            loop {
                let code = self.stream.next_byte()?;
                buffer.push(code);
                if code == consts::CAPABILITY_PIN_DELIMITER {
                    pin_count += 1;
                    break;
                }
                if code == consts::SYSEX_END {
                    break 'message;
                }
                buffer.push(self.stream.next_byte()?);
            }
        }

        if pin_count > consts::MAX_PINS {
            return Err(Error::TooManyPins(pin_count));
        }
        self.stream.putback_all(&buffer);
        debug!("capability pre-scan found {} pins", pin_count);
        self.pins = (0..pin_count as u8).map(Pin::new).collect();
        Ok(())
    }

    /// Updates one pin's mode and state from a pin-state response.
    fn process_pin_state_response(&mut self) -> Result<()> {
        self.expect_byte(consts::SYSEX_START)?;
        self.expect_byte(consts::RESPONSE_PIN_STATE)?;
        let pin_number = self.stream.next_byte()?;
        let mode_code = self.stream.next_byte()?;
        if mode_code == consts::SYSEX_END {
            // The firmware answers a query for a nonexistent pin with an
            // immediately closed response.
            return Err(Error::NoSuchPin(pin_number));
        }
        // An unknown mode code leaves the tracked mode alone; the state
        // bytes still have to be consumed either way.
        let mode = match PinMode::from_code(mode_code) {
            Ok(mode) => Some(mode),
            Err(_) => {
                warn!(
                    "pin {}: unknown mode code 0x{:02X} in state response",
                    pin_number, mode_code
                );
                None
            }
        };

        let mut state = 0u32;
        let mut index = 0u32;
        loop {
            let byte = self.stream.next_byte()?;
            if byte == consts::SYSEX_END {
                break;
            }
            if index < 4 {
                state |= u32::from(byte & 0x7F) << (8 * index);
            }
            index += 1;
        }
        debug!("pin {} state: mode={:?}, state={}", pin_number, mode, state);

        let pin = self.get_pin_mut(pin_number)?;
        if let Some(mode) = mode {
            pin.update_mode(mode);
        }
        pin.update_state(state);
        Ok(())
    }

    /// Replaces the firmware record from a firmware response.
    fn process_firmware_response(&mut self) -> Result<()> {
        self.expect_byte(consts::SYSEX_START)?;
        self.expect_byte(consts::QUERY_FIRMWARE)?;
        let major = self.stream.next_byte()?;
        let minor = self.stream.next_byte()?;
        let name_wire = Self::read_until_sysex_end(&mut self.stream)?;
        let name = codec::decode_string(&name_wire)?;
        debug!("firmware response: {} v{}.{}", name, major, minor);
        self.firmware = Firmware { name, major, minor };
        Ok(())
    }

    /// Assigns each already-known pin its analog index. Capability discovery
    /// must have run first so the table is sized.
    fn process_analog_mapping_response(&mut self) -> Result<()> {
        self.expect_byte(consts::SYSEX_START)?;
        self.expect_byte(consts::RESPONSE_ANALOG_MAPPING)?;
        for index in 0..self.pins.len() {
            let byte = self.stream.next_byte()?;
            let analog_pin = if byte == consts::NOT_ANALOG {
                None
            } else {
                Some(byte)
            };
            self.pins[index].set_analog_pin_number(analog_pin);
        }
        self.expect_byte(consts::SYSEX_END)?;
        Ok(())
    }

    // --- Unsolicited reports ---

    /// Parses one analog message and notifies the analog observers with the
    /// mapped pin.
    fn process_analog_message(&mut self) -> Result<()> {
        let command = self.stream.next_byte()?;
        let analog_pin = command & 0x0F;
        let lsb = self.stream.next_byte()?;
        let msb = self.stream.next_byte()?;
        let value = u32::from(codec::fourteen_bit(lsb, msb));
        if !self.pins_initialized {
            return Ok(());
        }
        match self.get_pin_by_analog_pin_number(analog_pin)? {
            Some(pin) => self.analog_observers.notify(pin, value),
            None => warn!("analog message for unmapped analog pin {}", analog_pin),
        }
        Ok(())
    }

    /// Parses one digital port message, updates every changed pin, and
    /// notifies the digital observers in ascending pin order.
    fn process_digital_message(&mut self) -> Result<()> {
        let command = self.stream.next_byte()?;
        let lsb = self.stream.next_byte()?;
        let msb = self.stream.next_byte()?;
        let port_number = command & 0x0F;
        let changed = self
            .port_reports
            .entry(port_number)
            .or_insert_with(|| DigitalPortReport::new(port_number))
            .set_value(lsb, msb);
        for (pin_number, level) in changed {
            let value = u32::from(level);
            match self.pins.get_mut(pin_number as usize) {
                Some(pin) => pin.update_state(value),
                None => {
                    warn!("digital report for unknown pin {}", pin_number);
                    continue;
                }
            }
            self.digital_observers
                .notify(&self.pins[pin_number as usize], value);
        }
        Ok(())
    }
}
