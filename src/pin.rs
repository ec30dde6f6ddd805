//! Pin, capability, firmware, and version records.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Error, Result};

/// A pin's operating mode. Mirrors the Firmata mode table; the wire carries
/// these as small integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PinMode {
    Input,
    Output,
    Analog,
    Pwm,
    Servo,
    Shift,
    I2c,
    OneWire,
    Stepper,
    Encoder,
    Serial,
    InputPullup,
}

impl PinMode {
    /// Decodes a wire mode code.
    pub fn from_code(code: u8) -> Result<Self> {
        Ok(match code {
            0x00 => PinMode::Input,
            0x01 => PinMode::Output,
            0x02 => PinMode::Analog,
            0x03 => PinMode::Pwm,
            0x04 => PinMode::Servo,
            0x05 => PinMode::Shift,
            0x06 => PinMode::I2c,
            0x07 => PinMode::OneWire,
            0x08 => PinMode::Stepper,
            0x09 => PinMode::Encoder,
            0x0A => PinMode::Serial,
            0x0B => PinMode::InputPullup,
            other => return Err(Error::UnknownPinMode(other)),
        })
    }

    /// The wire code for this mode.
    pub fn code(self) -> u8 {
        match self {
            PinMode::Input => 0x00,
            PinMode::Output => 0x01,
            PinMode::Analog => 0x02,
            PinMode::Pwm => 0x03,
            PinMode::Servo => 0x04,
            PinMode::Shift => 0x05,
            PinMode::I2c => 0x06,
            PinMode::OneWire => 0x07,
            PinMode::Stepper => 0x08,
            PinMode::Encoder => 0x09,
            PinMode::Serial => 0x0A,
            PinMode::InputPullup => 0x0B,
        }
    }
}

impl fmt::Display for PinMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PinMode::Input => "INPUT",
            PinMode::Output => "OUTPUT",
            PinMode::Analog => "ANALOG",
            PinMode::Pwm => "PWM",
            PinMode::Servo => "SERVO",
            PinMode::Shift => "SHIFT",
            PinMode::I2c => "I2C",
            PinMode::OneWire => "ONEWIRE",
            PinMode::Stepper => "STEPPER",
            PinMode::Encoder => "ENCODER",
            PinMode::Serial => "SERIAL",
            PinMode::InputPullup => "INPUT_PULLUP",
        };
        f.write_str(name)
    }
}

/// A pin's supported modes with the bit resolution available per mode.
/// Immutable once capability discovery completes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PinCapability {
    resolutions: BTreeMap<PinMode, u32>,
}

impl PinCapability {
    pub(crate) fn set_resolution(&mut self, mode: PinMode, resolution: u32) {
        self.resolutions.insert(mode, resolution);
    }

    /// Resolution (as `2^bits`) for `mode`, or `None` if the mode is
    /// unsupported on this pin.
    pub fn resolution(&self, mode: PinMode) -> Option<u32> {
        self.resolutions.get(&mode).copied()
    }

    pub fn supports(&self, mode: PinMode) -> bool {
        self.resolutions.contains_key(&mode)
    }

    /// Supported modes in ascending wire-code order.
    pub fn modes(&self) -> impl Iterator<Item = PinMode> + '_ {
        self.resolutions.keys().copied()
    }
}

/// One device pin: mode, last known state, analog mapping, capability.
///
/// Pins are created during capability discovery and live as long as the
/// device; the count never changes afterwards.
#[derive(Debug, Clone)]
pub struct Pin {
    number: u8,
    mode: PinMode,
    state: u32,
    analog_pin: Option<u8>,
    capability: PinCapability,
}

impl Pin {
    pub(crate) fn new(number: u8) -> Self {
        Self {
            number,
            mode: PinMode::Input,
            state: 0,
            analog_pin: None,
            capability: PinCapability::default(),
        }
    }

    pub fn number(&self) -> u8 {
        self.number
    }

    /// Current operating mode, as last reported by the device.
    pub fn mode(&self) -> PinMode {
        self.mode
    }

    /// Last known value; its width depends on the mode (one bit for digital,
    /// up to the capability resolution for analog/PWM).
    pub fn state(&self) -> u32 {
        self.state
    }

    /// The pin's analog index (0-15), or `None` if not analog-capable.
    pub fn analog_pin_number(&self) -> Option<u8> {
        self.analog_pin
    }

    pub fn capability(&self) -> &PinCapability {
        &self.capability
    }

    pub(crate) fn capability_mut(&mut self) -> &mut PinCapability {
        &mut self.capability
    }

    pub(crate) fn update_mode(&mut self, mode: PinMode) {
        self.mode = mode;
    }

    pub(crate) fn update_state(&mut self, state: u32) {
        self.state = state;
    }

    pub(crate) fn set_analog_pin_number(&mut self, analog_pin: Option<u8>) {
        self.analog_pin = analog_pin;
    }
}

/// Firmware identity reported by the device. Replaced wholesale whenever a
/// fresh firmware response is parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Firmware {
    pub name: String,
    pub major: u8,
    pub minor: u8,
}

/// Protocol version reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolVersion {
    pub major: u8,
    pub minor: u8,
}
