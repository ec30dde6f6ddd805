//! Internal constants: Firmata command bytes and framing markers.

// --- Framing ---
/// Start of a SysEx (variable-length, vendor-extensible) message.
pub const SYSEX_START: u8 = 0xF0;
/// End of a SysEx message.
pub const SYSEX_END: u8 = 0xF7;

// --- Top-level commands ---
/// Protocol version report (2 data bytes: major, minor). Sent both ways.
pub const REPORT_VERSION: u8 = 0xF9;
/// Set a pin's operating mode (pin, mode).
pub const SET_PIN_MODE: u8 = 0xF4;

// Base values for commands that carry an index in their low nibble.
/// Analog value message base; `0xE0 + analog_index`, inbound.
pub const MESSAGE_ANALOG: u8 = 0xE0;
/// Digital port message base; `0x90 + port`, inbound and outbound.
pub const MESSAGE_DIGITAL: u8 = 0x90;
/// Enable/disable analog reporting base; `0xC0 + analog_index`, outbound.
pub const REPORT_ANALOG: u8 = 0xC0;
/// Enable/disable digital port reporting base; `0xD0 + port`, outbound.
pub const REPORT_DIGITAL: u8 = 0xD0;

// --- SysEx sub-commands ---
/// Firmware name/version query; the response reuses the same code.
pub const QUERY_FIRMWARE: u8 = 0x79;
pub const QUERY_CAPABILITY: u8 = 0x6B;
pub const RESPONSE_CAPABILITY: u8 = 0x6C;
pub const QUERY_PIN_STATE: u8 = 0x6D;
pub const RESPONSE_PIN_STATE: u8 = 0x6E;
pub const QUERY_ANALOG_MAPPING: u8 = 0x69;
pub const RESPONSE_ANALOG_MAPPING: u8 = 0x6A;
/// Extended analog write (pin numbers and values beyond the compact forms).
pub const EXTENDED_ANALOG: u8 = 0x6F;
pub const SAMPLING_INTERVAL: u8 = 0x7A;

// --- Data markers ---
/// Terminates one pin's block inside a capability response; also the
/// analog-mapping sentinel for "pin is not analog-capable".
pub const CAPABILITY_PIN_DELIMITER: u8 = 0x7F;
pub const NOT_ANALOG: u8 = 0x7F;

/// Sampling interval requested at initialization, in milliseconds.
pub const DEFAULT_SAMPLING_INTERVAL_MS: u16 = 50;

/// Pin numbers travel as single 7-bit data bytes, so no device can have
/// more addressable pins than this.
pub const MAX_PINS: usize = 128;
