//! Digital port codec.
//!
//! A port groups 8 consecutive digital pins, reported and written together
//! as one 2-byte unit: bits 0-6 of the first byte carry the port's first
//! seven pins, bit 0 of the second byte carries the eighth.

use crate::codec::fourteen_bit;

/// Returns the port containing `pin`.
#[inline]
pub fn port_for_pin(pin: u8) -> u8 {
    pin / 8
}

/// Returns the bit location (0-7) of `pin` within its port.
#[inline]
pub fn location_in_port(pin: u8) -> u8 {
    pin % 8
}

/// Returns the pin number at `location` within `port`.
#[inline]
pub fn pin_number(location: u8, port: u8) -> u8 {
    port * 8 + location
}

/// Per-port change tracker for inbound digital messages.
///
/// Remembers the previously reported bitmask so each new report can be
/// reduced to the set of pins that actually flipped.
#[derive(Debug)]
pub struct DigitalPortReport {
    port: u8,
    mask: u16,
}

impl DigitalPortReport {
    pub fn new(port: u8) -> Self {
        Self { port, mask: 0 }
    }

    /// Applies a reported `(lsb, msb)` pair and returns the pins whose bit
    /// flipped versus the stored mask, in ascending pin order, each with its
    /// new value. The new mask replaces the stored one.
    pub fn set_value(&mut self, lsb: u8, msb: u8) -> Vec<(u8, bool)> {
        let new_mask = fourteen_bit(lsb, msb);
        let flipped = self.mask ^ new_mask;
        let mut changed = Vec::new();
        for location in 0..8u8 {
            if flipped & (1 << location) != 0 {
                changed.push((
                    pin_number(location, self.port),
                    new_mask & (1 << location) != 0,
                ));
            }
        }
        self.mask = new_mask;
        changed
    }
}
