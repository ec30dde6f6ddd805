//! Pin change observers.

use std::rc::Rc;

use crate::pin::Pin;

/// Callback contract for analog and digital pin change notifications.
///
/// Register an observer with [`Device::add_analog_observer`] or
/// [`Device::add_digital_observer`] and start the device loop; the observer
/// is invoked with the affected pin and its new value whenever a change is
/// parsed from the wire.
///
/// [`Device::add_analog_observer`]: crate::Device::add_analog_observer
/// [`Device::add_digital_observer`]: crate::Device::add_digital_observer
pub trait PinObserver {
    fn pin_changed(&self, pin: &Pin, value: u32);
}

/// Ordered observer collection with identity-based removal.
#[derive(Default)]
pub(crate) struct ObserverRegistry {
    observers: Vec<Rc<dyn PinObserver>>,
}

impl ObserverRegistry {
    pub(crate) fn add(&mut self, observer: Rc<dyn PinObserver>) {
        self.observers.push(observer);
    }

    /// Removes the first registered entry that is the same allocation as
    /// `observer`. Unknown handles are ignored.
    pub(crate) fn remove(&mut self, observer: &Rc<dyn PinObserver>) {
        if let Some(index) = self
            .observers
            .iter()
            .position(|o| Rc::ptr_eq(o, observer))
        {
            self.observers.remove(index);
        }
    }

    pub(crate) fn notify(&self, pin: &Pin, value: u32) {
        for observer in &self.observers {
            observer.pin_changed(pin, value);
        }
    }
}
