//! PS/2 keyboard IRQ handling, just enough to account for keystrokes.

use core::sync::atomic::{AtomicU64, Ordering};

use pc_keyboard::{HandleControl, KeyState, Keyboard, ScancodeSet1, layouts::Us104Key};
use spin::Mutex;
use x86_64::instructions::port::Port;
use x86_64::structures::idt::InterruptStackFrame;

use super::InterruptIndex;

const KEYBOARD_DATA_PORT: u16 = 0x60;

static KEYS_PRESSED: AtomicU64 = AtomicU64::new(0);

static DECODER: Mutex<Keyboard<Us104Key, ScancodeSet1>> = Mutex::new(Keyboard::new(
    ScancodeSet1::new(),
    Us104Key,
    HandleControl::Ignore,
));

pub(super) extern "x86-interrupt" fn keyboard_interrupt(_frame: InterruptStackFrame) {
    let mut port = Port::new(KEYBOARD_DATA_PORT);
    // SAFETY: reading the data port is how the IRQ is serviced.
    let scancode: u8 = unsafe { port.read() };

    // Only completed key-down events count as a pressed key; releases and
    // partial scancode sequences do not.
    if let Ok(Some(event)) = DECODER.lock().add_byte(scancode) {
        if event.state == KeyState::Down {
            KEYS_PRESSED.fetch_add(1, Ordering::Relaxed);
        }
    }

    super::end_of_interrupt(InterruptIndex::Keyboard);
}

/// Keys pressed since boot.
pub fn keys_pressed() -> u64 {
    KEYS_PRESSED.load(Ordering::Relaxed)
}

/// Prints keyboard statistics.
pub fn print_stats() {
    crate::println!("Keyboard: {} keys pressed", keys_pressed());
}
