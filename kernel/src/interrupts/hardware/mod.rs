//! Legacy PIC wiring for the hardware IRQs this kernel actually uses.

use core::convert::Infallible;

use crust::declare_module;
use pic8259::ChainedPics;
use spin::Mutex;
use x86_64::structures::idt::InterruptDescriptorTable;

pub mod keyboard;
pub mod timer;

/// The IRQ offset for the primary PIC.
pub const PIC_1_OFFSET: u8 = 32;
/// The IRQ offset for the secondary PIC.
pub const PIC_2_OFFSET: u8 = PIC_1_OFFSET + 8;

/// The chained PICs.
pub static PICS: Mutex<ChainedPics> =
    Mutex::new(unsafe { ChainedPics::new(PIC_1_OFFSET, PIC_2_OFFSET) });

/// Interrupt vectors for the hardware IRQs in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum InterruptIndex {
    /// PIT channel 0.
    Timer = PIC_1_OFFSET,
    /// PS/2 keyboard.
    Keyboard,
}

pub(super) fn install(idt: &mut InterruptDescriptorTable) {
    idt[InterruptIndex::Timer as u8].set_handler_fn(timer::timer_interrupt);
    idt[InterruptIndex::Keyboard as u8].set_handler_fn(keyboard::keyboard_interrupt);
}

fn init() -> Result<(), Infallible> {
    unsafe {
        let mut pics = PICS.lock();
        // Only the timer and keyboard lines are unmasked.
        pics.write_masks(0b1111_1100, 0b1111_1111);
        pics.initialize();
    }
    Ok(())
}

declare_module!("hardware_interrupts", init);

fn end_of_interrupt(index: InterruptIndex) {
    // SAFETY: the vector matches the IRQ being acknowledged.
    unsafe {
        PICS.lock().notify_end_of_interrupt(index as u8);
    }
}
