//! Kernel face of the termination subsystem.
//!
//! [`configure`] is called while boot arguments are processed, [`execute`]
//! once the kernel is finished. The sequencing itself lives in `khalt`;
//! this module supplies the real hardware and routes the collaborator
//! calls to the subsystems that own the numbers.

use core::ops::ControlFlow;

use khalt::{Clock, Cpu, ModeCell, PortBus, Sequencer, Services, Step, TerminationMode};
use x86_64::instructions::interrupts;
use x86_64::instructions::port::Port;

use crate::interrupts::exception;
use crate::interrupts::hardware::keyboard;
use crate::{console, sched, timer};

static HOW: ModeCell = ModeCell::new();

/// Selects what [`execute`] will do once the kernel is finished.
pub fn configure(mode: TerminationMode) {
    HOW.set(mode);
}

/// Performs the configured termination action.
///
/// With [`TerminationMode::None`] this is a no-op and returns; otherwise
/// it does not come back.
pub fn execute() {
    match Sequencer::new(Hardware, KernelServices).execute(HOW.get()) {
        ControlFlow::Continue(()) => {}
        // Real hardware cannot report that it stopped; only simulated
        // machines produce Break.
        ControlFlow::Break(_) => unreachable!(),
    }
}

/// The machine this kernel is actually running on.
#[derive(Debug, Clone, Copy)]
struct Hardware;

impl PortBus for Hardware {
    fn read_byte(&mut self, port: u16) -> u8 {
        // SAFETY: the sequencer only reads the keyboard controller's
        // status and data ports.
        unsafe { Port::<u8>::new(port).read() }
    }

    fn write_byte(&mut self, port: u16, value: u8) -> Step {
        // SAFETY: shutdown is the last thing the kernel does; nothing
        // else contends for these ports anymore.
        unsafe { Port::<u8>::new(port).write(value) };
        ControlFlow::Continue(())
    }

    fn write_word(&mut self, port: u16, value: u16) -> Step {
        // SAFETY: as above.
        unsafe { Port::<u16>::new(port).write(value) };
        ControlFlow::Continue(())
    }
}

impl Cpu for Hardware {
    fn disable_interrupts(&mut self) {
        interrupts::disable();
    }

    fn halt(&mut self) -> Step {
        x86_64::instructions::hlt();
        // Only specially configured virtual machines exit on hlt; anywhere
        // else, falling through means it merely woke up again.
        ControlFlow::Continue(())
    }

    fn relax(&mut self) -> Step {
        core::hint::spin_loop();
        ControlFlow::Continue(())
    }
}

impl Clock for Hardware {
    fn busy_wait_us(&mut self, us: u32) {
        timer::udelay(us);
    }
}

/// Routes the sequencer's collaborator calls to the kernel subsystems.
#[derive(Debug, Clone, Copy)]
struct KernelServices;

impl Services for KernelServices {
    fn print(&mut self, s: &str) {
        crate::print!("{}", s);
    }

    fn flush_output(&mut self) {
        console::flush();
    }

    fn timer_stats(&mut self) {
        timer::print_stats();
    }

    fn sched_stats(&mut self) {
        sched::print_stats();
    }

    fn console_stats(&mut self) {
        console::print_stats();
    }

    fn keyboard_stats(&mut self) {
        keyboard::print_stats();
    }

    fn exception_stats(&mut self) {
        exception::print_stats();
    }

    // storage_done and block_stats keep their no-op defaults: no
    // persistent storage is compiled into this kernel.
}
