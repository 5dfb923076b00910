//! A small x86_64 kernel built around one job: ending cleanly.
//!
//! Services come up, the boot command line picks a termination mode, and
//! when the kernel runs out of work the shutdown subsystem takes the
//! machine down. The sequencing logic itself lives in the `khalt` crate;
//! this crate owns the hardware and the subsystems that report statistics
//! on the way out.
#![no_std]
#![feature(abi_x86_interrupt)]
/* LINT OPTS */
#![forbid(unsafe_op_in_unsafe_fn)]
#![warn(missing_debug_implementations)]

use crust::limine::BaseRevision;
use log::info;
use spin::Once;

pub mod console;
pub mod interrupts;
pub mod requests;
pub mod sched;
pub mod serial;
pub mod shutdown;
pub mod timer;

#[used]
static BASE_REVISION: BaseRevision = BaseRevision::with_revision(3);

/// Halts the CPU indefinitely with interrupts masked. Terminal.
pub fn hlt_loop() -> ! {
    x86_64::instructions::interrupts::disable();
    loop {
        x86_64::instructions::hlt();
    }
}

/// Parks the CPU with interrupts live, so ticks keep arriving and get
/// accounted as idle time.
pub fn idle_loop() -> ! {
    sched::enter_idle();
    loop {
        x86_64::instructions::hlt();
    }
}

/// Brings up every kernel service in dependency order.
///
/// # Safety
/// The caller must ensure this runs exactly once, on the boot CPU, before
/// anything else touches the services. Calling it twice panics.
pub unsafe fn init_kernel_services() {
    static INIT: Once<()> = Once::new();
    if INIT.is_completed() {
        panic!("init_kernel_services called more than once");
    }
    INIT.call_once(|| ());

    serial::MODULE.init();
    console::MODULE.init();
    requests::MODULE.init();
    interrupts::MODULE.init();
    interrupts::hardware::MODULE.init();

    // Timer calibration counts loop iterations between live ticks, so the
    // IRQ path has to be open before it runs.
    x86_64::instructions::interrupts::enable();
    timer::MODULE.init();

    info!("kernel services up");
}
