//! Kernel entry point: bring services up, pick a termination mode from the
//! command line, and take the machine down when there is nothing left to do.
#![no_std]
#![no_main]

use kernel::{shutdown, sprintln, timer};
use khalt::TerminationMode;
use log::info;

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    sprintln!("KERNEL PANIC: {}", info);
    kernel::hlt_loop();
}

#[unsafe(no_mangle)]
pub extern "C" fn _start() -> ! {
    // SAFETY: this is the sole entry point; services have not been touched.
    unsafe {
        kernel::init_kernel_services();
    }

    let mode = parse_cmdline(kernel::requests::cmdline());
    shutdown::configure(mode);

    info!("boot complete at tick {}, mode {:?}", timer::ticks(), mode);

    shutdown::execute();

    // Only TerminationMode::None comes back here.
    kernel::idle_loop();
}

/// Picks the termination mode out of the kernel command line.
///
/// `halt=off` powers the machine down at the end of the run, `halt=reboot`
/// resets it, anything else leaves it running.
fn parse_cmdline(cmdline: &str) -> TerminationMode {
    for option in cmdline.split_whitespace() {
        match option {
            "halt=off" => return TerminationMode::PowerOff,
            "halt=reboot" => return TerminationMode::Reboot,
            _ => {}
        }
    }
    TerminationMode::None
}
