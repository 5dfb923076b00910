//! Serial port driver, the kernel's only wire to the outside.
//!
//! Human-facing output should go through [`console`](crate::console) so it
//! gets counted; the `sprint!` macros here write straight to the UART and
//! exist for the panic path.

use core::convert::Infallible;

use crust::{OnceMutex, declare_module};
use uart_16550::SerialPort;
use x86_64::instructions::interrupts::without_interrupts;
use x86_64::instructions::port::Port;

const SERIAL_PORT_NUM: u16 = 0x3F8;
/// Line status register; bit 6 means the transmitter is completely idle.
const LINE_STATUS: u16 = SERIAL_PORT_NUM + 5;
const TRANSMITTER_IDLE: u8 = 1 << 6;

static PORT: OnceMutex<SerialPort> = OnceMutex::uninitialized();

fn init() -> Result<(), Infallible> {
    // SAFETY: 0x3F8 is COM1 on every PC and nothing else drives it.
    let mut port = unsafe { SerialPort::new(SERIAL_PORT_NUM) };
    port.init();
    PORT.init(port);
    Ok(())
}

declare_module!("serial", init);

/// Writes a string to the UART.
pub fn write_str(s: &str) {
    without_interrupts(|| {
        let mut port = PORT.get();
        for byte in s.bytes() {
            port.send(byte);
        }
    });
}

/// Busy-waits until the UART has pushed everything onto the wire.
///
/// The power-off path calls this right before port writes that may kill
/// the machine; anything still queued in the FIFO would be lost.
pub fn flush() {
    let mut status = Port::<u8>::new(LINE_STATUS);
    // SAFETY: reading line status has no side effects.
    while unsafe { status.read() } & TRANSMITTER_IDLE == 0 {
        core::hint::spin_loop();
    }
}

#[doc(hidden)]
pub fn _print(args: core::fmt::Arguments) {
    use core::fmt::Write;
    without_interrupts(|| {
        // Drop the output rather than deadlock; the panic path can land
        // here while the port is held.
        if let Some(mut port) = PORT.try_get() {
            let _ = port.write_fmt(args);
        }
    });
}

/// Serial print
#[macro_export]
macro_rules! sprint {
    ($($arg:tt)*) => {
        $crate::serial::_print(format_args!($($arg)*));
    };
}
/// Serial print with newline
#[macro_export]
macro_rules! sprintln {
    () => {
        $crate::sprint!("\n");
    };
    ($fmt:expr) => {
        $crate::sprint!(concat!($fmt, "\n"));
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::sprint!(concat!($fmt, "\n"), $($arg)*);
    };
}
