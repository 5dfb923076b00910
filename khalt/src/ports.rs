//! Fixed architectural constants for the shutdown techniques.
//!
//! These are bit-exact conventions of the PC platform and of the emulators
//! this kernel targets. None of them are configurable.

use bitflags::bitflags;

bitflags! {
    /// Keyboard-controller status register bits, read from [`KBC_COMMAND`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct KbcStatus: u8 {
        /// Scancode data is waiting in the output buffer.
        const OUTPUT_FULL = 1 << 0;
        /// The input buffer still holds a byte the controller has not
        /// consumed; commands written now would be dropped.
        const INPUT_FULL = 1 << 1;
    }
}

/// Keyboard-controller status (read) / command (write) port.
pub const KBC_COMMAND: u16 = 0x64;
/// Keyboard-controller data port.
pub const KBC_DATA: u16 = 0x60;
/// Command byte that pulses bit 0 of the controller's output port, which is
/// wired to the CPU reset pin.
pub const KBC_CMD_PULSE_RESET: u8 = 0xFE;

/// Most polls of [`KbcStatus::INPUT_FULL`] before pulsing anyway.
pub const RESET_POLL_BUDGET: usize = 0x10000;
/// Delay between status polls, in microseconds.
pub const RESET_POLL_DELAY_US: u32 = 2;
/// Settle delay around each reset pulse, in microseconds.
pub const RESET_SETTLE_US: u32 = 50;

/// Port some emulators watch for an ACPI-style soft power-off.
pub const ACPI_SHUTDOWN_PORT: u16 = 0xB004;
/// Control word that triggers the soft power-off.
pub const ACPI_SHUTDOWN_CMD: u16 = 0x2000;

/// Out-of-band port certain emulators accept machine-exit requests on.
pub const BACKDOOR_PORT: u16 = 0x8900;
/// Signal string written byte-by-byte to [`BACKDOOR_PORT`].
pub const BACKDOOR_SIGNAL: &[u8] = b"Shutdown";
