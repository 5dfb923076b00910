use core::fmt::Debug;
use core::ops::ControlFlow;

use log::debug;

use crate::machine::{Machine, Step};
use crate::mode::TerminationMode;
use crate::ports::{
    ACPI_SHUTDOWN_CMD, ACPI_SHUTDOWN_PORT, BACKDOOR_PORT, BACKDOOR_SIGNAL, KBC_CMD_PULSE_RESET,
    KBC_COMMAND, KBC_DATA, KbcStatus, RESET_POLL_BUDGET, RESET_POLL_DELAY_US, RESET_SETTLE_US,
};
use crate::services::Services;

/// Walks the machine through the configured termination sequence.
///
/// Construct one at the very end of kernel life and call
/// [`execute`](Sequencer::execute) exactly once. On real hardware the only
/// way a sequence "returns" is the [`TerminationMode::None`] no-op; the
/// others either stop the machine or diverge retrying. The [`Step`] return
/// values exist for the simulated machines in the test suite.
pub struct Sequencer<M, S> {
    machine: M,
    services: S,
}

impl<M: Machine, S: Services> Sequencer<M, S> {
    /// Pairs the hardware with the kernel services it will report through.
    pub fn new(machine: M, services: S) -> Self {
        Self { machine, services }
    }

    /// Performs the configured action: nothing, reboot, or power-off.
    ///
    /// With [`TerminationMode::None`] this touches no hardware at all and
    /// returns normally.
    pub fn execute(&mut self, mode: TerminationMode) -> Step {
        match mode {
            TerminationMode::None => ControlFlow::Continue(()),
            TerminationMode::Reboot => self.reboot(),
            TerminationMode::PowerOff => self.power_off(),
        }
    }

    /// Resets the CPU through the keyboard controller.
    ///
    /// The controller's output port has bit 0 wired to the CPU reset pin.
    /// A byte sitting in the controller's input buffer can keep it from
    /// accepting the reset command, so the buffers are drained first. Does
    /// not return on working hardware.
    pub fn reboot(&mut self) -> Step {
        self.services.print("Rebooting...\n");

        // The controller handshake must not be preempted.
        self.machine.disable_interrupts();

        // Drain both controller buffers, discarding any pending scancode
        // data along the way.
        loop {
            let status = self.read_status();
            if status.contains(KbcStatus::OUTPUT_FULL) {
                let _ = self.machine.read_byte(KBC_DATA);
            }
            if !status.contains(KbcStatus::INPUT_FULL) {
                break;
            }
        }

        self.machine.write_byte(KBC_COMMAND, KBC_CMD_PULSE_RESET)?;

        // Controllers, emulated ones especially, are allowed to drop a
        // pulse. Still being here is the only failure signal there is, so
        // keep pulsing.
        while self.machine.reset_line_live() {
            for _ in 0..RESET_POLL_BUDGET {
                if !self.read_status().contains(KbcStatus::INPUT_FULL) {
                    break;
                }
                self.machine.busy_wait_us(RESET_POLL_DELAY_US);
            }

            self.machine.busy_wait_us(RESET_SETTLE_US);
            self.machine.write_byte(KBC_COMMAND, KBC_CMD_PULSE_RESET)?;
            self.machine.busy_wait_us(RESET_SETTLE_US);
        }

        debug!("reset line dead, nothing left to pulse");
        ControlFlow::Continue(())
    }

    /// Powers the machine down, degrading through every technique we have.
    ///
    /// In order: ACPI soft-off emulation, the emulator backdoor port, a
    /// plain CPU reset, a halt with interrupts masked, and finally an idle
    /// spin with a diagnostic. Each step is fire-and-hope; execution
    /// reaching the next line is the only sign the previous one did not
    /// take.
    pub fn power_off(&mut self) -> Step {
        self.services.storage_done();
        self.report_stats();

        self.services.print("Powering off...\n");
        // Get the notice onto the wire while the machine still exists.
        self.services.flush_output();

        self.machine.write_word(ACPI_SHUTDOWN_PORT, ACPI_SHUTDOWN_CMD)?;
        debug!("ACPI soft-off ignored");

        for &byte in BACKDOOR_SIGNAL {
            self.machine.write_byte(BACKDOOR_PORT, byte)?;
        }
        debug!("backdoor signal ignored, falling back to reset");

        // A reset beats leaving the machine wedged.
        self.reboot()?;

        // One more class of virtual machine exits on a bare halt with
        // interrupts masked. On anything else this parks the CPU.
        self.machine.disable_interrupts();
        self.machine.halt()?;

        self.services.print("still running...\n");
        loop {
            self.machine.relax()?;
        }
    }

    /// Reports execution statistics from every collaborating subsystem.
    ///
    /// The order is fixed: idle-time accounting only reads sensibly next to
    /// the raw tick count it is a slice of.
    fn report_stats(&mut self) {
        self.services.timer_stats();
        self.services.sched_stats();
        self.services.block_stats();
        self.services.console_stats();
        self.services.keyboard_stats();
        self.services.exception_stats();
    }

    fn read_status(&mut self) -> KbcStatus {
        KbcStatus::from_bits_truncate(self.machine.read_byte(KBC_COMMAND))
    }
}

impl<M, S> Debug for Sequencer<M, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Sequencer").finish()
    }
}
