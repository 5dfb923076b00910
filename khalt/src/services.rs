/// Kernel collaborators the power-off path consults on the way down.
///
/// All of these are one-shot, fire-and-forget calls made while the machine
/// is still fully alive: nothing here returns a value and nothing here is
/// allowed to fail. The statistics hooks are invoked in the fixed order laid
/// out in [`Sequencer::power_off`](crate::Sequencer::power_off).
pub trait Services {
    /// Writes a human-readable notice to the console.
    fn print(&mut self, s: &str);

    /// Pushes any buffered console output onto the wire, so the final
    /// notice is not lost when the next port write kills the machine.
    fn flush_output(&mut self);

    /// Flushes and closes persistent storage. Default: no storage compiled
    /// into this kernel, nothing to do.
    fn storage_done(&mut self) {}

    /// Timer statistics (tick count).
    fn timer_stats(&mut self);

    /// Scheduler statistics (idle vs. kernel ticks).
    fn sched_stats(&mut self);

    /// Block-device statistics. Default: no storage, nothing to report.
    fn block_stats(&mut self) {}

    /// Console statistics (characters written).
    fn console_stats(&mut self);

    /// Keyboard statistics (keys pressed).
    fn keyboard_stats(&mut self);

    /// Exception statistics. Default: nothing to report.
    fn exception_stats(&mut self) {}
}
