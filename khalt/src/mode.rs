use core::sync::atomic::{AtomicU8, Ordering};

/// How the machine should be brought down once the kernel is done running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum TerminationMode {
    /// Leave the machine running.
    #[default]
    None = 0,
    /// Cut power.
    PowerOff = 1,
    /// Reset the CPU.
    Reboot = 2,
}

/// The process-wide termination selection.
///
/// Written once, early, by whoever handles boot arguments and read once at
/// end of life; an atomic is all it takes to make that pattern legal in a
/// static. The last write wins.
#[derive(Debug)]
pub struct ModeCell(AtomicU8);

impl ModeCell {
    /// A cell holding [`TerminationMode::None`].
    pub const fn new() -> Self {
        Self(AtomicU8::new(TerminationMode::None as u8))
    }

    /// Replaces the selection.
    pub fn set(&self, mode: TerminationMode) {
        self.0.store(mode as u8, Ordering::Relaxed);
    }

    /// The most recently stored selection.
    pub fn get(&self) -> TerminationMode {
        match self.0.load(Ordering::Relaxed) {
            x if x == TerminationMode::PowerOff as u8 => TerminationMode::PowerOff,
            x if x == TerminationMode::Reboot as u8 => TerminationMode::Reboot,
            _ => TerminationMode::None,
        }
    }
}

impl Default for ModeCell {
    fn default() -> Self {
        Self::new()
    }
}
