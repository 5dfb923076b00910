use core::ops::ControlFlow;

/// Why execution ceased, as reported by a simulated machine.
///
/// Real hardware never produces one of these: a write that cuts power or
/// fires the reset line simply does not return. The type exists so a
/// simulated machine can unwind the sequencer instead, and so tests can see
/// which technique took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stopped {
    /// Power was cut.
    PowerCut,
    /// The CPU reset line fired.
    Reset,
    /// The environment exited on a halt instruction.
    HaltExit,
    /// The terminal spin was abandoned.
    Parked,
}

/// The outcome of one step of machine execution: still running, or not.
pub type Step = ControlFlow<Stopped>;

/// Port-mapped I/O, one byte or word at a time.
///
/// Writes return a [`Step`] because in a simulation a write can be the thing
/// that stops the machine; the real implementation always continues.
pub trait PortBus {
    /// Reads a byte from `port`.
    fn read_byte(&mut self, port: u16) -> u8;

    /// Writes a byte to `port`.
    fn write_byte(&mut self, port: u16, value: u8) -> Step;

    /// Writes a word to `port`.
    fn write_word(&mut self, port: u16, value: u16) -> Step;

    /// Whether the CPU reset line is worth another pulse.
    ///
    /// Real controllers never say no, which keeps the reset retry loop
    /// unbounded, and divergence there is the intended terminal state. A
    /// simulated bus may answer `false` to model the pathological machines
    /// where the retry loop is bypassed entirely.
    fn reset_line_live(&mut self) -> bool {
        true
    }
}

/// The handful of privileged instructions the shutdown paths need.
pub trait Cpu {
    /// Masks all interrupt delivery. There is no way back on purpose; the
    /// shutdown paths never re-enable.
    fn disable_interrupts(&mut self);

    /// Executes a halt. Returning `Continue` means the halt fell through
    /// and control is still here.
    fn halt(&mut self) -> Step;

    /// One iteration of the terminal spin loop.
    fn relax(&mut self) -> Step;
}

/// Microsecond-granularity busy delay.
///
/// All waiting during shutdown is busy-polling; no timer-driven sleep can be
/// trusted once interrupts are masked.
pub trait Clock {
    /// Burns roughly `us` microseconds.
    fn busy_wait_us(&mut self, us: u32);
}

/// Everything the sequencer needs from the machine it is bringing down.
pub trait Machine: PortBus + Cpu + Clock {}

impl<T: PortBus + Cpu + Clock> Machine for T {}
