//! Programmable interval timer: tick accounting and calibrated busy delays.

use core::hint;
use core::sync::atomic::{AtomicU64, Ordering};

use crust::declare_module;
use thiserror::Error;
use x86_64::instructions::port::Port;

/// Frequency the PIT is programmed to tick at.
pub const TICK_HZ: u32 = 100;

const PIT_INPUT_HZ: u32 = 1_193_182;
const PIT_CHANNEL_0: u16 = 0x40;
const PIT_COMMAND: u16 = 0x43;
/// Channel 0, lobyte/hibyte access, rate generator, binary counting.
const PIT_MODE_RATE_GENERATOR: u8 = 0x34;

/// Spins to allow before concluding the PIT is not ticking.
const CALIBRATION_PATIENCE: u64 = 1 << 30;

static TICKS: AtomicU64 = AtomicU64::new(0);
static LOOPS_PER_TICK: AtomicU64 = AtomicU64::new(0);

/// Called from the IRQ0 handler on every PIT tick.
pub(crate) fn on_tick() {
    TICKS.fetch_add(1, Ordering::Relaxed);
    crate::sched::on_tick();
}

/// Ticks since boot.
pub fn ticks() -> u64 {
    TICKS.load(Ordering::Relaxed)
}

/// Timer bring-up failure.
#[derive(Debug, Error)]
pub enum TimerInitError {
    /// The PIT was programmed but no tick ever arrived.
    #[error("PIT produced no ticks during calibration")]
    NoTicks,
}

fn init() -> Result<(), TimerInitError> {
    program_pit();
    let loops = calibrate()?;
    LOOPS_PER_TICK.store(loops, Ordering::Relaxed);
    log::debug!("timer calibrated: {} loops per tick", loops);
    Ok(())
}

declare_module!("timer", init, TimerInitError);

fn program_pit() {
    let divisor = (PIT_INPUT_HZ / TICK_HZ) as u16;
    let mut command = Port::new(PIT_COMMAND);
    let mut channel0 = Port::new(PIT_CHANNEL_0);
    // SAFETY: standard PIT programming sequence, low byte then high byte.
    unsafe {
        command.write(PIT_MODE_RATE_GENERATOR);
        channel0.write((divisor & 0xFF) as u8);
        channel0.write((divisor >> 8) as u8);
    }
}

/// Counts busy-loop iterations across one full tick.
///
/// Needs the timer interrupt flowing; the caller enables interrupts before
/// this module initializes.
fn calibrate() -> Result<u64, TimerInitError> {
    wait_for_tick()?;
    let edge = ticks();
    let mut loops: u64 = 0;
    while ticks() == edge {
        hint::spin_loop();
        loops += 1;
        if loops > CALIBRATION_PATIENCE {
            return Err(TimerInitError::NoTicks);
        }
    }
    Ok(loops.max(1))
}

fn wait_for_tick() -> Result<(), TimerInitError> {
    let start = ticks();
    for _ in 0..CALIBRATION_PATIENCE {
        if ticks() != start {
            return Ok(());
        }
        hint::spin_loop();
    }
    Err(TimerInitError::NoTicks)
}

/// Burns roughly `us` microseconds without any interrupt support.
///
/// This is the delay the shutdown sequences lean on once timer-driven
/// sleeps can no longer be trusted; it works with interrupts masked.
pub fn udelay(us: u32) {
    let loops_per_tick = LOOPS_PER_TICK.load(Ordering::Relaxed).max(1);
    let loops = loops_per_tick * u64::from(TICK_HZ) * u64::from(us) / 1_000_000;
    for _ in 0..loops.max(1) {
        hint::spin_loop();
    }
}

/// Prints timer statistics.
pub fn print_stats() {
    crate::println!("Timer: {} ticks", ticks());
}
