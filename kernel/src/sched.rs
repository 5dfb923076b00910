//! Tick accounting for the (single) kernel thread.
//!
//! There is no real scheduler in this kernel; what remains of one is the
//! split of timer ticks into time spent idle and time spent working, which
//! the power-off report prints alongside the raw tick count.

use core::sync::atomic::{AtomicBool, AtomicU64, Ordering};

static IDLE: AtomicBool = AtomicBool::new(false);
static IDLE_TICKS: AtomicU64 = AtomicU64::new(0);
static KERNEL_TICKS: AtomicU64 = AtomicU64::new(0);

/// Marks the CPU as idle; ticks from here on count as idle time.
pub fn enter_idle() {
    IDLE.store(true, Ordering::Relaxed);
}

/// Marks the CPU as busy again.
pub fn leave_idle() {
    IDLE.store(false, Ordering::Relaxed);
}

/// Called from the timer interrupt once per tick.
pub(crate) fn on_tick() {
    if IDLE.load(Ordering::Relaxed) {
        IDLE_TICKS.fetch_add(1, Ordering::Relaxed);
    } else {
        KERNEL_TICKS.fetch_add(1, Ordering::Relaxed);
    }
}

/// Prints the idle/busy tick split.
pub fn print_stats() {
    crate::println!(
        "Sched: {} idle ticks, {} kernel ticks",
        IDLE_TICKS.load(Ordering::Relaxed),
        KERNEL_TICKS.load(Ordering::Relaxed)
    );
}
