use x86_64::structures::idt::InterruptStackFrame;

use super::InterruptIndex;

pub(super) extern "x86-interrupt" fn timer_interrupt(_frame: InterruptStackFrame) {
    crate::timer::on_tick();
    super::end_of_interrupt(InterruptIndex::Timer);
}
