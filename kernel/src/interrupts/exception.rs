//! CPU exception handlers and fault accounting.

use core::sync::atomic::{AtomicU64, Ordering};

use x86_64::registers::control::Cr2;
use x86_64::structures::idt::{InterruptDescriptorTable, InterruptStackFrame, PageFaultErrorCode};

static PAGE_FAULTS: AtomicU64 = AtomicU64::new(0);

pub(super) fn install(idt: &mut InterruptDescriptorTable) {
    idt.breakpoint.set_handler_fn(breakpoint);
    idt.invalid_opcode.set_handler_fn(invalid_opcode);
    idt.general_protection_fault.set_handler_fn(general_protection);
    idt.page_fault.set_handler_fn(page_fault);
    idt.double_fault.set_handler_fn(double_fault);
}

extern "x86-interrupt" fn breakpoint(frame: InterruptStackFrame) {
    log::warn!("breakpoint: {:?}", frame);
}

extern "x86-interrupt" fn invalid_opcode(frame: InterruptStackFrame) {
    panic!("invalid opcode: {:#?}", frame);
}

extern "x86-interrupt" fn general_protection(frame: InterruptStackFrame, code: u64) {
    panic!("general protection fault (code {}): {:#?}", code, frame);
}

extern "x86-interrupt" fn page_fault(frame: InterruptStackFrame, code: PageFaultErrorCode) {
    PAGE_FAULTS.fetch_add(1, Ordering::Relaxed);
    panic!(
        "page fault at {:#x} ({:?}): {:#?}",
        Cr2::read_raw(),
        code,
        frame
    );
}

extern "x86-interrupt" fn double_fault(frame: InterruptStackFrame, _code: u64) -> ! {
    panic!("double fault: {:#?}", frame);
}

/// Page faults taken since boot.
pub fn page_faults() -> u64 {
    PAGE_FAULTS.load(Ordering::Relaxed)
}

/// Prints exception statistics.
pub fn print_stats() {
    crate::println!("Exception: {} page faults", page_faults());
}
