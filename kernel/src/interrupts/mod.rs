//! IDT setup and interrupt plumbing.

pub mod exception;
pub mod hardware;

use core::convert::Infallible;

use crust::declare_module;
use lazy_static::lazy_static;
use x86_64::structures::idt::InterruptDescriptorTable;

lazy_static! {
    static ref IDT: InterruptDescriptorTable = {
        let mut idt = InterruptDescriptorTable::new();
        exception::install(&mut idt);
        hardware::install(&mut idt);
        idt
    };
}

fn init() -> Result<(), Infallible> {
    IDT.load();
    Ok(())
}

declare_module!("interrupts", init);
