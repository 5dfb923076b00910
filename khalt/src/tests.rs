//! Host-side tests driving the sequencer against a simulated machine.
//!
//! The simulator records every port access, delay, and CPU event into one
//! shared trace so tests can assert on the exact order things happened in.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::ops::ControlFlow;
use std::rc::Rc;

use crate::ports::{
    ACPI_SHUTDOWN_CMD, ACPI_SHUTDOWN_PORT, BACKDOOR_PORT, BACKDOOR_SIGNAL, KBC_CMD_PULSE_RESET,
    KBC_COMMAND, KBC_DATA, RESET_POLL_BUDGET,
};
use crate::{Clock, Cpu, ModeCell, PortBus, Sequencer, Services, Step, Stopped, TerminationMode};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    ReadByte(u16),
    WriteByte(u16, u8),
    WriteWord(u16, u16),
    DelayUs(u32),
    IrqOff,
    Halt,
    Relax,
    Service(&'static str),
    Print(String),
}

type Trace = Rc<RefCell<Vec<Event>>>;

struct SimMachine {
    trace: Trace,
    /// Successive values returned by status reads; `status_default` after
    /// the queue runs dry.
    status: VecDeque<u8>,
    status_default: u8,
    accept_acpi: bool,
    /// Power off once the full backdoor signal has been written.
    accept_backdoor: bool,
    /// Reset on the nth (1-based) reset command written to the controller.
    accept_reset_on_write: Option<usize>,
    reset_line_live: bool,
    accept_halt: bool,
    /// Break out of the terminal spin after this many iterations.
    park_after: usize,
    reset_writes: usize,
    backdoor_bytes: usize,
    relaxes: usize,
}

impl SimMachine {
    fn push(&self, event: Event) {
        self.trace.borrow_mut().push(event);
    }
}

impl PortBus for SimMachine {
    fn read_byte(&mut self, port: u16) -> u8 {
        self.push(Event::ReadByte(port));
        match port {
            KBC_COMMAND => self.status.pop_front().unwrap_or(self.status_default),
            _ => 0,
        }
    }

    fn write_byte(&mut self, port: u16, value: u8) -> Step {
        self.push(Event::WriteByte(port, value));
        match port {
            KBC_COMMAND if value == KBC_CMD_PULSE_RESET => {
                self.reset_writes += 1;
                if Some(self.reset_writes) == self.accept_reset_on_write {
                    return ControlFlow::Break(Stopped::Reset);
                }
            }
            BACKDOOR_PORT => {
                self.backdoor_bytes += 1;
                if self.accept_backdoor && self.backdoor_bytes == BACKDOOR_SIGNAL.len() {
                    return ControlFlow::Break(Stopped::PowerCut);
                }
            }
            _ => {}
        }
        ControlFlow::Continue(())
    }

    fn write_word(&mut self, port: u16, value: u16) -> Step {
        self.push(Event::WriteWord(port, value));
        if port == ACPI_SHUTDOWN_PORT && self.accept_acpi {
            return ControlFlow::Break(Stopped::PowerCut);
        }
        ControlFlow::Continue(())
    }

    fn reset_line_live(&mut self) -> bool {
        self.reset_line_live
    }
}

impl Cpu for SimMachine {
    fn disable_interrupts(&mut self) {
        self.push(Event::IrqOff);
    }

    fn halt(&mut self) -> Step {
        self.push(Event::Halt);
        if self.accept_halt {
            return ControlFlow::Break(Stopped::HaltExit);
        }
        ControlFlow::Continue(())
    }

    fn relax(&mut self) -> Step {
        self.push(Event::Relax);
        self.relaxes += 1;
        if self.relaxes >= self.park_after {
            return ControlFlow::Break(Stopped::Parked);
        }
        ControlFlow::Continue(())
    }
}

impl Clock for SimMachine {
    fn busy_wait_us(&mut self, us: u32) {
        self.push(Event::DelayUs(us));
    }
}

struct SimServices {
    trace: Trace,
}

impl SimServices {
    fn push(&self, event: Event) {
        self.trace.borrow_mut().push(event);
    }
}

impl Services for SimServices {
    fn print(&mut self, s: &str) {
        self.push(Event::Print(s.to_string()));
    }

    fn flush_output(&mut self) {
        self.push(Event::Service("flush_output"));
    }

    fn storage_done(&mut self) {
        self.push(Event::Service("storage_done"));
    }

    fn timer_stats(&mut self) {
        self.push(Event::Service("timer_stats"));
    }

    fn sched_stats(&mut self) {
        self.push(Event::Service("sched_stats"));
    }

    fn block_stats(&mut self) {
        self.push(Event::Service("block_stats"));
    }

    fn console_stats(&mut self) {
        self.push(Event::Service("console_stats"));
    }

    fn keyboard_stats(&mut self) {
        self.push(Event::Service("keyboard_stats"));
    }

    fn exception_stats(&mut self) {
        self.push(Event::Service("exception_stats"));
    }
}

fn sim() -> (Sequencer<SimMachine, SimServices>, Trace) {
    sim_with(|_| {})
}

fn sim_with(
    configure: impl FnOnce(&mut SimMachine),
) -> (Sequencer<SimMachine, SimServices>, Trace) {
    let trace: Trace = Rc::new(RefCell::new(Vec::new()));
    let mut machine = SimMachine {
        trace: trace.clone(),
        status: VecDeque::new(),
        status_default: 0,
        accept_acpi: false,
        accept_backdoor: false,
        accept_reset_on_write: None,
        reset_line_live: true,
        accept_halt: false,
        park_after: 1,
        reset_writes: 0,
        backdoor_bytes: 0,
        relaxes: 0,
    };
    configure(&mut machine);
    let services = SimServices {
        trace: trace.clone(),
    };
    (Sequencer::new(machine, services), trace)
}

fn events(trace: &Trace) -> Vec<Event> {
    trace.borrow().clone()
}

fn is_port_access(event: &Event) -> bool {
    matches!(
        event,
        Event::ReadByte(_) | Event::WriteByte(_, _) | Event::WriteWord(_, _)
    )
}

fn position(trace: &Trace, pred: impl Fn(&Event) -> bool) -> Option<usize> {
    trace.borrow().iter().position(|e| pred(e))
}

#[test]
fn none_mode_touches_nothing_and_returns() {
    let (mut seq, trace) = sim();
    let outcome = seq.execute(TerminationMode::None);
    assert_eq!(outcome, ControlFlow::Continue(()));
    assert!(events(&trace).is_empty());
}

#[test]
fn mode_cell_defaults_to_none() {
    let cell = ModeCell::new();
    assert_eq!(cell.get(), TerminationMode::None);
}

#[test]
fn mode_cell_last_write_wins() {
    let cell = ModeCell::new();
    cell.set(TerminationMode::PowerOff);
    cell.set(TerminationMode::None);
    cell.set(TerminationMode::Reboot);
    assert_eq!(cell.get(), TerminationMode::Reboot);

    // And the dispatcher acts on the survivor: a reboot goes for the
    // keyboard controller, not the ACPI port.
    let (mut seq, trace) = sim_with(|m| m.accept_reset_on_write = Some(1));
    let outcome = seq.execute(cell.get());
    assert_eq!(outcome, ControlFlow::Break(Stopped::Reset));
    let first_port = position(&trace, is_port_access).unwrap();
    assert_eq!(events(&trace)[first_port], Event::ReadByte(KBC_COMMAND));
    assert!(position(&trace, |e| matches!(e, Event::WriteWord(_, _))).is_none());
}

#[test]
fn reboot_masks_interrupts_before_touching_the_controller() {
    let (mut seq, trace) = sim_with(|m| m.accept_reset_on_write = Some(1));
    let outcome = seq.reboot();
    assert_eq!(outcome, ControlFlow::Break(Stopped::Reset));

    let irq_off = position(&trace, |e| *e == Event::IrqOff).unwrap();
    let first_port = position(&trace, is_port_access).unwrap();
    let notice = position(&trace, |e| matches!(e, Event::Print(_))).unwrap();
    assert!(notice < irq_off, "notice goes out before interrupts drop");
    assert!(irq_off < first_port, "no controller traffic before cli");
}

#[test]
fn drain_reads_data_only_when_output_full_and_stops_when_input_clears() {
    let (mut seq, trace) = sim_with(|m| {
        // out+in full, in full only, out full with in clear.
        m.status.extend([0b11, 0b10, 0b01]);
        m.accept_reset_on_write = Some(1);
    });
    let outcome = seq.reboot();
    assert_eq!(outcome, ControlFlow::Break(Stopped::Reset));

    let port_trail: Vec<Event> = events(&trace).into_iter().filter(is_port_access).collect();
    assert_eq!(
        port_trail,
        vec![
            Event::ReadByte(KBC_COMMAND),
            Event::ReadByte(KBC_DATA),
            Event::ReadByte(KBC_COMMAND),
            Event::ReadByte(KBC_COMMAND),
            Event::ReadByte(KBC_DATA),
            Event::WriteByte(KBC_COMMAND, KBC_CMD_PULSE_RESET),
        ]
    );
}

#[test]
fn retry_poll_is_bounded_when_input_never_clears() {
    let (mut seq, trace) = sim_with(|m| {
        // Drain sees a clear controller, then every poll reads input-full.
        m.status.push_back(0b00);
        m.status_default = 0b10;
        m.accept_reset_on_write = Some(2);
    });
    let outcome = seq.reboot();
    assert_eq!(outcome, ControlFlow::Break(Stopped::Reset));

    let all = events(&trace);
    let first_write = all
        .iter()
        .position(|e| matches!(e, Event::WriteByte(KBC_COMMAND, _)))
        .unwrap();
    let polls = all[first_write + 1..]
        .iter()
        .filter(|e| **e == Event::ReadByte(KBC_COMMAND))
        .count();
    assert_eq!(polls, RESET_POLL_BUDGET);

    let poll_delays = all.iter().filter(|e| **e == Event::DelayUs(2)).count();
    assert_eq!(poll_delays, RESET_POLL_BUDGET);
    let settle_delays = all.iter().filter(|e| **e == Event::DelayUs(50)).count();
    assert_eq!(settle_delays, 1, "accepted pulse cuts off the second settle");
}

#[test]
fn retry_poll_breaks_early_once_input_clears() {
    let (mut seq, trace) = sim_with(|m| {
        // Clear for the drain, busy for two polls, then clear.
        m.status.extend([0b00, 0b10, 0b10, 0b00]);
        m.status_default = 0b00;
        m.accept_reset_on_write = Some(2);
    });
    let outcome = seq.reboot();
    assert_eq!(outcome, ControlFlow::Break(Stopped::Reset));

    let all = events(&trace);
    let first_write = all
        .iter()
        .position(|e| matches!(e, Event::WriteByte(KBC_COMMAND, _)))
        .unwrap();
    let polls = all[first_write + 1..]
        .iter()
        .filter(|e| **e == Event::ReadByte(KBC_COMMAND))
        .count();
    assert_eq!(polls, 3, "poll ends on the first clear read");
}

#[test]
fn power_off_reports_stats_in_fixed_order_before_any_port_write() {
    let (mut seq, trace) = sim_with(|m| m.accept_reset_on_write = Some(1));
    let _ = seq.power_off();

    let all = events(&trace);
    let first_port = all.iter().position(is_port_access).unwrap();
    let services: Vec<&Event> = all[..first_port]
        .iter()
        .filter(|e| matches!(e, Event::Service(_)))
        .collect();
    assert_eq!(
        services,
        vec![
            &Event::Service("storage_done"),
            &Event::Service("timer_stats"),
            &Event::Service("sched_stats"),
            &Event::Service("block_stats"),
            &Event::Service("console_stats"),
            &Event::Service("keyboard_stats"),
            &Event::Service("exception_stats"),
            &Event::Service("flush_output"),
        ]
    );

    let notice = all
        .iter()
        .position(|e| *e == Event::Print("Powering off...\n".into()))
        .unwrap();
    let flush = all
        .iter()
        .position(|e| *e == Event::Service("flush_output"))
        .unwrap();
    assert!(notice < flush, "flush pushes the notice out");
    assert!(flush < first_port);
}

#[test]
fn power_off_walks_acpi_then_backdoor_then_reset() {
    let (mut seq, trace) = sim_with(|m| m.accept_reset_on_write = Some(1));
    let outcome = seq.power_off();
    assert_eq!(outcome, ControlFlow::Break(Stopped::Reset));

    let port_trail: Vec<Event> = events(&trace).into_iter().filter(is_port_access).collect();
    let mut expected = vec![Event::WriteWord(ACPI_SHUTDOWN_PORT, ACPI_SHUTDOWN_CMD)];
    expected.extend(
        BACKDOOR_SIGNAL
            .iter()
            .map(|&b| Event::WriteByte(BACKDOOR_PORT, b)),
    );
    // Reboot's drain then the accepted reset command.
    expected.extend([
        Event::ReadByte(KBC_COMMAND),
        Event::WriteByte(KBC_COMMAND, KBC_CMD_PULSE_RESET),
    ]);
    assert_eq!(port_trail, expected);
}

#[test]
fn accepted_acpi_write_stops_before_the_backdoor() {
    let (mut seq, trace) = sim_with(|m| m.accept_acpi = true);
    let outcome = seq.power_off();
    assert_eq!(outcome, ControlFlow::Break(Stopped::PowerCut));

    let all = events(&trace);
    assert!(
        all.iter()
            .all(|e| !matches!(e, Event::WriteByte(BACKDOOR_PORT, _))),
        "no backdoor bytes after the machine died"
    );
    assert_eq!(
        all.last(),
        Some(&Event::WriteWord(ACPI_SHUTDOWN_PORT, ACPI_SHUTDOWN_CMD))
    );
}

#[test]
fn accepted_backdoor_write_stops_before_the_reset_fallback() {
    let (mut seq, trace) = sim_with(|m| m.accept_backdoor = true);
    let outcome = seq.power_off();
    assert_eq!(outcome, ControlFlow::Break(Stopped::PowerCut));

    let all = events(&trace);
    let backdoor: Vec<&Event> = all
        .iter()
        .filter(|e| matches!(e, Event::WriteByte(BACKDOOR_PORT, _)))
        .collect();
    assert_eq!(backdoor.len(), BACKDOOR_SIGNAL.len());
    assert!(
        all.iter()
            .all(|e| !matches!(e, Event::ReadByte(KBC_COMMAND) | Event::WriteByte(KBC_COMMAND, _))),
        "never got to the keyboard controller"
    );
}

#[test]
fn dead_machine_reaches_the_diagnostic_exactly_once_then_parks() {
    let (mut seq, trace) = sim_with(|m| {
        // Nothing takes: ports ignored, reset line dead, halt falls
        // through. Park after a few spins so the test terminates.
        m.reset_line_live = false;
        m.park_after = 3;
    });
    let outcome = seq.power_off();
    assert_eq!(outcome, ControlFlow::Break(Stopped::Parked));

    let all = events(&trace);
    let diagnostics = all
        .iter()
        .filter(|e| **e == Event::Print("still running...\n".into()))
        .count();
    assert_eq!(diagnostics, 1);

    let halt = all.iter().position(|e| *e == Event::Halt).unwrap();
    let diag = all
        .iter()
        .position(|e| *e == Event::Print("still running...\n".into()))
        .unwrap();
    let first_relax = all.iter().position(|e| *e == Event::Relax).unwrap();
    assert!(halt < diag, "diagnostic only after the halt fell through");
    assert!(diag < first_relax, "diagnostic precedes the terminal spin");
    assert_eq!(all.iter().filter(|e| **e == Event::Relax).count(), 3);
}

#[test]
fn accepted_halt_never_prints_the_diagnostic() {
    let (mut seq, trace) = sim_with(|m| {
        m.reset_line_live = false;
        m.accept_halt = true;
    });
    let outcome = seq.power_off();
    assert_eq!(outcome, ControlFlow::Break(Stopped::HaltExit));

    let all = events(&trace);
    assert!(
        all.iter()
            .all(|e| *e != Event::Print("still running...\n".into()))
    );
    assert!(all.iter().all(|e| *e != Event::Relax));
}

#[test]
fn interrupts_masked_again_before_the_final_halt() {
    let (mut seq, trace) = sim_with(|m| {
        m.reset_line_live = false;
        m.accept_halt = true;
    });
    let _ = seq.power_off();

    let all = events(&trace);
    let halt = all.iter().position(|e| *e == Event::Halt).unwrap();
    let last_irq_off = all.iter().rposition(|e| *e == Event::IrqOff).unwrap();
    assert!(last_irq_off < halt);
    // One cli from the reset fallback, one right before the halt.
    assert_eq!(all.iter().filter(|e| **e == Event::IrqOff).count(), 2);
}
