//! 8253/8254 PIT channel 0 as the system tick on IRQ0.

use core::sync::atomic::{AtomicU64, Ordering};

use trapos::arch::x86::cpu::Platform;
use trapos::arch::x86::port::{PortIo, Ports};
use trapos::interrupts::{HandlerRef, InterruptCore, InterruptIndex, RegisterFrame};

const CH0_DATA: u16 = 0x40;
const CMD: u16 = 0x43;

/// PIT input clock in Hz
const PIT_BASE_HZ: u32 = 1_193_182;

/// Target tick rate
pub const TICK_HZ: u32 = 100;

/// Command: channel 0, lo/hi bytes, mode 3 (square wave), binary
const CMD_CH0_SQUARE: u8 = 0x36;

const DIVISOR: u16 = (PIT_BASE_HZ / TICK_HZ) as u16;

static TICKS: AtomicU64 = AtomicU64::new(0);

fn on_tick(_frame: &mut RegisterFrame) {
    TICKS.fetch_add(1, Ordering::Relaxed);
}

static TICK_HANDLER: HandlerRef = &on_tick;

pub fn ticks() -> u64 {
    TICKS.load(Ordering::Relaxed)
}

/// Hook the tick handler, program channel 0 and make sure IRQ0 is unmasked.
pub fn init<P: Platform>(core: &InterruptCore<P>) {
    let timer = InterruptIndex::Timer;
    core.register(timer.as_u8(), &TICK_HANDLER);

    let ports = Ports;
    unsafe {
        ports.write_u8(CMD, CMD_CH0_SQUARE);
        ports.write_u8(CH0_DATA, (DIVISOR & 0xFF) as u8);
        ports.write_u8(CH0_DATA, (DIVISOR >> 8) as u8);
    }

    core.unmask_irq(timer.line());
}

/// Busy-wait until `n` more ticks have been counted.
pub fn sleep_ticks(n: u64) {
    let until = ticks() + n;
    while ticks() < until {
        core::hint::spin_loop();
    }
}
