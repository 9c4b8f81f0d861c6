use core::fmt;

use trapos::arch::x86::cpu::X86;
use trapos::arch::x86::gdt;
use trapos::interrupts::{self, CoreConfig, InterruptCore, InterruptInitError};
use trapos::klog::{self, Level};
use trapos::{klog_info, serial};

use crate::timer;

pub enum KernelInitError {
    Interrupts(InterruptInitError),
}

impl From<InterruptInitError> for KernelInitError {
    fn from(err: InterruptInitError) -> Self {
        KernelInitError::Interrupts(err)
    }
}

impl fmt::Display for KernelInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelInitError::Interrupts(err) => write!(f, "interrupts: {}", err),
        }
    }
}

pub struct KernelState {
    pub interrupts: &'static InterruptCore<X86>,
}

pub fn early_init() -> Result<KernelState, KernelInitError> {
    serial::init();
    klog::set_max_level(Level::Debug);
    klog_info!("trapos kernel running");

    let selectors = gdt::init();
    klog_info!("GDT loaded, code selector {:#x}", selectors.code_selector.0);

    let core = interrupts::init(CoreConfig {
        double_fault_stack: Some(gdt::DOUBLE_FAULT_IST_INDEX),
    })?;
    core.install()?;

    timer::init(core);
    core.enable_interrupts();
    klog_info!("interrupts enabled; PIT {} Hz", timer::TICK_HZ);

    Ok(KernelState { interrupts: core })
}

pub fn kernel_loop(state: KernelState) -> ! {
    let mut seconds = 0u64;
    loop {
        timer::sleep_ticks(u64::from(timer::TICK_HZ));
        seconds += 1;
        klog_info!(
            "uptime {}s, {} timer interrupts",
            seconds,
            state.interrupts.dispatch_count(interrupts::InterruptIndex::Timer.as_u8())
        );
    }
}
