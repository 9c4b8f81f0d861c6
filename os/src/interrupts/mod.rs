//! Interrupt and exception dispatch.
//!
//! [`InterruptCore`] owns everything the CPU reaches on an interrupt: the
//! vector table, the 8259 pair, and the handler registry. Every vector enters
//! through its trampoline and ends up in [`InterruptCore::dispatch`]:
//!
//! ```text
//! vector 0-31    exception dispatcher   handler, or report and halt
//! vector 32-47   IRQ dispatcher         handler, then EOI
//! vector 48-255  software               handler, or warn and resume
//! ```

pub mod exception;
pub mod frame;
pub mod gate;
mod irq;
pub mod pic;
pub mod registry;
pub mod table;
pub mod trampoline;
pub mod vector;

use core::fmt;
use core::sync::atomic::{AtomicBool, Ordering};

use spin::Once;

use crate::arch::x86::cpu::{Platform, X86};

pub use exception::{exception_name, ExceptionReport};
pub use frame::RegisterFrame;
pub use gate::{Gate, GateFlags};
pub use pic::{ChainedPics, PicMasks};
pub use registry::{HandlerRef, HandlerRegistry, InterruptHandler};
pub use table::VectorTable;
pub use vector::{InterruptIndex, IrqLine, VectorKind};

/// Outcome of dispatching one interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Return to the interrupted code with the (possibly edited) frame.
    Resume,
    /// Unhandled exception; the caller reports it and stops the CPU.
    Halt(ExceptionReport),
}

/// Runtime knobs for [`InterruptCore::new`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CoreConfig {
    /// TSS interrupt stack (1-7) the double fault gate switches to.
    pub double_fault_stack: Option<u16>,
}

impl CoreConfig {
    fn stack_index(&self) -> Result<Option<u8>, InterruptInitError> {
        match self.double_fault_stack {
            None => Ok(None),
            Some(index @ 1..=7) => Ok(Some(index as u8)),
            Some(index) => Err(InterruptInitError::InvalidStackIndex(index)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptInitError {
    /// [`InterruptCore::install`] already ran.
    AlreadyInstalled,
    /// IST slots are numbered 1 through 7.
    InvalidStackIndex(u16),
}

impl fmt::Display for InterruptInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterruptInitError::AlreadyInstalled => write!(f, "interrupt core already installed"),
            InterruptInitError::InvalidStackIndex(index) => {
                write!(f, "invalid interrupt stack index {} (expected 1-7)", index)
            }
        }
    }
}

/// The interrupt subsystem of one CPU.
pub struct InterruptCore<P: Platform> {
    platform: P,
    table: VectorTable,
    pics: ChainedPics,
    registry: HandlerRegistry,
    installed: AtomicBool,
}

impl<P: Platform> InterruptCore<P> {
    /// Build the full vector table, one trampoline per gate. Touches no
    /// hardware beyond reading the live code selector.
    pub fn new(platform: P, config: CoreConfig) -> Result<Self, InterruptInitError> {
        let stack = config.stack_index()?;
        Ok(Self::with_stack(platform, stack))
    }

    fn with_stack(platform: P, double_fault_stack: Option<u8>) -> Self {
        let table = VectorTable::build(
            platform.code_selector(),
            double_fault_stack,
            trampoline::trampoline_address,
        );
        Self {
            platform,
            table,
            pics: ChainedPics::default(),
            registry: HandlerRegistry::new(),
            installed: AtomicBool::new(false),
        }
    }

    /// Clear the registry, load the table, remap the controllers and unmask
    /// every IRQ line.
    ///
    /// The remap itself restores the masks it found; they are logged and then
    /// cleared, so any line a driver registers for is delivered without a
    /// separate unmask. Interrupts stay disabled; call [`enable_interrupts`]
    /// once the drivers that need them are registered.
    ///
    /// [`enable_interrupts`]: InterruptCore::enable_interrupts
    pub fn install(&'static self) -> Result<(), InterruptInitError> {
        if self.installed.swap(true, Ordering::AcqRel) {
            return Err(InterruptInitError::AlreadyInstalled);
        }

        let masks = self.platform.without_interrupts(|| {
            self.registry.clear();
            self.table.load(&self.platform);
            let saved = self.pics.remap(&self.platform);
            self.pics.write_masks(&self.platform, PicMasks::NONE);
            saved
        });
        crate::klog_info!(
            "interrupt core installed: {} vectors, IRQs at {}/{}, unmasked (were {:#04x}/{:#04x})",
            vector::VECTOR_COUNT,
            self.pics.master_offset(),
            self.pics.slave_offset(),
            masks.master,
            masks.slave
        );
        Ok(())
    }

    pub fn is_installed(&self) -> bool {
        self.installed.load(Ordering::Acquire)
    }

    pub fn enable_interrupts(&self) {
        crate::klog_debug!("enabling interrupts");
        self.platform.enable_interrupts();
    }

    /// Route `vector` to `handler`, replacing whatever was there.
    ///
    /// A single atomic store; safe to call with interrupts enabled or from
    /// inside a handler.
    pub fn register(&self, vector: u8, handler: &'static HandlerRef) {
        self.registry.set(vector, handler);
        crate::klog_debug!("handler registered for vector {}", vector);
    }

    /// Route one interrupt to the dispatcher that owns its vector.
    pub fn dispatch(&self, frame: &mut RegisterFrame) -> Dispatch {
        match VectorKind::of(frame.vector()) {
            VectorKind::Exception(_) => exception::dispatch(&self.registry, &self.platform, frame),
            VectorKind::Irq(_) => {
                irq::dispatch(&self.registry, &self.pics, &self.platform, frame);
                Dispatch::Resume
            }
            VectorKind::Software(vector) => {
                if !self.registry.invoke(frame) {
                    crate::klog_warn!("unhandled software interrupt {}", vector);
                }
                Dispatch::Resume
            }
        }
    }

    pub fn unmask_irq(&self, line: IrqLine) {
        self.platform.without_interrupts(|| self.pics.unmask(&self.platform, line));
    }

    pub fn mask_irq(&self, line: IrqLine) {
        self.platform.without_interrupts(|| self.pics.mask(&self.platform, line));
    }

    /// Times `vector` was dispatched since install.
    pub fn dispatch_count(&self, vector: u8) -> u64 {
        self.registry.count(vector)
    }

    pub fn table(&self) -> &VectorTable {
        &self.table
    }

    pub fn pics(&self) -> &ChainedPics {
        &self.pics
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }
}

static CORE: Once<InterruptCore<X86>> = Once::new();

/// Create the kernel's interrupt core. Later calls return the first one.
pub fn init(config: CoreConfig) -> Result<&'static InterruptCore<X86>, InterruptInitError> {
    let stack = config.stack_index()?;
    Ok(CORE.call_once(|| InterruptCore::with_stack(X86::new(), stack)))
}

/// The core created by [`init`], if any.
pub fn core() -> Option<&'static InterruptCore<X86>> {
    CORE.get()
}
