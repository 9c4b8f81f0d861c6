//! Vector table and table loader.

use core::mem::size_of;

use x86_64::structures::DescriptorTablePointer;
use x86_64::VirtAddr;

use super::gate::Gate;
use super::vector::{DOUBLE_FAULT, VECTOR_COUNT};
use crate::arch::x86::cpu::Platform;

/// IDTR limit: table size in bytes minus one.
pub const TABLE_LIMIT: u16 = (VECTOR_COUNT * size_of::<Gate>() - 1) as u16;

/// The 256-entry interrupt descriptor table.
///
/// Built complete by [`VectorTable::build`]; there is no way to leave a slot
/// empty, and no way to change a gate afterwards.
#[repr(C, align(16))]
pub struct VectorTable {
    gates: [Gate; VECTOR_COUNT],
}

impl VectorTable {
    /// Fill every slot with `handler_for(vector)` through `code_selector`.
    ///
    /// `double_fault_stack` puts the double fault gate on that IST slot.
    pub fn build(
        code_selector: u16,
        double_fault_stack: Option<u8>,
        handler_for: impl Fn(u8) -> u64,
    ) -> Self {
        let mut gates = [Gate::MISSING; VECTOR_COUNT];
        for (vector, gate) in gates.iter_mut().enumerate() {
            *gate = Gate::new(handler_for(vector as u8), code_selector);
        }
        if let Some(index) = double_fault_stack {
            gates[DOUBLE_FAULT as usize] = gates[DOUBLE_FAULT as usize].with_stack_index(index);
        }
        Self { gates }
    }

    pub fn gate(&self, vector: u8) -> &Gate {
        &self.gates[vector as usize]
    }

    pub fn gates(&self) -> &[Gate; VECTOR_COUNT] {
        &self.gates
    }

    /// The IDTR value describing this table.
    pub fn pointer(&self) -> DescriptorTablePointer {
        DescriptorTablePointer {
            limit: TABLE_LIMIT,
            base: VirtAddr::from_ptr(self.gates.as_ptr()),
        }
    }

    /// Load this table into IDTR.
    ///
    /// Reloading the same table is harmless; the `'static` borrow keeps the
    /// memory the CPU points at alive and in place.
    pub fn load<P: Platform>(&'static self, platform: &P) {
        let pointer = self.pointer();
        crate::klog_debug!("loading vector table at {:#x}, limit {}", pointer.base.as_u64(), pointer.limit);
        unsafe { platform.load_interrupt_table(&pointer) };
    }
}
