//! Global Descriptor Table (GDT) and Task State Segment (TSS)
//!
//! The interrupt gates name the kernel code selector installed here, and the
//! double fault gate switches to the TSS interrupt stack below so a kernel
//! stack overflow ends in a report instead of a triple fault.

mod stack;

use x86_64::instructions::segmentation::{Segment, CS, DS, ES, SS};
use x86_64::instructions::tables::load_tss;
use x86_64::structures::gdt::{Descriptor, GlobalDescriptorTable, SegmentSelector};
use x86_64::structures::tss::TaskStateSegment;
use x86_64::VirtAddr;

use stack::DOUBLE_FAULT_STACK;

/// IST slot used by the double fault gate.
///
/// The gate encodes this 1-based; `TaskStateSegment::interrupt_stack_table`
/// is indexed from 0.
pub const DOUBLE_FAULT_IST_INDEX: u16 = 1;

/// Stack size for the double fault stack (32 KiB)
pub const STACK_SIZE: usize = 32 * 1024;

static mut TSS: TaskStateSegment = TaskStateSegment::new();

static mut GDT: GlobalDescriptorTable = GlobalDescriptorTable::empty();

/// Segment selectors handed out by the GDT
#[derive(Debug, Clone, Copy)]
pub struct Selectors {
    pub code_selector: SegmentSelector,
    pub data_selector: SegmentSelector,
    pub tss_selector: SegmentSelector,
}

/// Build and load the GDT and TSS, then reload every segment register.
///
/// Must run once, before the interrupt core is built: gates capture the code
/// selector that is live at that point.
pub fn init() -> Selectors {
    let selectors = unsafe {
        let tss = &mut *(&raw mut TSS);
        tss.interrupt_stack_table[DOUBLE_FAULT_IST_INDEX as usize - 1] =
            VirtAddr::from_ptr(stack::top(&raw const DOUBLE_FAULT_STACK));

        let gdt = &mut *(&raw mut GDT);
        let code_selector = gdt.append(Descriptor::kernel_code_segment());
        let data_selector = gdt.append(Descriptor::kernel_data_segment());
        let tss_selector = gdt.append(Descriptor::tss_segment(&*(&raw const TSS)));
        gdt.load();

        CS::set_reg(code_selector);
        SS::set_reg(data_selector);
        DS::set_reg(data_selector);
        ES::set_reg(data_selector);
        load_tss(tss_selector);

        Selectors { code_selector, data_selector, tss_selector }
    };

    crate::klog_info!(
        "GDT loaded: code {:#x}, data {:#x}, tss {:#x}",
        selectors.code_selector.0,
        selectors.data_selector.0,
        selectors.tss_selector.0
    );
    selectors
}
