//! Exception dispatcher for vectors 0-31.
//!
//! A registered handler owns the outcome: it returns to resume, or halts on
//! its own. With no handler the exception is fatal.

use core::fmt;

use super::frame::RegisterFrame;
use super::registry::HandlerRegistry;
use super::vector::{EXCEPTION_COUNT, PAGE_FAULT};
use super::Dispatch;
use crate::arch::x86::cpu::Platform;

static EXCEPTION_NAMES: [&str; EXCEPTION_COUNT as usize] = [
    "Divide By Zero",
    "Debug",
    "Non Maskable Interrupt",
    "Breakpoint",
    "Into Detected Overflow",
    "Out of Bounds",
    "Invalid Opcode",
    "No Coprocessor",
    "Double Fault",
    "Coprocessor Segment Overrun",
    "Bad TSS",
    "Segment Not Present",
    "Stack Fault",
    "General Protection Fault",
    "Page Fault",
    "Unknown Interrupt",
    "Coprocessor Fault",
    "Alignment Check",
    "Machine Check",
    "Reserved",
    "Reserved",
    "Reserved",
    "Reserved",
    "Reserved",
    "Reserved",
    "Reserved",
    "Reserved",
    "Reserved",
    "Reserved",
    "Reserved",
    "Reserved",
    "Reserved",
];

/// Human-readable name of exception `vector`, or `None` above 31.
pub fn exception_name(vector: u8) -> Option<&'static str> {
    EXCEPTION_NAMES.get(vector as usize).copied()
}

/// What gets printed before the machine halts on an unhandled exception.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExceptionReport {
    pub vector: u8,
    pub name: &'static str,
    pub error_code: u64,
    pub instruction_pointer: u64,
    /// CR2 at the time of a page fault.
    pub fault_address: Option<u64>,
}

impl ExceptionReport {
    fn from_frame(frame: &RegisterFrame, fault_address: Option<u64>) -> Self {
        let vector = frame.vector();
        Self {
            vector,
            name: exception_name(vector).unwrap_or("Unknown Interrupt"),
            error_code: frame.error_code,
            instruction_pointer: frame.rip,
            fault_address,
        }
    }
}

impl fmt::Display for ExceptionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "EXCEPTION {} ({}), error code {:#x}, rip {:#x}",
            self.vector, self.name, self.error_code, self.instruction_pointer
        )?;
        if let Some(address) = self.fault_address {
            write!(f, ", fault address {:#x}", address)?;
        }
        Ok(())
    }
}

/// Route a CPU exception: registered handler, or a fatal report.
pub(super) fn dispatch<P: Platform>(
    registry: &HandlerRegistry,
    platform: &P,
    frame: &mut RegisterFrame,
) -> Dispatch {
    debug_assert!(frame.vector() < EXCEPTION_COUNT);

    if registry.invoke(frame) {
        return Dispatch::Resume;
    }

    let fault_address = (frame.vector() == PAGE_FAULT).then(|| platform.fault_address());
    Dispatch::Halt(ExceptionReport::from_frame(frame, fault_address))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interrupts::registry::HandlerRef;
    use crate::testing::MockPlatform;

    #[test]
    fn names_cover_every_exception_vector() {
        assert_eq!(exception_name(0), Some("Divide By Zero"));
        assert_eq!(exception_name(13), Some("General Protection Fault"));
        assert_eq!(exception_name(14), Some("Page Fault"));
        assert_eq!(exception_name(31), Some("Reserved"));
        assert_eq!(exception_name(32), None);
    }

    #[test]
    fn unhandled_page_fault_halts_with_report() {
        let registry = HandlerRegistry::new();
        let platform = MockPlatform::new().with_fault_address(0xdead_b000);
        let mut frame = RegisterFrame::for_vector(14).with_error_code(0b10);
        frame.rip = 0xffff_8000_0000_1234;

        let Dispatch::Halt(report) = dispatch(&registry, &platform, &mut frame) else {
            panic!("unhandled page fault resumed");
        };
        let text = report.to_string();
        assert!(text.contains("Page Fault"), "{text}");
        assert!(text.contains("error code 0x2"), "{text}");
        assert!(text.contains("fault address 0xdeadb000"), "{text}");
        assert_eq!(report.vector, 14);
    }

    #[test]
    fn only_page_faults_read_cr2() {
        let registry = HandlerRegistry::new();
        let platform = MockPlatform::new().with_fault_address(0x1000);
        let mut frame = RegisterFrame::for_vector(13).with_error_code(0x18);

        let Dispatch::Halt(report) = dispatch(&registry, &platform, &mut frame) else {
            panic!("unhandled GPF resumed");
        };
        assert_eq!(report.fault_address, None);
        assert_eq!(report.error_code, 0x18);
        assert!(report.to_string().contains("General Protection Fault"));
    }

    #[test]
    fn registered_handler_overrides_the_fatal_default() {
        static MARK_RAX: HandlerRef = &|frame: &mut RegisterFrame| frame.rax = 0xb9;
        let registry = HandlerRegistry::new();
        let platform = MockPlatform::new();
        registry.set(3, &MARK_RAX);

        let mut frame = RegisterFrame::for_vector(3);
        assert_eq!(dispatch(&registry, &platform, &mut frame), Dispatch::Resume);
        assert_eq!(frame.rax, 0xb9);
    }
}
