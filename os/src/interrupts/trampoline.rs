//! Per-vector entry stubs.
//!
//! The stubs themselves are generated by the `trampoline` assembler macro in
//! `trampolines.s`. Each one tags the frame with its own vector and jumps to a
//! shared entry that calls [`dispatch_from_trampoline`].

use core::arch::global_asm;

use super::frame::RegisterFrame;

/// Distance in bytes between consecutive stubs.
pub const TRAMPOLINE_STRIDE: u64 = 16;

global_asm!(
    include_str!("trampolines.s"),
    dispatch = sym dispatch_from_trampoline,
);

extern "C" {
    fn trapos_trampolines_start();
    fn trapos_trampolines_end();
}

/// Entry address of the stub for `vector`.
pub fn trampoline_address(vector: u8) -> u64 {
    trapos_trampolines_start as *const () as u64 + u64::from(vector) * TRAMPOLINE_STRIDE
}

/// Total bytes occupied by all stubs.
pub fn trampolines_len() -> u64 {
    trapos_trampolines_end as *const () as u64 - trapos_trampolines_start as *const () as u64
}

/// Called by the common trampoline entry with interrupts disabled.
///
/// Routes through the core registered with [`super::init`]. An interrupt
/// arriving before that can only be a fault during early boot, which is
/// reported and halts.
extern "C" fn dispatch_from_trampoline(frame: *mut RegisterFrame) {
    // SAFETY: the common entry passes a pointer to the frame it just built
    // on this stack; it lives until we return.
    let frame = unsafe { &mut *frame };

    match super::core() {
        Some(core) => {
            if let super::Dispatch::Halt(report) = core.dispatch(frame) {
                crate::klog_error!("{}", report);
                crate::klog_error!("{:#?}", frame);
                crate::klog_error!("System halted");
                crate::arch::x86::cpu::halt_forever();
            }
        }
        None => {
            crate::klog_error!("interrupt {} before the interrupt core was initialized", frame.vector);
            crate::klog_error!("{:#?}", frame);
            crate::arch::x86::cpu::halt_forever();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interrupts::vector::{has_error_code, VECTOR_COUNT};

    const PUSH_IMM8: u8 = 0x6A;
    const PUSH_IMM32: u8 = 0x68;
    const JMP_REL8: u8 = 0xEB;
    const JMP_REL32: u8 = 0xE9;

    fn stub_bytes(vector: u8) -> &'static [u8] {
        // SAFETY: every stub is TRAMPOLINE_STRIDE bytes of mapped text.
        unsafe {
            core::slice::from_raw_parts(
                trampoline_address(vector) as *const u8,
                TRAMPOLINE_STRIDE as usize,
            )
        }
    }

    /// Decode the leading run of `push imm` instructions of a stub.
    fn pushed_immediates(code: &[u8]) -> (Vec<u64>, usize) {
        let mut values = Vec::new();
        let mut at = 0;
        loop {
            match code[at] {
                PUSH_IMM8 => {
                    values.push(code[at + 1] as i8 as i64 as u64);
                    at += 2;
                }
                PUSH_IMM32 => {
                    let imm = i32::from_le_bytes(code[at + 1..at + 5].try_into().unwrap());
                    values.push(imm as i64 as u64);
                    at += 5;
                }
                _ => return (values, at),
            }
        }
    }

    #[test]
    fn each_stub_pushes_dummy_error_code_only_when_cpu_does_not() {
        for vector in 0..=255u8 {
            let code = stub_bytes(vector);
            let (pushed, next) = pushed_immediates(code);
            let expected = if has_error_code(vector) {
                vec![u64::from(vector)]
            } else {
                vec![0, u64::from(vector)]
            };
            assert_eq!(pushed, expected, "stub {vector}");
            assert!(
                matches!(code[next], JMP_REL8 | JMP_REL32),
                "stub {vector} does not jump to the common entry"
            );
        }
    }

    #[test]
    fn stubs_have_fixed_stride() {
        assert_eq!(trampolines_len(), VECTOR_COUNT as u64 * TRAMPOLINE_STRIDE);
    }

    #[test]
    fn stub_addresses_are_distinct_and_ordered() {
        for vector in 1..=255u8 {
            assert_eq!(
                trampoline_address(vector) - trampoline_address(vector - 1),
                TRAMPOLINE_STRIDE
            );
        }
        assert_eq!(trampoline_address(0) % TRAMPOLINE_STRIDE, 0);
    }
}
