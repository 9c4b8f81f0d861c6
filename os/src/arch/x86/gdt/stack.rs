//! Dedicated exception stacks.

use super::STACK_SIZE;

/// Stacks must be 16-byte aligned for proper x86-64 operation.
#[repr(align(16))]
pub struct Stack(pub [u8; STACK_SIZE]);

/// Double fault handler stack (IST1). Never used for normal execution.
pub static mut DOUBLE_FAULT_STACK: Stack = Stack([0; STACK_SIZE]);

/// Highest address of `stack`; stacks grow downward.
pub fn top(stack: *const Stack) -> *const u8 {
    unsafe { (stack as *const u8).add(STACK_SIZE) }
}
