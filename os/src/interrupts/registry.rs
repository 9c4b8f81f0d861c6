//! Handler registry: one optional handler per vector.

use core::ptr;
use core::sync::atomic::{AtomicPtr, AtomicU64, Ordering};

use super::frame::RegisterFrame;
use super::vector::VECTOR_COUNT;

/// Something that services an interrupt.
///
/// Handlers run with interrupts disabled on the interrupted stack. They may
/// edit the frame to change the context that resumes.
pub trait InterruptHandler: Sync {
    fn handle(&self, frame: &mut RegisterFrame);
}

impl<F> InterruptHandler for F
where
    F: Fn(&mut RegisterFrame) + Send + Sync,
{
    fn handle(&self, frame: &mut RegisterFrame) {
        self(frame)
    }
}

pub type HandlerRef = &'static dyn InterruptHandler;

/// Vector-indexed handler table plus per-vector dispatch counters.
///
/// Each slot is a single atomic pointer to a `'static` [`HandlerRef`], so
/// neither registering nor dispatching ever waits. An NMI or machine check
/// that lands in the middle of a registration sees either the old handler or
/// the new one. Last write wins.
pub struct HandlerRegistry {
    slots: [AtomicPtr<HandlerRef>; VECTOR_COUNT],
    counts: [AtomicU64; VECTOR_COUNT],
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HandlerRegistry {
    pub const fn new() -> Self {
        Self {
            slots: [const { AtomicPtr::new(ptr::null_mut()) }; VECTOR_COUNT],
            counts: [const { AtomicU64::new(0) }; VECTOR_COUNT],
        }
    }

    pub fn set(&self, vector: u8, handler: &'static HandlerRef) {
        let handler = handler as *const HandlerRef as *mut HandlerRef;
        self.slots[vector as usize].store(handler, Ordering::Release);
    }

    pub fn get(&self, vector: u8) -> Option<HandlerRef> {
        let handler = self.slots[vector as usize].load(Ordering::Acquire);
        // SAFETY: slots only ever hold null or a pointer taken from a
        // `&'static HandlerRef` in `set`.
        unsafe { handler.as_ref() }.copied()
    }

    /// Drop every handler and zero the counters.
    pub fn clear(&self) {
        for slot in &self.slots {
            slot.store(ptr::null_mut(), Ordering::Release);
        }
        for count in &self.counts {
            count.store(0, Ordering::Relaxed);
        }
    }

    /// Invoke the handler for the frame's vector, if any.
    ///
    /// Returns whether a handler ran.
    pub fn invoke(&self, frame: &mut RegisterFrame) -> bool {
        let vector = frame.vector();
        self.counts[vector as usize].fetch_add(1, Ordering::Relaxed);
        match self.get(vector) {
            Some(handler) => {
                handler.handle(frame);
                true
            }
            None => false,
        }
    }

    /// How many times `vector` has been dispatched since the last clear.
    pub fn count(&self, vector: u8) -> u64 {
        self.counts[vector as usize].load(Ordering::Relaxed)
    }
}
