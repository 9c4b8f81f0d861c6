//! Hardware IRQ dispatcher for vectors 32-47.
//!
//! The handler runs first and the controller is acknowledged after it
//! returns. Until then the PIC holds the line in service, so the same line
//! cannot be delivered again while its handler is still running, even if the
//! handler turns interrupts back on.

use super::frame::RegisterFrame;
use super::pic::ChainedPics;
use super::registry::HandlerRegistry;
use crate::arch::x86::port::PortIo;

/// Service one IRQ. A line without a driver is routine and ignored, but is
/// still acknowledged exactly once.
pub(super) fn dispatch(
    registry: &HandlerRegistry,
    pics: &ChainedPics,
    io: &impl PortIo,
    frame: &mut RegisterFrame,
) {
    let vector = frame.vector();
    registry.invoke(frame);
    pics.notify_end_of_interrupt(io, vector);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interrupts::pic::{MASTER_CMD, SLAVE_CMD};
    use crate::interrupts::registry::HandlerRef;
    use crate::testing::{MockPlatform, PortEvent};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn unregistered_line_is_acknowledged_once() {
        let registry = HandlerRegistry::new();
        let io = MockPlatform::new();
        dispatch(&registry, &ChainedPics::default(), &io, &mut RegisterFrame::for_vector(39));
        assert_eq!(io.eoi_writes(), vec![MASTER_CMD]);
    }

    #[test]
    fn slave_line_acknowledges_slave_then_master() {
        let registry = HandlerRegistry::new();
        let io = MockPlatform::new();
        dispatch(&registry, &ChainedPics::default(), &io, &mut RegisterFrame::for_vector(45));
        assert_eq!(io.eoi_writes(), vec![SLAVE_CMD, MASTER_CMD]);
    }

    #[test]
    fn eoi_follows_the_handler() {
        static IO: std::sync::OnceLock<MockPlatform> = std::sync::OnceLock::new();
        static MARK: HandlerRef = &|_: &mut RegisterFrame| {
            IO.get().unwrap().mark("handler");
        };
        let io = IO.get_or_init(MockPlatform::new);
        let registry = HandlerRegistry::new();
        registry.set(44, &MARK);

        dispatch(&registry, &ChainedPics::default(), io, &mut RegisterFrame::for_vector(44));
        assert_eq!(
            io.events(),
            vec![
                PortEvent::Mark("handler"),
                PortEvent::Write(SLAVE_CMD, 0x20),
                PortEvent::Write(MASTER_CMD, 0x20),
            ]
        );
    }

    #[test]
    fn handler_runs_once_per_dispatch() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        static COUNT: HandlerRef = &|_: &mut RegisterFrame| {
            CALLS.fetch_add(1, Ordering::SeqCst);
        };
        let registry = HandlerRegistry::new();
        let io = MockPlatform::new();
        registry.set(33, &COUNT);

        for _ in 0..3 {
            dispatch(&registry, &ChainedPics::default(), &io, &mut RegisterFrame::for_vector(33));
        }
        assert_eq!(CALLS.load(Ordering::SeqCst), 3);
        assert_eq!(io.eoi_writes().len(), 3);
    }
}
