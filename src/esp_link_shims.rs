//! `critical-section` provider for the ESP-IDF target.
//!
//! `embassy-sync`'s `CriticalSectionRawMutex` guards [`LINK_EVENTS`], which
//! the Bluedroid callback task and the main loop both touch.  Under ESP-IDF
//! both run as FreeRTOS tasks with std available, so a process-wide mutex
//! held for the outermost nesting level is enough.  Host builds get their
//! provider from `critical-section`'s `std` feature instead.
//!
//! [`LINK_EVENTS`]: crate::events::LINK_EVENTS

#[cfg(target_os = "espidf")]
use core::cell::{Cell, RefCell};
#[cfg(target_os = "espidf")]
use std::sync::{Mutex, MutexGuard};

#[cfg(target_os = "espidf")]
static LINK_QUEUE_LOCK: Mutex<()> = Mutex::new(());

#[cfg(target_os = "espidf")]
thread_local! {
    static NESTING: Cell<u8> = const { Cell::new(0) };
    static HELD: RefCell<Option<MutexGuard<'static, ()>>> = const { RefCell::new(None) };
}

#[cfg(target_os = "espidf")]
#[unsafe(no_mangle)]
pub extern "C" fn _critical_section_1_0_acquire() -> u8 {
    NESTING.with(|nesting| {
        let depth = nesting.get();
        if depth == 0 {
            // A panic while holding the lock cannot leave the queue torn
            // (embassy-sync only swaps whole slots), so poison is ignored.
            let guard = LINK_QUEUE_LOCK
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            HELD.with(|held| *held.borrow_mut() = Some(guard));
        }
        let depth = depth.saturating_add(1);
        nesting.set(depth);
        depth
    })
}

#[cfg(target_os = "espidf")]
#[unsafe(no_mangle)]
pub extern "C" fn _critical_section_1_0_release(_token: u8) {
    NESTING.with(|nesting| {
        let depth = nesting.get();
        if depth == 0 {
            return;
        }
        nesting.set(depth - 1);
        if depth == 1 {
            HELD.with(|held| *held.borrow_mut() = None);
        }
    })
}
