//! User id allocation.

use std::sync::atomic::{AtomicI64, Ordering};

/// Opaque user identifier. Millisecond timestamp at creation.
pub type UserId = i64;

static LAST_ID: AtomicI64 = AtomicI64::new(0);

/// Allocate a new user id from the wall clock.
///
/// Ids are strictly increasing within a process: if the clock has not moved
/// past the last id handed out, the last id plus one is used instead.
pub fn next_user_id() -> UserId {
    let now = chrono::Utc::now().timestamp_millis();
    let mut last = LAST_ID.load(Ordering::Relaxed);
    loop {
        let candidate = now.max(last + 1);
        match LAST_ID.compare_exchange_weak(last, candidate, Ordering::SeqCst, Ordering::Relaxed) {
            Ok(_) => return candidate,
            Err(current) => last = current,
        }
    }
}

/// Make sure future ids are larger than `id` (used after loading a store).
pub fn observe_user_id(id: UserId) {
    LAST_ID.fetch_max(id, Ordering::SeqCst);
}
