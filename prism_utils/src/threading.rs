//! Thread-role bookkeeping for the simulation and submission threads.
//!
//! The embedding engine registers its two threads once at startup. Every
//! public operation in the framework documents which thread it belongs to;
//! calling from the wrong one is a broken contract and panics. Processes
//! that never register roles (unit tests, single-threaded embeddings) skip
//! enforcement entirely.

use std::sync::OnceLock;
use std::thread::{self, ThreadId};

static GAME_THREAD: OnceLock<ThreadId> = OnceLock::new();
static RENDER_THREAD: OnceLock<ThreadId> = OnceLock::new();

/// Marks the calling thread as the simulation thread. Later calls are ignored.
pub fn register_game_thread() {
    let _ = GAME_THREAD.set(thread::current().id());
}

/// Marks the calling thread as the submission thread. Later calls are ignored.
pub fn register_render_thread() {
    let _ = RENDER_THREAD.set(thread::current().id());
}

pub fn is_in_game_thread() -> bool {
    GAME_THREAD
        .get()
        .is_none_or(|id| *id == thread::current().id())
}

pub fn is_in_render_thread() -> bool {
    RENDER_THREAD
        .get()
        .is_none_or(|id| *id == thread::current().id())
}

#[track_caller]
pub fn assert_game_thread(op: &str) {
    assert!(
        is_in_game_thread(),
        "`{op}` must be called from the simulation thread"
    );
}

#[track_caller]
pub fn assert_render_thread(op: &str) {
    assert!(
        is_in_render_thread(),
        "`{op}` must be called from the submission thread"
    );
}
