//! Call-scoped state: resolved paths, hash-check skipping, overrides.
//!
//! Everything here is thread-local and tagged with the owning manager's id,
//! so concurrent callers on other threads and other manager instances never
//! see each other's entries. Each scope is entered by pushing onto a stack
//! and left when its guard drops, which also happens during unwinding.

use std::cell::RefCell;
use std::path::PathBuf;
use std::thread::LocalKey;

use super::error::ContextError;

pub(super) struct Frame {
    manager: u64,
    name: String,
    path: PathBuf,
}

/// Source substituted for a requirement while an override scope is active.
#[derive(Debug, Clone)]
pub(super) struct Override {
    manager: u64,
    name: String,
    pub(super) uri: String,
    pub(super) hash: Option<String>,
}

thread_local! {
    static FRAMES: RefCell<Vec<Frame>> = const { RefCell::new(Vec::new()) };
    static SKIP_HASH: RefCell<Vec<u64>> = const { RefCell::new(Vec::new()) };
    static OVERRIDES: RefCell<Vec<Override>> = const { RefCell::new(Vec::new()) };
}

/// Pops its stack back to the depth it had before the push.
pub(super) struct ScopeGuard<T: 'static> {
    stack: &'static LocalKey<RefCell<Vec<T>>>,
    depth: usize,
}

impl<T: 'static> Drop for ScopeGuard<T> {
    fn drop(&mut self) {
        let depth = self.depth;
        // try_with: the thread may be tearing down its locals.
        let _ = self.stack.try_with(|s| s.borrow_mut().truncate(depth));
    }
}

fn push<T: 'static>(stack: &'static LocalKey<RefCell<Vec<T>>>, item: T) -> ScopeGuard<T> {
    let depth = stack.with(|s| {
        let mut s = s.borrow_mut();
        let depth = s.len();
        s.push(item);
        depth
    });
    ScopeGuard { stack, depth }
}

/// Make `name → path` visible to `lookup` until the guard drops.
pub(super) fn enter(manager: u64, name: &str, path: PathBuf) -> ScopeGuard<Frame> {
    push(
        &FRAMES,
        Frame {
            manager,
            name: name.to_string(),
            path,
        },
    )
}

/// Innermost path recorded for `name` by `manager` on this thread.
pub(super) fn lookup(manager: u64, name: &str) -> Result<PathBuf, ContextError> {
    FRAMES.with(|frames| {
        let frames = frames.borrow();
        let mut mine = frames.iter().rev().filter(|f| f.manager == manager).peekable();
        if mine.peek().is_none() {
            return Err(ContextError::OutsideContext);
        }
        mine.find(|f| f.name == name)
            .map(|f| f.path.clone())
            .ok_or_else(|| ContextError::NotRequired(name.to_string()))
    })
}

pub(super) fn skip_hash(manager: u64) -> ScopeGuard<u64> {
    push(&SKIP_HASH, manager)
}

pub(super) fn hash_check_skipped(manager: u64) -> bool {
    SKIP_HASH.with(|s| s.borrow().contains(&manager))
}

pub(super) fn override_source(
    manager: u64,
    name: &str,
    uri: &str,
    hash: Option<&str>,
) -> ScopeGuard<Override> {
    push(
        &OVERRIDES,
        Override {
            manager,
            name: name.to_string(),
            uri: uri.to_string(),
            hash: hash.map(str::to_string),
        },
    )
}

/// Innermost override of `name` for `manager`, if any.
pub(super) fn active_override(manager: u64, name: &str) -> Option<Override> {
    OVERRIDES.with(|o| {
        o.borrow()
            .iter()
            .rev()
            .find(|o| o.manager == manager && o.name == name)
            .cloned()
    })
}
