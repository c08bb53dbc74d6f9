//! Thread-local context.
//!
//! Fields bound here are merged into every record logged from the same
//! thread, whichever logger handle is used.

use std::{cell::RefCell, marker::PhantomData};

use serde_json::{Map, Value};

use crate::{
    error::PipelineError,
    record::{EventMeta, EventRecord},
    stages::Processor,
};

thread_local! {
    static CONTEXT: RefCell<Map<String, Value>> = RefCell::new(Map::new());
}

/// Binds fields to the current thread's context, overwriting existing keys.
pub fn bind_threadlocal<I, K, V>(pairs: I)
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    CONTEXT.with(|ctx| {
        let mut ctx = ctx.borrow_mut();
        for (key, value) in pairs {
            ctx.insert(key.into(), value.into());
        }
    });
}

/// Removes keys from the current thread's context. Missing keys are ignored.
pub fn unbind_threadlocal<I, K>(keys: I)
where
    I: IntoIterator<Item = K>,
    K: AsRef<str>,
{
    CONTEXT.with(|ctx| {
        let mut ctx = ctx.borrow_mut();
        for key in keys {
            ctx.remove(key.as_ref());
        }
    });
}

/// Empties the current thread's context.
pub fn clear_threadlocal() {
    CONTEXT.with(|ctx| ctx.borrow_mut().clear());
}

/// Binds fields until the returned guard is dropped, then restores whatever
/// those keys held before.
#[must_use = "the fields are unbound as soon as the guard is dropped"]
pub fn bound_threadlocal<I, K, V>(pairs: I) -> ContextGuard
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    let previous = CONTEXT.with(|ctx| {
        let mut ctx = ctx.borrow_mut();
        pairs
            .into_iter()
            .map(|(key, value)| {
                let key = key.into();
                let old = ctx.insert(key.clone(), value.into());
                (key, old)
            })
            .collect()
    });
    ContextGuard {
        previous,
        _thread_bound: PhantomData,
    }
}

/// Restores the thread-local context on drop. See [`bound_threadlocal`].
pub struct ContextGuard {
    previous: Vec<(String, Option<Value>)>,
    _thread_bound: PhantomData<*const ()>,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        let previous = std::mem::take(&mut self.previous);
        // Thread teardown may already have destroyed the context.
        let _ = CONTEXT.try_with(|ctx| {
            let mut ctx = ctx.borrow_mut();
            for (key, old) in previous.into_iter().rev() {
                match old {
                    Some(value) => ctx.insert(key, value),
                    None => ctx.remove(&key),
                };
            }
        });
    }
}

/// Merges the thread-local context into the record.
///
/// Context fields come first; fields already in the record win.
#[derive(Clone, Copy, Debug, Default)]
pub struct MergeThreadLocal;

impl Processor for MergeThreadLocal {
    fn name(&self) -> &'static str {
        "merge_threadlocal"
    }

    fn process(
        &self,
        _meta: &EventMeta<'_>,
        record: EventRecord,
    ) -> Result<Option<EventRecord>, PipelineError> {
        let mut merged = CONTEXT
            .try_with(|ctx| ctx.borrow().clone())
            .unwrap_or_default();
        if merged.is_empty() {
            return Ok(Some(record));
        }
        for (key, value) in record {
            merged.insert(key, value);
        }
        Ok(Some(merged))
    }
}
