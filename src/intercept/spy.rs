//! Spy
//!
//! The per-target wrapper state. The forwarding callable installed by the
//! engine reports every call here after the original implementation ran;
//! the spy decides whether the call counts and keeps the call history.
//!
//! A `Spy` is a cheap handle: clones share the same counter and chain.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use tracing::trace;

use super::config::RegistryConfig;
use super::predicate::{Arity, BoundArgs, Predicate, PredicateChain};
use super::target::{ReceiverId, TargetKey};
use crate::dispatch::{CallError, Receiver};
use crate::value::Value;

/// One observed invocation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CallRecord {
    /// The receiver the call was dispatched on. For any-instance spies this is
    /// the individual instance.
    pub receiver: ReceiverId,
    pub args: Vec<Value>,
    /// What the original returned, or `None` if it failed.
    pub result: Option<Value>,
    /// Whether the predicate chain accepted the call.
    pub counted: bool,
}

struct SpyState {
    key: TargetKey,
    chain: ArcSwap<PredicateChain>,
    count: AtomicUsize,
    history: Option<Mutex<VecDeque<CallRecord>>>,
    history_limit: Option<usize>,
    restored: AtomicBool,
}

#[derive(Clone)]
pub struct Spy {
    state: Arc<SpyState>,
}

impl Spy {
    pub(crate) fn new(key: TargetKey, config: &RegistryConfig) -> Self {
        Self {
            state: Arc::new(SpyState {
                key,
                chain: ArcSwap::from_pointee(PredicateChain::new()),
                count: AtomicUsize::new(0),
                history: config.record_calls.then(|| Mutex::new(VecDeque::new())),
                history_limit: config.history_limit,
                restored: AtomicBool::new(false),
            }),
        }
    }

    pub fn key(&self) -> &TargetKey {
        &self.state.key
    }

    /// Number of calls accepted by the predicate chain so far.
    pub fn call_count(&self) -> usize {
        self.state.count.load(Ordering::SeqCst)
    }

    /// Only count calls whose argument list equals `matchers` exactly.
    pub fn with_args<I>(self, matchers: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.push(Predicate::args(matchers))
    }

    /// Only count calls for which `predicate` holds.
    ///
    /// The predicate declares `arity` parameters: a call with more arguments
    /// is truncated to the leading `arity`, and missing trailing parameters
    /// read as absent.
    pub fn when<F>(self, arity: usize, predicate: F) -> Self
    where
        F: Fn(&BoundArgs<'_>) -> bool + Send + Sync + 'static,
    {
        self.push(Predicate::when(Arity::Fixed(arity), predicate))
    }

    /// Like [`when`](Self::when), binding every argument actually passed.
    pub fn when_variadic<F>(self, predicate: F) -> Self
    where
        F: Fn(&BoundArgs<'_>) -> bool + Send + Sync + 'static,
    {
        self.push(Predicate::when(Arity::Variadic, predicate))
    }

    /// Append an already-built predicate.
    pub fn push(self, predicate: Predicate) -> Self {
        self.state.chain.rcu(|chain| chain.with(predicate.clone()));
        self
    }

    pub fn predicate_count(&self) -> usize {
        self.state.chain.load().len()
    }

    /// Recorded calls, oldest first. Empty when recording is disabled.
    pub fn calls(&self) -> Vec<CallRecord> {
        self.state
            .history
            .as_ref()
            .map(|history| history.lock().iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn last_call(&self) -> Option<CallRecord> {
        self.state
            .history
            .as_ref()
            .and_then(|history| history.lock().back().cloned())
    }

    pub fn was_called(&self) -> bool {
        self.call_count() > 0
    }

    /// True if any recorded call, counted or not, had exactly these arguments.
    pub fn was_called_with<I>(&self, args: I) -> bool
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let expected: Vec<Value> = args.into_iter().map(Into::into).collect();
        self.state
            .history
            .as_ref()
            .is_some_and(|history| history.lock().iter().any(|call| call.args == expected))
    }

    /// True once the spy has been restored; its counter no longer moves.
    pub fn is_restored(&self) -> bool {
        self.state.restored.load(Ordering::SeqCst)
    }

    pub(crate) fn mark_restored(&self) {
        self.state.restored.store(true, Ordering::SeqCst);
    }

    /// Account for one forwarded call.
    pub(crate) fn observe(&self, receiver: &Receiver, args: &[Value], result: &Result<Value, CallError>) {
        if self.is_restored() {
            return;
        }

        let chain = self.state.chain.load_full();
        let counted = chain.matches(args);
        if counted {
            self.state.count.fetch_add(1, Ordering::SeqCst);
        }
        trace!(target_key = %self.state.key, counted, args = args.len(), "intercepted call");

        if let Some(history) = &self.state.history {
            let record = CallRecord {
                receiver: ReceiverId::from(receiver),
                args: args.to_vec(),
                result: result.as_ref().ok().cloned(),
                counted,
            };
            let mut history = history.lock();
            history.push_back(record);
            if let Some(limit) = self.state.history_limit {
                while history.len() > limit {
                    history.pop_front();
                }
            }
        }
    }
}

impl fmt::Debug for Spy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Spy")
            .field("key", &self.state.key)
            .field("call_count", &self.call_count())
            .field("predicates", &self.predicate_count())
            .field("restored", &self.is_restored())
            .finish()
    }
}
