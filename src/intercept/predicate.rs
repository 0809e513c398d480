//! Predicate Chain
//!
//! Filters deciding which calls a spy counts. A chain is AND-composed and an
//! empty chain accepts every call.
//!
//! Arbitrary predicates declare an [`Arity`]. The call's arguments are bound
//! positionally to that many parameters: surplus arguments are dropped, and
//! parameters past the end of the call are bound as absent (`None`).

use std::fmt;
use std::sync::Arc;

use crate::value::Value;

/// Number of parameters a predicate declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Fixed(usize),
    /// Bind every argument actually passed.
    Variadic,
}

/// Call arguments bound to a predicate's declared parameters.
#[derive(Debug, Clone, Copy)]
pub struct BoundArgs<'a> {
    args: &'a [Value],
    arity: usize,
}

impl<'a> BoundArgs<'a> {
    pub fn bind(args: &'a [Value], arity: Arity) -> Self {
        let arity = match arity {
            Arity::Fixed(n) => n,
            Arity::Variadic => args.len(),
        };
        Self { args, arity }
    }

    /// Parameter `index`, or `None` when it is absent or beyond the arity.
    pub fn get(&self, index: usize) -> Option<&'a Value> {
        if index < self.arity {
            self.args.get(index)
        } else {
            None
        }
    }

    /// True for a declared parameter that the call did not supply.
    pub fn is_absent(&self, index: usize) -> bool {
        index < self.arity && index >= self.args.len()
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    /// How many declared parameters received an actual argument.
    pub fn supplied(&self) -> usize {
        self.arity.min(self.args.len())
    }

    /// Every declared parameter in order.
    pub fn iter(&self) -> impl Iterator<Item = Option<&'a Value>> + '_ {
        (0..self.arity).map(move |i| self.get(i))
    }
}

type TestFn = dyn Fn(&BoundArgs<'_>) -> bool + Send + Sync;

/// A single filter over a call's argument list.
#[derive(Clone)]
pub enum Predicate {
    /// The call's arguments must equal these, position by position, with the same length.
    Args(Vec<Value>),
    When { arity: Arity, test: Arc<TestFn> },
}

impl Predicate {
    pub fn args<I>(matchers: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        Predicate::Args(matchers.into_iter().map(Into::into).collect())
    }

    pub fn when<F>(arity: Arity, test: F) -> Self
    where
        F: Fn(&BoundArgs<'_>) -> bool + Send + Sync + 'static,
    {
        Predicate::When {
            arity,
            test: Arc::new(test),
        }
    }

    pub fn matches(&self, args: &[Value]) -> bool {
        match self {
            Predicate::Args(expected) => expected.as_slice() == args,
            Predicate::When { arity, test } => test(&BoundArgs::bind(args, *arity)),
        }
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Args(values) => f.debug_tuple("Args").field(values).finish(),
            Predicate::When { arity, .. } => f.debug_struct("When").field("arity", arity).finish(),
        }
    }
}

/// Ordered, AND-composed predicates.
#[derive(Debug, Clone, Default)]
pub struct PredicateChain {
    predicates: Vec<Predicate>,
}

impl PredicateChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, predicate: Predicate) {
        self.predicates.push(predicate);
    }

    /// Copy of this chain with `predicate` appended.
    pub fn with(&self, predicate: Predicate) -> Self {
        let mut next = self.clone();
        next.push(predicate);
        next
    }

    /// True when every predicate accepts `args`. Stops at the first rejection.
    pub fn matches(&self, args: &[Value]) -> bool {
        self.predicates.iter().all(|p| p.matches(args))
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Predicate> {
        self.predicates.iter()
    }
}
