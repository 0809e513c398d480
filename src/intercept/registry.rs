//! Registry
//!
//! The table of live spies, keyed by [`TargetKey`]. The registry owns every
//! spy's lifetime and the snapshot needed to undo it. Each key moves through
//! `Unspied -> Spied -> Restored`; any other transition is an error.
//!
//! Install and restore run under a single registry lock, so a snapshot is
//! taken and consumed exactly once and no other caller ever observes a
//! half-installed or half-restored slot.
//!
//! Nothing is restored automatically: the surrounding test harness is
//! expected to call [`SpyRegistry::restore_all`] after each test case.

use std::collections::HashMap;
use std::sync::OnceLock;

use parking_lot::Mutex;
use tracing::debug;

use super::config::RegistryConfig;
use super::engine;
use super::error::SpyError;
use super::snapshot::Snapshot;
use super::spy::Spy;
use super::target::{Target, TargetKey};
use crate::dispatch::{ClassRef, ObjectRef};

/// One identifying argument of the dynamic [`SpyRegistry::on_args`] form.
#[derive(Debug, Clone)]
pub enum SpyArg {
    Target(Target),
    Method(String),
}

impl From<Target> for SpyArg {
    fn from(target: Target) -> Self {
        SpyArg::Target(target)
    }
}

impl From<&ObjectRef> for SpyArg {
    fn from(obj: &ObjectRef) -> Self {
        SpyArg::Target(Target::from(obj))
    }
}

impl From<&ClassRef> for SpyArg {
    fn from(class: &ClassRef) -> Self {
        SpyArg::Target(Target::from(class))
    }
}

impl From<&str> for SpyArg {
    fn from(method: &str) -> Self {
        SpyArg::Method(method.to_string())
    }
}

impl From<String> for SpyArg {
    fn from(method: String) -> Self {
        SpyArg::Method(method)
    }
}

/// What a restore request covers.
#[derive(Debug, Clone)]
pub enum RestoreRequest {
    /// Every live spy.
    All,
    Method(Target, String),
}

struct ActiveSpy {
    spy: Spy,
    snapshot: Snapshot,
    /// Install order, used to unwind restore-all newest first.
    seq: u64,
}

#[derive(Default)]
struct Spies {
    active: HashMap<TargetKey, ActiveSpy>,
    next_seq: u64,
}

/// Builder for a [`SpyRegistry`].
#[derive(Debug, Clone, Default)]
pub struct RegistryBuilder {
    config: RegistryConfig,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_calls(mut self, enabled: bool) -> Self {
        self.config.record_calls = enabled;
        self
    }

    pub fn history_limit(mut self, limit: usize) -> Self {
        self.config.history_limit = Some(limit);
        self
    }

    pub fn unbounded_history(mut self) -> Self {
        self.config.history_limit = None;
        self
    }

    pub fn build(self) -> SpyRegistry {
        SpyRegistry::with_config(self.config)
    }
}

pub struct SpyRegistry {
    config: RegistryConfig,
    spies: Mutex<Spies>,
}

static GLOBAL: OnceLock<SpyRegistry> = OnceLock::new();

impl SpyRegistry {
    /// An empty registry with the default configuration.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            config,
            spies: Mutex::new(Spies::default()),
        }
    }

    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// The process-wide registry, created empty on first use.
    pub fn global() -> &'static SpyRegistry {
        GLOBAL.get_or_init(SpyRegistry::new)
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Spy on `method` of an object (instance mode) or a type (static mode).
    ///
    /// Passing [`Target::AnyInstance`] behaves like [`on_any_instance`](Self::on_any_instance).
    pub fn on(&self, target: impl Into<Target>, method: &str) -> Result<Spy, SpyError> {
        self.install(target.into(), method)
    }

    /// Dynamic form of [`on`](Self::on): exactly a target followed by a method
    /// name, anything else is [`SpyError::InvalidArgument`].
    pub fn on_args(&self, args: Vec<SpyArg>) -> Result<Spy, SpyError> {
        let [target, method]: [SpyArg; 2] = args.try_into().map_err(|args: Vec<SpyArg>| {
            SpyError::InvalidArgument(format!(
                "wrong number of arguments (given {}, expected 2)",
                args.len()
            ))
        })?;
        match (target, method) {
            (SpyArg::Target(target), SpyArg::Method(method)) => self.install(target, &method),
            _ => Err(SpyError::InvalidArgument(
                "expected a target followed by a method name".to_string(),
            )),
        }
    }

    /// Spy on the dispatch entry shared by every instance of `class`,
    /// including instances that already exist.
    pub fn on_any_instance(&self, class: &ClassRef, method: &str) -> Result<Spy, SpyError> {
        self.install(Target::any_instance(class), method)
    }

    fn install(&self, target: Target, method: &str) -> Result<Spy, SpyError> {
        let key = target.key(method);
        let mut spies = self.spies.lock();
        if spies.active.contains_key(&key) {
            return Err(SpyError::AlreadySpied {
                receiver: target.to_string(),
                method: method.to_string(),
            });
        }

        let spy = Spy::new(key.clone(), &self.config);
        let snapshot = engine::install(&target, method, &spy)?;
        let seq = spies.next_seq;
        spies.next_seq += 1;
        spies.active.insert(
            key,
            ActiveSpy {
                spy: spy.clone(),
                snapshot,
                seq,
            },
        );
        Ok(spy)
    }

    /// Undo the spy on `method` of `target`.
    pub fn restore(&self, target: impl Into<Target>, method: &str) -> Result<(), SpyError> {
        let target = target.into();
        let key = target.key(method);
        let mut spies = self.spies.lock();
        let active = spies
            .active
            .remove(&key)
            .ok_or_else(|| SpyError::MethodNotSpied {
                receiver: target.to_string(),
                method: method.to_string(),
            })?;
        retire(active);
        Ok(())
    }

    pub fn restore_any_instance(&self, class: &ClassRef, method: &str) -> Result<(), SpyError> {
        self.restore(Target::any_instance(class), method)
    }

    /// Restore either everything or one target. Returns how many spies were restored.
    pub fn restore_request(&self, request: RestoreRequest) -> Result<usize, SpyError> {
        match request {
            RestoreRequest::All => Ok(self.restore_all()),
            RestoreRequest::Method(target, method) => {
                self.restore(target, &method)?;
                Ok(1)
            }
        }
    }

    /// Restore every live spy, newest first, leaving the registry empty.
    pub fn restore_all(&self) -> usize {
        let mut spies = self.spies.lock();
        let mut drained: Vec<ActiveSpy> = spies.active.drain().map(|(_, active)| active).collect();
        drained.sort_by(|a, b| b.seq.cmp(&a.seq));

        let restored = drained.len();
        for active in drained {
            retire(active);
        }
        debug!(restored, "restored all spies");
        restored
    }

    /// The live spy for `method` on `target`, if any.
    pub fn spy(&self, target: impl Into<Target>, method: &str) -> Option<Spy> {
        let key = target.into().key(method);
        self.spies.lock().active.get(&key).map(|active| active.spy.clone())
    }

    pub fn is_spied(&self, target: impl Into<Target>, method: &str) -> bool {
        let key = target.into().key(method);
        self.spies.lock().active.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.spies.lock().active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spies.lock().active.is_empty()
    }

    /// Keys of every live spy, in install order.
    pub fn keys(&self) -> Vec<TargetKey> {
        let spies = self.spies.lock();
        let mut keys: Vec<_> = spies
            .active
            .iter()
            .map(|(key, active)| (active.seq, key.clone()))
            .collect();
        keys.sort_by_key(|(seq, _)| *seq);
        keys.into_iter().map(|(_, key)| key).collect()
    }
}

impl Default for SpyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Freeze the spy, then hand its snapshot back to the engine.
fn retire(active: ActiveSpy) {
    active.spy.mark_restored();
    engine::reinstate(active.snapshot);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::Class;
    use crate::value::Value;

    fn widget() -> ClassRef {
        Class::builder("Widget")
            .method("render", |_, _| Ok(Value::from("<widget>")))
            .method("hide", |_, _| Ok(Value::Unit))
            .build()
    }

    #[test]
    fn on_args_requires_target_then_method() {
        let registry = SpyRegistry::new();
        let obj = widget().new_instance();

        for args in [
            vec![],
            vec![SpyArg::from(&obj)],
            vec![SpyArg::from(&obj), SpyArg::from("render"), SpyArg::from("hide")],
            vec![SpyArg::from("render"), SpyArg::from(&obj)],
        ] {
            assert!(matches!(
                registry.on_args(args),
                Err(SpyError::InvalidArgument(_))
            ));
        }
        assert!(registry.is_empty());

        let spy = registry
            .on_args(vec![SpyArg::from(&obj), SpyArg::from("render")])
            .expect("two arguments");
        assert_eq!(spy.key(), &Target::from(&obj).key("render"));
    }

    #[test]
    fn keys_come_back_in_install_order() {
        let registry = SpyRegistry::new();
        let class = widget();
        let obj = class.new_instance();

        registry.on(&obj, "render").expect("render");
        registry.on_any_instance(&class, "hide").expect("hide");

        assert_eq!(
            registry.keys(),
            vec![
                Target::from(&obj).key("render"),
                Target::any_instance(&class).key("hide"),
            ]
        );
        assert_eq!(registry.restore_all(), 2);
        assert!(registry.keys().is_empty());
    }

    #[test]
    fn builder_config_reaches_spies() {
        let registry = SpyRegistry::builder().record_calls(false).build();
        let obj = widget().new_instance();
        let spy = registry.on(&obj, "render").expect("spy");

        obj.call("render", &[]).expect("call");
        assert_eq!(spy.call_count(), 1);
        assert!(spy.calls().is_empty());
        assert!(!registry.config().record_calls);
    }
}
