//! Registry configuration.

/// Options applied to every spy a registry creates.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct RegistryConfig {
    /// Keep a [`CallRecord`](super::CallRecord) for every intercepted call.
    pub record_calls: bool,
    /// Oldest records are dropped beyond this many. `None` keeps everything.
    pub history_limit: Option<usize>,
}

impl RegistryConfig {
    pub const DEFAULT_HISTORY_LIMIT: usize = 1024;
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            record_calls: true,
            history_limit: Some(Self::DEFAULT_HISTORY_LIMIT),
        }
    }
}
