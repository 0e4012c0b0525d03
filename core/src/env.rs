use std::collections::HashMap;
use std::fmt::Debug;

/// Env is used to read environment variables while loading configuration.
///
/// Signers never read the process environment directly, so tests can swap in
/// a [`StaticEnv`] instead of mutating global state.
pub trait Env: Debug + Send + Sync + 'static {
    /// Get an environment variable.
    ///
    /// Returns `None` if the variable is unset or not valid unicode.
    fn var(&self, key: &str) -> Option<String>;
}

/// Implements Env for the current process environment.
#[derive(Debug, Copy, Clone, Default)]
pub struct OsEnv;

impl Env for OsEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// StaticEnv provides a fixed set of environment variables.
#[derive(Debug, Clone, Default)]
pub struct StaticEnv {
    /// The environment variables.
    pub envs: HashMap<String, String>,
}

impl<K, V> FromIterator<(K, V)> for StaticEnv
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            envs: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl Env for StaticEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.envs.get(key).cloned()
    }
}
