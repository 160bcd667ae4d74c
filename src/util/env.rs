//! Process environment overlays.

use std::ffi::OsString;

/// Applies variables to the current process and restores the previous
/// values when dropped, including on early returns and panics.
#[derive(Debug)]
pub struct ScopedEnv {
    saved: Vec<(String, Option<OsString>)>,
}

impl ScopedEnv {
    /// Set each variable, remembering what it replaced.
    pub fn apply<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut saved = Vec::new();
        for (key, value) in vars {
            let key = key.into();
            if key.is_empty() || key.contains('=') {
                continue;
            }
            saved.push((key.clone(), std::env::var_os(&key)));
            std::env::set_var(&key, value.as_ref());
        }
        tracing::debug!(count = saved.len(), "applied scoped environment");
        ScopedEnv { saved }
    }

    /// Names of the variables this guard overrides.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.saved.iter().map(|(k, _)| k.as_str())
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        // restore in reverse so repeated keys end at their first saved value
        for (key, previous) in self.saved.drain(..).rev() {
            match previous {
                Some(value) => std::env::set_var(&key, value),
                None => std::env::remove_var(&key),
            }
        }
    }
}
