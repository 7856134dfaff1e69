// Persists the cache related environment variables and mirrors them into the
// running process.

use crate::libs::env_store::EnvironmentStore;
use crate::schemas::errors::EnvError;
use crate::{log_debug, log_info, log_warn};
use colored::Colorize;

/// A variable to set at user scope and in the current process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentBinding {
    pub name: String,
    pub value: String,
}

impl EnvironmentBinding {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Sets one binding in both scopes.
///
/// A persisted value that already matches is not rewritten. A failure to
/// persist is returned; a failure to mirror into the current process is only
/// logged because the persisted value still reaches future processes.
///
/// # Returns
/// * `Ok(true)` if the persisted value changed, `Ok(false)` if it was already set.
pub fn set_binding(
    env: &mut dyn EnvironmentStore,
    binding: &EnvironmentBinding,
) -> Result<bool, EnvError> {
    let EnvironmentBinding { name, value } = binding;

    let changed = if env.persisted(name)?.as_deref() == Some(value.as_str()) {
        log_debug!("[Env] {} already persisted as '{}'", name, value);
        false
    } else {
        env.persist(name, value)?;
        log_info!("[Env] Set {} = {}", name.bold(), value.cyan());
        true
    };

    if let Err(e) = env.mirror(name, value) {
        log_warn!("[Env] {} (new processes will still see it)", e);
    }

    Ok(changed)
}

/// Applies every binding in order, stopping at the first persist failure.
///
/// # Returns
/// * The number of bindings whose persisted value changed.
pub fn apply_bindings(
    env: &mut dyn EnvironmentStore,
    bindings: &[EnvironmentBinding],
) -> Result<usize, EnvError> {
    let mut changed = 0;
    for binding in bindings {
        if set_binding(env, binding)? {
            changed += 1;
        }
    }
    Ok(changed)
}
