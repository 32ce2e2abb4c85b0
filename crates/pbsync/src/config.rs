//! CLI configuration: thin wrapper around `pbsync_config`.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--profile, --endpoint, --insecure, --timeout).

use pbsync_core::ProviderConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use pbsync_config::{Config, Profile, config_path, load_config};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build a `ProviderConfig` from the config file, profile, and CLI overrides.
///
/// Without a matching profile, `--endpoint` alone is enough as long as
/// credentials are available from the environment.
pub fn resolve_provider(global: &GlobalOpts) -> Result<ProviderConfig, CliError> {
    let cfg = load_config()?;
    let name = active_profile_name(global, &cfg);

    let mut profile = match (cfg.profiles.get(&name), &global.endpoint) {
        (Some(profile), _) => profile.clone(),
        (None, Some(endpoint)) => Profile {
            endpoint: endpoint.clone(),
            ..Profile::default()
        },
        (None, None) if global.profile.is_some() => {
            let mut available: Vec<_> = cfg.profiles.keys().cloned().collect();
            available.sort();
            return Err(CliError::ProfileNotFound {
                name,
                available: if available.is_empty() {
                    "(none)".into()
                } else {
                    available.join(", ")
                },
                path: config_path().display().to_string(),
            });
        }
        (None, None) => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
    };

    // flags win over the profile
    if let Some(endpoint) = &global.endpoint {
        profile.endpoint.clone_from(endpoint);
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }

    tracing::debug!(profile = %name, endpoint = %profile.endpoint, "resolved server profile");
    Ok(pbsync_config::profile_to_provider_config(
        &profile,
        &name,
        &cfg.defaults,
    )?)
}
