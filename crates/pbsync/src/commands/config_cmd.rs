//! Config subcommand handlers.

use std::collections::HashMap;

use pbsync_config::{ConfigError, Defaults};

use crate::cli::{ConfigArgs, ConfigCommand, OutputFormat};
use crate::commands::Ctx;
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

const MASK: &str = "****";

pub fn handle(args: &ConfigArgs, ctx: &Ctx<'_>) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string());
            Ok(())
        }
        ConfigCommand::Show => {
            let cfg = redacted(&config::load_config()?);
            let rendered = if ctx.global.output == OutputFormat::Text {
                toml::to_string_pretty(&cfg).map_err(ConfigError::from)?
            } else {
                output::render(ctx.global.output, &cfg, |_| String::new())?
            };
            output::print_output(&rendered);
            Ok(())
        }
    }
}

/// Copy of `cfg` with plaintext secrets masked.
fn redacted(cfg: &Config) -> Config {
    let profiles: HashMap<String, Profile> = cfg
        .profiles
        .iter()
        .map(|(name, profile)| {
            let mut profile = profile.clone();
            if profile.password.is_some() {
                profile.password = Some(MASK.into());
            }
            (name.clone(), profile)
        })
        .collect();

    Config {
        default_profile: cfg.default_profile.clone(),
        defaults: Defaults {
            insecure: cfg.defaults.insecure,
            timeout: cfg.defaults.timeout,
        },
        profiles,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passwords_are_masked_but_env_names_kept() {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "default".into(),
            Profile {
                endpoint: "http://127.0.0.1:8090".into(),
                identity: Some("admin@example.com".into()),
                password: Some("hunter22".into()),
                password_env: Some("PB_PASSWORD".into()),
                ..Profile::default()
            },
        );

        let shown = redacted(&cfg);
        let profile = &shown.profiles["default"];
        assert_eq!(profile.password.as_deref(), Some(MASK));
        assert_eq!(profile.password_env.as_deref(), Some("PB_PASSWORD"));
        assert_eq!(profile.identity.as_deref(), Some("admin@example.com"));
    }
}
