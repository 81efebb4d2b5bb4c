// Bootstrap steps wiring configuration into the application container.

use crate::{ConfigRepository, Result};
use std::collections::HashMap;
use std::sync::Arc;
use trellis_core::application::Application;
use trellis_core::bootstrap::{Bootstrapper, ServiceProvider, bootstrapper};
use trellis_core::error::Result as CoreResult;

/// Loads `.env` and every `config/*.toml` under the application base
/// path, then binds the repository as the `"config"` service.
///
/// Each file lands under its stem, so `config/app.toml` answers
/// `"app.timezone"` queries.
pub struct LoadConfiguration;

impl LoadConfiguration {
    fn load(&self, app: &Application) -> Result<ConfigRepository> {
        let base = app
            .path()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| ".".into());

        // Missing .env is fine; a present but broken one is not.
        let env_file = base.join(".env");
        if env_file.exists() {
            dotenvy::from_path(&env_file)
                .map_err(|e| crate::ConfigError::LoadError(e.to_string()))?;
        }

        let config = ConfigRepository::new();
        let config_dir = base.join("config");
        if config_dir.is_dir() {
            let mut paths: Vec<_> = std::fs::read_dir(&config_dir)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("toml"))
                .collect();
            paths.sort();

            for path in paths {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    config.load_named(stem, &path)?;
                }
            }
        }

        Ok(config)
    }
}

impl Bootstrapper for LoadConfiguration {
    fn bootstrap(&self, app: &Application) -> CoreResult<()> {
        let config = self.load(app)?;
        app.set("config", config);
        Ok(())
    }
}

/// Runs the configured service providers, then installs facade aliases
/// from the `app.aliases` table.
#[derive(Clone, Default)]
pub struct RegisterProviders {
    providers: Vec<String>,
}

impl RegisterProviders {
    pub fn new<I, S>(providers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            providers: providers.into_iter().map(Into::into).collect(),
        }
    }
}

impl Bootstrapper for RegisterProviders {
    fn bootstrap(&self, app: &Application) -> CoreResult<()> {
        for id in &self.providers {
            let provider = app.resolve::<Arc<dyn ServiceProvider>>(id)?;
            provider.register(app)?;
        }

        if let Ok(config) = app.resolve::<ConfigRepository>("config") {
            if let Ok(aliases) = config.get::<HashMap<String, String>>("app.aliases") {
                for (alias, abstract_id) in aliases {
                    app.alias(&alias, &abstract_id);
                }
            }
        }

        Ok(())
    }
}

/// Bind both bootstrap steps under their canonical ids.
pub fn register(app: &Application, providers: Vec<String>) {
    app.bind_factory("bootstrap.configuration", |_, _| {
        Ok(bootstrapper(LoadConfiguration))
    });

    let step = RegisterProviders::new(providers);
    app.bind_factory("bootstrap.providers", move |_, _| {
        Ok(bootstrapper(step.clone()))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use trellis_core::bootstrap::{LogServiceProvider, provider};

    fn write_app_toml(dir: &std::path::Path, body: &str) {
        let config_dir = dir.join("config");
        std::fs::create_dir_all(&config_dir).unwrap();
        let mut file = std::fs::File::create(config_dir.join("app.toml")).unwrap();
        writeln!(file, "{}", body).unwrap();
    }

    #[test]
    fn test_load_configuration_binds_config_service() {
        let dir = tempfile::tempdir().unwrap();
        write_app_toml(dir.path(), "timezone = \"UTC\"");

        let app = Application::with_path(dir.path());
        LoadConfiguration.bootstrap(&app).unwrap();

        let config = app.resolve::<ConfigRepository>("config").unwrap();
        assert_eq!(config.get_string("app.timezone").unwrap(), "UTC");
    }

    #[test]
    fn test_register_providers_runs_providers_and_aliases() {
        let dir = tempfile::tempdir().unwrap();
        write_app_toml(dir.path(), "[aliases]\nLog = \"log\"");

        let app = Application::with_path(dir.path());
        app.bind_factory("provider.log", |_, _| Ok(provider(LogServiceProvider)));

        LoadConfiguration.bootstrap(&app).unwrap();
        RegisterProviders::new(["provider.log"]).bootstrap(&app).unwrap();

        let via_alias = app.resolve::<trellis_log::LogWriter>("Log").unwrap();
        let direct = app.resolve::<trellis_log::LogWriter>("log").unwrap();
        assert!(Arc::ptr_eq(&via_alias, &direct));
    }

    #[test]
    fn test_full_bootstrap_sequence() {
        let dir = tempfile::tempdir().unwrap();
        write_app_toml(dir.path(), "name = \"trellis\"");

        let app = Application::with_path(dir.path());
        register(&app, vec![]);
        app.bootstrap_with(&["bootstrap.configuration", "bootstrap.providers"])
            .unwrap();

        assert!(app.has_been_bootstrapped());
        let config = app.resolve::<ConfigRepository>("config").unwrap();
        assert_eq!(config.get_string("app.name").unwrap(), "trellis");
    }
}
