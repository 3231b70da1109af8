use std::{
    env::{self, VarError},
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::Context;
use embedded_ui::{RoutePrefix, UiConfig};

/// All static configuration of the host. I.e. configuration which does not change during the
/// runtime without a restart.
pub struct Configuration {
    /// The port we bind to.
    port: u16,
    /// Host name or IP address to bind to.
    host: String,
    /// URL namespace of the embedded UI.
    route_prefix: RoutePrefix,
    /// Document loaded for client side routes of the UI.
    entry_document: String,
    /// Directory of static files served from disk for requests the UI does not answer. If not set,
    /// these requests end up with `404 Not Found`.
    static_dir: Option<PathBuf>,
}

impl Configuration {
    /// Load the configuration from the environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        let host = extract_env_var("HOST")?.unwrap_or_else(|| "0.0.0.0".to_owned());
        let port = extract_env_var("PORT")?.unwrap_or(3000);
        let route_prefix = match extract_env_var("UI_ROUTE_PREFIX")? {
            Some(prefix) => prefix,
            None => RoutePrefix::new("custom/ui")?,
        };
        let entry_document =
            extract_env_var("UI_ENTRY_DOCUMENT")?.unwrap_or_else(|| "index.html".to_owned());
        let static_dir = extract_env_var("STATIC_DIR")?;

        let cfg = Configuration {
            host,
            port,
            route_prefix,
            entry_document,
            static_dir,
        };
        Ok(cfg)
    }

    /// The address the server should bind to.
    pub fn socket_addr(&self) -> (&str, u16) {
        (&self.host, self.port)
    }

    /// How the embedded UI is mounted.
    pub fn ui_config(&self) -> UiConfig {
        UiConfig::new(self.route_prefix.clone()).with_entry_document(self.entry_document.clone())
    }

    /// Directory of on-disk static files, if configured.
    pub fn static_dir(&self) -> Option<&Path> {
        self.static_dir.as_deref()
    }
}

fn handle_invalid_unicode(result: Result<String, VarError>) -> anyhow::Result<Option<String>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(VarError::NotPresent) => Ok(None),
        Err(e @ VarError::NotUnicode(_)) => Err(e.into()),
    }
}

fn parse_from_env_result<T>(result: Result<String, VarError>) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: Into<anyhow::Error> + Send + Sync + std::error::Error + 'static,
{
    let value = handle_invalid_unicode(result)?
        .map(|value| value.parse::<T>())
        .transpose()?;
    Ok(value)
}

fn extract_env_var<T>(var_name: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: Into<anyhow::Error> + Send + Sync + std::error::Error + 'static,
{
    parse_from_env_result(env::var(var_name))
        .with_context(|| format!("Error parsing environment variable '{var_name}'"))
}
