use anyhow::{Context, Result, bail};
use clap::Parser;
use std::{env, fmt, str::FromStr, time::Duration};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATABASE_URL: &str = "sqlite://./data/metamatrix.db";
const DEFAULT_NLU_TIMEOUT_SECS: u64 = 30;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub nlu_api_url: String,
    pub nlu_api_key: String,
    pub nlu_timeout: Duration,
}

// Custom Debug to avoid exposing nlu_api_key
impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database_url", &self.database_url)
            .field("nlu_api_url", &self.nlu_api_url)
            .field("nlu_api_key", &"<redacted>")
            .field("nlu_timeout", &self.nlu_timeout)
            .finish()
    }
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Metadata CRUD API with NLU-backed text analysis")]
pub struct Args {
    /// Host to bind to (overrides METAMATRIX_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides METAMATRIX_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Database URL (overrides METAMATRIX_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// NLU analyze endpoint, including any version query (overrides METAMATRIX_NLU_API_URL)
    #[arg(long)]
    pub nlu_api_url: Option<String>,

    /// NLU API key (overrides METAMATRIX_NLU_API_KEY)
    #[arg(long)]
    pub nlu_api_key: Option<String>,

    /// Seconds before an NLU call is abandoned (overrides METAMATRIX_NLU_TIMEOUT_SECS)
    #[arg(long)]
    pub nlu_timeout_secs: Option<u64>,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        let args = Args::parse();
        let migrate = args.migrate;
        let cfg = Self::from_args_with(args, |key| env::var(key))?;
        Ok((cfg, migrate))
    }

    /// Merge `args` over values read through `lookup`. CLI values win.
    ///
    /// NLU settings are only required when the server will actually run, so a
    /// `--migrate` invocation may omit them.
    pub fn from_args_with<F>(args: Args, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        let env_host = optional_var(&lookup, "METAMATRIX_HOST")?;
        let env_port = parse_var::<u16, _>(&lookup, "METAMATRIX_PORT")?;
        let env_db = optional_var(&lookup, "METAMATRIX_DATABASE_URL")?;
        let env_nlu_url = optional_var(&lookup, "METAMATRIX_NLU_API_URL")?;
        let env_nlu_key = optional_var(&lookup, "METAMATRIX_NLU_API_KEY")?;
        let env_timeout = parse_var::<u64, _>(&lookup, "METAMATRIX_NLU_TIMEOUT_SECS")?;

        let nlu_api_url = args.nlu_api_url.or(env_nlu_url);
        let nlu_api_key = args.nlu_api_key.or(env_nlu_key);
        let (nlu_api_url, nlu_api_key) = match (nlu_api_url, nlu_api_key) {
            (Some(url), Some(key)) => (url, key),
            _ if args.migrate => (String::new(), String::new()),
            (None, _) => bail!("NLU API URL is required (--nlu-api-url or METAMATRIX_NLU_API_URL)"),
            (_, None) => bail!("NLU API key is required (--nlu-api-key or METAMATRIX_NLU_API_KEY)"),
        };

        let timeout_secs = args
            .nlu_timeout_secs
            .or(env_timeout)
            .unwrap_or(DEFAULT_NLU_TIMEOUT_SECS);
        if timeout_secs == 0 {
            bail!("NLU timeout must be at least one second");
        }

        Ok(Self {
            host: args.host.or(env_host).unwrap_or_else(|| DEFAULT_HOST.into()),
            port: args.port.or(env_port).unwrap_or(DEFAULT_PORT),
            database_url: args
                .database_url
                .or(env_db)
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.into()),
            nlu_api_url,
            nlu_api_key,
            nlu_timeout: Duration::from_secs(timeout_secs),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn optional_var<F>(lookup: &F, key: &str) -> Result<Option<String>>
where
    F: Fn(&str) -> Result<String, env::VarError>,
{
    match lookup(key) {
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(err) => Err(err).with_context(|| format!("reading {}", key)),
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Result<String, env::VarError>,
{
    optional_var(lookup, key)?
        .map(|value| {
            value
                .parse::<T>()
                .with_context(|| format!("parsing {} value `{}`", key, value))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(
        vars: &[(&str, &str)],
    ) -> impl Fn(&str) -> Result<String, env::VarError> + use<> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned().ok_or(env::VarError::NotPresent)
    }

    #[test]
    fn env_values_fill_in_and_flags_win() {
        let args = Args {
            port: Some(9000),
            ..Args::default()
        };
        let cfg = AppConfig::from_args_with(
            args,
            lookup_from(&[
                ("METAMATRIX_PORT", "7000"),
                ("METAMATRIX_HOST", "127.0.0.1"),
                ("METAMATRIX_NLU_API_URL", "http://nlu.local/v1/analyze"),
                ("METAMATRIX_NLU_API_KEY", "k"),
                ("METAMATRIX_NLU_TIMEOUT_SECS", "5"),
            ]),
        )
        .unwrap();

        assert_eq!(cfg.addr(), "127.0.0.1:9000");
        assert_eq!(cfg.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(cfg.nlu_timeout, Duration::from_secs(5));
        assert!(!format!("{:?}", cfg).contains("\"k\""));
    }

    #[test]
    fn nlu_settings_required_unless_migrating() {
        let err = AppConfig::from_args_with(Args::default(), lookup_from(&[])).unwrap_err();
        assert!(err.to_string().contains("NLU API URL"));

        let args = Args {
            migrate: true,
            ..Args::default()
        };
        assert!(AppConfig::from_args_with(args, lookup_from(&[])).is_ok());
    }

    #[test]
    fn bad_port_is_reported_with_its_key() {
        let err = AppConfig::from_args_with(
            Args::default(),
            lookup_from(&[("METAMATRIX_PORT", "http")]),
        )
        .unwrap_err();
        assert!(format!("{:#}", err).contains("METAMATRIX_PORT"));
    }
}
