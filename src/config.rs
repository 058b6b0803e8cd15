use crate::hipchat::TlsVerification;
use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Command line flags. Each one falls back to an environment variable, which
/// may also come from a `.env` file.
#[derive(Parser, Debug, Clone)]
#[command(version, about = "Archives private HipChat rooms that nobody has used in a while", long_about = None)]
pub struct Args {
    /// The HipChat API token.
    #[arg(long, env = "JANITOR_TOKEN", default_value = "", hide_env_values = true)]
    pub token: String,

    /// The HipChat server URL, e.g. https://hipchat.example.com/v2/
    #[arg(long, env = "JANITOR_URL", default_value = "")]
    pub url: String,

    /// How often cleanups are attempted, in hours.
    #[arg(long, env = "JANITOR_INTERVAL", default_value_t = 24, allow_negative_numbers = true)]
    pub interval: i64,

    /// The maximum amount of time to keep a room, in days.
    #[arg(long, env = "JANITOR_MAX", default_value_t = 30, allow_negative_numbers = true)]
    pub max: i64,

    /// Skip certificate verification for HTTPS requests.
    #[arg(long, env = "JANITOR_INSECURE")]
    pub insecure: bool,

    /// Address for the health check listener.
    #[arg(long, env = "JANITOR_HEALTH_ADDR", default_value = "0.0.0.0:3000")]
    pub health_addr: SocketAddr,

    /// Address for the Prometheus metrics listener.
    #[arg(long, env = "JANITOR_METRICS_ADDR", default_value = "0.0.0.0:3001")]
    pub metrics_addr: SocketAddr,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("The 'token' flag is required for communications with HipChat.")]
    MissingToken,

    #[error("The 'url' flag must be set to a valid HipChat server URL.")]
    MissingUrl,

    #[error("The 'interval' flag must be set to a number greater than zero (got {0}).")]
    InvalidInterval(i64),

    #[error("The 'max' flag must be set to a number greater than zero (got {0}).")]
    InvalidMax(i64),

    #[error("could not parse URL flag '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("The 'url' flag must be an http or https URL (got scheme '{0}').")]
    UnsupportedScheme(String),
}

/// Validated startup configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub token: String,
    pub base_url: Url,
    pub interval: Duration,
    pub max_idle_days: u32,
    pub tls: TlsVerification,
    pub health_addr: SocketAddr,
    pub metrics_addr: SocketAddr,
}

impl Config {
    pub fn from_args(args: Args) -> Result<Self, ConfigError> {
        if args.token.is_empty() {
            return Err(ConfigError::MissingToken);
        }
        if args.url.is_empty() {
            return Err(ConfigError::MissingUrl);
        }

        let interval_hours = positive(args.interval).ok_or(ConfigError::InvalidInterval(args.interval))?;
        let max_idle_days = positive(args.max).ok_or(ConfigError::InvalidMax(args.max))?;

        let base_url = Url::parse(&args.url).map_err(|source| ConfigError::InvalidUrl {
            url: args.url.clone(),
            source,
        })?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ConfigError::UnsupportedScheme(base_url.scheme().to_string()));
        }

        let tls = if args.insecure {
            TlsVerification::Skip
        } else {
            TlsVerification::Verify
        };

        Ok(Self {
            token: args.token,
            base_url,
            interval: Duration::from_secs(u64::from(interval_hours) * 3600),
            max_idle_days,
            tls,
            health_addr: args.health_addr,
            metrics_addr: args.metrics_addr,
        })
    }
}

fn positive(value: i64) -> Option<u32> {
    u32::try_from(value).ok().filter(|v| *v > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Result<Config, ConfigError> {
        let mut argv = vec!["hipchat-janitor"];
        argv.extend_from_slice(extra);
        Config::from_args(Args::try_parse_from(argv).unwrap())
    }

    const VALID: [&str; 4] = ["--token", "abc123", "--url", "https://hipchat.example.com/v2/"];

    #[test]
    fn test_defaults() {
        let config = parse(&VALID).unwrap();

        assert_eq!(config.token, "abc123");
        assert_eq!(config.base_url.as_str(), "https://hipchat.example.com/v2/");
        assert_eq!(config.interval, Duration::from_secs(24 * 3600));
        assert_eq!(config.max_idle_days, 30);
        assert_eq!(config.tls, TlsVerification::Verify);
        assert_eq!(config.health_addr.port(), 3000);
        assert_eq!(config.metrics_addr.port(), 3001);
    }

    #[test]
    fn test_all_flags() {
        let config = parse(&[
            "--token",
            "abc123",
            "--url",
            "http://chat.internal:8080/v2",
            "--interval",
            "6",
            "--max",
            "90",
            "--insecure",
            "--health-addr",
            "127.0.0.1:4000",
            "--metrics-addr",
            "127.0.0.1:4001",
        ])
        .unwrap();

        assert_eq!(config.interval, Duration::from_secs(6 * 3600));
        assert_eq!(config.max_idle_days, 90);
        assert_eq!(config.tls, TlsVerification::Skip);
        assert_eq!(config.health_addr, "127.0.0.1:4000".parse().unwrap());
        assert_eq!(config.metrics_addr, "127.0.0.1:4001".parse().unwrap());
    }

    #[test]
    fn test_empty_token_rejected() {
        let err = parse(&["--token", "", "--url", "https://hipchat.example.com/v2/"]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingToken));
    }

    #[test]
    fn test_missing_url_rejected() {
        let err = parse(&["--token", "abc123"]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingUrl));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut argv = VALID.to_vec();
        argv.extend(["--interval", "0"]);
        let err = parse(&argv).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidInterval(0)));
    }

    #[test]
    fn test_negative_max_rejected() {
        let mut argv = VALID.to_vec();
        argv.extend(["--max", "-5"]);
        let err = parse(&argv).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidMax(-5)));
        assert!(err.to_string().contains("'max'"));
    }

    #[test]
    fn test_oversized_interval_rejected() {
        let mut argv = VALID.to_vec();
        argv.extend(["--interval", "99999999999"]);
        assert!(matches!(parse(&argv).unwrap_err(), ConfigError::InvalidInterval(_)));
    }

    #[test]
    fn test_relative_url_rejected() {
        let err = parse(&["--token", "abc123", "--url", "hipchat.example.com/v2"]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { .. }));
    }

    #[test]
    fn test_non_http_url_rejected() {
        let err = parse(&["--token", "abc123", "--url", "ftp://hipchat.example.com/"]).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedScheme(scheme) if scheme == "ftp"));
    }
}
