// crates/server/src/config.rs
//! Command-line and environment configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 47900;

/// Default tracing directive when neither `RUST_LOG` nor `--log-filter` is set.
pub const DEFAULT_LOG_FILTER: &str =
    "info,cogtrain_server=debug,cogtrain_db=debug,cogtrain_core=debug";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "cogtrain", version, about = "Cognitive training analytics server")]
pub struct Config {
    /// Address to bind.
    #[arg(long, env = "COGTRAIN_HOST", default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub host: IpAddr,

    #[arg(long, env = "COGTRAIN_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// SQLite database file. Defaults to `<cache dir>/cogtrain/cogtrain.db`.
    #[arg(long = "database", env = "COGTRAIN_DB")]
    pub database: Option<PathBuf>,

    /// HS256 secret shared with the identity provider.
    #[arg(long, env = "COGTRAIN_JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    /// Required `iss` claim, if set.
    #[arg(long, env = "COGTRAIN_JWT_ISSUER")]
    pub jwt_issuer: Option<String>,

    /// Required `aud` claim, if set.
    #[arg(long, env = "COGTRAIN_JWT_AUDIENCE")]
    pub jwt_audience: Option<String>,

    #[arg(long, env = "COGTRAIN_LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,

    #[arg(long, env = "COGTRAIN_LOG", default_value = DEFAULT_LOG_FILTER)]
    pub log_filter: String,
}

impl Config {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["cogtrain", "--jwt-secret", "s3cret"]).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:47900");
        assert_eq!(config.log_format, LogFormat::Compact);
        assert!(config.database.is_none());
        assert!(config.jwt_issuer.is_none());
    }

    #[test]
    fn test_explicit_flags() {
        let config = Config::try_parse_from([
            "cogtrain",
            "--jwt-secret",
            "s3cret",
            "--host",
            "0.0.0.0",
            "--port",
            "8080",
            "--database",
            "/tmp/cogtrain-test.db",
            "--jwt-audience",
            "cogtrain-web",
            "--log-format",
            "json",
        ])
        .unwrap();
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8080");
        assert_eq!(config.database, Some(PathBuf::from("/tmp/cogtrain-test.db")));
        assert_eq!(config.jwt_audience.as_deref(), Some("cogtrain-web"));
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_rejects_bad_port() {
        assert!(Config::try_parse_from(["cogtrain", "--jwt-secret", "x", "--port", "99999"]).is_err());
    }
}
