use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::time::Duration;

/// Cricket win-probability prediction API and dashboard
#[derive(Parser, Debug, Clone)]
#[command(name = "cricpulse", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Serve the prediction API
    Serve(ServeConfig),
    /// Serve the interactive dashboard (calls the prediction API)
    Dashboard(DashboardConfig),
}

#[derive(Args, Debug, Clone)]
pub struct ServeConfig {
    /// API listen address
    #[arg(long, env = "API_ADDR", default_value = "127.0.0.1:8000")]
    pub listen_addr: String,

    /// Pre-match model artifact (XGBoost JSON)
    #[arg(
        long,
        env = "PRE_MATCH_MODEL_PATH",
        default_value = "models/pre_match_model.json"
    )]
    pub pre_match_model: String,

    /// Live win-probability model artifact (XGBoost JSON)
    #[arg(long, env = "LIVE_MODEL_PATH", default_value = "models/live_wpa_model.json")]
    pub live_model: String,
}

#[derive(Args, Debug, Clone)]
pub struct DashboardConfig {
    /// Dashboard listen address
    #[arg(long, env = "DASHBOARD_ADDR", default_value = "127.0.0.1:8501")]
    pub listen_addr: String,

    /// Base URL of the prediction API
    #[arg(long, env = "API_BASE_URL", default_value = "http://127.0.0.1:8000")]
    pub api_base_url: String,

    /// Timeout for each prediction API call, in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "10")]
    pub request_timeout_secs: u64,
}

impl ServeConfig {
    pub fn validate(&self) -> anyhow::Result<SocketAddr> {
        let addr = parse_addr(&self.listen_addr)?;
        if self.pre_match_model.trim().is_empty() {
            anyhow::bail!("pre_match_model path must not be empty");
        }
        if self.live_model.trim().is_empty() {
            anyhow::bail!("live_model path must not be empty");
        }
        Ok(addr)
    }
}

impl DashboardConfig {
    pub fn validate(&self) -> anyhow::Result<SocketAddr> {
        let addr = parse_addr(&self.listen_addr)?;
        let url = url::Url::parse(&self.api_base_url)
            .map_err(|e| anyhow::anyhow!("api_base_url '{}' is not a valid URL: {}", self.api_base_url, e))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            anyhow::bail!("api_base_url must use http or https, got '{}'", url.scheme());
        }
        if url.host_str().is_none() {
            anyhow::bail!("api_base_url must include a host");
        }
        if self.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be positive");
        }
        Ok(addr)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_addr(s: &str) -> anyhow::Result<SocketAddr> {
    s.parse()
        .map_err(|e| anyhow::anyhow!("invalid listen address '{}': {}", s, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_defaults() {
        let cli = Cli::try_parse_from(["cricpulse", "serve"]).unwrap();
        match cli.command {
            Command::Serve(cfg) => {
                assert_eq!(cfg.pre_match_model, "models/pre_match_model.json");
                assert_eq!(cfg.validate().unwrap().port(), 8000);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_dashboard_flags() {
        let cli = Cli::try_parse_from([
            "cricpulse",
            "dashboard",
            "--api-base-url",
            "https://predict.example.com",
            "--request-timeout-secs",
            "3",
        ])
        .unwrap();
        match cli.command {
            Command::Dashboard(cfg) => {
                assert!(cfg.validate().is_ok());
                assert_eq!(cfg.request_timeout(), Duration::from_secs(3));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_dashboard_rejects_bad_url() {
        let cfg = DashboardConfig {
            listen_addr: "127.0.0.1:8501".to_string(),
            api_base_url: "ftp://127.0.0.1".to_string(),
            request_timeout_secs: 10,
        };
        assert!(cfg.validate().is_err());

        let cfg = DashboardConfig {
            api_base_url: "not a url".to_string(),
            ..cfg
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let cfg = DashboardConfig {
            listen_addr: "127.0.0.1:8501".to_string(),
            api_base_url: "http://127.0.0.1:8000".to_string(),
            request_timeout_secs: 0,
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_serve_rejects_bad_addr_and_empty_path() {
        let cfg = ServeConfig {
            listen_addr: "localhost".to_string(),
            pre_match_model: "a.json".to_string(),
            live_model: "b.json".to_string(),
        };
        assert!(cfg.validate().is_err());

        let cfg = ServeConfig {
            listen_addr: "0.0.0.0:8000".to_string(),
            pre_match_model: "  ".to_string(),
            live_model: "b.json".to_string(),
        };
        assert!(cfg.validate().is_err());
    }
}
