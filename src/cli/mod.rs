pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::dispatch::AcquisitionMode;

#[derive(Parser)]
#[command(name = "lyricscout")]
#[command(about = "Resolve song titles to lyrics", long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.config/lyricscout/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Lookup strategy
    #[arg(short, long, value_enum, env = "LYRICSCOUT_MODE", global = true)]
    pub mode: Option<AcquisitionMode>,

    /// Lyrics API base URL, or a full search prefix ending in `?q=`
    #[arg(long, env = "API_URL", global = true)]
    pub api_url: Option<String>,

    /// Lyrics API bearer token
    #[arg(long, env = "GENIUS_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,

    /// Show the browser window (browser mode)
    #[arg(long, global = true)]
    pub headed: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Look up one title and print the result
    Lookup {
        /// Song title, sent as given
        title: String,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run the HTTP lookup service
    Serve {
        /// Address to bind
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long, env = "PORT")]
        port: Option<u16>,
    },
    /// Show the effective configuration
    Config,
}

impl Cli {
    /// Apply flag and environment overrides on top of the file config.
    pub fn apply(&self, config: &mut Config) {
        if let Some(mode) = self.mode {
            config.acquisition.mode = mode;
        }
        if let Some(url) = &self.api_url {
            config.api.base_url = url.clone();
        }
        if let Some(token) = &self.token {
            config.api.token = Some(token.clone());
        }
        if self.headed {
            config.scraper.headless = false;
        }
        if let Commands::Serve { host, port } = &self.command {
            if let Some(host) = host {
                config.server.host = host.clone();
            }
            if let Some(port) = port {
                config.server.port = *port;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::try_parse_from([
            "lyricscout",
            "--mode",
            "browser",
            "--api-url",
            "http://127.0.0.1:9000",
            "--headed",
            "serve",
            "--port",
            "9100",
        ])
        .unwrap();

        let mut config = Config::default();
        cli.apply(&mut config);

        assert_eq!(config.acquisition.mode, AcquisitionMode::Browser);
        assert_eq!(config.api.base_url, "http://127.0.0.1:9000");
        assert!(!config.scraper.headless);
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host, "0.0.0.0");
    }

    #[test]
    fn test_lookup_args() {
        let cli = Cli::try_parse_from(["lyricscout", "lookup", "Hey Jude", "--json"]).unwrap();
        match cli.command {
            Commands::Lookup { title, json } => {
                assert_eq!(title, "Hey Jude");
                assert!(json);
            }
            _ => panic!("expected lookup"),
        }
    }

    #[test]
    fn test_unknown_mode_rejected() {
        assert!(Cli::try_parse_from(["lyricscout", "--mode", "carrier-pigeon", "config"]).is_err());
    }
}
