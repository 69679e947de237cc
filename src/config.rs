use core::time::Duration;
use std::path::PathBuf;

/// Build-time defaults; every value can still be overridden at runtime
/// through the matching flag or environment variable.
mod defaults {
    macro_rules! env_or_default {
        ($name:expr, $default:expr) => {
            if let Some(s) = option_env!($name) {
                s
            } else {
                $default
            }
        };
    }

    pub const DB_HOST: &str = env_or_default!("DB_HOST", "/var/run/postgresql");
    pub const DB_USER: &str = env_or_default!("DB_USER", "postgres");
    pub const DB_NAME: &str = env_or_default!("DB_NAME", "postgres");
    pub const SITE_URL: &str = env_or_default!("BUS_SITE_URL", "https://www.redbus.in/");
    pub const DATE_FORMAT: &str = "%d %b %Y";
}

#[derive(Clone, Debug, clap::Args)]
pub struct DbConfig {
    /// Database host name, or a directory holding the Unix socket
    #[arg(long = "db-host", env = "DB_HOST", default_value = defaults::DB_HOST)]
    pub host: String,
    #[arg(long = "db-port", env = "DB_PORT", default_value_t = 5432)]
    pub port: u16,
    #[arg(long = "db-user", env = "DB_USER", default_value = defaults::DB_USER)]
    pub user: String,
    #[arg(long = "db-password", env = "DB_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
    #[arg(long = "db-name", env = "DB_NAME", default_value = defaults::DB_NAME)]
    pub dbname: String,
    /// Connection timeout in seconds
    #[arg(long = "db-connect-timeout", value_name = "SECS", default_value_t = 5)]
    pub connect_timeout: u64,
}

impl DbConfig {
    #[inline]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }
}

#[derive(Clone, Debug, clap::Args)]
pub struct ScrapeConfig {
    /// Home page of the ticketing site
    #[arg(long = "site-url", env = "BUS_SITE_URL", default_value = defaults::SITE_URL)]
    pub url: String,
    /// Show the browser window instead of running headless
    #[arg(long)]
    pub headed: bool,
    #[arg(long, env = "PROXY_SERVER")]
    pub proxy: Option<String>,
    /// Chrome/Chromium executable, detected automatically when absent
    #[arg(long, env = "CHROME_PATH")]
    pub chrome: Option<PathBuf>,
    /// Pause after typing into each place field, in seconds
    #[arg(long, value_name = "SECS", default_value_t = 2)]
    pub input_pause: u64,
    /// Pause after submitting the search, in seconds
    #[arg(long, value_name = "SECS", default_value_t = 8)]
    pub results_wait: u64,
    /// Pause after scrolling to the bottom of the results, in seconds
    #[arg(long, value_name = "SECS", default_value_t = 3)]
    pub scroll_wait: u64,
    /// `strftime` format the date field expects
    #[arg(long, default_value = defaults::DATE_FORMAT)]
    pub date_format: String,
}

impl ScrapeConfig {
    #[inline]
    pub const fn input_pause(&self) -> Duration {
        Duration::from_secs(self.input_pause)
    }

    #[inline]
    pub const fn results_wait(&self) -> Duration {
        Duration::from_secs(self.results_wait)
    }

    #[inline]
    pub const fn scroll_wait(&self) -> Duration {
        Duration::from_secs(self.scroll_wait)
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(clap::Parser)]
    struct Args {
        #[command(flatten)]
        db: DbConfig,
        #[command(flatten)]
        scrape: ScrapeConfig,
    }

    #[test]
    fn flags_override_defaults() {
        let args = Args::try_parse_from([
            "test",
            "--db-host",
            "db.internal",
            "--db-port",
            "6543",
            "--db-password",
            "hunter2",
            "--headed",
            "--results-wait",
            "15",
            "--site-url",
            "http://localhost:8080/",
        ])
        .unwrap();
        assert_eq!(args.db.host, "db.internal");
        assert_eq!(args.db.port, 6543);
        assert_eq!(args.db.password.as_deref(), Some("hunter2"));
        assert!(args.scrape.headed);
        assert_eq!(args.scrape.results_wait(), Duration::from_secs(15));
        assert_eq!(args.scrape.url, "http://localhost:8080/");
    }

    #[test]
    fn pauses_have_defaults() {
        let args = Args::try_parse_from(["test"]).unwrap();
        assert_eq!(args.scrape.input_pause(), Duration::from_secs(2));
        assert_eq!(args.scrape.scroll_wait(), Duration::from_secs(3));
        assert_eq!(args.scrape.date_format, "%d %b %Y");
        assert_eq!(args.db.connect_timeout(), Duration::from_secs(5));
    }
}
