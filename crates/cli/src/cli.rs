use std::path::PathBuf;

use clap::Parser;

/// Book a time-limited campus activity the instant reservations open.
#[derive(Debug, Parser)]
#[command(name = "slotgrab", version, about)]
pub struct Cli {
    /// Portal username (student id).
    #[arg(short, long, env = "SLOTGRAB_USERNAME")]
    pub username: Option<String>,

    /// Portal password.
    #[arg(short, long, env = "SLOTGRAB_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Id of the activity to reserve.
    #[arg(short, long)]
    pub id: Option<String>,

    /// Print the activity catalog.
    #[arg(short, long)]
    pub list: bool,

    /// Configuration file (default: slotgrab.toml when present).
    #[arg(long, env = "SLOTGRAB_CONFIG")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Whether the catalog table should be printed.
    pub fn wants_listing(&self) -> bool {
        self.list || self.id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_short_flags() {
        let cli =
            Cli::try_parse_from(["slotgrab", "-u", "220201234", "-p", "pw", "-i", "abc"]).unwrap();
        assert_eq!(cli.username.as_deref(), Some("220201234"));
        assert_eq!(cli.password.as_deref(), Some("pw"));
        assert_eq!(cli.id.as_deref(), Some("abc"));
        assert!(!cli.wants_listing());
    }

    #[test]
    fn test_listing_without_id() {
        let cli = Cli::try_parse_from(["slotgrab", "-u", "x", "-p", "y"]).unwrap();
        assert!(cli.wants_listing());

        let cli = Cli::try_parse_from(["slotgrab", "-i", "abc", "--list"]).unwrap();
        assert!(cli.wants_listing());
    }
}
