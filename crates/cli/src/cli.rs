use clap::{Args, Parser, Subcommand, ValueEnum};

use domain::event::query::TimeRange;
use infrastructure::config::{LogFormat, LogLevel};
use infrastructure::constants::DEFAULT_CONFIG_PATH;

pub fn parse() -> Cli {
    Cli::parse()
}

#[derive(Parser, Debug)]
#[command(
    name = "dbaudit",
    about = "Database audit event viewer",
    version = env!("CARGO_PKG_VERSION"),
)]
pub struct Cli {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    /// Log level override (takes precedence over config file)
    #[arg(short, long)]
    pub log_level: Option<LogLevel>,

    /// Log format: text (default) or json
    #[arg(long)]
    pub log_format: Option<LogFormat>,

    /// Bearer token for authenticated requests
    #[arg(long, env = "DBAUDIT_TOKEN", global = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(short, long, default_value = "table", global = true)]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table (default)
    Table,
    /// Classified events as JSON
    Json,
}

/// Connection parameters for reaching the audit service.
#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// Audit service base URL (falls back to config file, then default)
    #[arg(long, env = "DBAUDIT_ADDR")]
    pub addr: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Display version information
    Version,

    /// Retrieve and classify database audit events
    Events(DomainArgs<EventsCommand>),
}

#[derive(Args, Debug)]
pub struct DomainArgs<T: Subcommand> {
    #[command(flatten)]
    pub conn: ConnectionArgs,

    #[command(subcommand)]
    pub command: T,
}

#[derive(Subcommand, Debug)]
pub enum EventsCommand {
    /// Fetch the first page of the window
    List {
        /// Cluster to query
        #[arg(long)]
        cluster: String,

        /// Time window preset
        #[arg(long, value_enum, default_value_t = RangePreset::Day)]
        range: RangePreset,

        /// Events per page (overrides config)
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Page through the whole window until exhausted
    Dump {
        /// Cluster to query
        #[arg(long)]
        cluster: String,

        /// Time window preset
        #[arg(long, value_enum, default_value_t = RangePreset::Day)]
        range: RangePreset,
    },
}

/// Selectable time window presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RangePreset {
    /// Last 24 hours
    #[value(name = "24h")]
    Day,
    /// Last 3 days
    #[value(name = "3d")]
    ThreeDays,
    /// Last 7 days
    #[value(name = "7d")]
    Week,
}

impl RangePreset {
    pub fn to_range(self, now_ns: u64) -> TimeRange {
        match self {
            Self::Day => TimeRange::last_day(now_ns),
            Self::ThreeDays => TimeRange::last_three_days(now_ns),
            Self::Week => TimeRange::last_week(now_ns),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn events_list_parses() {
        let cli = Cli::try_parse_from([
            "dbaudit", "events", "--addr", "https://proxy:3080", "list", "--cluster", "prod",
            "--range", "7d",
        ])
        .unwrap();

        match cli.command {
            Command::Events(args) => {
                assert_eq!(args.conn.addr.as_deref(), Some("https://proxy:3080"));
                match args.command {
                    EventsCommand::List { cluster, range, limit } => {
                        assert_eq!(cluster, "prod");
                        assert_eq!(range, RangePreset::Week);
                        assert_eq!(limit, None);
                    }
                    other => panic!("unexpected subcommand: {other:?}"),
                }
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn range_presets_map_to_named_windows() {
        let now = 1_700_000_000_000_000_000;
        assert_eq!(
            RangePreset::Day.to_range(now).name.as_deref(),
            Some("Last 24 hours")
        );
        assert_eq!(
            RangePreset::Week.to_range(now).name.as_deref(),
            Some("Last 7 days")
        );
    }
}
