use crate::event_list::FilterToken;
use crate::run::FullName;
use clap::Parser;

pub const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "+", env!("BUILD_NUMBER"));

#[derive(Parser, Debug)]
#[command(name = "runboard", version = VERSION, about = "Run and event browser TUI")]
pub struct Cli {
    /// Base URL of the server API
    #[arg(long, env = "RUNBOARD_URL", default_value = "http://127.0.0.1:3000")]
    pub url: String,

    /// Bearer token for the API
    #[arg(long, env = "RUNBOARD_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Project whose runs are listed
    #[arg(short, long, env = "RUNBOARD_PROJECT")]
    pub project: String,

    /// Only list runs submitted from this repository
    #[arg(long)]
    pub repo_url: Option<String>,

    /// Page size of every list request
    #[arg(short, long, default_value_t = 20, value_parser = clap::value_parser!(u64).range(1..))]
    pub limit: u64,

    /// Load the next page when the cursor gets within this many rows of the end
    #[arg(long, default_value_t = 10)]
    pub threshold: u32,

    /// Start with the tag filter set
    #[arg(short, long)]
    pub tag: Option<String>,

    /// Start with this search query
    #[arg(short, long)]
    pub search: Option<String>,

    /// Only list active runs
    #[arg(short, long)]
    pub active: bool,

    /// Start with an ungrouped runs list
    #[arg(long)]
    pub flat: bool,

    /// Events filter, e.g. `actors=alice` or `within_projects=main` (repeatable)
    #[arg(short = 'e', long = "event-filter", value_parser = parse_filter_token)]
    pub event_filter: Vec<FilterToken>,

    /// Select `user/run[/workflow]` once it has been loaded
    #[arg(short, long, value_parser = validate_focus)]
    pub focus: Option<String>,

    /// Enable verbose logging to $XDG_STATE_HOME/runboard/debug.log
    #[arg(long)]
    pub verbose: bool,
}

fn parse_filter_token(s: &str) -> Result<FilterToken, String> {
    s.parse::<FilterToken>().map_err(|e| e.to_string())
}

/// Validates a `user/run` or `user/run/workflow` key.
pub fn validate_focus(s: &str) -> Result<String, String> {
    match FullName::parse(s) {
        Some(name) => Ok(name.to_string()),
        None => Err(format!(
            "Invalid name '{s}'. Expected 'user/run' or 'user/run/workflow'."
        )),
    }
}
