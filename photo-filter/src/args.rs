use clap::{ArgAction, Parser, Subcommand};
use filter_client::FilterKind;
use log::LevelFilter;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "photo-filter", version, about)]
pub struct Args {
    /// Config file, defaults to the platform config directory
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the filter service base URL
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Directory downloads are written to
    #[arg(short, long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// -v for debug, -vv for trace
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// List the available filters
    Filters,

    /// Run an image through one filter and save the result
    Apply {
        /// Image files; the last readable one is used
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[arg(short, long, value_parser = parse_filter)]
        filter: FilterKind,

        /// Resize percentage, clamped to 1..=99
        #[arg(short, long, allow_negative_numbers = true)]
        percentage: Option<i64>,

        /// Carry the result to the output screen before saving it
        #[arg(long)]
        proceed: bool,
    },

    /// Drive the screens line by line from stdin
    Session,
}

fn parse_filter(s: &str) -> Result<FilterKind, String> {
    s.parse::<FilterKind>().map_err(|e| e.to_string())
}

impl Args {
    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}
