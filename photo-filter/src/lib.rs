//! Photo Filter
//!
//! Sends an image to a remote filter service (grayscale, blur edges, resize),
//! previews the result and saves it locally.
//!
//! # Architecture
//! - `logic`: the workflow engine. Intake, the filter state machine, the output
//!   screen and the navigation between them
//! - `config`: TOML configuration loaded once at startup
//! - `commands`/`interactive`: the command line front ends built on `logic::Session`

#[macro_use]
extern crate derivative;

pub mod args;
pub mod commands;
pub mod config;
pub mod interactive;
pub mod logic;

use anyhow::Result;
use args::{Args, Command};
use filter_client::FilterClient;
use log::LevelFilter;
use logic::Session;
use std::io::Write;

/// Initializes the logger.
///
/// One line per record: local time, level, file name, line number and the
/// message. `RUST_LOG` takes precedence over `level`.
pub fn init_logger(level: LevelFilter) {
    let env = env_logger::Env::default().default_filter_or(level.as_str());

    _ = env_logger::Builder::from_env(env)
        .format(|buf, record| {
            let style = buf.default_level_style(record.level());
            let ts = chrono::Local::now().format("%H:%M:%S");

            writeln!(
                buf,
                "[{} {style}{}{style:#} {} {}] {}",
                ts,
                record.level(),
                record
                    .file()
                    .unwrap_or("None")
                    .split('/')
                    .next_back()
                    .unwrap_or("None"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .try_init();
}

/// Entry point of the `photo-filter` binary.
pub async fn cli_main(args: Args) -> Result<()> {
    init_logger(args.log_level());
    log::debug!("start...");

    config::init(args.config.clone())?;

    let mut conf = config::all();
    if let Some(base_url) = &args.base_url {
        conf.service.base_url = base_url.clone();
    }
    if let Some(dir) = &args.output_dir {
        conf.output.save_dir = dir.display().to_string();
    }

    let options = conf.session_options();
    let client = FilterClient::new(options.service.clone());
    let mut session = Session::new(options, Box::new(client));

    let mut stdout = std::io::stdout();
    let result = match args.command {
        Command::Filters => commands::list_filters(&mut stdout),
        Command::Apply {
            files,
            filter,
            percentage,
            proceed,
        } => commands::apply_once(&mut session, &files, filter, percentage, proceed, &mut stdout)
            .await
            .map(|_| ()),
        Command::Session => {
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            interactive::run(&mut session, stdin, &mut stdout).await
        }
    };

    log::debug!("exit...");
    result
}
