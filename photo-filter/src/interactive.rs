//! Line-oriented driver for [`Session`].

use crate::{
    commands,
    logic::{ApplyOutcome, Session},
};
use anyhow::Result;
use filter_client::FilterKind;
use std::{io::Write, path::PathBuf, str::FromStr};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

const HELP: &str = "\
open <file>...      pick an image (/ and /filter)
select <filter>     grayscale | blur_edges | resize
percentage <n>      resize percentage, clamped to 1..=99
apply               send the image to the filter service
proceed             carry the result to /output
download            save the current result
back                return to / and discard the image
start-over          return to / from anywhere
status              show the current screen
filters             list the filters
quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Open(Vec<PathBuf>),
    Select(FilterKind),
    Percentage(i64),
    Apply,
    Proceed,
    Download,
    Back,
    StartOver,
    Status,
    Filters,
    Help,
    Quit,
}

impl FromStr for Action {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let command = words.next().unwrap_or_default().to_lowercase();
        let rest = words.collect::<Vec<_>>();

        let action = match command.as_str() {
            "open" if !rest.is_empty() => {
                Action::Open(rest.iter().map(|p| PathBuf::from(*p)).collect())
            }
            "open" => return Err("usage: open <file>...".to_string()),
            "select" => {
                let name = rest.join(" ");
                Action::Select(name.parse::<FilterKind>().map_err(|e| e.to_string())?)
            }
            "percentage" => match rest.first().map(|v| v.parse::<i64>()) {
                Some(Ok(value)) => Action::Percentage(value),
                _ => return Err("usage: percentage <n>".to_string()),
            },
            "apply" => Action::Apply,
            "proceed" => Action::Proceed,
            "download" => Action::Download,
            "back" => Action::Back,
            "start-over" | "restart" => Action::StartOver,
            "status" => Action::Status,
            "filters" => Action::Filters,
            "help" | "?" => Action::Help,
            "quit" | "exit" => Action::Quit,
            other => return Err(format!("unknown command `{other}`, try `help`")),
        };

        Ok(action)
    }
}

/// Reads actions until `quit` or end of input. Failed actions are reported
/// and the session keeps going.
pub async fn run(
    session: &mut Session,
    reader: impl AsyncBufRead + Unpin,
    w: &mut impl Write,
) -> Result<()> {
    let mut lines = reader.lines();

    writeln!(w, "{}", session.status())?;

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let action = match line.parse::<Action>() {
            Ok(action) => action,
            Err(e) => {
                writeln!(w, "{e}")?;
                continue;
            }
        };

        if action == Action::Quit {
            break;
        }

        if let Err(e) = perform(session, action, w).await {
            log::debug!("{e:?}");
            writeln!(w, "{e}")?;
        }
    }

    Ok(())
}

async fn perform(session: &mut Session, action: Action, w: &mut impl Write) -> Result<()> {
    match action {
        Action::Open(paths) => {
            let image = session.open(&paths).await?;
            writeln!(
                w,
                "opened {} ({}, {})",
                image.name,
                image.content_type,
                image.size_label()
            )?;
        }
        Action::Select(kind) => {
            let selection = session.select(kind)?;
            writeln!(w, "selected {selection}")?;
        }
        Action::Percentage(value) => {
            let percentage = session.set_percentage(value)?;
            writeln!(w, "percentage set to {percentage}")?;
        }
        Action::Apply => match session.apply().await? {
            ApplyOutcome::Applied => writeln!(w, "{}", session.status())?,
            ApplyOutcome::Failed(message) => writeln!(w, "error: {message}")?,
            ApplyOutcome::Stale => writeln!(w, "response dropped, a newer action replaced it")?,
        },
        Action::Proceed => {
            let image = session.proceed()?;
            writeln!(w, "output: {} ({})", image.name, image.size_label())?;
        }
        Action::Download => match session.download()? {
            Some(path) => writeln!(w, "saved {}", path.display())?,
            None => writeln!(w, "nothing to download yet")?,
        },
        Action::Back => {
            session.back()?;
            writeln!(w, "{}", session.status())?;
        }
        Action::StartOver => {
            session.start_over();
            writeln!(w, "{}", session.status())?;
        }
        Action::Status => writeln!(w, "{}", session.status())?,
        Action::Filters => commands::list_filters(w)?,
        Action::Help => writeln!(w, "{HELP}")?,
        Action::Quit => (),
    }

    Ok(())
}
