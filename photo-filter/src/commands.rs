//! One-shot subcommands.

use crate::logic::{ApplyOutcome, Session};
use anyhow::{Result, bail};
use filter_client::{FILTERS, FilterKind};
use std::{
    io::Write,
    path::{Path, PathBuf},
};

pub fn list_filters(w: &mut impl Write) -> Result<()> {
    for spec in FILTERS.iter() {
        match spec.parameter {
            Some(p) => writeln!(
                w,
                "{:<12}{:<12}{} {}..={} (default {})",
                spec.endpoint, spec.label, p.name, p.min, p.max, p.default
            )?,
            None => writeln!(w, "{:<12}{}", spec.endpoint, spec.label)?,
        }
    }
    Ok(())
}

/// Intake, select, apply and download in one go.
///
/// Returns the path of the saved file.
pub async fn apply_once(
    session: &mut Session,
    files: &[impl AsRef<Path>],
    filter: FilterKind,
    percentage: Option<i64>,
    proceed: bool,
    w: &mut impl Write,
) -> Result<PathBuf> {
    let image = session.open(files).await?;
    writeln!(w, "opened {} ({})", image.name, image.size_label())?;

    let selection = session.select(filter)?;
    let selection = match percentage {
        Some(value) if filter.requires_parameter() => {
            session.set_percentage(value)?;
            session.workflow().selection().unwrap_or(selection)
        }
        Some(_) => {
            log::warn!("{} takes no percentage, ignored", filter.label());
            selection
        }
        None => selection,
    };

    match session.apply().await? {
        ApplyOutcome::Applied => (),
        ApplyOutcome::Failed(message) => bail!(message),
        ApplyOutcome::Stale => bail!("filter response was superseded"),
    }

    if let Some(output) = session.workflow().result() {
        match output.size_info {
            Some(info) => writeln!(w, "applied {selection}: {}", info.label())?,
            None => writeln!(w, "applied {selection}: {}", output.image.size_label())?,
        }
    }

    if proceed {
        session.proceed()?;
    }

    match session.download()? {
        Some(path) => {
            writeln!(w, "saved {}", path.display())?;
            Ok(path)
        }
        None => bail!("the filter service returned an empty image"),
    }
}
