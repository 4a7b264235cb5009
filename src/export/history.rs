//! Mass-history export.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

use crate::analysis::MassSummary;
use crate::simulation::MassRecord;

/// Errors that can occur during history export.
#[derive(Error, Debug)]
pub enum HistoryExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct HistoryDocument<'a> {
    label: &'a str,
    summary: Option<MassSummary>,
    history: &'a [MassRecord],
}

/// Writes the mass history and its summary as pretty JSON.
pub fn export_mass_history_json(
    history: &[MassRecord],
    label: &str,
    path: &Path,
) -> Result<(), HistoryExportError> {
    let doc = HistoryDocument {
        label,
        summary: MassSummary::from_history(history),
        history,
    };
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &doc)?;
    writer.flush()?;
    Ok(())
}
