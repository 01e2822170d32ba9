//! Plain-text snapshots of the trap interior.
//!
//! One line per interior row, every cell printed with two decimals and a
//! trailing space. Frames are appended back to back so a whole run can be
//! replayed from a single file.

use crate::sim::relaxation::Grid;
use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes the interior of `grid` to `writer`. Degenerate grids write nothing.
pub fn write_interior<W: Write>(writer: &mut W, grid: &Grid) -> std::io::Result<()> {
    let Some(interior) = grid.interior() else {
        return Ok(());
    };
    for row in interior.rows() {
        for v in row {
            write!(writer, "{v:.2} ")?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

/// Appends one interior frame to the file at `path`.
pub fn append_interior(path: &Path, grid: &Grid) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open dump file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    write_interior(&mut writer, grid)
        .and_then(|_| writer.flush())
        .with_context(|| format!("Failed to write dump file: {}", path.display()))?;

    Ok(())
}
