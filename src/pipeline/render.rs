//! Fixed-width table rendering.
//!
//! Headers, a dash separator, then one line per row, every cell
//! left-justified in a 15-character field. Over-length values are printed
//! in full rather than wrapped or clipped, so columns past an oversized
//! cell shift right on that line only. Ends with a row count.

use std::io::{self, Write};

use crate::db::TableResult;

/// Width of every rendered column.
pub const COLUMN_WIDTH: usize = 15;

/// Writes the result as a fixed-width text table.
pub fn render<W: Write>(result: &TableResult, out: &mut W) -> io::Result<()> {
    for column in &result.columns {
        write!(out, "{column:<COLUMN_WIDTH$}")?;
    }
    writeln!(out)?;

    let dashes = "-".repeat(COLUMN_WIDTH);
    for _ in &result.columns {
        write!(out, "{dashes:<COLUMN_WIDTH$}")?;
    }
    writeln!(out)?;

    for row in &result.rows {
        for cell in row {
            write!(out, "{:<COLUMN_WIDTH$}", cell.to_display_string())?;
        }
        writeln!(out)?;
    }

    writeln!(out)?;
    writeln!(out, "Total rows returned: {}", result.row_count())?;
    Ok(())
}
