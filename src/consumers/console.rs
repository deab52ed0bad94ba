use std::io::{self, Write};

use crate::models::Snapshot;

/// Prints each snapshot as an aligned table followed by the portfolio value.
pub struct ConsolePrinter<W: Write> {
    out: W,
}

impl ConsolePrinter<io::Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write> ConsolePrinter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn print(&mut self, snapshot: &Snapshot) -> io::Result<()> {
        writeln!(self.out, "New snapshot received:")?;
        if snapshot.is_empty() {
            writeln!(self.out, "Empty snapshot")?;
        } else {
            self.out.write_all(render_table(snapshot).as_bytes())?;
        }
        match snapshot.portfolio_value() {
            Some(pv) => writeln!(self.out, "Portfolio PV: {}", pv)?,
            None => writeln!(self.out, "Portfolio PV: None")?,
        }
        writeln!(self.out, "Last published: {}", snapshot.last_published_iso())?;
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Render the grid with the identifier column left-aligned and values right-aligned.
pub fn render_table(snapshot: &Snapshot) -> String {
    let grid = snapshot.to_grid();
    let width = grid.first().map(|header| header.len()).unwrap_or(0);

    let mut widths = vec![0usize; width];
    for line in &grid {
        for (idx, cell) in line.iter().enumerate() {
            widths[idx] = widths[idx].max(cell.chars().count());
        }
    }

    let mut out = String::new();
    for line in &grid {
        let rendered: Vec<String> = line
            .iter()
            .enumerate()
            .map(|(idx, cell)| {
                if idx == 0 {
                    format!("{:<w$}", cell, w = widths[idx])
                } else {
                    format!("{:>w$}", cell, w = widths[idx])
                }
            })
            .collect();
        out.push_str(rendered.join("  ").trim_end());
        out.push('\n');
    }
    out
}
