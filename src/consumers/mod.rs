//! Reference consumers that drain the snapshot slot.

pub mod console;
pub mod csv_export;

pub use console::{render_table, ConsolePrinter};
pub use csv_export::CsvSnapshotWriter;
