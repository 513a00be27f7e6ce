//! Reference table of named colors.
//!
//! The table is read once (normally at startup) and only borrowed afterwards.
//! Row order matters: every nearest-color lookup resolves exact ties to the
//! earliest row, so the table keeps rows exactly as they appear in the source.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use palette::Srgb;
use serde::Deserialize;

use crate::error::{ProfileError, Result};

/// The table shipped with the crate (CSS/X11 color names).
const BUILTIN_CSV: &str = include_str!("../data/colors_medium.csv");

#[derive(Clone, Debug, PartialEq)]
pub struct PaletteEntry {
    pub name: String,
    pub rgb: Srgb<u8>,
}

/// One CSV row. Extra columns (e.g. `Hex`) are ignored.
#[derive(Debug, Deserialize)]
struct Row {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "R")]
    r: u8,
    #[serde(rename = "G")]
    g: u8,
    #[serde(rename = "B")]
    b: u8,
}

/// Ordered, immutable sequence of [`PaletteEntry`] values.
///
/// Names are not required to be unique.
#[derive(Clone, Debug)]
pub struct ColorTable {
    entries: Vec<PaletteEntry>,
}

impl ColorTable {
    /// Build a table from entries already in memory. Fails on an empty list.
    pub fn new(entries: Vec<PaletteEntry>) -> Result<Self> {
        if entries.is_empty() {
            return Err(ProfileError::Palette("color table has no rows".into()));
        }
        Ok(Self { entries })
    }

    /// The table embedded at compile time.
    pub fn builtin() -> Result<Self> {
        Self::from_reader(BUILTIN_CSV.as_bytes())
    }

    /// Parse a headed CSV with at least `Name`, `R`, `G` and `B` columns.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut entries = Vec::new();
        for row in rdr.deserialize::<Row>() {
            let row = row?;
            entries.push(PaletteEntry {
                name: row.name,
                rgb: Srgb::new(row.r, row.g, row.b),
            });
        }
        Self::new(entries)
    }

    /// Load a table from disk. The file handle is dropped as soon as parsing ends.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let table = {
            let file = File::open(path)?;
            Self::from_reader(file)?
        };
        log::info!(
            "loaded {} named colors from {}",
            table.len(),
            path.display()
        );
        Ok(table)
    }

    pub fn entries(&self) -> &[PaletteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_loads_in_source_order() {
        let table = ColorTable::builtin().unwrap();
        assert_eq!(table.len(), 140);
        assert_eq!(table.entries()[0].name, "Alice Blue");
        let red = table.entries().iter().find(|e| e.name == "Red").unwrap();
        assert_eq!(red.rgb, Srgb::new(255, 0, 0));
    }

    #[test]
    fn duplicate_colors_are_kept() {
        let table = ColorTable::builtin().unwrap();
        let cyan_like: Vec<_> = table
            .entries()
            .iter()
            .filter(|e| e.rgb == Srgb::new(0, 255, 255))
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(cyan_like, ["Aqua", "Cyan"]);
    }

    #[test]
    fn extra_columns_and_whitespace_are_tolerated() {
        let csv = "Name, R, G, B, Notes\nRed, 255, 0, 0, primary\nRed, 250, 5, 5, again\n";
        let table = ColorTable::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.entries()[1].rgb, Srgb::new(250, 5, 5));
    }

    #[test]
    fn out_of_range_channel_is_rejected() {
        let csv = "Name,R,G,B\nToo Red,256,0,0\n";
        assert!(matches!(
            ColorTable::from_reader(csv.as_bytes()),
            Err(ProfileError::Csv(_))
        ));
    }

    #[test]
    fn empty_table_is_rejected() {
        let csv = "Name,R,G,B\n";
        assert!(matches!(
            ColorTable::from_reader(csv.as_bytes()),
            Err(ProfileError::Palette(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(
            ColorTable::from_path("/definitely/not/here.csv"),
            Err(ProfileError::Io(_))
        ));
    }
}
