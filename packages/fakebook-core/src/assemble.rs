//! # Section and Grid Assembly
//!
//! Reshapes a flat measure list for storage or display. No chord logic lives here.
//!
//! - [`assemble_section()`] - one labelled section holding every measure
//! - [`assemble_grid()`] - a row-major grid of beat cells, `measures_per_row` wide
//!
//! ## Grid Layout
//! ```text
//! row 0: | m0b0 m0b1 m0b2 m0b3 | m1b0 m1b1 m1b2 m1b3 | ...
//! row 1: | m4b0 ...
//! ```

use serde::Serialize;
use std::fmt::Write;

use crate::song::{is_placeholder, Measure, Section, SectionMeta};

/// Default number of measures per display row.
pub const DEFAULT_MEASURES_PER_ROW: usize = 4;

/// Group measures into a single section.
pub fn assemble_section(measures: Vec<Measure>, meta: SectionMeta) -> Section {
    Section {
        label: meta.label,
        kind: meta.kind,
        measures,
    }
}

/// One beat slot as displayed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridCell {
    pub chord: String,
    pub measure_index: usize,
    pub beat_index: usize,
    pub is_downbeat: bool,
    /// The cell carries no chord symbol (`""`, `-` or `%`)
    pub is_empty: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Grid {
    pub measures_per_row: usize,
    pub rows: Vec<Vec<GridCell>>,
}

/// Lay measures out in rows of `measures_per_row` (at least one).
/// The last row may be shorter.
pub fn assemble_grid(measures: &[Measure], measures_per_row: usize) -> Grid {
    let measures_per_row = measures_per_row.max(1);
    let rows = measures
        .chunks(measures_per_row)
        .enumerate()
        .map(|(row, chunk)| {
            chunk
                .iter()
                .enumerate()
                .flat_map(|(offset, measure)| {
                    let measure_index = row * measures_per_row + offset;
                    measure
                        .beat_chords
                        .iter()
                        .enumerate()
                        .map(move |(beat_index, chord)| GridCell {
                            chord: chord.clone(),
                            measure_index,
                            beat_index,
                            is_downbeat: beat_index == 0,
                            is_empty: is_placeholder(chord),
                        })
                })
                .collect()
        })
        .collect();

    Grid {
        measures_per_row,
        rows,
    }
}

impl Grid {
    /// Split rows into pages of `rows_per_page` (at least one).
    pub fn pages(&self, rows_per_page: usize) -> Vec<&[Vec<GridCell>]> {
        self.rows.chunks(rows_per_page.max(1)).collect()
    }

    /// Plain-text chart, one row per line: `| C - G - | F - - - |`.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for row in &self.rows {
            for cell in row {
                if cell.is_downbeat {
                    out.push_str("| ");
                }
                let _ = write!(out, "{} ", cell.chord);
            }
            out.push_str("|\n");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::song::{SectionKind, TimeSignature};

    fn measure(order: usize, beats: &[&str]) -> Measure {
        Measure {
            order,
            time_signature: TimeSignature::new(beats.len() as u8, 4),
            beat_chords: beats.iter().map(|b| b.to_string()).collect(),
        }
    }

    fn sample() -> Vec<Measure> {
        vec![
            measure(0, &["C", "-", "G", "-"]),
            measure(1, &["Am", "-", "-", "-"]),
            measure(2, &["F", "-", "%", "%"]),
            measure(3, &["G7", "-", "-", "-"]),
            measure(4, &["C", "-", "-", "-"]),
        ]
    }

    #[test]
    fn test_section_keeps_measures() {
        let section = assemble_section(
            sample(),
            SectionMeta {
                label: "Chorus".to_string(),
                kind: SectionKind::Chorus,
            },
        );
        assert_eq!(section.label, "Chorus");
        assert_eq!(section.kind, SectionKind::Chorus);
        assert_eq!(section.measures.len(), 5);
    }

    #[test]
    fn test_grid_rows() {
        let grid = assemble_grid(&sample(), 2);
        assert_eq!(grid.rows.len(), 3);
        assert_eq!(grid.rows[0].len(), 8);
        assert_eq!(grid.rows[2].len(), 4);

        let cell = &grid.rows[1][2];
        assert_eq!(cell.measure_index, 2);
        assert_eq!(cell.beat_index, 2);
        assert_eq!(cell.chord, "%");
        assert!(cell.is_empty);
        assert!(!cell.is_downbeat);

        let first = &grid.rows[2][0];
        assert_eq!(first.measure_index, 4);
        assert!(first.is_downbeat);
        assert!(!first.is_empty);
    }

    #[test]
    fn test_zero_per_row_is_one() {
        let grid = assemble_grid(&sample(), 0);
        assert_eq!(grid.measures_per_row, 1);
        assert_eq!(grid.rows.len(), 5);
    }

    #[test]
    fn test_pages() {
        let grid = assemble_grid(&sample(), 1);
        let pages = grid.pages(2);
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[2].len(), 1);
    }

    #[test]
    fn test_to_text() {
        let grid = assemble_grid(&sample()[..2], 2);
        assert_eq!(grid.to_text(), "| C - G - | Am - - - |\n");
    }
}
