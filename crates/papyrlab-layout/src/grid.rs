//! Column grid drawn over the working area as a reconstruction guide.
//!
//! The grid is a single row of columns separated by a fixed gap and inset by
//! a margin. Each cell records how far the reconstruction of that column has
//! progressed; free-text notes can be pinned anywhere on the grid.

use papyrlab_core::BoundingBox;
use serde::{Deserialize, Serialize};

/// Progress marker of a grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellState {
    #[default]
    Empty,
    Incomplete,
    Complete,
}

impl CellState {
    /// Next state in the Empty → Incomplete → Complete → Empty cycle.
    pub fn next(self) -> Self {
        match self {
            CellState::Empty => CellState::Incomplete,
            CellState::Incomplete => CellState::Complete,
            CellState::Complete => CellState::Empty,
        }
    }
}

/// A text note pinned on the grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridNote {
    pub x: f64,
    pub y: f64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnGrid {
    pub width: u32,
    pub height: u32,
    pub nrow: usize,
    pub ncol: usize,
    pub offx: i32,
    pub offy: i32,
    pub column_width: u32,
    pub intercolumn_space: u32,
    #[serde(default)]
    cells: Vec<Vec<CellState>>,
    #[serde(default)]
    notes: Vec<GridNote>,
}

impl ColumnGrid {
    /// An empty grid covering a `width` x `height` area.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            nrow: 0,
            ncol: 0,
            offx: 0,
            offy: 0,
            column_width: 0,
            intercolumn_space: 0,
            cells: Vec::new(),
            notes: Vec::new(),
        }
    }

    /// Lays out `ncol` columns and resets every cell to [`CellState::Empty`].
    pub fn set_layout(
        &mut self,
        column_width: u32,
        ncol: usize,
        margin_x: i32,
        margin_y: i32,
        intercolumn_space: u32,
    ) {
        self.column_width = column_width;
        self.nrow = 1;
        self.ncol = ncol;
        self.offx = margin_x;
        self.offy = margin_y;
        self.intercolumn_space = intercolumn_space;
        self.cells = vec![vec![CellState::Empty; ncol]; self.nrow];
    }

    fn cell_height(&self) -> i64 {
        if self.nrow == 0 {
            return 0;
        }
        let usable = self.height as i64 - 2 * self.offy as i64;
        usable.max(0) / self.nrow as i64
    }

    fn column_pitch(&self) -> i64 {
        self.column_width as i64 + self.intercolumn_space as i64
    }

    /// Box of cell `(row, col)`, mirrored horizontally for the verso view.
    pub fn cell_rect(&self, row: usize, col: usize, mirrored: bool) -> Option<BoundingBox> {
        if row >= self.nrow || col >= self.ncol {
            return None;
        }
        let step = col as i64 * self.column_pitch();
        let x = if mirrored {
            self.width as i64 - self.column_width as i64 - step - self.offx as i64
        } else {
            self.offx as i64 + step
        };
        let cell_height = self.cell_height();
        let y = self.offy as i64 + row as i64 * cell_height;
        Some(BoundingBox::new(
            y as i32,
            x as i32,
            self.column_width,
            cell_height as u32,
        ))
    }

    /// Cell `(row, col)` under a canvas point; gaps between columns hit nothing.
    pub fn cell_at(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        let pitch = self.column_pitch();
        let cell_height = self.cell_height();
        if self.ncol == 0 || pitch == 0 || cell_height == 0 {
            return None;
        }
        let local_x = x - self.offx as f64;
        let local_y = y - self.offy as f64;
        if local_x < 0.0 || local_y < 0.0 {
            return None;
        }
        let col = (local_x / pitch as f64).floor() as usize;
        let row = (local_y / cell_height as f64).floor() as usize;
        if col >= self.ncol || row >= self.nrow {
            return None;
        }
        if local_x - (col as i64 * pitch) as f64 >= self.column_width as f64 {
            return None;
        }
        Some((row, col))
    }

    pub fn cell_state(&self, row: usize, col: usize) -> Option<CellState> {
        self.cells.get(row).and_then(|r| r.get(col)).copied()
    }

    /// Sets the state of the cell under `(x, y)`, or cycles it when `state`
    /// is `None`. Returns the new state, `None` if no cell was hit.
    pub fn set_cell_state(&mut self, x: f64, y: f64, state: Option<CellState>) -> Option<CellState> {
        let (row, col) = self.cell_at(x, y)?;
        let cell = self.cells.get_mut(row)?.get_mut(col)?;
        *cell = state.unwrap_or_else(|| cell.next());
        Some(*cell)
    }

    pub fn notes(&self) -> &[GridNote] {
        &self.notes
    }

    pub fn add_note(&mut self, x: f64, y: f64, text: impl Into<String>) {
        self.notes.push(GridNote {
            x,
            y,
            text: text.into(),
        });
    }

    /// Moves and edits a note; an empty text removes it.
    pub fn update_note(&mut self, index: usize, x: f64, y: f64, text: &str) -> bool {
        if index >= self.notes.len() {
            return false;
        }
        if text.is_empty() {
            self.notes.remove(index);
        } else {
            self.notes[index] = GridNote {
                x,
                y,
                text: text.to_string(),
            };
        }
        true
    }
}
