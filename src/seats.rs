//! Seat maps for bus bookings
//!
//! Availability here is mock data for the seat picker; seats are not
//! allocated or held anywhere.

use crate::ItineraryError;
use rand::Rng;
use serde::Serialize;

pub const DEFAULT_AVAILABILITY_RATIO: f64 = 0.8;

/// A (row, column) cell, both 0-based
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

/// Vehicle seating grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeatLayout {
    pub rows: usize,
    pub cols: usize,
    pub aisle: Vec<usize>, // column indices
    pub driver: Cell,
    pub entrance: Cell,
}

/// What occupies a cell of the grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum SeatCell {
    Seat(String),
    Driver,
    Entrance,
    Aisle,
}

impl SeatLayout {
    /// Standard 10 x 4 bus with the aisle in the third column.
    pub fn bus() -> Self {
        Self {
            rows: 10,
            cols: 4,
            aisle: vec![2],
            driver: Cell { row: 0, col: 0 },
            entrance: Cell { row: 0, col: 3 },
        }
    }

    pub fn validate(&self) -> Result<(), ItineraryError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(ItineraryError::LayoutError(format!(
                "layout must have at least one row and column, got {}x{}",
                self.rows, self.cols
            )));
        }
        if self.cols > 26 {
            return Err(ItineraryError::LayoutError(format!(
                "at most 26 columns are supported, got {}",
                self.cols
            )));
        }
        for cell in [self.driver, self.entrance] {
            if cell.row >= self.rows || cell.col >= self.cols {
                return Err(ItineraryError::LayoutError(format!(
                    "cell ({}, {}) is outside the {}x{} grid",
                    cell.row, cell.col, self.rows, self.cols
                )));
            }
        }
        Ok(())
    }

    /// Seat identifier like "3B".
    pub fn seat_id(row: usize, col: usize) -> Result<String, ItineraryError> {
        let letter = u8::try_from(col)
            .ok()
            .filter(|offset| *offset < 26)
            .map(|offset| (b'A' + offset) as char)
            .ok_or_else(|| ItineraryError::LayoutError(format!("no seat letter for column {}", col)))?;
        Ok(format!("{}{}", row + 1, letter))
    }

    pub fn cell(&self, row: usize, col: usize) -> Result<SeatCell, ItineraryError> {
        let here = Cell { row, col };
        let cell = if here == self.driver {
            SeatCell::Driver
        } else if here == self.entrance {
            SeatCell::Entrance
        } else if self.aisle.contains(&col) {
            SeatCell::Aisle
        } else {
            SeatCell::Seat(Self::seat_id(row, col)?)
        };
        Ok(cell)
    }

    /// Row-major grid for rendering.
    pub fn grid(&self) -> Result<Vec<Vec<SeatCell>>, ItineraryError> {
        self.validate()?;
        (0..self.rows)
            .map(|row| (0..self.cols).map(|col| self.cell(row, col)).collect::<Result<Vec<_>, _>>())
            .collect()
    }

    /// Every seat id in row-major order, skipping non-seat cells.
    pub fn seat_ids(&self) -> Result<Vec<String>, ItineraryError> {
        Ok(self
            .grid()?
            .into_iter()
            .flatten()
            .filter_map(|cell| match cell {
                SeatCell::Seat(id) => Some(id),
                _ => None,
            })
            .collect())
    }
}

impl Default for SeatLayout {
    fn default() -> Self {
        Self::bus()
    }
}

/// Available/booked partition of a layout's seats
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeatMap {
    pub layout: SeatLayout,
    pub available: Vec<String>,
    pub booked: Vec<String>,
}

impl SeatMap {
    /// Each seat stays available with probability `ratio`.
    pub fn generate<G: Rng>(
        layout: SeatLayout,
        ratio: f64,
        rng: &mut G,
    ) -> Result<Self, ItineraryError> {
        layout.validate()?;
        if !(0.0..=1.0).contains(&ratio) {
            return Err(ItineraryError::LayoutError(format!(
                "availability ratio must be within 0.0..=1.0, got {}",
                ratio
            )));
        }

        let (available, booked): (Vec<String>, Vec<String>) = layout
            .seat_ids()?
            .into_iter()
            .partition(|_| rng.gen::<f64>() < ratio);

        Ok(Self { layout, available, booked })
    }

    pub fn is_booked(&self, seat_id: &str) -> bool {
        self.booked.iter().any(|id| id == seat_id)
    }

    pub fn is_available(&self, seat_id: &str) -> bool {
        self.available.iter().any(|id| id == seat_id)
    }
}

/// Seats picked by the traveller, in the order they were picked
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeatSelection {
    selected: Vec<String>,
}

impl SeatSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle a seat; booked and unknown seats are ignored. Returns whether
    /// the seat is selected afterwards.
    pub fn toggle(&mut self, map: &SeatMap, seat_id: &str) -> bool {
        if !map.is_available(seat_id) {
            return false;
        }
        if let Some(pos) = self.selected.iter().position(|id| id == seat_id) {
            self.selected.remove(pos);
            false
        } else {
            self.selected.push(seat_id.to_string());
            true
        }
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn total_price(&self, base_price: f64) -> f64 {
        self.selected.len() as f64 * base_price
    }

    /// Selected seats, or an error when nothing was picked.
    pub fn confirm(&self) -> Result<&[String], ItineraryError> {
        if self.selected.is_empty() {
            return Err(ItineraryError::ValidationError(
                "Please select at least one seat to continue.".to_string(),
            ));
        }
        Ok(&self.selected)
    }
}
