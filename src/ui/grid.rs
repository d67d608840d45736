use ratatui::layout::Rect;
use reflex::session::GRID_SIZE;

const MAX_CELL_HEIGHT: u16 = 5;

/// Placement of the 3x3 grid inside a panel. Shared by rendering and mouse hit tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridGeometry {
    pub origin: Rect,
    pub cell_width: u16,
    pub cell_height: u16,
}

impl GridGeometry {
    /// Largest centered grid that fits in `area`, with cells roughly twice as wide
    /// as they are tall so they look square in a terminal.
    pub fn fit(area: Rect) -> Self {
        let n = GRID_SIZE as u16;
        let cell_height = (area.height / n).clamp(1, MAX_CELL_HEIGHT);
        let cell_width = (cell_height * 2).min(area.width / n).max(1);

        let width = (cell_width * n).min(area.width);
        let height = (cell_height * n).min(area.height);
        let origin = Rect::new(
            area.x + (area.width - width) / 2,
            area.y + (area.height - height) / 2,
            width,
            height,
        );
        Self {
            origin,
            cell_width,
            cell_height,
        }
    }

    pub fn cell_rect(&self, cell: usize) -> Rect {
        let row = (cell / GRID_SIZE) as u16;
        let col = (cell % GRID_SIZE) as u16;
        Rect::new(
            self.origin.x + col * self.cell_width,
            self.origin.y + row * self.cell_height,
            self.cell_width,
            self.cell_height,
        )
    }

    /// Grid cell under a terminal position, if any
    pub fn cell_at(&self, column: u16, row: u16) -> Option<usize> {
        if column < self.origin.x || row < self.origin.y {
            return None;
        }
        let col = ((column - self.origin.x) / self.cell_width) as usize;
        let row = ((row - self.origin.y) / self.cell_height) as usize;
        (col < GRID_SIZE && row < GRID_SIZE).then_some(row * GRID_SIZE + col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fits_and_centers() {
        let grid = GridGeometry::fit(Rect::new(0, 0, 60, 15));
        assert_eq!(grid.cell_height, 5);
        assert_eq!(grid.cell_width, 10);
        assert_eq!(grid.origin, Rect::new(15, 0, 30, 15));
    }

    #[test]
    fn small_areas_still_get_cells() {
        let grid = GridGeometry::fit(Rect::new(0, 0, 6, 2));
        assert_eq!(grid.cell_height, 1);
        assert_eq!(grid.cell_width, 2);
    }

    #[test]
    fn cell_at_maps_back_to_cell_rect() {
        let grid = GridGeometry::fit(Rect::new(3, 2, 60, 15));
        for cell in 0..GRID_SIZE * GRID_SIZE {
            let r = grid.cell_rect(cell);
            assert_eq!(grid.cell_at(r.x, r.y), Some(cell));
            assert_eq!(grid.cell_at(r.x + r.width - 1, r.y + r.height - 1), Some(cell));
        }
    }

    #[test]
    fn clicks_outside_grid_miss() {
        let grid = GridGeometry::fit(Rect::new(0, 0, 60, 15));
        assert_eq!(grid.cell_at(0, 0), None);
        assert_eq!(grid.cell_at(45, 3), None);
        assert_eq!(grid.cell_at(20, 15), None);
    }
}
