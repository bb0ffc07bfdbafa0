use core::ops::Index;
use ndarray::Array2;
use rand::Rng;
use rand::RngExt;
use serde::{Deserialize, Serialize};

pub use board::*;
pub use error::*;
pub use status::*;
pub use types::*;

mod board;
mod error;
mod status;
mod types;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    pub rows: Coord,
    pub cols: Coord,
    pub mines: CellCount,
}

impl GameConfig {
    pub const fn new_unchecked(rows: Coord, cols: Coord, mines: CellCount) -> Self {
        Self { rows, cols, mines }
    }

    /// Validates the board dimensions and mine count.
    ///
    /// A full board cannot be populated while avoiding the first-revealed
    /// cell, so `mines` must leave at least one cell free. The random
    /// population path additionally expects `mines < rows * cols / 3` to
    /// keep its rejection rate low; that bound is a documented precondition
    /// of [`MineLayout::populate`], not checked here.
    pub fn new(rows: Coord, cols: Coord, mines: CellCount) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(GameError::InvalidBoardShape);
        }
        if mines >= mult(rows, cols) {
            return Err(GameError::TooManyMines);
        }
        Ok(Self::new_unchecked(rows, cols, mines))
    }

    pub const fn total_cells(&self) -> CellCount {
        mult(self.rows, self.cols)
    }
}

/// Locations of the mines for one game.
///
/// The mask is fixed for the lifetime of a round; the only mutators are
/// [`populate`](Self::populate) and [`reset_empty`](Self::reset_empty),
/// which the owning caller runs between rounds (typically on the first
/// reveal and on "new game"). A layout built from explicit mine data keeps
/// its derived count forever; a layout built with [`empty`](Self::empty)
/// stores a target count that only matches the mask once populated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MineLayout {
    mine_mask: Array2<bool>,
    mine_count: CellCount,
}

impl MineLayout {
    /// Builds a layout from an explicit mask; the mine count is derived.
    ///
    /// The mask dimensions must fit in [`Coord`].
    pub fn from_mine_mask(mine_mask: Array2<bool>) -> Self {
        let mine_count = mine_mask
            .iter()
            .filter(|&&is_mine| is_mine)
            .count()
            .try_into()
            .unwrap();
        Self {
            mine_mask,
            mine_count,
        }
    }

    /// Builds a layout mirroring the given rectangular boolean grid
    /// (defensive copy). Fails if the grid is empty, ragged, or larger than
    /// [`Coord`] allows per axis.
    pub fn from_mine_data(mine_data: &[Vec<bool>]) -> Result<Self> {
        let rows: Coord = mine_data
            .len()
            .try_into()
            .map_err(|_| GameError::InvalidBoardShape)?;
        if rows == 0 {
            return Err(GameError::InvalidBoardShape);
        }
        let cols: Coord = mine_data[0]
            .len()
            .try_into()
            .map_err(|_| GameError::InvalidBoardShape)?;
        if cols == 0 || mine_data.iter().any(|row| row.len() != usize::from(cols)) {
            return Err(GameError::InvalidBoardShape);
        }

        let mut mine_mask: Array2<bool> = Array2::default((rows, cols).to_nd_index());
        for (row, row_data) in mine_data.iter().enumerate() {
            for (col, &is_mine) in row_data.iter().enumerate() {
                mine_mask[[row, col]] = is_mine;
            }
        }
        Ok(Self::from_mine_mask(mine_mask))
    }

    pub fn from_mine_coords(size: Coord2, mine_coords: &[Coord2]) -> Result<Self> {
        let mut mine_mask: Array2<bool> = Array2::default(size.to_nd_index());

        for &coords in mine_coords {
            if coords.0 >= size.0 || coords.1 >= size.1 {
                return Err(GameError::InvalidCoords);
            }
            mine_mask[coords.to_nd_index()] = true;
        }

        Ok(Self::from_mine_mask(mine_mask))
    }

    /// Builds a mine-free layout that will hold `config.mines` mines once
    /// [`populate`](Self::populate) is called; until then the stored count
    /// does not match the mask.
    pub fn empty(config: GameConfig) -> Self {
        Self {
            mine_mask: Array2::default((config.rows, config.cols).to_nd_index()),
            mine_count: config.mines,
        }
    }

    /// Clears the layout, then places exactly [`mine_count`](Self::mine_count)
    /// mines at distinct cells chosen uniformly at random from all cells
    /// except `avoid`, without replacement.
    ///
    /// Placement is rejection sampling: a uniformly random cell is redrawn
    /// until it is neither `avoid` nor already mined. The documented density
    /// precondition (`mine_count < total_cells / 3`) keeps the expected
    /// rejection rate low.
    pub fn populate<R: Rng>(&mut self, avoid: Coord2, rng: &mut R) -> Result<()> {
        let avoid = self.validate_coords(avoid)?;
        if self.mine_count >= self.total_cells() {
            log::warn!(
                "{} mines cannot avoid {:?} on a {}x{} board",
                self.mine_count,
                avoid,
                self.num_rows(),
                self.num_cols()
            );
            return Err(GameError::TooManyMines);
        }

        self.mine_mask.fill(false);

        let (rows, cols) = self.size();
        let mut placed: CellCount = 0;
        while placed < self.mine_count {
            let coords = (rng.random_range(0..rows), rng.random_range(0..cols));
            if coords == avoid || self[coords] {
                continue;
            }
            self.mine_mask[coords.to_nd_index()] = true;
            placed += 1;
        }
        log::debug!("placed {} mines avoiding {:?}", placed, avoid);
        Ok(())
    }

    /// Clears all mines without touching the stored mine count. This is the
    /// state a layout built with [`empty`](Self::empty) starts a round in.
    pub fn reset_empty(&mut self) {
        self.mine_mask.fill(false);
    }

    pub fn game_config(&self) -> GameConfig {
        let (rows, cols) = self.size();
        GameConfig {
            rows,
            cols,
            mines: self.mine_count,
        }
    }

    pub fn in_range(&self, coords: Coord2) -> bool {
        let (rows, cols) = self.size();
        coords.0 < rows && coords.1 < cols
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        if self.in_range(coords) {
            Ok(coords)
        } else {
            Err(GameError::InvalidCoords)
        }
    }

    pub fn size(&self) -> Coord2 {
        let dim = self.mine_mask.dim();
        (dim.0.try_into().unwrap(), dim.1.try_into().unwrap())
    }

    pub fn num_rows(&self) -> Coord {
        self.size().0
    }

    pub fn num_cols(&self) -> Coord {
        self.size().1
    }

    pub fn safe_cell_count(&self) -> CellCount {
        self.total_cells() - self.mine_count
    }

    pub fn total_cells(&self) -> CellCount {
        self.mine_mask.len().try_into().unwrap()
    }

    pub fn mine_count(&self) -> CellCount {
        self.mine_count
    }

    pub fn has_mine(&self, coords: Coord2) -> bool {
        self[coords]
    }

    /// Number of mines in the 8-neighborhood of `coords`, clipped to the
    /// grid and excluding the cell itself. Range `[0, 8]`.
    pub fn adjacent_mine_count(&self, coords: Coord2) -> u8 {
        self.iter_neighbors(coords)
            .filter(|&pos| self[pos])
            .count()
            .try_into()
            .unwrap()
    }

    pub(crate) fn iter_neighbors(&self, coords: Coord2) -> NeighborIter {
        NeighborIter::new(coords, self.size())
    }
}

impl Index<Coord2> for MineLayout {
    type Output = bool;

    fn index(&self, coords: Coord2) -> &Self::Output {
        &self.mine_mask[coords.to_nd_index()]
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MarkOutcome {
    NoChange,
    Changed,
}

impl MarkOutcome {
    pub const fn has_update(self) -> bool {
        match self {
            Self::NoChange => false,
            Self::Changed => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn cross_layout() -> MineLayout {
        MineLayout::from_mine_data(&[
            vec![false, true, false, false],
            vec![true, true, false, false],
            vec![true, true, true, false],
            vec![false, false, true, true],
        ])
        .unwrap()
    }

    #[test]
    fn layout_from_explicit_data_derives_its_count() {
        let layout = cross_layout();

        assert_eq!(layout.num_rows(), 4);
        assert_eq!(layout.num_cols(), 4);
        assert_eq!(layout.mine_count(), 8);
        assert!(!layout.in_range((2, 4)));
        assert!(layout.has_mine((0, 1)));
        assert_eq!(layout.adjacent_mine_count((1, 2)), 4);
    }

    #[test]
    fn from_mine_data_rejects_empty_and_ragged_grids() {
        assert_eq!(
            MineLayout::from_mine_data(&[]),
            Err(GameError::InvalidBoardShape)
        );
        assert_eq!(
            MineLayout::from_mine_data(&[vec![]]),
            Err(GameError::InvalidBoardShape)
        );
        assert_eq!(
            MineLayout::from_mine_data(&[vec![false, true], vec![false]]),
            Err(GameError::InvalidBoardShape)
        );
    }

    #[test]
    fn from_mine_coords_rejects_out_of_range_mines() {
        assert_eq!(
            MineLayout::from_mine_coords((2, 2), &[(2, 0)]),
            Err(GameError::InvalidCoords)
        );
    }

    #[test]
    fn game_config_validates_shape_and_density() {
        assert_eq!(GameConfig::new(0, 5, 1), Err(GameError::InvalidBoardShape));
        assert_eq!(GameConfig::new(5, 0, 1), Err(GameError::InvalidBoardShape));
        assert_eq!(GameConfig::new(2, 2, 4), Err(GameError::TooManyMines));
        assert!(GameConfig::new(2, 2, 3).is_ok());
    }

    fn count_mines(layout: &MineLayout) -> usize {
        let (rows, cols) = layout.size();
        let mut total = 0;
        for row in 0..rows {
            for col in 0..cols {
                if layout.has_mine((row, col)) {
                    total += 1;
                }
            }
        }
        total
    }

    #[test]
    fn populate_places_exact_count_and_avoids_the_start_cell() {
        let mut layout = MineLayout::empty(GameConfig::new(4, 4, 5).unwrap());
        let mut rng = SmallRng::seed_from_u64(455);

        layout.populate((1, 2), &mut rng).unwrap();

        assert!(!layout.has_mine((1, 2)));
        assert_eq!(count_mines(&layout), 5);
        assert_eq!(layout.mine_count(), 5);
    }

    #[test]
    fn populate_is_deterministic_for_a_seed() {
        let config = GameConfig::new(9, 9, 10).unwrap();
        let mut first = MineLayout::empty(config);
        let mut second = MineLayout::empty(config);

        first.populate((4, 4), &mut SmallRng::seed_from_u64(7)).unwrap();
        second.populate((4, 4), &mut SmallRng::seed_from_u64(7)).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn populate_rejects_out_of_range_avoid_cell() {
        let mut layout = MineLayout::empty(GameConfig::new(4, 4, 5).unwrap());
        let mut rng = SmallRng::seed_from_u64(0);

        assert_eq!(layout.populate((4, 0), &mut rng), Err(GameError::InvalidCoords));
    }

    #[test]
    fn populate_refuses_a_board_it_cannot_fill() {
        let mut layout = MineLayout::from_mine_data(&[vec![true, true], vec![true, true]]).unwrap();
        let mut rng = SmallRng::seed_from_u64(0);

        assert_eq!(layout.populate((0, 0), &mut rng), Err(GameError::TooManyMines));
    }

    #[test]
    fn reset_empty_clears_mines_but_keeps_the_count() {
        let mut layout = cross_layout();

        layout.reset_empty();

        assert_eq!(count_mines(&layout), 0);
        assert_eq!(layout.mine_count(), 8);
    }

    #[test]
    fn adjacency_matches_a_brute_force_count() {
        let mut layout = MineLayout::empty(GameConfig::new(8, 8, 12).unwrap());
        layout.populate((3, 3), &mut SmallRng::seed_from_u64(99)).unwrap();

        let (rows, cols) = layout.size();
        for row in 0..rows {
            for col in 0..cols {
                let mut expected = 0;
                for dr in -1i16..=1 {
                    for dc in -1i16..=1 {
                        if dr == 0 && dc == 0 {
                            continue;
                        }
                        let (nr, nc) = (i16::from(row) + dr, i16::from(col) + dc);
                        if (0..i16::from(rows)).contains(&nr)
                            && (0..i16::from(cols)).contains(&nc)
                            && layout.has_mine((nr as Coord, nc as Coord))
                        {
                            expected += 1;
                        }
                    }
                }
                let count = layout.adjacent_mine_count((row, col));
                assert_eq!(count, expected);
                assert!(count <= 8);
            }
        }
    }
}
