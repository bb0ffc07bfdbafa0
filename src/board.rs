use hashbrown::HashSet;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::*;

/// Player-visible overlay over a [`MineLayout`]: what the user can see about
/// the minefield at any point of a game.
///
/// The overlay owns the layout it displays and never mutates it; the owning
/// caller reaches it through [`mine_layout_mut`](Self::mine_layout_mut) to
/// re-populate or reset between rounds. Its status grid always has the
/// layout's dimensions. `flag_count` counts the cells currently in
/// [`CellStatus::FlaggedMine`].
///
/// The expected driving loop is: mutate with [`uncover`](Self::uncover) or
/// [`cycle_flag`](Self::cycle_flag) in response to input, then poll
/// [`is_game_over`](Self::is_game_over).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VisibleBoard {
    layout: MineLayout,
    status: Array2<CellStatus>,
    flag_count: CellCount,
}

impl VisibleBoard {
    /// Creates an overlay with every cell covered, no flags, and the game
    /// not over.
    pub fn new(layout: MineLayout) -> Self {
        let size = layout.size();
        Self {
            layout,
            status: Array2::default(size.to_nd_index()),
            flag_count: 0,
        }
    }

    pub fn mine_layout(&self) -> &MineLayout {
        &self.layout
    }

    /// Mutable access to the underlying layout, for re-seeding it between
    /// rounds ([`MineLayout::populate`] on the first reveal,
    /// [`MineLayout::reset_empty`] on a new game).
    pub fn mine_layout_mut(&mut self) -> &mut MineLayout {
        &mut self.layout
    }

    pub fn num_rows(&self) -> Coord {
        self.layout.num_rows()
    }

    pub fn num_cols(&self) -> Coord {
        self.layout.num_cols()
    }

    pub fn status(&self, coords: Coord2) -> CellStatus {
        self.status[coords.to_nd_index()]
    }

    /// Stable integer form of [`status`](Self::status), see
    /// [`CellStatus::code`].
    pub fn status_code(&self, coords: Coord2) -> i8 {
        self.status(coords).code()
    }

    pub fn is_uncovered(&self, coords: Coord2) -> bool {
        self.status(coords).is_uncovered()
    }

    /// How many mines are left to flag. This has nothing to do with whether
    /// the flags are correct; it goes negative when the player has flagged
    /// more cells than there are mines.
    pub fn mines_left(&self) -> isize {
        (self.layout.mine_count() as isize) - (self.flag_count as isize)
    }

    /// Returns the overlay to its initial state without touching the
    /// layout; the caller re-populates or resets the layout separately.
    pub fn reset_display(&mut self) {
        self.status.fill(CellStatus::Covered);
        self.flag_count = 0;
    }

    /// Advances a covered cell through the marker cycle
    /// Covered -> FlaggedMine -> FlaggedQuestion -> Covered. `flag_count`
    /// changes only on the Covered <-> FlaggedMine edges. Revealed cells are
    /// left alone.
    pub fn cycle_flag(&mut self, coords: Coord2) -> Result<MarkOutcome> {
        use CellStatus::*;
        use MarkOutcome::*;

        let coords = self.layout.validate_coords(coords)?;

        Ok(match self.status[coords.to_nd_index()] {
            Covered => {
                self.status[coords.to_nd_index()] = FlaggedMine;
                self.flag_count += 1;
                Changed
            }
            FlaggedMine => {
                self.status[coords.to_nd_index()] = FlaggedQuestion;
                self.flag_count -= 1;
                Changed
            }
            FlaggedQuestion => {
                self.status[coords.to_nd_index()] = Covered;
                Changed
            }
            _ => NoChange,
        })
    }

    /// Uncovers the cell at `coords`, returning `false` iff it held a mine.
    ///
    /// A zero-adjacency cell opens its whole connected zero region plus the
    /// bordering count cells. The target cell is always evaluated, even when
    /// currently flagged; only the recursive sweep respects flags.
    pub fn uncover(&mut self, coords: Coord2) -> Result<bool> {
        let coords = self.layout.validate_coords(coords)?;

        // the flag on a directly uncovered cell is consumed either way
        if self.status[coords.to_nd_index()] == CellStatus::FlaggedMine {
            self.flag_count -= 1;
        }

        if self.layout.has_mine(coords) {
            self.status[coords.to_nd_index()] = CellStatus::ExplodedMine;
            log::debug!("uncovered a mine at {coords:?}");
            return Ok(false);
        }

        let adjacent_mines = self.layout.adjacent_mine_count(coords);
        log::debug!("uncover at {coords:?}, adjacent mines: {adjacent_mines}");
        if adjacent_mines > 0 {
            self.status[coords.to_nd_index()] = CellStatus::Revealed(adjacent_mines);
        } else {
            self.spread(coords);
        }
        Ok(true)
    }

    /// Whether the game has ended. Scans the whole grid once; when a loss or
    /// a win is detected the end-of-game presentation is applied before
    /// returning. Repeated calls on a finished board keep returning `true`
    /// without changing it further.
    pub fn is_game_over(&mut self) -> bool {
        let mut revealed: CellCount = 0;
        let mut exploded = false;
        for &status in &self.status {
            match status {
                CellStatus::ExplodedMine => {
                    exploded = true;
                    break;
                }
                CellStatus::Revealed(_) => revealed += 1,
                _ => {}
            }
        }

        if exploded {
            self.finalize(true);
            return true;
        }
        if revealed == self.layout.safe_cell_count() {
            self.finalize(false);
            return true;
        }
        false
    }

    /// Iterative flood fill from a zero-adjacency cell: reveals the maximal
    /// 8-connected zero region reachable from `start` plus its one-cell
    /// count border. The sweep never opens a flagged cell or a covered
    /// mine; question marks are opened.
    fn spread(&mut self, start: Coord2) {
        use CellStatus::*;

        self.status[start.to_nd_index()] = Revealed(0);

        let mut visited: HashSet<Coord2> = HashSet::new();
        visited.insert(start);
        let mut to_visit: VecDeque<Coord2> = self
            .layout
            .iter_neighbors(start)
            .filter(|&pos| self.spreadable(pos))
            .collect();
        log::trace!("flood fill from {start:?}, initial frontier: {to_visit:?}");

        while let Some(visit) = to_visit.pop_front() {
            if !visited.insert(visit) {
                continue;
            }

            // a queued cell may have been opened from another direction
            if !self.spreadable(visit) {
                continue;
            }

            let adjacent_mines = self.layout.adjacent_mine_count(visit);
            self.status[visit.to_nd_index()] = Revealed(adjacent_mines);
            log::trace!("flood opened {visit:?}, adjacent mines: {adjacent_mines}");

            // only zero cells keep the sweep going
            if adjacent_mines == 0 {
                to_visit.extend(
                    self.layout
                        .iter_neighbors(visit)
                        .filter(|&pos| self.spreadable(pos))
                        .filter(|pos| !visited.contains(pos)),
                );
            }
        }
    }

    /// Whether the sweep may open this cell: still covered (plainly or with
    /// a question mark) and not a covered mine.
    fn spreadable(&self, coords: Coord2) -> bool {
        use CellStatus::*;
        match self.status[coords.to_nd_index()] {
            Covered => !self.layout.has_mine(coords),
            FlaggedQuestion => true,
            FlaggedMine | Revealed(_) | Mine | IncorrectFlag | ExplodedMine => false,
        }
    }

    /// Applies the end-of-game presentation. On a win the remaining mines
    /// are flagged; on a loss every cell except the exploded one is swept:
    /// unflagged mines (question marks included) are shown, flags over safe
    /// cells are marked incorrect.
    fn finalize(&mut self, lost: bool) {
        use CellStatus::*;

        let (rows, cols) = self.layout.size();
        for row in 0..rows {
            for col in 0..cols {
                let coords = (row, col);
                let status = self.status[coords.to_nd_index()];
                if status == ExplodedMine {
                    continue;
                }
                match (self.layout.has_mine(coords), status) {
                    (true, FlaggedMine) => {}
                    (true, _) if lost => self.status[coords.to_nd_index()] = Mine,
                    (true, _) => {
                        self.status[coords.to_nd_index()] = FlaggedMine;
                        self.flag_count += 1;
                    }
                    (false, FlaggedMine) if lost => {
                        self.status[coords.to_nd_index()] = IncorrectFlag;
                    }
                    (false, _) => {}
                }
            }
        }
        log::debug!("game over, lost: {lost}, mines left: {}", self.mines_left());
    }
}
