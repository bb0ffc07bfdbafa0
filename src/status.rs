use serde::{Deserialize, Serialize};

/// Player-visible state of a single cell.
///
/// Every cell is in exactly one of two disjoint families: the covered family
/// (`Covered`, `FlaggedMine`, `FlaggedQuestion`) or the revealed family
/// (`Revealed`, `Mine`, `IncorrectFlag`, `ExplodedMine`). `Mine` and
/// `IncorrectFlag` only appear once a lost game has been finalized.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellStatus {
    Covered,
    FlaggedMine,
    FlaggedQuestion,
    /// Revealed safe cell with its adjacent-mine count, in `[0, 8]`.
    Revealed(u8),
    /// Mine that was never flagged, shown at the end of a lost game.
    Mine,
    /// Flag over a safe cell, shown at the end of a lost game.
    IncorrectFlag,
    /// The mine whose reveal ended the game.
    ExplodedMine,
}

impl CellStatus {
    /// Whether the cell is in any revealed-family state.
    pub const fn is_uncovered(self) -> bool {
        use CellStatus::*;
        match self {
            Covered => false,
            FlaggedMine => false,
            FlaggedQuestion => false,
            Revealed(_) => true,
            Mine => true,
            IncorrectFlag => true,
            ExplodedMine => true,
        }
    }

    /// Stable small-integer code for UI consumption.
    ///
    /// | Code | Meaning |
    /// |---|---|
    /// | -1 | Covered |
    /// | -2 | Flagged as mine guess |
    /// | -3 | Flagged as question |
    /// | 0-8 | Revealed, N adjacent mines |
    /// | 9 | Revealed mine |
    /// | 10 | Incorrect flag |
    /// | 11 | Exploded mine |
    pub const fn code(self) -> i8 {
        use CellStatus::*;
        match self {
            Covered => -1,
            FlaggedMine => -2,
            FlaggedQuestion => -3,
            Revealed(count) => count as i8,
            Mine => 9,
            IncorrectFlag => 10,
            ExplodedMine => 11,
        }
    }
}

impl Default for CellStatus {
    fn default() -> Self {
        Self::Covered
    }
}
