use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid coordinates")]
    InvalidCoords,
    #[error("Mine data must be non-empty and rectangular")]
    InvalidBoardShape,
    #[error("Too many mines")]
    TooManyMines,
}

pub type Result<T> = core::result::Result<T, GameError>;
