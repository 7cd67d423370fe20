/// Load-time errors. Anything that can go wrong while turning level data into
/// a playable world lands here and aborts construction; in-play guards never
/// produce errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LevelError {
    #[error("could not find key '{0}' in level data")]
    MissingKey(&'static str),

    #[error("found no data for key '{0}'")]
    EmptySection(String),

    #[error("expected one line of data for key '{key}' but found {found}")]
    ExpectedSingleLine { key: &'static str, found: usize },

    #[error("key '{0}' appears more than once")]
    DuplicateKey(String),

    #[error("data line '{0}' found before any key")]
    DataBeforeKey(String),

    #[error("empty key found")]
    EmptyKey,

    #[error("invalid dimensions '{0}', expected 'WIDTH,HEIGHT' with both > 0")]
    BadDimensions(String),

    #[error("tile size must be positive, got {0}")]
    BadTileSize(i32),

    #[error("a {width}x{height} grid of {tile_size}-unit tiles is too large")]
    WorldTooLarge { width: usize, height: usize, tile_size: i32 },

    #[error("tile data height {found} does not match expected height {expected}")]
    RowCountMismatch { expected: usize, found: usize },

    #[error("tile data row {row} has width {found}, expected {expected}")]
    ColumnCountMismatch { row: usize, expected: usize, found: usize },

    #[error("tile data row {row} column {column}: expected '0' or '1', got '{found}'")]
    BadTile { row: usize, column: usize, found: char },

    #[error("could not parse {what} record '{line}'")]
    BadRecord { what: &'static str, line: String },

    #[error("unknown enemy key '{0}'")]
    UnknownEnemy(String),

    #[error("unknown upgrade key '{0}'")]
    UnknownUpgrade(String),

    #[error("{what} refers to room {room}, but only {count} rooms exist")]
    UnknownRoom { what: String, room: usize, count: usize },

    #[error("{what} tile ({x}, {y}) lies outside the {width}x{height} grid")]
    OutOfBounds { what: String, x: i32, y: i32, width: usize, height: usize },

    #[error("level file must have the .mapdata extension: {0}")]
    BadExtension(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LevelError>;
