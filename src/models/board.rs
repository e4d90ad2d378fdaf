use std::fmt;
use std::str::FromStr;

use crate::error::LaunchError;

/// A supported photo frame board.
///
/// The catalog is fixed at compile time. Order matters: the first board in a
/// requested list is the one whose manifest becomes the root-level default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Board {
    WavesharePhotopainter73,
    SeeedstudioXiaoEe02,
}

impl Board {
    /// Every supported board, in catalog order.
    pub const ALL: [Board; 2] = [Board::WavesharePhotopainter73, Board::SeeedstudioXiaoEe02];

    /// The board that shipped before multi-board releases existed.
    ///
    /// Only this board may fall back to the legacy release asset name.
    pub const PRIMARY: Board = Board::WavesharePhotopainter73;

    /// The identifier used in file names, URLs and CLI arguments.
    pub fn id(self) -> &'static str {
        match self {
            Board::WavesharePhotopainter73 => "waveshare_photopainter_73",
            Board::SeeedstudioXiaoEe02 => "seeedstudio_xiao_ee02",
        }
    }

    /// Canonical merged firmware image name, as published on the release page.
    pub fn artifact_name(self) -> String {
        format!("photoframe-firmware-{}-merged.bin", self.id())
    }

    /// Name of the locally built image exposed to the flasher as the dev version.
    pub fn dev_artifact_name(self) -> String {
        format!("photoframe-firmware-{}-dev.bin", self.id())
    }

    /// Subdirectory of the demo tree holding this board's firmware and manifests.
    pub fn subdir(self) -> &'static str {
        self.id()
    }

    pub fn is_primary(self) -> bool {
        self == Self::PRIMARY
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Board {
    type Err = LaunchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Board::ALL
            .into_iter()
            .find(|board| board.id() == s)
            .ok_or_else(|| LaunchError::UnknownBoard(s.to_string()))
    }
}

/// Static view over the supported boards.
pub struct BoardCatalog;

impl BoardCatalog {
    /// The fixed, ordered set of supported boards.
    pub fn all() -> &'static [Board] {
        &Board::ALL
    }

    /// Look up a board by identifier.
    pub fn get(id: &str) -> Result<Board, LaunchError> {
        id.parse()
    }

    /// Canonical artifact file name for a board identifier.
    pub fn artifact_name(id: &str) -> Result<String, LaunchError> {
        Self::get(id).map(Board::artifact_name)
    }
}

/// Which boards the user asked to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardSelection {
    One(Board),
    All,
}

impl BoardSelection {
    /// Selects every board in the catalog.
    pub const ALL_KEYWORD: &'static str = "all";

    pub fn boards(self) -> Vec<Board> {
        match self {
            BoardSelection::One(board) => vec![board],
            BoardSelection::All => BoardCatalog::all().to_vec(),
        }
    }

    /// Every accepted spelling: each board id, then the `all` keyword.
    pub fn choices() -> Vec<&'static str> {
        BoardCatalog::all()
            .iter()
            .map(|board| board.id())
            .chain([Self::ALL_KEYWORD])
            .collect()
    }
}

impl Default for BoardSelection {
    fn default() -> Self {
        BoardSelection::One(Board::PRIMARY)
    }
}

impl fmt::Display for BoardSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoardSelection::One(board) => f.write_str(board.id()),
            BoardSelection::All => f.write_str(BoardSelection::ALL_KEYWORD),
        }
    }
}

impl FromStr for BoardSelection {
    type Err = LaunchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == Self::ALL_KEYWORD {
            Ok(BoardSelection::All)
        } else {
            s.parse().map(BoardSelection::One)
        }
    }
}
