//! Core domain types for the triples puzzle.

use serde::{Deserialize, Serialize};
use strum::EnumIter;
use tracing::instrument;

/// A board coordinate.
///
/// Cells are plain coordinates. Whether a cell holds an item is decided by
/// the board that owns it, never by the cell itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    /// Column, 0 at the left edge.
    pub x: u8,
    /// Row, 0 at the top edge.
    pub y: u8,
}

impl Cell {
    /// Creates a cell at the given column and row.
    pub const fn new(x: u8, y: u8) -> Self {
        Self { x, y }
    }

    /// Returns true if `other` shares an edge with this cell.
    #[instrument]
    pub fn is_adjacent(self, other: Cell) -> bool {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y) == 1
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Identity of a single item for the lifetime of a session.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[display("#{}", _0)]
pub struct ItemId(pub u32);

/// The seven ordinary tile types.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, EnumIter,
)]
pub enum NormalType {
    /// Tile type one.
    One,
    /// Tile type two.
    Two,
    /// Tile type three.
    Three,
    /// Tile type four.
    Four,
    /// Tile type five.
    Five,
    /// Tile type six.
    Six,
    /// Tile type seven.
    Seven,
}

impl NormalType {
    /// Single-letter symbol used by board and tray renderings.
    pub fn symbol(self) -> char {
        match self {
            NormalType::One => 'A',
            NormalType::Two => 'B',
            NormalType::Three => 'C',
            NormalType::Four => 'D',
            NormalType::Five => 'E',
            NormalType::Six => 'F',
            NormalType::Seven => 'G',
        }
    }
}

/// Bonus tile variants.
///
/// They only matter as items that share `MatchKey::Bonus`. Nothing deals
/// them and they have no effect on the board.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, EnumIter,
)]
pub enum BonusType {
    /// Row-marked bonus.
    Horizontal,
    /// Column-marked bonus.
    Vertical,
    /// Area-marked bonus.
    Bomb,
}

/// Everything that can sit on a board cell or in a tray slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    /// An ordinary tile.
    Normal(NormalType),
    /// A bonus tile.
    Bonus(BonusType),
}

impl ItemKind {
    /// Returns the key this kind is grouped under for triple matching.
    ///
    /// All bonus tiles share one key regardless of their flavour.
    pub fn match_key(self) -> MatchKey {
        match self {
            ItemKind::Normal(normal) => MatchKey::Normal(normal),
            ItemKind::Bonus(_) => MatchKey::Bonus,
        }
    }

    /// Single-letter symbol used by board and tray renderings.
    pub fn symbol(self) -> char {
        match self {
            ItemKind::Normal(normal) => normal.symbol(),
            ItemKind::Bonus(BonusType::Horizontal) => '-',
            ItemKind::Bonus(BonusType::Vertical) => '|',
            ItemKind::Bonus(BonusType::Bomb) => '*',
        }
    }
}

/// The grouping key compared when looking for triples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MatchKey {
    /// Ordinary tiles match on their type.
    Normal(NormalType),
    /// Any bonus tile.
    Bonus,
}

impl std::fmt::Display for MatchKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchKey::Normal(normal) => write!(f, "{:?}", normal),
            MatchKey::Bonus => write!(f, "Bonus"),
        }
    }
}

/// A collectible item.
///
/// `origin` remembers the board cell the item was last taken from so it
/// can be sent back. It is a coordinate, not ownership: the item belongs
/// to whichever container currently holds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    id: ItemId,
    kind: ItemKind,
    origin: Option<Cell>,
}

impl Item {
    /// Creates an item that has never left the board.
    pub fn new(id: ItemId, kind: ItemKind) -> Self {
        Self {
            id,
            kind,
            origin: None,
        }
    }

    /// Returns the item's identity.
    pub fn id(&self) -> ItemId {
        self.id
    }

    /// Returns the item's kind.
    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    /// Returns the key used for triple matching.
    pub fn match_key(&self) -> MatchKey {
        self.kind.match_key()
    }

    /// Returns the board cell this item was taken from, if any.
    pub fn origin(&self) -> Option<Cell> {
        self.origin
    }

    /// Records the cell this item is being taken from.
    pub(crate) fn set_origin(&mut self, cell: Cell) {
        self.origin = Some(cell);
    }
}
