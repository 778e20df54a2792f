//! Board abstraction consumed by the solver and the game flow.

use super::types::{Cell, Item, ItemId, ItemKind, NormalType};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use tracing::{debug, info, instrument};

/// What the game flow and the solver need from a board.
///
/// `occupied_cells` must return cells in a stable order so that the
/// solver picks the same move for the same position.
pub trait BoardFacade: Send + Sync {
    /// Cells currently holding an item, in stable enumeration order.
    fn occupied_cells(&self) -> Vec<Cell>;

    /// Returns true if no cell holds an item.
    fn is_empty(&self) -> bool;

    /// Returns true if the two cells share an edge on this board.
    fn is_neighbor(&self, a: Cell, b: Cell) -> bool;

    /// The item on a cell, if any.
    fn item_at(&self, cell: Cell) -> Option<&Item>;

    /// Takes the item off a cell without destroying it.
    fn free_cell(&mut self, cell: Cell) -> Option<Item>;

    /// Puts an existing item back on an empty cell.
    ///
    /// An occupied or unknown cell hands the item back unchanged.
    fn place_existing(&mut self, cell: Cell, item: Item) -> Result<(), Item>;

    /// Horizontal and vertical runs through `cell` of at least `min_len`
    /// items sharing its match key.
    fn matches_at(&self, cell: Cell, min_len: usize) -> Vec<Cell>;

    /// Drops every item, returning how many were removed.
    fn clear(&mut self) -> usize;
}

/// A rectangular board stored row-major.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridBoard {
    width: u8,
    height: u8,
    cells: Vec<Option<Item>>,
    next_id: u32,
}

impl GridBoard {
    /// Creates an empty board.
    #[instrument]
    pub fn new(width: u8, height: u8) -> Self {
        Self {
            width,
            height,
            cells: vec![None; width as usize * height as usize],
            next_id: 0,
        }
    }

    /// Board width in cells.
    pub fn width(&self) -> u8 {
        self.width
    }

    /// Board height in cells.
    pub fn height(&self) -> u8 {
        self.height
    }

    /// Returns true if the cell lies on this board.
    pub fn contains(&self, cell: Cell) -> bool {
        cell.x < self.width && cell.y < self.height
    }

    fn index(&self, cell: Cell) -> Option<usize> {
        self.contains(cell)
            .then(|| cell.y as usize * self.width as usize + cell.x as usize)
    }

    fn cell_at(&self, index: usize) -> Cell {
        let width = self.width as usize;
        Cell::new((index % width) as u8, (index / width) as u8)
    }

    /// Creates a new item on an empty cell.
    ///
    /// Returns `None` if the cell is occupied or off the board.
    #[instrument(skip(self))]
    pub fn place(&mut self, cell: Cell, kind: ItemKind) -> Option<ItemId> {
        let index = self.index(cell)?;
        if self.cells[index].is_some() {
            return None;
        }
        let id = ItemId(self.next_id);
        self.next_id += 1;
        self.cells[index] = Some(Item::new(id, kind));
        Some(id)
    }

    /// Fills the board with dealable groups of normal tiles.
    ///
    /// Only the largest multiple of `group` cells is used, and every kind
    /// appears a multiple of `group` times, so a fresh board can always be
    /// cleared. Cells are filled row-major after shuffling the deal.
    /// Returns the number of items dealt.
    #[instrument(skip(self, rng))]
    pub fn fill<R: Rng + ?Sized>(&mut self, group: usize, rng: &mut R) -> usize {
        self.clear();
        let group = group.max(1);
        let groups = self.cells.len() / group;
        let kinds: Vec<NormalType> = NormalType::iter().collect();

        let mut deal: Vec<ItemKind> = (0..groups)
            .flat_map(|g| {
                let kind = kinds[g % kinds.len()];
                std::iter::repeat_n(ItemKind::Normal(kind), group)
            })
            .collect();
        deal.shuffle(rng);

        let dealt = deal.len();
        for (index, kind) in deal.into_iter().enumerate() {
            let cell = self.cell_at(index);
            self.place(cell, kind);
        }
        info!(dealt, groups, "Board filled");
        dealt
    }

    /// Permutes the items over the currently occupied cells.
    #[instrument(skip(self, rng))]
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let occupied: Vec<usize> = (0..self.cells.len())
            .filter(|&i| self.cells[i].is_some())
            .collect();
        let mut items: Vec<Item> = occupied
            .iter()
            .filter_map(|&i| self.cells[i].take())
            .collect();
        items.shuffle(rng);
        for (index, item) in occupied.into_iter().zip(items) {
            self.cells[index] = Some(item);
        }
        debug!("Board shuffled");
    }

    /// Formats the board as rows of symbols, `.` for empty cells.
    pub fn render(&self) -> String {
        self.cells
            .chunks(self.width.max(1) as usize)
            .map(|row| {
                row.iter()
                    .map(|cell| cell.as_ref().map_or('.', |item| item.kind().symbol()))
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Collects the run through `cell` along one axis.
    fn run(&self, cell: Cell, dx: i16, dy: i16) -> Vec<Cell> {
        let Some(key) = self.item_at(cell).map(Item::match_key) else {
            return Vec::new();
        };

        let same = |c: Cell| self.item_at(c).is_some_and(|i| i.match_key() == key);
        let step = |c: Cell, sx: i16, sy: i16| -> Option<Cell> {
            let x = u8::try_from(c.x as i16 + sx).ok()?;
            let y = u8::try_from(c.y as i16 + sy).ok()?;
            let next = Cell::new(x, y);
            self.contains(next).then_some(next)
        };

        let mut run = vec![cell];
        for (sx, sy) in [(-dx, -dy), (dx, dy)] {
            let mut current = cell;
            while let Some(next) = step(current, sx, sy).filter(|c| same(*c)) {
                run.push(next);
                current = next;
            }
        }
        run.sort();
        run
    }
}

impl BoardFacade for GridBoard {
    fn occupied_cells(&self) -> Vec<Cell> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(index, _)| self.cell_at(index))
            .collect()
    }

    fn is_empty(&self) -> bool {
        self.cells.iter().all(Option::is_none)
    }

    fn is_neighbor(&self, a: Cell, b: Cell) -> bool {
        self.contains(a) && self.contains(b) && a.is_adjacent(b)
    }

    fn item_at(&self, cell: Cell) -> Option<&Item> {
        self.index(cell).and_then(|i| self.cells[i].as_ref())
    }

    fn free_cell(&mut self, cell: Cell) -> Option<Item> {
        let index = self.index(cell)?;
        self.cells[index].take()
    }

    fn place_existing(&mut self, cell: Cell, item: Item) -> Result<(), Item> {
        match self.index(cell) {
            Some(index) if self.cells[index].is_none() => {
                self.cells[index] = Some(item);
                Ok(())
            }
            _ => Err(item),
        }
    }

    fn matches_at(&self, cell: Cell, min_len: usize) -> Vec<Cell> {
        let mut matches = Vec::new();
        for (dx, dy) in [(1, 0), (0, 1)] {
            let run = self.run(cell, dx, dy);
            if run.len() >= min_len {
                matches.extend(run);
            }
        }
        matches.sort();
        matches.dedup();
        matches
    }

    fn clear(&mut self) -> usize {
        let dropped = self.cells.iter().filter(|c| c.is_some()).count();
        self.cells.iter_mut().for_each(|c| *c = None);
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::triples::MatchKey;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashMap;

    const A: ItemKind = ItemKind::Normal(NormalType::One);
    const B: ItemKind = ItemKind::Normal(NormalType::Two);

    #[test]
    fn test_fill_deals_whole_groups() {
        let mut board = GridBoard::new(5, 5);
        let mut rng = StdRng::seed_from_u64(7);
        let dealt = board.fill(3, &mut rng);
        assert_eq!(dealt, 24);
        assert_eq!(board.occupied_cells().len(), 24);

        let mut counts: HashMap<MatchKey, usize> = HashMap::new();
        for cell in board.occupied_cells() {
            let key = board.item_at(cell).map(Item::match_key).unwrap();
            *counts.entry(key).or_default() += 1;
        }
        assert!(counts.values().all(|count| count % 3 == 0));
        assert!(!counts.contains_key(&MatchKey::Bonus));
    }

    #[test]
    fn test_fill_is_deterministic_for_a_seed() {
        let mut a = GridBoard::new(4, 3);
        let mut b = GridBoard::new(4, 3);
        a.fill(3, &mut StdRng::seed_from_u64(42));
        b.fill(3, &mut StdRng::seed_from_u64(42));
        assert_eq!(a.render(), b.render());
    }

    #[test]
    fn test_occupied_cells_are_row_major() {
        let mut board = GridBoard::new(3, 3);
        board.place(Cell::new(2, 1), A);
        board.place(Cell::new(0, 2), A);
        board.place(Cell::new(1, 0), B);
        assert_eq!(
            board.occupied_cells(),
            vec![Cell::new(1, 0), Cell::new(2, 1), Cell::new(0, 2)]
        );
    }

    #[test]
    fn test_free_and_place_existing() {
        let mut board = GridBoard::new(2, 2);
        let cell = Cell::new(0, 0);
        board.place(cell, A);
        let item = board.free_cell(cell).unwrap();
        assert!(board.is_empty());

        board.place(cell, B);
        let item = board.place_existing(cell, item).unwrap_err();
        assert_eq!(item.kind(), A);

        board.free_cell(cell);
        assert!(board.place_existing(cell, item).is_ok());
        assert_eq!(board.item_at(cell).map(Item::kind), Some(A));
    }

    #[test]
    fn test_neighbor_requires_board_cells() {
        let board = GridBoard::new(2, 2);
        assert!(board.is_neighbor(Cell::new(0, 0), Cell::new(1, 0)));
        assert!(!board.is_neighbor(Cell::new(1, 0), Cell::new(2, 0)));
    }

    #[test]
    fn test_matches_at_finds_runs() {
        let mut board = GridBoard::new(4, 4);
        for x in 0..3 {
            board.place(Cell::new(x, 0), A);
        }
        board.place(Cell::new(0, 1), A);
        board.place(Cell::new(3, 0), B);

        let horizontal = board.matches_at(Cell::new(1, 0), 3);
        assert_eq!(
            horizontal,
            vec![Cell::new(0, 0), Cell::new(1, 0), Cell::new(2, 0)]
        );
        assert!(board.matches_at(Cell::new(0, 1), 3).is_empty());
        assert_eq!(board.matches_at(Cell::new(0, 0), 2).len(), 4);
    }

    #[test]
    fn test_shuffle_keeps_occupied_cells() {
        let mut board = GridBoard::new(5, 5);
        board.fill(3, &mut StdRng::seed_from_u64(1));
        let before = board.occupied_cells();
        board.shuffle(&mut StdRng::seed_from_u64(2));
        assert_eq!(board.occupied_cells(), before);
    }
}
