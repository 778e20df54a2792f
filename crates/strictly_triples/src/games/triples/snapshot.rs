//! Serializable view of a session.

use super::board::BoardFacade;
use super::flow::GameFlow;
use super::level::LevelCondition;
use super::phases::{GamePhase, Verdict};
use super::types::{Cell, ItemId, ItemKind};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// One occupied board cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_new::new)]
pub struct BoardEntry {
    /// Cell coordinate.
    pub cell: Cell,
    /// Item on the cell.
    pub item: ItemId,
    /// Its kind.
    pub kind: ItemKind,
}

/// Point-in-time copy of everything a presentation layer shows.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct GameSnapshot {
    phase: GamePhase,
    verdict: Verdict,
    board: Vec<BoardEntry>,
    tray: Vec<Option<ItemKind>>,
    level: LevelCondition,
    moves: u32,
    consumed: usize,
    dealt: usize,
}

impl GameSnapshot {
    /// Copies the live state of a flow.
    #[instrument(skip(flow))]
    pub fn capture<B: BoardFacade>(flow: &GameFlow<B>) -> Self {
        let board = flow
            .board()
            .occupied_cells()
            .into_iter()
            .filter_map(|cell| {
                flow.board()
                    .item_at(cell)
                    .map(|item| BoardEntry::new(cell, item.id(), item.kind()))
            })
            .collect();
        let tray = flow
            .tray()
            .slots()
            .iter()
            .map(|slot| slot.as_ref().map(|item| item.kind()))
            .collect();

        Self {
            phase: flow.phase(),
            verdict: flow.verdict(),
            board,
            tray,
            level: *flow.level(),
            moves: flow.moves(),
            consumed: flow.consumed(),
            dealt: flow.dealt(),
        }
    }

    /// Tray contents as symbols, `.` for empty slots.
    pub fn tray_symbols(&self) -> String {
        self.tray
            .iter()
            .map(|slot| slot.map_or('.', ItemKind::symbol))
            .collect()
    }

    /// Pretty JSON rendering.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
