//! Player that replays a fixed list of requests.

use super::Player;
use crate::games::triples::{BoardFacade, MoveRequest, Tray};
use anyhow::Result;
use std::collections::VecDeque;

/// Replays requests in order, then reports it has nothing left.
///
/// Stands in for human input in tests and headless runs.
#[derive(Debug, Clone)]
pub struct ScriptedPlayer {
    name: String,
    script: VecDeque<MoveRequest>,
}

impl ScriptedPlayer {
    /// Creates a player from a request list.
    pub fn new(name: impl Into<String>, script: impl IntoIterator<Item = MoveRequest>) -> Self {
        Self {
            name: name.into(),
            script: script.into_iter().collect(),
        }
    }

    /// Requests not yet played.
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

#[async_trait::async_trait]
impl Player for ScriptedPlayer {
    async fn next_request(
        &mut self,
        _board: &dyn BoardFacade,
        _tray: &Tray,
    ) -> Result<Option<MoveRequest>> {
        Ok(self.script.pop_front())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
