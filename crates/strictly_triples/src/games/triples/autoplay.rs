//! Autoplay loop and its external stop signal.

use super::action::{MoveError, TransitionError};
use super::board::BoardFacade;
use super::events::GameEvent;
use super::flow::GameFlow;
use super::phases::Verdict;
use super::solver::{MoveSolver, Objective};
use crate::players::Player;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Sender half of a stop signal; owned by whoever may stop the loop.
#[derive(Debug)]
pub struct AutoplayHandle {
    sender: watch::Sender<bool>,
}

impl AutoplayHandle {
    /// Asks the loop to stop before its next move.
    pub fn stop(&self) {
        // A loop that already ended dropped its receiver.
        let _ = self.sender.send(true);
    }
}

/// Receiver half, polled by the loop between moves.
#[derive(Debug, Clone)]
pub struct StopSignal {
    receiver: watch::Receiver<bool>,
}

impl StopSignal {
    /// Creates a linked handle and signal.
    pub fn channel() -> (AutoplayHandle, StopSignal) {
        let (sender, receiver) = watch::channel(false);
        (AutoplayHandle { sender }, StopSignal { receiver })
    }

    /// A signal that never fires.
    pub fn never() -> Self {
        Self::channel().1
    }

    /// Returns true once a stop was requested.
    pub fn is_stopped(&self) -> bool {
        *self.receiver.borrow()
    }
}

/// Why an autoplay or player loop returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutoplayOutcome {
    /// The session reached a terminal verdict.
    Finished(Verdict),
    /// The stop signal fired.
    Stopped,
    /// The board has items but nothing could be chosen.
    NeedsReshuffle,
    /// The input collaborator ran out of requests.
    InputExhausted,
    /// A move was refused.
    Rejected(MoveError),
}

impl std::fmt::Display for AutoplayOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AutoplayOutcome::Finished(verdict) => write!(f, "{}", verdict),
            AutoplayOutcome::Stopped => write!(f, "Stopped"),
            AutoplayOutcome::NeedsReshuffle => write!(f, "Needs reshuffle"),
            AutoplayOutcome::InputExhausted => write!(f, "Input exhausted"),
            AutoplayOutcome::Rejected(err) => write!(f, "Rejected: {}", err),
        }
    }
}

/// Consecutive rejected player requests before the loop gives up.
const REJECTION_LIMIT: usize = 3;

impl<B: BoardFacade> GameFlow<B> {
    /// Lets the solver play until the session ends, stalls, or is stopped.
    ///
    /// Enters the autoplay sub-mode for `objective` and returns to
    /// `Playing` afterwards unless the session ended. Time spent in the
    /// loop counts against a timer level.
    #[instrument(skip(self, stop))]
    pub async fn run_autoplay(
        &mut self,
        objective: Objective,
        stop: &StopSignal,
    ) -> Result<AutoplayOutcome, TransitionError> {
        self.enter_autoplay(objective)?;
        info!(%objective, "Autoplay started");
        let solver = MoveSolver::new(objective);
        let mut clock = Instant::now();

        let outcome = loop {
            if stop.is_stopped() {
                break AutoplayOutcome::Stopped;
            }
            if self.is_busy() {
                debug!("Waiting for the previous move to settle");
                tokio::task::yield_now().await;
                continue;
            }

            let Some(choice) = solver.choose(self.board(), self.tray()) else {
                if self.board().is_empty() {
                    self.finish(Verdict::Won)?;
                    break AutoplayOutcome::Finished(Verdict::Won);
                }
                break AutoplayOutcome::NeedsReshuffle;
            };

            match self.request_move(choice.primary).await {
                Ok(report) if report.verdict.is_terminal() => {
                    break AutoplayOutcome::Finished(report.verdict);
                }
                Ok(_) => {}
                Err(err) => break AutoplayOutcome::Rejected(err),
            }
            self.pace().await;
            if let Some(verdict) = self.advance_clock(&mut clock)? {
                break AutoplayOutcome::Finished(verdict);
            }
        };

        self.halt(&outcome)?;
        info!(%outcome, "Autoplay ended");
        Ok(outcome)
    }

    /// Feeds requests from a player until the session ends, the player
    /// runs dry, or the loop is stopped.
    ///
    /// A rejected request is skipped; after a few in a row the loop gives
    /// up with the last rejection. A phase that takes no moves ends the
    /// loop at once.
    #[instrument(skip(self, player, stop), fields(player = player.name()))]
    pub async fn run_player(
        &mut self,
        player: &mut dyn Player,
        stop: &StopSignal,
    ) -> anyhow::Result<AutoplayOutcome> {
        let mut clock = Instant::now();
        let mut rejections = 0;

        loop {
            if stop.is_stopped() {
                return Ok(AutoplayOutcome::Stopped);
            }
            let phase = self.phase();
            if phase.is_terminal() {
                return Ok(AutoplayOutcome::Finished(self.verdict()));
            }
            if !phase.accepts_moves() {
                return Ok(AutoplayOutcome::Rejected(MoveError::NotAcceptingMoves(
                    phase,
                )));
            }

            let Some(request) = player.next_request(self.board(), self.tray()).await? else {
                if self.board().is_empty() {
                    self.finish(Verdict::Won)?;
                    return Ok(AutoplayOutcome::Finished(Verdict::Won));
                }
                return Ok(AutoplayOutcome::InputExhausted);
            };
            debug!(%request, "Player request");

            match self.apply(request).await {
                Ok(report) if report.verdict.is_terminal() => {
                    return Ok(AutoplayOutcome::Finished(report.verdict));
                }
                Ok(_) => {
                    rejections = 0;
                    self.pace().await;
                }
                Err(err) => {
                    rejections += 1;
                    warn!(%request, error = %err, rejections, "Player request rejected");
                    if rejections >= REJECTION_LIMIT {
                        return Ok(AutoplayOutcome::Rejected(err));
                    }
                    tokio::task::yield_now().await;
                }
            }
            if let Some(verdict) = self.advance_clock(&mut clock)? {
                return Ok(AutoplayOutcome::Finished(verdict));
            }
        }
    }

    /// Waits out the pause between autoplay moves.
    async fn pace(&self) {
        let delay = self.settings().autoplay_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    /// Charges the time since `clock` to the level and restarts it.
    ///
    /// Returns the verdict if the charge ended the session.
    fn advance_clock(&mut self, clock: &mut Instant) -> Result<Option<Verdict>, TransitionError> {
        let now = Instant::now();
        self.tick(now.duration_since(*clock))?;
        *clock = now;
        Ok(self.phase().is_terminal().then(|| self.verdict()))
    }

    /// Leaves the autoplay sub-mode after a non-terminal outcome.
    fn halt(&mut self, outcome: &AutoplayOutcome) -> Result<(), TransitionError> {
        if self.phase().is_terminal() {
            return Ok(());
        }
        self.leave_autoplay()?;
        let reason = outcome.to_string();
        warn!(%reason, "Autoplay halted");
        self.emit(&[GameEvent::AutoplayHalted { reason }]);
        Ok(())
    }
}
