use rand::rngs::ThreadRng;
use rand::Rng;
use tracing::{debug, info};

use crate::catalog::{Item, ItemCatalog, ItemHandle};
use crate::error::{QuizError, Result};
use crate::selection::SelectionEngine;
use crate::session::SessionTracker;

/// Session level state. Leaving `Exhausted` needs the player's confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum QuizState {
    Active,
    Exhausted,
}

/// How much of the current item has been shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Stage {
    Listening,
    ImageRevealed,
    InfoRevealed,
}

impl Stage {
    pub fn image_visible(self) -> bool {
        !matches!(self, Stage::Listening)
    }

    pub fn info_visible(self) -> bool {
        matches!(self, Stage::InfoRevealed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Correct,
    Incorrect,
}

/// A running quiz: the validated catalog plus the selection and scoring
/// state layered on top of it.
#[derive(Debug)]
pub struct Quiz<R = ThreadRng> {
    catalog: ItemCatalog,
    engine: SelectionEngine<R>,
    tracker: SessionTracker,
    current: Option<ItemHandle>,
    stage: Stage,
    last_verdict: Option<Verdict>,
}

impl<R: Rng> Quiz<R> {
    /// `catalog` is expected to have been through its validation pass.
    pub fn new(catalog: ItemCatalog, engine: SelectionEngine<R>) -> Self {
        Self {
            catalog,
            engine,
            tracker: SessionTracker::new(),
            current: None,
            stage: Stage::Listening,
            last_verdict: None,
        }
    }

    pub fn start(&mut self) -> Result<QuizState> {
        info!("starting quiz with {} recordings", self.catalog.remaining());
        self.advance()
    }

    fn advance(&mut self) -> Result<QuizState> {
        self.stage = Stage::Listening;
        if self.catalog.is_exhausted() {
            info!("working set exhausted");
            self.current = None;
            return Ok(QuizState::Exhausted);
        }
        self.current = Some(self.engine.select_next(self.catalog.working_set())?);
        Ok(QuizState::Active)
    }

    /// Move on without scoring the current item.
    pub fn next(&mut self) -> Result<QuizState> {
        self.last_verdict = None;
        self.advance()
    }

    /// Show the next piece of the current item: first the image, then the
    /// names and credits.
    pub fn reveal(&mut self) -> Result<Stage> {
        if self.current.is_none() {
            return Err(QuizError::NoCurrentItem);
        }
        self.stage = match self.stage {
            Stage::Listening => Stage::ImageRevealed,
            Stage::ImageRevealed | Stage::InfoRevealed => Stage::InfoRevealed,
        };
        Ok(self.stage)
    }

    /// Score the current item. A correct answer retires it for the rest of
    /// the session. Either way the next item is drawn.
    pub fn answer(&mut self, is_correct: bool) -> Result<QuizState> {
        let current = self.current.ok_or(QuizError::NoCurrentItem)?;
        if !self.stage.image_visible() {
            return Err(QuizError::NotRevealed);
        }

        self.tracker.record_response(is_correct);
        if is_correct {
            self.catalog.remove_from_working(current);
        }
        self.last_verdict = Some(if is_correct {
            Verdict::Correct
        } else {
            Verdict::Incorrect
        });
        debug!(
            "answered {current:?} correct={is_correct}, {} remaining",
            self.catalog.remaining()
        );

        self.advance()
    }

    /// Refill the working set after exhaustion, optionally clearing the score.
    pub fn confirm_repopulate(&mut self, reset_score: bool) -> Result<QuizState> {
        if self.state() != QuizState::Exhausted {
            debug!("repopulate requested while still active, ignoring");
            return Ok(self.state());
        }
        if reset_score {
            self.tracker.reset();
        }
        self.last_verdict = None;
        self.catalog.reset_working_set();
        info!(
            "repopulated {} recordings (score reset: {reset_score})",
            self.catalog.remaining()
        );
        self.advance()
    }

    pub fn state(&self) -> QuizState {
        if self.catalog.is_exhausted() {
            QuizState::Exhausted
        } else {
            QuizState::Active
        }
    }
}

impl<R> Quiz<R> {
    pub fn current_handle(&self) -> Option<ItemHandle> {
        self.current
    }

    pub fn current_item(&self) -> Option<&Item> {
        self.current.and_then(|h| self.catalog.item(h).ok())
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn last_verdict(&self) -> Option<Verdict> {
        self.last_verdict
    }

    pub fn tracker(&self) -> &SessionTracker {
        &self.tracker
    }

    pub fn percentage(&self) -> Option<f64> {
        self.tracker.percentage()
    }

    pub fn remaining(&self) -> usize {
        self.catalog.remaining()
    }

    pub fn catalog(&self) -> &ItemCatalog {
        &self.catalog
    }
}
