use rand::rngs::ThreadRng;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::catalog::ItemHandle;
use crate::error::{QuizError, Result};

/// Redraws allowed before a repeat of the previous item is accepted.
pub const DEFAULT_MAX_REDRAWS: usize = 100;

/// Draw uniformly from `working`, avoiding `previous` whenever another item
/// is available.
///
/// After `max_redraws` draws that all hit `previous` the repeat is accepted.
/// Calling this with an empty working set is a caller bug.
pub fn select_next<R: Rng + ?Sized>(
    rng: &mut R,
    working: &[ItemHandle],
    previous: Option<ItemHandle>,
    max_redraws: usize,
) -> Result<ItemHandle> {
    debug_assert!(
        !working.is_empty(),
        "select_next called on an empty working set"
    );
    let mut pick = *working.choose(rng).ok_or(QuizError::EmptyWorkingSet)?;

    if working.len() > 1 {
        let mut redraws = 0;
        while Some(pick) == previous && redraws < max_redraws {
            pick = *working.choose(rng).ok_or(QuizError::EmptyWorkingSet)?;
            redraws += 1;
        }
        if Some(pick) == previous {
            debug!("accepting repeat of {pick:?} after {redraws} redraws");
        }
    }

    Ok(pick)
}

/// Stateful selector that remembers the last item it handed out.
#[derive(Debug, Clone)]
pub struct SelectionEngine<R = ThreadRng> {
    rng: R,
    max_redraws: usize,
    last_selected: Option<ItemHandle>,
}

impl SelectionEngine<ThreadRng> {
    pub fn new(max_redraws: usize) -> Self {
        Self::with_rng(rand::thread_rng(), max_redraws)
    }
}

impl Default for SelectionEngine<ThreadRng> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REDRAWS)
    }
}

impl<R: Rng> SelectionEngine<R> {
    pub fn with_rng(rng: R, max_redraws: usize) -> Self {
        Self {
            rng,
            max_redraws,
            last_selected: None,
        }
    }

    pub fn select_next(&mut self, working: &[ItemHandle]) -> Result<ItemHandle> {
        let pick = select_next(&mut self.rng, working, self.last_selected, self.max_redraws)?;
        debug!("selected {pick:?} from {} candidates", working.len());
        self.last_selected = Some(pick);
        Ok(pick)
    }

    pub fn last_selected(&self) -> Option<ItemHandle> {
        self.last_selected
    }
}
