use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{QuizError, Result};
use crate::metadata::{
    validate, Image, InvalidReason, ItemDetails, MetadataReader, RawMetadata, ValidationOutcome,
};
use crate::report::{Exclusion, ValidationReport};
use crate::source::{display_name, CatalogSource};

/// Stable handle to an item owned by an [`ItemCatalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemHandle(usize);

impl ItemHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One recording in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub path: PathBuf,
    pub name: String,
    /// Filled in by a successful validation pass.
    pub details: Option<ItemDetails>,
    pub image: Option<Image>,
}

impl Item {
    fn new(path: PathBuf) -> Self {
        Self {
            name: display_name(&path),
            path,
            details: None,
            image: None,
        }
    }
}

/// Owner of every discovered item, the subset that passed validation, and
/// the working subset the current session still draws from.
#[derive(Debug, Clone)]
pub struct ItemCatalog {
    items: Vec<Item>,
    eligible: Vec<ItemHandle>,
    working: Vec<ItemHandle>,
    report: Option<ValidationReport>,
}

impl ItemCatalog {
    /// Enumerate the source in sorted order.
    pub fn build<S: CatalogSource + ?Sized>(source: &S) -> Result<Self> {
        let mut paths = source.list()?;
        paths.sort();
        paths.dedup();

        if paths.is_empty() {
            return Err(QuizError::NoItemsFound(source.location()));
        }
        info!("found {} sound files in {}", paths.len(), source.location().display());

        Ok(Self {
            items: paths.into_iter().map(Item::new).collect(),
            eligible: Vec::new(),
            working: Vec::new(),
            report: None,
        })
    }

    /// Validate every item once and fill the eligible and working sets.
    ///
    /// Metadata that cannot be read is treated as absent. Calling this again
    /// returns the first outcome without touching the reader.
    pub fn run_validation_pass<R: MetadataReader + ?Sized>(
        &mut self,
        reader: &R,
    ) -> Result<ValidationReport> {
        if let Some(report) = &self.report {
            if self.eligible.is_empty() {
                return Err(QuizError::AllItemsInvalid {
                    checked: report.checked,
                });
            }
            return Ok(report.clone());
        }

        let mut report = ValidationReport::new(self.items.len());
        let mut eligible = Vec::with_capacity(self.items.len());

        for (idx, item) in self.items.iter_mut().enumerate() {
            let raw = reader.read(&item.path).unwrap_or_else(|err| {
                warn!("{err}");
                RawMetadata::default()
            });

            match validate(&raw) {
                ValidationOutcome::Valid(details) => {
                    item.details = Some(details);
                    item.image = raw.image;
                    eligible.push(ItemHandle(idx));
                }
                ValidationOutcome::Invalid(reason) => {
                    warn!("{}: {}", item.path.display(), reason);
                    report.exclusions.push(Exclusion {
                        path: item.path.clone(),
                        reason,
                    });
                }
            }
        }

        info!(
            "{} of {} sound files are eligible for the quiz",
            eligible.len(),
            self.items.len()
        );

        self.eligible = eligible;
        self.working = self.eligible.clone();
        self.report = Some(report.clone());

        if self.eligible.is_empty() {
            return Err(QuizError::AllItemsInvalid {
                checked: self.items.len(),
            });
        }
        Ok(report)
    }

    pub fn reset_working_set(&mut self) {
        self.working = self.eligible.clone();
    }

    /// Take an item out of the rotation for the rest of the session.
    /// Returns whether it was still in the working set.
    pub fn remove_from_working(&mut self, handle: ItemHandle) -> bool {
        match self.working.iter().position(|h| *h == handle) {
            Some(pos) => {
                self.working.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn working_set(&self) -> &[ItemHandle] {
        &self.working
    }

    pub fn remaining(&self) -> usize {
        self.working.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.working.is_empty()
    }

    pub fn eligible(&self) -> &[ItemHandle] {
        &self.eligible
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn report(&self) -> Option<&ValidationReport> {
        self.report.as_ref()
    }

    pub fn item(&self, handle: ItemHandle) -> Result<&Item> {
        self.items
            .get(handle.0)
            .ok_or(QuizError::UnknownItem(handle))
    }

    pub fn find(&self, path: &Path) -> Option<ItemHandle> {
        self.items
            .iter()
            .position(|item| item.path == path)
            .map(ItemHandle)
    }

    /// Reason an item was excluded, if it was.
    pub fn exclusion_reason(&self, handle: ItemHandle) -> Option<InvalidReason> {
        let item = self.items.get(handle.0)?;
        self.report.as_ref()?.reason_for(&item.path)
    }
}
