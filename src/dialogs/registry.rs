//! Dialog registry — typed lookup from [`DialogId`] to its definition.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{ConfigError, DialogError};
use crate::nlu::IntentRecognizer;
use crate::timex::TemporalResolver;

use super::booking::BookingDialog;
use super::date_resolver::DateResolverDialog;
use super::main_dialog::MainDialog;
use super::waterfall::Dialog;
use super::DialogId;

/// Every dialog a conversation may push, plus the shared temporal resolver
/// prompts recognize dates with.
pub struct DialogSet {
    dialogs: HashMap<DialogId, Box<dyn Dialog>>,
    temporal: Arc<dyn TemporalResolver>,
}

impl DialogSet {
    /// The booking bot's dialogs: main flow, booking flow, date resolution.
    pub fn booking_bot(
        recognizer: Arc<dyn IntentRecognizer>,
        temporal: Arc<dyn TemporalResolver>,
    ) -> Result<Self, ConfigError> {
        DialogSetBuilder::new(temporal.clone())
            .add(Box::new(DateResolverDialog::new(temporal.clone())))
            .add(Box::new(BookingDialog::new(temporal.clone())))
            .add(Box::new(MainDialog::new(recognizer, temporal)))
            .build()
    }

    pub fn get(&self, id: DialogId) -> Result<&dyn Dialog, DialogError> {
        self.dialogs
            .get(&id)
            .map(|d| d.as_ref())
            .ok_or(DialogError::UnknownDialog(id))
    }

    pub fn contains(&self, id: DialogId) -> bool {
        self.dialogs.contains_key(&id)
    }

    pub fn temporal(&self) -> &dyn TemporalResolver {
        self.temporal.as_ref()
    }

    pub fn len(&self) -> usize {
        self.dialogs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dialogs.is_empty()
    }
}

/// Collects dialogs and checks the wiring before anything runs.
pub struct DialogSetBuilder {
    dialogs: HashMap<DialogId, Box<dyn Dialog>>,
    duplicate: Option<DialogId>,
    temporal: Arc<dyn TemporalResolver>,
}

impl DialogSetBuilder {
    pub fn new(temporal: Arc<dyn TemporalResolver>) -> Self {
        Self {
            dialogs: HashMap::new(),
            duplicate: None,
            temporal,
        }
    }

    pub fn add(mut self, dialog: Box<dyn Dialog>) -> Self {
        let id = dialog.id();
        if self.dialogs.insert(id, dialog).is_some() && self.duplicate.is_none() {
            self.duplicate = Some(id);
        }
        self
    }

    /// Fails on a duplicate id or on a dialog whose children are missing.
    pub fn build(self) -> Result<DialogSet, ConfigError> {
        if let Some(id) = self.duplicate {
            return Err(ConfigError::DuplicateDialog(id));
        }
        for (parent, dialog) in &self.dialogs {
            if let Some(child) = dialog
                .children()
                .iter()
                .find(|child| !self.dialogs.contains_key(child))
            {
                return Err(ConfigError::MissingDialog {
                    parent: *parent,
                    child: *child,
                });
            }
        }
        tracing::debug!(dialogs = self.dialogs.len(), "Dialog set built");
        Ok(DialogSet {
            dialogs: self.dialogs,
            temporal: self.temporal,
        })
    }
}
