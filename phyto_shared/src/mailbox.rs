//! Single-slot operator channel between the labeling interface and the engine.
//!
//! The operator side writes a pending label or organism request at any time;
//! the engine drains both slots exactly once per tick. A newer submission
//! replaces an unconsumed older one.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::state::PlantState;

#[derive(Debug, Default)]
struct Slots {
    label: Option<PlantState>,
    organism: Option<String>,
}

/// Cloneable handle to the shared label/organism slots.
#[derive(Debug, Clone, Default)]
pub struct Mailbox {
    slots: Arc<Mutex<Slots>>,
}

/// Rejections raised by [`Mailbox`] submissions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailboxError {
    /// The label is not one of the six classifiable state names.
    UnknownLabel { name: String },
    /// The organism name was empty.
    EmptyOrganism,
    /// The shared slots were poisoned by a panicking holder.
    Unavailable,
}

impl fmt::Display for MailboxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MailboxError::UnknownLabel { name } => {
                write!(f, "label '{}' is not a classifiable state", name)
            }
            MailboxError::EmptyOrganism => write!(f, "organism name must not be empty"),
            MailboxError::Unavailable => write!(f, "mailbox is poisoned"),
        }
    }
}

impl std::error::Error for MailboxError {}

impl Mailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a user label for the next tick.
    ///
    /// Names outside the six classifiable states (including `unknown`) are
    /// rejected and leave any pending label untouched. A poisoned mailbox
    /// drops nothing silently: the submission fails with
    /// [`MailboxError::Unavailable`].
    pub fn submit_label(&self, name: &str) -> Result<PlantState, MailboxError> {
        let state = match name.parse::<PlantState>() {
            Ok(state) if state.is_known() => state,
            _ => {
                tracing::warn!("rejected label submission '{}'", name);
                return Err(MailboxError::UnknownLabel {
                    name: name.to_string(),
                });
            }
        };

        let mut slots = self.lock_for_submit()?;
        slots.label = Some(state);
        Ok(state)
    }

    /// Queue an organism profile switch for the next tick.
    ///
    /// The engine validates the name against its profile registry when it
    /// drains the slot.
    pub fn request_organism(&self, name: &str) -> Result<(), MailboxError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(MailboxError::EmptyOrganism);
        }
        let mut slots = self.lock_for_submit()?;
        slots.organism = Some(trimmed.to_string());
        Ok(())
    }

    fn lock_for_submit(&self) -> Result<MutexGuard<'_, Slots>, MailboxError> {
        self.slots.lock().map_err(|_| {
            tracing::warn!("mailbox poisoned; submission dropped");
            MailboxError::Unavailable
        })
    }

    /// Drain the pending label, if any. A poisoned lock reads as empty.
    pub fn take_label(&self) -> Option<PlantState> {
        self.slots.lock().ok().and_then(|mut slots| slots.label.take())
    }

    /// Drain the pending organism request, if any.
    pub fn take_organism(&self) -> Option<String> {
        self.slots
            .lock()
            .ok()
            .and_then(|mut slots| slots.organism.take())
    }

    /// True when a label is waiting to be consumed.
    pub fn has_pending_label(&self) -> bool {
        self.slots
            .lock()
            .map(|slots| slots.label.is_some())
            .unwrap_or(false)
    }
}
