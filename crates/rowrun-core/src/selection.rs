//! Choice dialog with a confirmation step for the sensitive option.
//!
//! Ordinary choices commit as soon as they are accepted. Accepting the
//! sensitive choice only arms a confirmation; the choice is committed when
//! the user confirms, and declining returns the dialog to choosing.

use serde::{Deserialize, Serialize};

use crate::domain::SelectionError;

/// Choices offered by the standard dialog.
pub const STANDARD_CHOICES: [&str; 3] = ["Choice 1", "Choice 2", "Choice 3"];

/// Choice that needs confirmation in the standard dialog.
pub const STANDARD_SENSITIVE: &str = "Choice 3";

/// Where the dialog currently stands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogState {
    /// Waiting for a choice to be accepted.
    Choosing,
    /// The sensitive choice was accepted and awaits a yes/no.
    AwaitingConfirmation { index: usize },
    /// A choice has been committed; the dialog is done.
    Committed { index: usize },
}

/// Result of accepting a choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcceptOutcome {
    /// The choice is committed.
    Committed(String),
    /// The choice needs confirmation; show `prompt` and call `confirm`.
    NeedsConfirmation { prompt: String },
}

#[derive(Debug, Clone)]
pub struct SelectionDialog {
    choices: Vec<String>,
    sensitive: Option<usize>,
    state: DialogState,
}

impl SelectionDialog {
    pub fn new(
        choices: Vec<String>,
        sensitive: Option<String>,
    ) -> Result<Self, SelectionError> {
        if choices.is_empty() {
            return Err(SelectionError::NoChoices);
        }
        let sensitive = match sensitive {
            Some(name) => Some(
                choices
                    .iter()
                    .position(|c| *c == name)
                    .ok_or(SelectionError::UnknownSensitiveChoice(name))?,
            ),
            None => None,
        };
        Ok(Self {
            choices,
            sensitive,
            state: DialogState::Choosing,
        })
    }

    /// `Choice 1`..`Choice 3`, with `Choice 3` needing confirmation.
    pub fn standard() -> Self {
        Self {
            choices: STANDARD_CHOICES.iter().map(|c| c.to_string()).collect(),
            sensitive: Some(2),
            state: DialogState::Choosing,
        }
    }

    pub fn choices(&self) -> &[String] {
        &self.choices
    }

    pub fn state(&self) -> &DialogState {
        &self.state
    }

    pub fn is_sensitive(&self, index: usize) -> bool {
        self.sensitive == Some(index)
    }

    /// The committed choice, if any.
    pub fn selected(&self) -> Option<&str> {
        match self.state {
            DialogState::Committed { index } => Some(&self.choices[index]),
            _ => None,
        }
    }

    /// Accept the choice at `index` (0-based).
    pub fn accept(&mut self, index: usize) -> Result<AcceptOutcome, SelectionError> {
        match self.state {
            DialogState::Committed { index: done } => {
                return Err(SelectionError::AlreadyCommitted(self.choices[done].clone()))
            }
            DialogState::AwaitingConfirmation { index: pending } => {
                return Err(SelectionError::ConfirmationPending(
                    self.choices[pending].clone(),
                ))
            }
            DialogState::Choosing => {}
        }

        let choice = self
            .choices
            .get(index)
            .cloned()
            .ok_or(SelectionError::OutOfRange {
                index,
                len: self.choices.len(),
            })?;

        if self.is_sensitive(index) {
            self.state = DialogState::AwaitingConfirmation { index };
            Ok(AcceptOutcome::NeedsConfirmation {
                prompt: format!("Are you sure you want to select {choice}?"),
            })
        } else {
            self.state = DialogState::Committed { index };
            Ok(AcceptOutcome::Committed(choice))
        }
    }

    /// Answer a pending confirmation. Returns the committed choice on `yes`.
    pub fn confirm(&mut self, approved: bool) -> Result<Option<String>, SelectionError> {
        let DialogState::AwaitingConfirmation { index } = self.state else {
            return Err(SelectionError::NotAwaitingConfirmation);
        };

        if approved {
            self.state = DialogState::Committed { index };
            Ok(Some(self.choices[index].clone()))
        } else {
            self.state = DialogState::Choosing;
            Ok(None)
        }
    }
}
