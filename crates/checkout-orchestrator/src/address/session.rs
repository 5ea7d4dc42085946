use crate::error::AddressError;
use crate::model::{AddressPatch, AddressSnapshot};
use serde::Serialize;

/// An in-progress address correction.
///
/// Holds the address as it was when the edit began, a dirty copy the user types
/// into, and an error slot for the last failed save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditSession {
    original: AddressSnapshot,
    draft: AddressSnapshot,
    error: Option<String>,
    saving: bool,
}

impl EditSession {
    pub(crate) fn new(original: AddressSnapshot) -> Self {
        Self {
            draft: original.clone(),
            original,
            error: None,
            saving: false,
        }
    }

    /// The address the edit started from.
    pub fn original(&self) -> &AddressSnapshot {
        &self.original
    }

    pub fn draft(&self) -> &AddressSnapshot {
        &self.draft
    }

    /// Message of the last failed save, cleared by the next attempt.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn is_dirty(&self) -> bool {
        self.draft != self.original
    }

    pub(crate) fn apply(&mut self, patch: AddressPatch) -> Result<(), AddressError> {
        if self.saving {
            return Err(AddressError::CommitPending);
        }
        self.draft.apply(patch);
        Ok(())
    }

    pub(crate) fn begin_save(&mut self) -> Result<AddressSnapshot, AddressError> {
        if self.saving {
            return Err(AddressError::CommitPending);
        }
        self.saving = true;
        self.error = None;
        Ok(self.draft.clone())
    }

    pub(crate) fn fail_save(&mut self, message: &str) {
        self.saving = false;
        self.error = Some(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_save_while_pending_is_refused() {
        let mut session = EditSession::new(AddressSnapshot::empty("US", "AL"));
        session.begin_save().unwrap();

        assert_eq!(session.begin_save().unwrap_err(), AddressError::CommitPending);
        assert_eq!(
            session.apply(AddressPatch::default()).unwrap_err(),
            AddressError::CommitPending
        );
    }

    #[test]
    fn test_retry_clears_previous_error() {
        let mut session = EditSession::new(AddressSnapshot::empty("US", "AL"));
        session.begin_save().unwrap();
        session.fail_save("boom");
        assert_eq!(session.error(), Some("boom"));

        session.begin_save().unwrap();
        assert_eq!(session.error(), None);
    }
}
