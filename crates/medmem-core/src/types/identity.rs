//! Session identity.

use serde::{Deserialize, Serialize};

/// The patient a conversation session is bound to.
///
/// A session starts unresolved. Once a name is set it stays fixed for the
/// lifetime of the session; there is no way to clear or replace it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentity {
    #[serde(skip_serializing_if = "Option::is_none")]
    patient_id: Option<String>,
}

impl SessionIdentity {
    /// Create an unresolved identity.
    pub fn unresolved() -> Self {
        Self::default()
    }

    /// Create an identity already bound to a patient.
    pub fn resolved(patient_id: impl Into<String>) -> Self {
        Self {
            patient_id: Some(patient_id.into()),
        }
    }

    /// Whether a patient name is known.
    pub fn is_resolved(&self) -> bool {
        self.patient_id.is_some()
    }

    /// The resolved patient id, if any.
    pub fn patient_id(&self) -> Option<&str> {
        self.patient_id.as_deref()
    }

    /// Bind the identity to a patient. Returns `false` and leaves the
    /// identity untouched if it was already resolved.
    pub(crate) fn bind(&mut self, patient_id: impl Into<String>) -> bool {
        if self.patient_id.is_some() {
            return false;
        }
        self.patient_id = Some(patient_id.into());
        true
    }
}
