//! Pending Guard confirmations awaiting a signed accept or decline.

use strum::{Display, FromRepr};

use crate::error::GuardError;

/// Category of a pending confirmation, as reported on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, FromRepr)]
#[repr(u8)]
pub enum ConfirmationType {
    /// Placeholder for wire values this client does not recognize.
    Unknown = 0,
    /// A generic confirmation with no specialized handling.
    Generic = 1,
    /// An outgoing trade offer.
    Trade = 2,
    /// A market listing.
    Market = 3,
    // Value 4 exists upstream but its meaning is undocumented.
    /// A phone number change.
    PhoneNumberChange = 5,
    /// An account recovery request.
    AccountRecovery = 6,
}

impl ConfirmationType {
    /// Maps a raw wire value, folding unrecognized values into
    /// [`ConfirmationType::Unknown`]. Protocol drift is never fatal: the
    /// value is logged once per occurrence and the confirmation is still
    /// surfaced to the caller.
    #[must_use]
    pub fn from_wire(raw: u8) -> Self {
        Self::from_repr(raw).unwrap_or_else(|| {
            tracing::warn!(raw, "unrecognized confirmation type, treating as unknown");

            Self::Unknown
        })
    }
}

/// A single pending confirmation. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Confirmation {
    id: u64,
    key: u64,
    creator_id: u64,
    kind: ConfirmationType,
}

impl Confirmation {
    /// Builds a confirmation from its wire fields.
    ///
    /// # Errors
    /// Returns [`GuardError::InvalidConfirmationField`] when `id`, `key`, or
    /// `creator_id` is zero; the platform never issues zero identifiers, so
    /// a zero always means a corrupt record.
    pub const fn new(
        id: u64,
        key: u64,
        creator_id: u64,
        kind: ConfirmationType,
    ) -> Result<Self, GuardError> {
        if id == 0 {
            return Err(GuardError::InvalidConfirmationField { field: "id" });
        }

        if key == 0 {
            return Err(GuardError::InvalidConfirmationField { field: "key" });
        }

        if creator_id == 0 {
            return Err(GuardError::InvalidConfirmationField {
                field: "creator_id",
            });
        }

        Ok(Self {
            id,
            key,
            creator_id,
            kind,
        })
    }

    /// Confirmation identifier.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Per-confirmation nonce required when acting on it.
    #[must_use]
    pub const fn key(&self) -> u64 {
        self.key
    }

    /// Identifier of the object that created the confirmation.
    #[must_use]
    pub const fn creator_id(&self) -> u64 {
        self.creator_id
    }

    /// Category of the confirmation.
    #[must_use]
    pub const fn kind(&self) -> ConfirmationType {
        self.kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_fields() {
        assert_eq!(
            Confirmation::new(0, 2, 3, ConfirmationType::Trade),
            Err(GuardError::InvalidConfirmationField { field: "id" })
        );
        assert_eq!(
            Confirmation::new(1, 0, 3, ConfirmationType::Trade),
            Err(GuardError::InvalidConfirmationField { field: "key" })
        );
        assert_eq!(
            Confirmation::new(1, 2, 0, ConfirmationType::Trade),
            Err(GuardError::InvalidConfirmationField { field: "creator_id" })
        );
    }

    #[test]
    fn accepts_positive_fields() {
        let confirmation = Confirmation::new(1, 2, 3, ConfirmationType::Market).unwrap();

        assert_eq!(confirmation.id(), 1);
        assert_eq!(confirmation.key(), 2);
        assert_eq!(confirmation.creator_id(), 3);
        assert_eq!(confirmation.kind(), ConfirmationType::Market);
    }

    #[test]
    fn known_wire_values_round_trip() {
        assert_eq!(ConfirmationType::from_wire(1), ConfirmationType::Generic);
        assert_eq!(ConfirmationType::from_wire(2), ConfirmationType::Trade);
        assert_eq!(ConfirmationType::from_wire(3), ConfirmationType::Market);
        assert_eq!(
            ConfirmationType::from_wire(5),
            ConfirmationType::PhoneNumberChange
        );
        assert_eq!(
            ConfirmationType::from_wire(6),
            ConfirmationType::AccountRecovery
        );
    }

    #[test]
    fn unrecognized_wire_values_fold_into_unknown() {
        for raw in [4, 7, 42, u8::MAX] {
            assert_eq!(ConfirmationType::from_wire(raw), ConfirmationType::Unknown);
        }
    }
}
