//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents accidentally passing a `MemberId` where an `AccountId` is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Creates a new random ID using UUID v7 (time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates an ID from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

typed_id!(UserId, "Unique identifier for a staff user processing transactions.");
typed_id!(MemberId, "Unique identifier for a SACCO member.");
typed_id!(AccountId, "Unique identifier for a member account wrapper.");
typed_id!(SavingsAccountId, "Unique identifier for a savings (or wallet) accountable.");
typed_id!(LoanAccountId, "Unique identifier for a loan accountable.");
typed_id!(ShareAccountId, "Unique identifier for a share accountable.");
typed_id!(LoanId, "Unique identifier for a loan.");
typed_id!(LoanRepaymentId, "Unique identifier for a loan repayment record.");
typed_id!(ShareCertificateId, "Unique identifier for a share certificate.");
typed_id!(TransactionId, "Unique identifier for a transaction.");
typed_id!(LedgerEntryId, "Unique identifier for a general ledger entry.");
typed_id!(BatchId, "Correlation identifier for one ledger posting batch.");

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_typed_id_from_uuid() {
        let uuid = Uuid::new_v4();
        let id = MemberId::from_uuid(uuid);
        assert_eq!(id.into_inner(), uuid);
    }

    #[test]
    fn test_typed_id_display() {
        let uuid = Uuid::new_v4();
        let id = TransactionId::from_uuid(uuid);
        assert_eq!(id.to_string(), uuid.to_string());
    }

    #[test]
    fn test_typed_id_from_str() {
        let uuid = Uuid::new_v4();
        let id = AccountId::from_str(&uuid.to_string()).unwrap();
        assert_eq!(id.into_inner(), uuid);
        assert!(BatchId::from_str("invalid").is_err());
    }

    #[test]
    fn test_typed_ids_are_time_ordered() {
        let first = LedgerEntryId::new();
        let second = LedgerEntryId::new();
        assert!(first <= second);
    }
}
