//! SACCO member types.

use sacco_shared::types::MemberId;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    /// Registered but not yet activated.
    Pending,
    /// Active member allowed to transact.
    Active,
    /// Temporarily barred from transacting.
    Suspended,
    /// Has left the cooperative.
    Exited,
}

/// Outcome of the membership approval workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipStatus {
    /// Awaiting approval.
    Pending,
    /// Approved by the board.
    Approved,
    /// Rejected.
    Rejected,
}

/// A member of the cooperative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    /// Unique identifier.
    pub id: MemberId,
    /// Human-readable member number.
    pub member_number: String,
    /// Member's full name.
    pub full_name: String,
    /// Lifecycle status.
    pub status: MemberStatus,
    /// Membership approval status.
    pub membership_status: MembershipStatus,
}

impl Member {
    /// Returns true if the member may transact outside onboarding flows.
    #[must_use]
    pub fn can_transact(&self) -> bool {
        self.status == MemberStatus::Active && self.membership_status == MembershipStatus::Approved
    }
}

string_enum!(MemberStatus {
    Pending => "pending",
    Active => "active",
    Suspended => "suspended",
    Exited => "exited",
});

string_enum!(MembershipStatus {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
});

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn member(status: MemberStatus, membership_status: MembershipStatus) -> Member {
        Member {
            id: MemberId::new(),
            member_number: "M-0001".to_string(),
            full_name: "Test Member".to_string(),
            status,
            membership_status,
        }
    }

    #[test]
    fn test_can_transact() {
        assert!(member(MemberStatus::Active, MembershipStatus::Approved).can_transact());
        assert!(!member(MemberStatus::Pending, MembershipStatus::Approved).can_transact());
        assert!(!member(MemberStatus::Active, MembershipStatus::Pending).can_transact());
        assert!(!member(MemberStatus::Suspended, MembershipStatus::Approved).can_transact());
    }

    #[test]
    fn test_status_round_trip_strings() {
        assert_eq!(MemberStatus::from_str("exited").unwrap(), MemberStatus::Exited);
        assert_eq!(MembershipStatus::Approved.to_string(), "approved");
        assert!(MemberStatus::from_str("unknown").is_err());
    }
}
