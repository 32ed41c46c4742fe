//! Ownership trait for user-owned resources.
//!
//! Every user-initiated operation on an order goes through
//! [`OwnedByUser::check_ownership`]. Webhook-driven transitions skip it: the
//! provider authenticates itself through the payload signature instead.

use super::{DomainError, ErrorCode, UserId};

/// Trait for aggregates that have a single owner.
pub trait OwnedByUser {
    /// Returns the ID of the user who owns this resource.
    fn owner_id(&self) -> &UserId;

    fn is_owner(&self, user_id: &UserId) -> bool {
        self.owner_id() == user_id
    }

    /// Validates ownership, returning a `Forbidden` error if the user is not the owner.
    ///
    /// The error carries both ids as details for audit logging. Boundaries
    /// facing end users are expected to collapse it into a not-found reply.
    fn check_ownership(&self, user_id: &UserId) -> Result<(), DomainError> {
        if self.is_owner(user_id) {
            Ok(())
        } else {
            Err(
                DomainError::new(ErrorCode::Forbidden, "User does not own this resource")
                    .with_detail("owner_id", self.owner_id().to_string())
                    .with_detail("requested_by", user_id.to_string()),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Receipt {
        owner: UserId,
    }

    impl OwnedByUser for Receipt {
        fn owner_id(&self) -> &UserId {
            &self.owner
        }
    }

    #[test]
    fn owner_passes_check() {
        let owner = UserId::new("alice").unwrap();
        let receipt = Receipt { owner: owner.clone() };
        assert!(receipt.check_ownership(&owner).is_ok());
    }

    #[test]
    fn other_user_is_forbidden_with_audit_details() {
        let receipt = Receipt {
            owner: UserId::new("alice").unwrap(),
        };
        let err = receipt
            .check_ownership(&UserId::new("mallory").unwrap())
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::Forbidden);
        assert_eq!(err.details.get("owner_id"), Some(&"alice".to_string()));
        assert_eq!(err.details.get("requested_by"), Some(&"mallory".to_string()));
    }
}
