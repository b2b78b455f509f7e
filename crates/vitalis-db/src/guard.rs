//! Ownership authorization for mutations.
//!
//! The guard runs before a transaction is opened, so a denial never touches
//! the store. Policy is strict equality between actor and owner; there is no
//! administrative override.

use vitalis_core::identity::ActorId;

use crate::error::DatabaseError;

#[derive(Debug, Clone, Copy, Default)]
pub struct OwnershipGuard;

impl OwnershipGuard {
    /// Allow the mutation only if `actor` owns the target.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Authorization` when `actor != owner`.
    pub fn authorize(
        self,
        actor: &ActorId,
        owner: &ActorId,
        public_id: &str,
    ) -> Result<(), DatabaseError> {
        if actor == owner {
            return Ok(());
        }
        tracing::warn!(
            actor = %actor,
            public_id,
            "ownership check denied mutation"
        );
        Err(DatabaseError::Authorization {
            actor: actor.clone(),
            public_id: public_id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_is_allowed() {
        let u1 = ActorId::new("user_1");
        assert!(OwnershipGuard.authorize(&u1, &u1.clone(), "lab-1").is_ok());
    }

    #[test]
    fn non_owner_is_denied() {
        let err = OwnershipGuard
            .authorize(&ActorId::new("user_2"), &ActorId::new("user_1"), "lab-1")
            .unwrap_err();
        match err {
            DatabaseError::Authorization { actor, public_id } => {
                assert_eq!(actor.as_str(), "user_2");
                assert_eq!(public_id, "lab-1");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn comparison_is_exact() {
        let err = OwnershipGuard.authorize(
            &ActorId::new("User_1"),
            &ActorId::new("user_1"),
            "lab-1",
        );
        assert!(err.is_err());
    }
}
