//! Entitlement repository port.
//!
//! # Design
//!
//! - **One row per user**: unique constraint on `user_id`
//! - **Merge-patch upsert**: only fields present in the patch are written
//! - **Atomic**: insert-or-update happens in one statement, so concurrent deliveries
//!   for the same user cannot lose an update (including delinquency increments)
//!
//! # Example
//!
//! ```ignore
//! async fn mark_paid(
//!     repo: &dyn EntitlementRepository,
//!     user_id: &UserId,
//! ) -> Result<Entitlement, DomainError> {
//!     let patch = EntitlementPatch::new()
//!         .status(EntitlementStatus::Active)
//!         .last_invoice_status("paid");
//!     repo.upsert(user_id, &patch).await
//! }
//! ```

use async_trait::async_trait;

use crate::domain::entitlement::{Entitlement, EntitlementPatch};
use crate::domain::foundation::{DomainError, UserId};

use super::ClaimToken;

#[async_trait]
pub trait EntitlementRepository: Send + Sync {
    /// Creates the user's row from `patch` plus defaults, or merges `patch` into it.
    ///
    /// Returns the row as stored after the write. `updated_at` is refreshed on every call.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure (not retried here)
    async fn upsert(
        &self,
        user_id: &UserId,
        patch: &EntitlementPatch,
    ) -> Result<Entitlement, DomainError>;

    /// Same as [`upsert`](Self::upsert), and marks the webhook claim `applied` in the same
    /// transaction.
    ///
    /// Nothing is written unless `claim` still holds a `processing` claim, so a delivery
    /// that times out after the commit cannot be applied again by its redelivery.
    ///
    /// # Errors
    ///
    /// - `Conflict` if the claim was taken over or already completed
    /// - `DatabaseError` on persistence failure
    async fn upsert_claimed(
        &self,
        user_id: &UserId,
        patch: &EntitlementPatch,
        claim: &ClaimToken,
    ) -> Result<Entitlement, DomainError>;

    /// Find the entitlement for a user.
    ///
    /// Returns `None` if the user never had a billing event.
    async fn find_by_user_id(&self, user_id: &UserId) -> Result<Option<Entitlement>, DomainError>;
}
