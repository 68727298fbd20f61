//! GetEntitlementHandler - Query handler for a user's entitlement and access.

use serde::Serialize;
use std::sync::Arc;

use crate::domain::entitlement::{is_active, Entitlement, EntitlementError};
use crate::domain::foundation::{Timestamp, UserId};
use crate::ports::EntitlementRepository;

#[derive(Debug, Clone)]
pub struct GetEntitlementQuery {
    pub user_id: UserId,
}

/// Stored entitlement plus the access decision at query time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntitlementView {
    #[serde(flatten)]
    pub entitlement: Entitlement,
    pub is_active: bool,
}

/// Returns `None` if the user has no entitlement.
pub type GetEntitlementResult = Option<EntitlementView>;

pub struct GetEntitlementHandler {
    repository: Arc<dyn EntitlementRepository>,
}

impl GetEntitlementHandler {
    pub fn new(repository: Arc<dyn EntitlementRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(
        &self,
        query: GetEntitlementQuery,
    ) -> Result<GetEntitlementResult, EntitlementError> {
        self.handle_at(query, Timestamp::now()).await
    }

    /// Same as [`handle`](Self::handle) with an explicit clock.
    pub async fn handle_at(
        &self,
        query: GetEntitlementQuery,
        now: Timestamp,
    ) -> Result<GetEntitlementResult, EntitlementError> {
        let entitlement = self.repository.find_by_user_id(&query.user_id).await?;
        let active = is_active(entitlement.as_ref(), &now);
        Ok(entitlement.map(|entitlement| EntitlementView {
            entitlement,
            is_active: active,
        }))
    }
}
