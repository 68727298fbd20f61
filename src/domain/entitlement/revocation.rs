//! Revocation date policy.

use crate::domain::foundation::Timestamp;

use super::calendar::CalendarBoundaries;
use super::errors::EntitlementError;
use super::product_type::ProductType;

/// Maps a product type and "now" to the instant access should end.
///
/// `None` means access is never revoked by the calendar. Payment plans get a rolling
/// one-month window here; a missed installment locks them through the failure path instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RevocationPolicy {
    calendar: CalendarBoundaries,
}

impl RevocationPolicy {
    pub fn new(calendar: CalendarBoundaries) -> Self {
        Self { calendar }
    }

    pub fn calendar(&self) -> &CalendarBoundaries {
        &self.calendar
    }

    /// Revoke-at instant for a known product type.
    pub fn revoke_at(&self, product_type: ProductType, now: &Timestamp) -> Option<Timestamp> {
        match product_type {
            ProductType::Lifetime => None,
            ProductType::Monthly | ProductType::PaymentPlan => {
                Some(self.calendar.next_month_boundary(now))
            }
            ProductType::Yearly => Some(self.calendar.next_year_boundary(now)),
        }
    }

    /// Revoke-at instant for a raw product type string.
    ///
    /// # Errors
    ///
    /// `InvalidProductType` when the string is not a known product type.
    pub fn revoke_at_for(
        &self,
        product_type: &str,
        now: &Timestamp,
    ) -> Result<Option<Timestamp>, EntitlementError> {
        let product_type: ProductType = product_type.parse()?;
        Ok(self.revoke_at(product_type, now))
    }
}
