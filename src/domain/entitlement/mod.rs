//! Entitlement lifecycle domain.
//!
//! Decides, from billing events, whether a user has paid access and when it ends.
//! Monthly and yearly access ends on calendar boundaries in a reference time zone;
//! payment plans lock immediately on a missed installment; lifetime purchases never
//! expire through billing events.

mod aggregate;
mod calendar;
mod errors;
mod lifecycle;
mod product_type;
mod revocation;
mod status;

pub use aggregate::{
    is_active, BillingReferences, DelinquencyUpdate, Entitlement, EntitlementPatch,
    RevokeAtUpdate, DEFAULT_CURRENCY,
};
pub use calendar::{
    next_month_boundary, next_year_boundary, CalendarBoundaries, DEFAULT_REFERENCE_ZONE,
};
pub use errors::EntitlementError;
pub use lifecycle::{BillingEventKind, EntitlementLifecycle, INVOICE_FAILED, INVOICE_PAID};
pub use product_type::ProductType;
pub use revocation::RevocationPolicy;
pub use status::EntitlementStatus;
