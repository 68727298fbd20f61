//! CRM Entitlements - paid-access lifecycle for a white-label CRM.
//!
//! Payment webhooks from Stripe and Zaxaa drive a one-row-per-user entitlement record
//! that says whether a subscriber has access and when it ends. A small text
//! generation service sits alongside, routing prompts through a prioritized provider chain.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
