//! Trailpass - Day-Package Booking Backend
//!
//! This crate implements tiered package pricing (weekday/weekend categories
//! with date-range overrides) and a purchase lifecycle kept consistent across
//! a hosted-checkout payment flow: initiation, user return, provider webhook.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
