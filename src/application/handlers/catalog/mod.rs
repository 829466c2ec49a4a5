//! Catalog query handlers.

mod get_availability;

pub use get_availability::{AvailabilityError, GetAvailabilityHandler, GetAvailabilityQuery};
