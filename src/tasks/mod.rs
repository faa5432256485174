//! Background Tasks Module
//!
//! Contains background tasks that run alongside request handling.
//!
//! # Tasks
//! - Expiry: removes each cache entry when its lifetime has passed

mod expiry;

pub(crate) use expiry::{spawn_expiry_task, ExpiryRequest, ExpirySink};
