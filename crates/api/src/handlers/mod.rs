//! HTTP handler modules, one per resource.

pub mod events;
pub mod health;
pub mod users;
