//! Municipal staff ("handler") accounts.
//!
//! Handlers register through `/api/auth/register/handler` and must be approved
//! by an administrator before they can take on reports. Report handling
//! itself lives in the reports feature.

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
