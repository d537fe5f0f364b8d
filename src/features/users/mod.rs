//! Citizen accounts.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | GET | `/api/users/me` | Own profile |
//! | PUT | `/api/users/me/phone` | Update phone number |
//! | POST/DELETE | `/api/users/me/image` | Upload or remove profile picture |
//! | GET | `/api/admin/users` | List citizens (admin) |
//! | GET | `/api/admin/users/{id}` | Citizen detail (admin) |
//! | PATCH | `/api/admin/users/{id}/active` | Activate/deactivate (admin) |
//! | PATCH | `/api/admin/users/{id}/role` | Assign role (admin) |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
