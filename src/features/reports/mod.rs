//! Waste reports and their handling.
//!
//! ## Lifecycle
//!
//! `Pending → Verified → Assigned → Resolved`. A moderator verifies, a handler
//! accepts (which may skip verification, and reassigns an already assigned
//! report), and the handler holding the latest assignment resolves. Every
//! acceptance appends a row to `report_assignments`; nothing is overwritten.
//! Transition rules live in [`lifecycle`].
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | POST | `/api/reports` | Submit a report (confirmed citizens) |
//! | GET | `/api/reports/latest` | 50 most recent reports |
//! | GET | `/api/reports/mine` | Caller's reports |
//! | GET | `/api/reports/{user,handler}/{id}` | Reports by citizen / by handler |
//! | GET/PUT | `/api/reports/{id}` | Detail / edit while pending |
//! | GET/POST | `/api/reports/{id}/categories` | Category links |
//! | GET/POST | `/api/reports/{id}/comments` | Discussion |
//! | GET/POST | `/api/reports/{id}/images` | Photos |
//! | POST | `/api/reports/{id}/{verify,accept,resolve}` | Lifecycle transitions |
//! | GET | `/api/reports/{id}/assignments` | Handling history |
//! | GET/PATCH | `/api/staff/assignments[/{id}]` | Handler work list / progress |
//! | GET/POST | `/api/staff/resolutions[/{id}]` | Resolution write-ups |

pub mod dtos;
pub mod handlers;
pub mod lifecycle;
pub mod models;
pub mod routes;
pub mod services;

pub use services::{
    CommentService, Geocoder, HandlingService, NominatimGeocoder, ReportImageService,
    ReportService,
};
