pub mod geocoding_service;

mod comment_service;
mod handling_service;
mod report_image_service;
mod report_service;

pub use comment_service::CommentService;
pub use geocoding_service::{Geocoder, NominatimGeocoder};
pub use handling_service::HandlingService;
pub use report_image_service::ReportImageService;
pub use report_service::ReportService;
