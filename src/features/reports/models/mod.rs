mod comment;
mod report;
mod report_assignment;
mod report_category;
mod report_image;
mod report_resolution;

pub use comment::*;
pub use report::*;
pub use report_assignment::*;
pub use report_category::*;
pub use report_image::*;
pub use report_resolution::*;
