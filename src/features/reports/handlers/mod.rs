pub mod comment_handler;
pub mod handling_handler;
pub mod image_handler;
pub mod report_handler;
