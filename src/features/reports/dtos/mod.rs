mod comment_dto;
mod handling_dto;
mod report_dto;

pub use comment_dto::*;
pub use handling_dto::*;
pub use report_dto::*;
