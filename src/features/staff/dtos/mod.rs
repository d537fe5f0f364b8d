mod handler_dto;

pub use handler_dto::*;
