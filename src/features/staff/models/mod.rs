mod handler;

pub use handler::{Handler, NewHandler, HANDLER_COLUMNS};
