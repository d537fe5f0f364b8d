//! Storage module for uploaded images
//!
//! Profile pictures and report photos are stored on the local filesystem,
//! one folder per owner kind.

mod local_storage;

pub use local_storage::{read_images, read_single_image, LocalStorage, UploadedImage};
