mod reward;

pub use reward::*;
