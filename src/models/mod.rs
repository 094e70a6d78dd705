pub mod bank;
pub mod code;

pub use bank::*;
pub use code::*;
