pub mod catalog;
pub mod channel;

pub use catalog::*;
pub use channel::*;
