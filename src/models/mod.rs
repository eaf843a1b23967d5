pub mod enums;
pub mod gcim;

pub use enums::*;
pub use gcim::*;
