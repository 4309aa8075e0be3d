pub mod catalog;
pub mod notice;
pub mod order;

pub use catalog::*;
pub use notice::*;
pub use order::*;
