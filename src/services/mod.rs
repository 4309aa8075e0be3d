pub mod cart_service;
pub mod live_order_service;

pub use cart_service::*;
pub use live_order_service::*;
