pub mod cart;
pub mod coupon;
pub mod engine;
pub mod errors;
pub mod ports;
