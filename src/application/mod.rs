pub mod coupon_service;

pub use coupon_service::CouponService;
