pub mod coupons;

use actix_web::web;

use crate::errors::AppError;

/// Register the coupon routes, with JSON body errors reported the same way
/// as every other error.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .service(
        web::scope("/coupons")
            .route("", web::post().to(coupons::create_coupon))
            .route("", web::get().to(coupons::list_coupons))
            .route("/{code}", web::get().to(coupons::get_coupon)),
    )
    .route("/best-coupon", web::post().to(coupons::best_coupon));
}
