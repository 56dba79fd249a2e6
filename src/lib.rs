pub mod application;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;

use actix_web::{middleware::Logger, web, App, HttpServer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use application::CouponService;
pub use infrastructure::InMemoryCouponRepository;

/// The service shared by every worker. Its store is created empty at startup
/// and discarded when the process exits.
pub type AppState = CouponService<InMemoryCouponRepository>;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Coupon Service",
        description = "Manage promotional coupons and find the best one for a cart."
    ),
    paths(
        handlers::coupons::create_coupon,
        handlers::coupons::list_coupons,
        handlers::coupons::get_coupon,
        handlers::coupons::best_coupon,
    ),
    components(schemas(
        handlers::coupons::DiscountType,
        handlers::coupons::CustomerRulesDto,
        handlers::coupons::CreateCouponRequest,
        handlers::coupons::CouponResponse,
        handlers::coupons::CartItemRequest,
        handlers::coupons::CartRequest,
        handlers::coupons::CustomerRequest,
        handlers::coupons::BestCouponRequest,
        handlers::coupons::BestCouponResponse,
    )),
    tags((name = "coupons", description = "Coupon management and selection"))
)]
pub struct ApiDoc;

/// A fresh service over an empty in-memory store.
pub fn new_state() -> web::Data<AppState> {
    web::Data::new(CouponService::new(InMemoryCouponRepository::new()))
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    state: web::Data<AppState>,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let openapi = ApiDoc::openapi();

    Ok(HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .configure(handlers::routes)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi.clone()),
            )
    })
    .bind((host.to_string(), port))?
    .run())
}
