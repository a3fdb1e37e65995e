//! Route table.

pub mod health;
mod products;

use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(web::resource("/health").get(health::health_check))
            // `/search` is registered before `/{id}` so it is never read as an id
            .service(
                web::scope("/products")
                    .service(web::resource("/search").get(products::search))
                    .service(web::resource("/{id}").get(products::detail)),
            ),
    );
}
