use crate::connection::ws_index;
use actix_cors::Cors;
use actix_web::web;

pub fn root(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/ws/").route(web::get().to(ws_index)));
}

/// Any origin when `allowed_origin` is unset.
pub fn cors(allowed_origin: Option<&str>) -> Cors {
    match allowed_origin {
        Some(origin) => Cors::default()
            .allowed_origin(origin)
            .allowed_methods(vec!["GET", "POST"]),
        None => Cors::permissive(),
    }
}
