pub mod v1;

use crate::settings;

/// Strict allow-list: origins outside the configured set get no CORS
/// headers at all.
pub fn cors_policy(cfg: &settings::Cors) -> warp::filters::cors::Cors {
    let mut cors = warp::cors()
        .allow_methods(vec!["GET", "POST", "DELETE"])
        .allow_headers(vec!["content-type", "authorization"]);
    for origin in &cfg.allowed_origins {
        cors = cors.allow_origin(origin.as_str());
    }
    cors.build()
}
