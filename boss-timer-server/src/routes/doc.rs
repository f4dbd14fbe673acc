use crate::routes::{bosses, catalog, health, maintenance};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(info(
    title = "boss-timer-server",
    description = "Boss respawn timer API",
    version = "0.1.0"
))]
pub struct ApiDoc;

pub fn get_docs() -> utoipa::openapi::OpenApi {
    let mut root = ApiDoc::openapi();
    root.merge(health::HealthApi::openapi());
    root.merge(bosses::BossesApi::openapi());
    root.merge(maintenance::MaintenanceApi::openapi());
    root.merge(catalog::CatalogApi::openapi());
    root
}
