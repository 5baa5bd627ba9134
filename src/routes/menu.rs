use axum::{Json, Router, extract::State, routing::get};

use crate::{catalog::MenuCatalog, state::AppState};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_menu))
}

#[utoipa::path(
    get,
    path = "/api/menu",
    responses((status = 200, description = "Restaurant menu", body = MenuCatalog)),
    tag = "Menu"
)]
pub async fn get_menu(State(state): State<AppState>) -> Json<MenuCatalog> {
    Json(state.menu.catalog().clone())
}
