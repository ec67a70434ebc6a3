use crate::handlers::{self, analytics, auth, bets, bookmakers, favorites, imports};
use crate::settings::Settings;
use crate::state::AppState;
use axum::{
    http::{HeaderValue, Method},
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

fn cors_layer(settings: &Settings) -> CorsLayer {
    let origins: Vec<HeaderValue> = settings
        .cors_origins()
        .into_iter()
        .filter_map(|origin| match HeaderValue::from_str(&origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("ignoring invalid CORS origin '{origin}'");
                None
            }
        })
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::mirror_request()
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/auth/currency", patch(auth::update_currency))
        .route("/bets", get(bets::list_bets).post(bets::create_bet))
        .route("/bets/page", get(bets::page_bets))
        .route("/bets/recent", get(bets::recent_bets))
        .route(
            "/bets/export",
            get(imports::export_all).post(imports::export_filtered),
        )
        .route("/bets/import", post(imports::import_csv))
        .route("/bets/import/coolbet", post(imports::import_coolbet))
        .route(
            "/bets/:bet_id",
            patch(bets::update_bet).delete(bets::delete_bet),
        )
        .route("/analytics/stats", get(analytics::stats))
        .route("/analytics/chart", get(analytics::chart))
        .route("/analytics/calendar", get(analytics::calendar_month))
        .route("/analytics/bookmakers", get(analytics::bookmakers))
        .route("/analytics/tipsters", get(analytics::tipsters))
        .route("/analytics/sports", get(analytics::sports))
        .route("/analytics/odds-range", get(analytics::odds_ranges))
        .route("/analytics/report", get(analytics::report))
        .route(
            "/bookmakers",
            get(bookmakers::list_bookmakers).post(bookmakers::create_bookmaker),
        )
        .route("/bookmakers/:bookmaker_id", delete(bookmakers::delete_bookmaker))
        .route(
            "/tipsters",
            get(bookmakers::list_tipsters).post(bookmakers::create_tipster),
        )
        .route("/tipsters/:tipster_id", delete(bookmakers::delete_tipster))
        .route(
            "/favorites/teams",
            get(favorites::list_favorites).post(favorites::add_favorite),
        )
        .route("/favorites/teams/:team_id", delete(favorites::remove_favorite))
        .route("/favorites/upcoming-matches", get(favorites::upcoming_matches))
        .route("/teams/search", get(favorites::search_teams))
}

pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.settings);
    Router::new()
        .nest("/api", api_routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
