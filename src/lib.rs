//! # Dice Duel
//!
//! A single-player over/under dice game served over HTTP.
//!
//! ## Overview
//!
//! The player picks a threshold in `1..=100` and a condition (`Over` or
//! `Under`), then plays a round: a hundred-sided die is rolled and the round
//! is won when the roll lands strictly on the chosen side of the threshold.
//! The last ten rounds are kept, most recent first, and saved after every
//! round so they survive restarts.
//!
//! ## Architecture
//!
//! The game logic lives in plain modules ([`round`], [`dice`], [`history`],
//! [`session`]) that know nothing about HTTP. The Rocket layer holds a single
//! [`session::GameSession`] behind an `Arc<Mutex<T>>` and exposes it with
//! OpenAPI documentation.

#[macro_use]
extern crate rocket;

use rocket_okapi::openapi_get_routes;
use rocket_okapi::swagger_ui::{make_swagger_ui, SwaggerUIConfig};

pub mod config;
pub mod dice;
pub mod error;
pub mod history;
pub mod round;
pub mod session;
pub mod status_messages;

use crate::config::GameConfig;
use crate::session::GameSession;

/// Builds the Rocket server with settings read from the environment.
///
/// # Example
///
/// ```no_run
/// use dice_duel::rocket_initialize;
///
/// #[rocket::main]
/// async fn main() {
///     rocket_initialize().launch().await.expect("Failed to launch rocket");
/// }
/// ```
pub fn rocket_initialize() -> rocket::Rocket<rocket::Build> {
    rocket_initialize_with(GameConfig::from_env())
}

/// Builds the Rocket server around a session created from `config`.
pub fn rocket_initialize_with(config: GameConfig) -> rocket::Rocket<rocket::Build> {
    use crate::session::endpoints::{
        get_game, get_history, okapi_add_operation_for_get_game_,
        okapi_add_operation_for_get_history_, okapi_add_operation_for_play_,
        okapi_add_operation_for_set_condition_, okapi_add_operation_for_set_seed_,
        okapi_add_operation_for_set_threshold_, play, set_condition, set_seed, set_threshold,
    };

    #[allow(clippy::no_effect_underscore_binding)]
    let _ = env_logger::try_init();

    log::info!(
        "history stored in {} under '{}', roll delay {:?}",
        config.history_dir.display(),
        config.storage_key,
        config.roll_delay
    );
    let session = std::sync::Arc::new(std::sync::Mutex::new(GameSession::from_config(&config)));

    rocket::build()
        .mount(
            "/",
            openapi_get_routes![
                get_game,
                get_history,
                set_threshold,
                set_condition,
                play,
                set_seed
            ],
        )
        .mount("/swagger", make_swagger_ui(&get_docs()))
        .manage(session)
}

fn get_docs() -> SwaggerUIConfig {
    SwaggerUIConfig {
        url: "/openapi.json".to_string(),
        ..Default::default()
    }
}
