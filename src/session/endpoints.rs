use std::sync::{Arc, Mutex, MutexGuard};

use rocket::response::status::{BadRequest, Conflict};
use rocket::serde::json::Json;
use rocket::serde::{Deserialize, Serialize};
use rocket::State;
use rocket_okapi::{openapi, JsonSchema};

use super::{GameSession, GameSnapshot, RoundOutcome};
use crate::history::HistoryLog;
use crate::round::{Condition, Threshold};
use crate::status_messages::{new_status, Status};

pub type SharedSession = Arc<Mutex<GameSession>>;

/// Locks are only held for in-memory work or inside `spawn_blocking`,
/// never across an `.await`.
pub fn lock_session(session: &Mutex<GameSession>) -> MutexGuard<'_, GameSession> {
    match session.lock() {
        Ok(g) => g,
        Err(e) => e.into_inner(),
    }
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct ThresholdRequest {
    pub threshold: i64,
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct ConditionRequest {
    pub condition: Condition,
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct SeedRequest {
    pub seed: u64,
}

/// Current settings, last result and verdict, rolling flag and history.
#[openapi]
#[get("/game")]
pub async fn get_game(session: &State<SharedSession>) -> Json<GameSnapshot> {
    Json(lock_session(session).snapshot())
}

#[openapi]
#[get("/game/history")]
pub async fn get_history(session: &State<SharedSession>) -> Json<HistoryLog> {
    Json(lock_session(session).history().clone())
}

#[openapi]
#[put("/game/threshold", format = "json", data = "<request>")]
pub async fn set_threshold(
    session: &State<SharedSession>,
    request: Json<ThresholdRequest>,
) -> Result<Json<Threshold>, BadRequest<Json<Status>>> {
    let mut session = lock_session(session);
    session
        .set_threshold(request.threshold)
        .map(Json)
        .map_err(|e| BadRequest(new_status(e.to_string())))
}

#[openapi]
#[put("/game/condition", format = "json", data = "<request>")]
pub async fn set_condition(
    session: &State<SharedSession>,
    request: Json<ConditionRequest>,
) -> Json<Condition> {
    let mut session = lock_session(session);
    session.set_condition(request.condition);
    Json(session.condition())
}

/// Play one round. The session lock is released while the dice "roll", so
/// reads and settings changes still go through; another play or a reseed
/// gets 409. Resolving writes the history file, so it runs on the blocking pool.
#[openapi]
#[post("/game/play")]
pub async fn play(
    session: &State<SharedSession>,
) -> Result<Json<RoundOutcome>, Conflict<Json<Status>>> {
    let (ticket, delay) = {
        let mut guard = lock_session(session);
        let ticket = guard
            .begin_roll()
            .map_err(|e| Conflict(new_status(e.to_string())))?;
        (ticket, guard.roll_delay())
    };

    if !delay.is_zero() {
        rocket::tokio::time::sleep(delay).await;
    }

    let shared = Arc::clone(session.inner());
    let resolved =
        rocket::tokio::task::spawn_blocking(move || lock_session(&shared).resolve_roll(ticket))
            .await;
    match resolved {
        Ok(outcome) => Ok(Json(outcome)),
        Err(e) => std::panic::resume_unwind(e.into_panic()),
    }
}

#[openapi]
#[post("/game/seed", format = "json", data = "<seed_req>")]
pub async fn set_seed(
    session: &State<SharedSession>,
    seed_req: Json<SeedRequest>,
) -> Result<Json<String>, Conflict<Json<Status>>> {
    let seed = seed_req.seed;
    lock_session(session)
        .reseed(seed)
        .map_err(|e| Conflict(new_status(e.to_string())))?;
    log::info!("dice reseeded with {}", seed);
    Ok(Json(format!("seed set to {}", seed)))
}
