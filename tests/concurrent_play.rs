use std::time::Duration;

use rocket::http::{ContentType, Status};
use rocket::local::asynchronous::Client;

use dice_duel::config::GameConfig;
use dice_duel::rocket_initialize_with;
use dice_duel::session::{GameSnapshot, Phase, RoundOutcome};

fn delayed_config(tag: &str) -> GameConfig {
    GameConfig {
        history_dir: std::env::temp_dir().join(format!(
            "dice_duel_concurrent_{tag}_{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        )),
        roll_delay: Duration::from_millis(300),
        seed: Some(11),
        ..GameConfig::default()
    }
}

#[rocket::async_test]
async fn second_play_during_roll_is_rejected() {
    let config = delayed_config("reject");
    let dir = config.history_dir.clone();
    let client = Client::tracked(rocket_initialize_with(config))
        .await
        .expect("valid rocket");

    let (first, second) = rocket::tokio::join!(
        client.post("/game/play").dispatch(),
        client.post("/game/play").dispatch()
    );
    let mut statuses = vec![first.status(), second.status()];
    statuses.sort_by_key(|s| s.code);
    assert_eq!(statuses, vec![Status::Ok, Status::Conflict]);

    let game: GameSnapshot = client.get("/game").dispatch().await.into_json().await.unwrap();
    assert_eq!(game.history.len(), 1);
    assert_eq!(game.phase, Phase::Idle);

    let _ = std::fs::remove_dir_all(&dir);
}

#[rocket::async_test]
async fn reads_and_settings_stay_live_while_rolling() {
    let config = delayed_config("live");
    let dir = config.history_dir.clone();
    let client = Client::tracked(rocket_initialize_with(config))
        .await
        .expect("valid rocket");

    let observe = async {
        rocket::tokio::time::sleep(Duration::from_millis(100)).await;
        let during: GameSnapshot = client.get("/game").dispatch().await.into_json().await.unwrap();
        let changed = client
            .put("/game/threshold")
            .header(ContentType::JSON)
            .body(r#"{ "threshold": 80 }"#)
            .dispatch()
            .await;
        (during, changed.status())
    };

    let (outcome, (during, changed)) = rocket::tokio::join!(
        async {
            client
                .post("/game/play")
                .dispatch()
                .await
                .into_json::<RoundOutcome>()
                .await
                .unwrap()
        },
        observe
    );

    assert!(during.rolling);
    assert_eq!(during.phase, Phase::Rolling);
    assert_eq!(changed, Status::Ok);
    // the round in flight keeps the threshold it started with
    assert_eq!(outcome.entry.guess_label, "over 50");

    let game: GameSnapshot = client.get("/game").dispatch().await.into_json().await.unwrap();
    assert!(!game.rolling);
    assert_eq!(game.threshold.value(), 80);

    let _ = std::fs::remove_dir_all(&dir);
}

#[rocket::async_test]
async fn reseed_during_roll_is_a_conflict() {
    let config = delayed_config("reseed");
    let dir = config.history_dir.clone();
    let client = Client::tracked(rocket_initialize_with(config))
        .await
        .expect("valid rocket");

    let reseed = async {
        rocket::tokio::time::sleep(Duration::from_millis(100)).await;
        let response = client
            .post("/game/seed")
            .header(ContentType::JSON)
            .body(r#"{ "seed": 42 }"#)
            .dispatch()
            .await;
        let status = response.status();
        let body: rocket::serde::json::Value = response.into_json().await.unwrap();
        (status, body)
    };

    let (played, (status, body)) =
        rocket::tokio::join!(client.post("/game/play").dispatch(), reseed);

    assert_eq!(played.status(), Status::Ok);
    assert_eq!(status, Status::Conflict);
    assert!(body["message"].as_str().unwrap().contains("already in progress"));
    // the round was saved from the blocking pool before the response came back
    assert!(dir.join("diceGameHistory.json").exists());

    // once idle, reseeding goes through again
    let response = client
        .post("/game/seed")
        .header(ContentType::JSON)
        .body(r#"{ "seed": 42 }"#)
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    let _ = std::fs::remove_dir_all(&dir);
}
