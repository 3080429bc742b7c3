#![cfg(feature = "redis")]

mod common;

use seaorm_session_control::{KvStore, RedisStore, SessionConfig, SessionControl};

async fn control() -> Option<SessionControl<RedisStore>> {
    let Ok(url) = std::env::var("REDIS_URL") else {
        eprintln!("skipping: REDIS_URL not set");
        return None;
    };
    match RedisStore::connect(&url).await {
        Ok(store) => SessionControl::new(store, SessionConfig::default()).ok(),
        Err(e) => {
            eprintln!("skipping: redis not reachable: {e}");
            None
        }
    }
}

#[tokio::test]
#[ignore = "requires REDIS_URL and a running Redis"]
async fn session_control_on_redis() {
    let Some(control) = control().await else {
        return;
    };
    let user = format!("redis-test-{}", std::process::id());

    common::session_limit_evicts_oldest(&control, &user).await;
    assert_eq!(control.close_all_user_sessions(&user).await.unwrap(), 5);
    common::closing_is_idempotent(&control, &format!("{user}-close")).await;

    let ver_user = format!("{user}-ver");
    common::versions_only_move_forward(&control, &ver_user).await;
    control
        .store()
        .del(&format!("user:{ver_user}:ver"))
        .await
        .unwrap();
}
