#![allow(dead_code)]

use seaorm_session_control::{KvStore, SessionControl, SessionData};

pub fn session(user_id: &str, n: i64) -> SessionData {
    SessionData {
        user_id: user_id.to_string(),
        email: format!("test{n}@example.com"),
        role: "user".to_string(),
        provider: "test".to_string(),
        created_at: 1_000 + n,
        last_seen: 1_000 + n,
        ip: None,
        user_agent: None,
    }
}

/// Six sessions, limit five: the oldest one goes and is revoked.
pub async fn session_limit_evicts_oldest<S: KvStore>(control: &SessionControl<S>, user: &str) {
    for n in 1..=6 {
        control
            .save_session(&format!("{user}-s{n}"), &session(user, n))
            .await
            .unwrap();
    }
    assert_eq!(control.get_user_sessions(user).await.unwrap().len(), 6);

    let limit = control.check_session_limit(user, 5).await.unwrap();
    assert!(!limit.can_create);
    assert_eq!(limit.current_sessions, 6);
    assert_eq!(limit.oldest_session.as_deref(), Some(format!("{user}-s1").as_str()));

    let evicted = control.enforce_session_limit(user, 5).await.unwrap();
    assert_eq!(evicted, vec![format!("{user}-s1")]);

    let remaining = control.get_user_sessions(user).await.unwrap();
    assert_eq!(remaining.len(), 5);
    assert!(remaining.iter().all(|s| s.jti != format!("{user}-s1")));
    // most recently active first
    assert_eq!(remaining[0].jti, format!("{user}-s6"));

    assert!(control.get_session(&format!("{user}-s1")).await.unwrap().is_none());
    assert!(control.is_token_revoked(&format!("{user}-s1")).await.unwrap());

    // already within the limit: nothing to do
    assert!(control.enforce_session_limit(user, 5).await.unwrap().is_empty());
    assert!(control.check_session_limit(user, 6).await.unwrap().can_create);
}

pub async fn versions_only_move_forward<S: KvStore>(control: &SessionControl<S>, user: &str) {
    let baseline = control.get_user_version(user).await.unwrap();
    assert_eq!(baseline, control.config().version_baseline());
    assert!(control.is_token_version_valid(user, baseline).await.unwrap());

    let bumped = control.increment_user_version(user).await.unwrap();
    assert_eq!(bumped, baseline + 1);
    assert_eq!(control.get_user_version(user).await.unwrap(), bumped);

    assert!(!control.is_token_version_valid(user, baseline).await.unwrap());
    assert!(control.is_token_version_valid(user, bumped).await.unwrap());
    // a token from the future is not valid either
    assert!(!control.is_token_version_valid(user, bumped + 1).await.unwrap());

    assert_eq!(control.increment_user_version(user).await.unwrap(), bumped + 1);
}

pub async fn activity_update_touches_last_seen_only<S: KvStore>(
    control: &SessionControl<S>,
    user: &str,
) {
    let jti = format!("{user}-active");
    let data = session(user, 0).with_ip("10.1.2.3").with_user_agent("curl/8");
    control.save_session(&jti, &data).await.unwrap();

    assert!(control.update_session_activity(&jti).await.unwrap());

    let after = control.get_session(&jti).await.unwrap().unwrap();
    assert!(after.last_seen > data.last_seen);
    assert_eq!(
        SessionData {
            last_seen: data.last_seen,
            ..after
        },
        data
    );

    let ghost = format!("{user}-ghost");
    assert!(!control.update_session_activity(&ghost).await.unwrap());
    assert!(control.get_session(&ghost).await.unwrap().is_none());
}

pub async fn closing_is_idempotent<S: KvStore>(control: &SessionControl<S>, user: &str) {
    let jti = format!("{user}-closing");
    control.save_session(&jti, &session(user, 1)).await.unwrap();

    control.close_user_session(user, &jti).await.unwrap();
    control.close_user_session(user, &jti).await.unwrap();

    assert!(control.get_session(&jti).await.unwrap().is_none());
    assert!(control.get_user_sessions(user).await.unwrap().is_empty());
    assert!(control.is_token_revoked(&jti).await.unwrap());
}

pub async fn close_all_logs_out_everywhere<S: KvStore>(control: &SessionControl<S>, user: &str) {
    for n in 1..=3 {
        control
            .save_session(&format!("{user}-all{n}"), &session(user, n))
            .await
            .unwrap();
    }
    assert_eq!(control.close_all_user_sessions(user).await.unwrap(), 3);
    assert!(control.get_user_sessions(user).await.unwrap().is_empty());
    for n in 1..=3 {
        assert!(control
            .is_token_revoked(&format!("{user}-all{n}"))
            .await
            .unwrap());
    }
}

/// Two users; the dashboard lists the most recently active one first.
pub async fn dashboard_orders_users_by_activity<S: KvStore>(control: &SessionControl<S>) {
    control.save_session("dash-a1", &session("dash-a", 10)).await.unwrap();
    control.save_session("dash-a2", &session("dash-a", 50)).await.unwrap();
    control.save_session("dash-b1", &session("dash-b", 30)).await.unwrap();

    let activity = control.get_all_users_activity().await.unwrap();
    let users: Vec<&str> = activity.iter().map(|a| a.user_id.as_str()).collect();
    assert_eq!(users, ["dash-a", "dash-b"]);

    assert_eq!(activity[0].active_sessions, 2);
    assert_eq!(activity[0].last_seen, 1_050);
    assert_eq!(
        activity[0].last_session.as_ref().map(|s| s.jti.as_str()),
        Some("dash-a2")
    );
    assert_eq!(activity[1].active_sessions, 1);

    let stats = control.get_session_stats().await.unwrap();
    assert_eq!(stats.total_sessions, 3);
    assert_eq!(stats.total_users, 2);
    assert_eq!(stats.total_revoked, 0);
    assert_eq!(stats.active_sessions, 3);

    control.close_user_session("dash-b", "dash-b1").await.unwrap();
    let stats = control.get_session_stats().await.unwrap();
    assert_eq!(stats.total_sessions, 2);
    assert_eq!(stats.total_users, 1);
    assert_eq!(stats.total_revoked, 1);
}

/// A record without TTL and an index entry pointing nowhere are both
/// cleaned up; healthy sessions survive.
pub async fn cleanup_removes_strays<S: KvStore>(control: &SessionControl<S>) {
    control.save_session("clean-ok", &session("clean", 1)).await.unwrap();

    let store = control.store();
    store
        .hset("sess:clean-stray", &[("userId", "clean".to_string())])
        .await
        .unwrap();
    store.sadd("user:clean:sessions", "clean-gone").await.unwrap();
    store.sadd("user:lonely:sessions", "lonely-gone").await.unwrap();

    assert_eq!(control.cleanup_expired_sessions().await.unwrap(), 1);

    assert!(!store.exists("sess:clean-stray").await.unwrap());
    assert!(control.get_session("clean-ok").await.unwrap().is_some());
    assert_eq!(
        store.smembers("user:clean:sessions").await.unwrap(),
        vec!["clean-ok".to_string()]
    );
    assert!(!store.exists("user:lonely:sessions").await.unwrap());
}
