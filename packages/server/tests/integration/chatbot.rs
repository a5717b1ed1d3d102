use std::sync::atomic::Ordering;

use serde_json::json;

use crate::common::{TestApp, routes};

async fn add_rule(app: &TestApp, token: &str, keyword: &str, response: &str) -> String {
    let res = app
        .post_with_token(
            routes::ADMIN_RULES,
            &json!({"keyword": keyword, "response": response}),
            token,
        )
        .await;
    assert_eq!(res.status, 201, "create rule failed: {}", res.text);
    res.id()
}

mod chat {
    use super::*;

    #[tokio::test]
    async fn keyword_in_message_returns_the_canned_response() {
        let app = TestApp::spawn().await;
        let admin = app.login("admin").await;
        add_rule(&app, &admin, "Beasiswa", "Registration opens in March.").await;

        let res = app
            .post_without_token(routes::CHAT, &json!({"message": "Kapan BEASISWA dibuka?"}))
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["status"], "success");
        assert_eq!(res.body["reply"], "Registration opens in March.");
        assert_eq!(res.body["source"], "keyword");
        assert_eq!(app.generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn near_miss_is_matched_as_a_typo() {
        let app = TestApp::spawn().await;
        let admin = app.login("admin").await;
        add_rule(&app, &admin, "beasiswa", "Registration opens in March.").await;

        let res = app
            .post_without_token(routes::CHAT, &json!({"message": "info beasiswq"}))
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["reply"], "Registration opens in March.");
        assert_eq!(res.body["source"], "typo");
    }

    #[tokio::test]
    async fn first_matching_rule_wins() {
        let app = TestApp::spawn().await;
        let admin = app.login("admin").await;
        add_rule(&app, &admin, "jadwal", "Schedule answer").await;
        add_rule(&app, &admin, "konseling", "Counseling answer").await;

        let res = app
            .post_without_token(
                routes::CHAT,
                &json!({"message": "jadwal konseling minggu ini"}),
            )
            .await;

        assert_eq!(res.body["reply"], "Schedule answer");
    }

    #[tokio::test]
    async fn unmatched_message_falls_back_to_the_generator() {
        let app = TestApp::spawn().await;
        let admin = app.login("admin").await;
        add_rule(&app, &admin, "beasiswa", "Registration opens in March.").await;

        let res = app
            .post_without_token(routes::CHAT, &json!({"message": "what time is it"}))
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["source"], "generative");
        assert_eq!(res.body["reply"], "generated: what time is it");
        assert_eq!(app.generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn generator_failure_is_a_structured_error() {
        let app = TestApp::spawn_with_failing_generator().await;

        let res = app
            .post_without_token(routes::CHAT, &json!({"message": "hello"}))
            .await;

        assert_eq!(res.status, 500);
        assert_eq!(res.body["status"], "error");
        assert!(res.body["message"].is_string());
    }

    #[tokio::test]
    async fn empty_message_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(routes::CHAT, &json!({"message": "   "}))
            .await;

        assert_eq!(res.status, 422);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod rules {
    use super::*;

    #[tokio::test]
    async fn keywords_are_stored_lowercased() {
        let app = TestApp::spawn().await;
        let admin = app.login("admin").await;

        let id = add_rule(&app, &admin, "  UKT  ", "Tuition info").await;
        assert_eq!(id, "BOT001");

        let res = app
            .get_with_token(&format!("{}/{id}", routes::ADMIN_RULES), &admin)
            .await;
        assert_eq!(res.body["keyword"], "ukt");
    }

    #[tokio::test]
    async fn deleted_rules_stop_matching() {
        let app = TestApp::spawn().await;
        let admin = app.login("admin").await;
        let id = add_rule(&app, &admin, "beasiswa", "Canned").await;

        let res = app
            .delete_with_token(&format!("{}/{id}", routes::ADMIN_RULES), &admin)
            .await;
        assert_eq!(res.status, 204);

        let res = app
            .post_without_token(routes::CHAT, &json!({"message": "beasiswa"}))
            .await;
        assert_eq!(res.body["source"], "generative");
    }

    #[tokio::test]
    async fn students_cannot_manage_rules() {
        let app = TestApp::spawn().await;
        let student = app.login("2201001").await;

        let res = app.get_with_token(routes::ADMIN_RULES, &student).await;

        assert_eq!(res.status, 403);
    }
}
