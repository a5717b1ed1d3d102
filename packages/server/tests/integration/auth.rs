use serde_json::json;

use crate::common::{TestApp, routes};

mod login {
    use super::*;

    #[tokio::test]
    async fn student_login_returns_token_and_mapped_role() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"username": "2201001", "password": "secret"}),
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert!(res.body["token"].is_string());
        assert_eq!(res.body["user"]["id"], "USR001");
        assert_eq!(res.body["user"]["role"], "student");
        assert_eq!(res.body["user"]["nim"], "2201001");
        let permissions = res.body["permissions"].as_array().unwrap();
        assert!(permissions.iter().any(|p| p == "submission:submit"));
        assert!(!permissions.iter().any(|p| p == "content:manage"));
    }

    #[tokio::test]
    async fn repeated_login_reuses_the_local_user() {
        let app = TestApp::spawn().await;
        let body = json!({"username": "2201001", "password": "secret"});

        let first = app.post_without_token(routes::LOGIN, &body).await;
        let second = app.post_without_token(routes::LOGIN, &body).await;

        assert_eq!(first.body["user"]["id"], second.body["user"]["id"]);
        assert!(second.body["user"]["last_login_at"].is_string());
    }

    #[tokio::test]
    async fn staff_roles_are_mapped() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"username": "staff-ani", "password": "secret"}),
            )
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["user"]["role"], "student_affairs");
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"username": "2201001", "password": "wrong"}),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn unmapped_role_is_refused() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"username": "alumni-budi", "password": "secret"}),
            )
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "ROLE_NOT_MAPPED");
    }

    #[tokio::test]
    async fn unreachable_identity_service_is_a_bad_gateway() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"username": "down-user", "password": "secret"}),
            )
            .await;

        assert_eq!(res.status, 502);
        assert_eq!(res.body["code"], "UPSTREAM_ERROR");
    }

    #[tokio::test]
    async fn empty_username_is_a_validation_error() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(routes::LOGIN, &json!({"username": "  ", "password": "x"}))
            .await;

        assert_eq!(res.status, 422);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod me {
    use super::*;

    #[tokio::test]
    async fn returns_profile_for_a_valid_token() {
        let app = TestApp::spawn().await;
        let token = app.login("2201001").await;

        let res = app.get_with_token(routes::ME, &token).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["user"]["username"], "2201001");
        assert!(res.body["permissions"].is_array());
    }

    #[tokio::test]
    async fn missing_token_is_unauthorized() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::ME).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn garbage_token_is_unauthorized() {
        let app = TestApp::spawn().await;

        let res = app.get_with_token(routes::ME, "not-a-jwt").await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }
}
