use serde_json::json;

use crate::common::{TestApp, routes};

async fn book(app: &TestApp, token: &str, topic: &str) -> String {
    let res = app
        .post_with_token(
            routes::COUNSELING,
            &json!({"topic": topic, "preferred_date": "2099-03-15", "notes": "Afternoon please"}),
            token,
        )
        .await;
    assert_eq!(res.status, 201, "booking failed: {}", res.text);
    res.id()
}

async fn review(app: &TestApp, id: &str, status: &str, token: &str) -> crate::common::TestResponse {
    app.patch_with_token(&routes::admin_counseling(id), &json!({"status": status}), token)
        .await
}

mod counseling {
    use super::*;

    #[tokio::test]
    async fn booking_starts_pending_with_a_lowercase_id() {
        let app = TestApp::spawn().await;
        let student = app.login("2201001").await;

        let id = book(&app, &student, "Academic stress").await;
        assert_eq!(id, "csl001");

        let res = app.get_with_token(routes::MY_COUNSELING, &student).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["pagination"]["total"], 1);
        assert_eq!(res.body["data"][0]["status"], "pending");
        assert_eq!(res.body["data"][0]["preferred_date"], "2099-03-15");
    }

    #[tokio::test]
    async fn past_dates_are_rejected() {
        let app = TestApp::spawn().await;
        let student = app.login("2201001").await;

        let res = app
            .post_with_token(
                routes::COUNSELING,
                &json!({"topic": "Career", "preferred_date": "2000-01-01"}),
                &student,
            )
            .await;

        assert_eq!(res.status, 422);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn pending_booking_can_be_cancelled_by_its_owner() {
        let app = TestApp::spawn().await;
        let student = app.login("2201001").await;
        let other = app.login("2201002").await;
        let id = book(&app, &student, "Career").await;

        let res = app.delete_with_token(&routes::counseling(&id), &other).await;
        assert_eq!(res.status, 403);

        let res = app.delete_with_token(&routes::counseling(&id), &student).await;
        assert_eq!(res.status, 204);

        let res = app.get_with_token(routes::MY_COUNSELING, &student).await;
        assert_eq!(res.body["pagination"]["total"], 0);
    }

    #[tokio::test]
    async fn reviewed_booking_cannot_be_cancelled() {
        let app = TestApp::spawn().await;
        let staff = app.login("staff-ani").await;
        let student = app.login("2201001").await;
        let id = book(&app, &student, "Career").await;

        let res = review(&app, &id, "approved", &staff).await;
        assert_eq!(res.status, 200, "{}", res.text);

        let res = app.delete_with_token(&routes::counseling(&id), &student).await;
        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn review_follows_the_status_lifecycle() {
        let app = TestApp::spawn().await;
        let staff = app.login("staff-ani").await;
        let student = app.login("2201001").await;
        let id = book(&app, &student, "Career").await;

        let res = review(&app, &id, "completed", &staff).await;
        assert_eq!(res.status, 422);

        let res = app
            .patch_with_token(
                &routes::admin_counseling(&id),
                &json!({"status": "approved", "staff_response": "See you at 14:00"}),
                &staff,
            )
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["status"], "approved");
        assert_eq!(res.body["staff_response"], "See you at 14:00");

        let res = review(&app, &id, "completed", &staff).await;
        assert_eq!(res.status, 200);

        let res = review(&app, &id, "pending", &staff).await;
        assert_eq!(res.status, 422);
    }

    #[tokio::test]
    async fn staff_listing_names_the_student() {
        let app = TestApp::spawn().await;
        let staff = app.login("staff-ani").await;
        let student = app.login("2201001").await;
        book(&app, &student, "Career").await;

        let res = app.get_with_token(routes::ADMIN_COUNSELING, &staff).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["data"][0]["student_name"], "User 2201001");

        let res = app.get_with_token(routes::ADMIN_COUNSELING, &student).await;
        assert_eq!(res.status, 403);
    }
}

mod aspirations {
    use super::*;

    async fn submit(app: &TestApp, token: &str, anonymous: bool) -> String {
        let res = app
            .post_with_token(
                routes::ASPIRATIONS,
                &json!({
                    "title": "More study rooms",
                    "content": "The library is full during exams.",
                    "category": "Facilities",
                    "is_anonymous": anonymous,
                }),
                token,
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["status"], "submitted");
        res.id()
    }

    #[tokio::test]
    async fn anonymous_submitters_are_hidden_from_staff() {
        let app = TestApp::spawn().await;
        let staff = app.login("staff-ani").await;
        let student = app.login("2201001").await;
        let id = submit(&app, &student, true).await;
        assert_eq!(id, "ASP001");

        let res = app.get_with_token(routes::ADMIN_ASPIRATIONS, &staff).await;
        assert_eq!(res.status, 200, "{}", res.text);
        let item = &res.body["data"][0];
        assert!(item["user_id"].is_null());
        assert!(item["submitter_name"].is_null());

        let res = app.get_with_token(routes::MY_ASPIRATIONS, &student).await;
        assert!(res.body["data"][0]["user_id"].is_string());
    }

    #[tokio::test]
    async fn named_submitters_are_shown_to_staff() {
        let app = TestApp::spawn().await;
        let staff = app.login("staff-ani").await;
        let student = app.login("2201001").await;
        submit(&app, &student, false).await;

        let res = app.get_with_token(routes::ADMIN_ASPIRATIONS, &staff).await;

        assert_eq!(res.body["data"][0]["submitter_name"], "User 2201001");
        assert_eq!(res.body["data"][0]["category"], "facilities");
    }

    #[tokio::test]
    async fn responding_marks_the_aspiration_responded() {
        let app = TestApp::spawn().await;
        let staff = app.login("staff-ani").await;
        let student = app.login("2201001").await;
        let id = submit(&app, &student, false).await;

        let res = app
            .patch_with_token(
                &routes::admin_aspiration(&id),
                &json!({"response": "Extra rooms open from next week."}),
                &staff,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["status"], "responded");

        let res = app.get_with_token(routes::MY_ASPIRATIONS, &student).await;
        assert_eq!(res.body["data"][0]["response"], "Extra rooms open from next week.");
    }

    #[tokio::test]
    async fn staff_cannot_submit_aspirations() {
        let app = TestApp::spawn().await;
        let staff = app.login("staff-ani").await;

        let res = app
            .post_with_token(
                routes::ASPIRATIONS,
                &json!({"title": "x", "content": "y"}),
                &staff,
            )
            .await;

        assert_eq!(res.status, 403);
    }
}

mod dashboard {
    use super::*;

    #[tokio::test]
    async fn staff_see_pending_work() {
        let app = TestApp::spawn().await;
        let staff = app.login("staff-ani").await;
        let student = app.login("2201001").await;
        book(&app, &student, "Career").await;
        book(&app, &student, "Finance").await;

        let res = app.get_with_token(routes::DASHBOARD, &staff).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["role"], "student_affairs");
        assert_eq!(res.body["staff"]["pending_counseling"], 2);
        assert_eq!(res.body["staff"]["open_aspirations"], 0);
        assert!(res.body["student"].is_null());
    }

    #[tokio::test]
    async fn students_see_their_own_counts() {
        let app = TestApp::spawn().await;
        let student = app.login("2201001").await;
        let other = app.login("2201002").await;
        book(&app, &student, "Career").await;
        book(&app, &other, "Finance").await;

        let res = app.get_with_token(routes::DASHBOARD, &student).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert!(res.body["staff"].is_null());
        assert_eq!(res.body["student"]["counseling_bookings"], 1);
        assert_eq!(res.body["student"]["pending_counseling"], 1);
        assert_eq!(res.body["student"]["submissions"], 0);
    }
}
