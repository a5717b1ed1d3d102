use reqwest::Method;
use serde_json::json;

use crate::common::{Field, TestApp, pdf_bytes, routes};

/// A form with a required name, a dropdown and a required transcript.
async fn scholarship_form(app: &TestApp, admin: &str) -> String {
    let form_id = app.create_form(admin).await;
    app.set_fields(
        &form_id,
        json!([
            {"key": "full_name", "label": "Full name", "field_type": "text", "required": true},
            {"key": "faculty", "label": "Faculty", "field_type": "dropdown", "options": ["Engineering", "Law"]},
            {"key": "transcript", "label": "Transcript", "field_type": "file", "required": true},
        ]),
        admin,
    )
    .await;
    form_id
}

async fn submit(
    app: &TestApp,
    token: &str,
    form_id: &str,
    fields: Vec<Field<'_>>,
) -> crate::common::TestResponse {
    let mut parts = vec![Field::Text("form_id", form_id)];
    parts.extend(fields);
    app.multipart_with_token(Method::POST, routes::SUBMIT, parts, token)
        .await
}

async fn submit_valid(app: &TestApp, token: &str, form_id: &str) -> crate::common::TestResponse {
    submit(
        app,
        token,
        form_id,
        vec![
            Field::Text("full_name", "Siti Aminah"),
            Field::Text("faculty", "Law"),
            Field::File("transcript", "transcript.pdf", pdf_bytes()),
        ],
    )
    .await
}

mod create {
    use super::*;

    #[tokio::test]
    async fn valid_submission_stores_data_file_and_snapshot() {
        let app = TestApp::spawn().await;
        let admin = app.login("admin").await;
        let student = app.login("2201001").await;
        let form_id = scholarship_form(&app, &admin).await;

        let res = submit_valid(&app, &student, &form_id).await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["id"], "FSUB001");

        let res = app.get_with_token(&routes::submission("FSUB001"), &student).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["data"]["full_name"], "Siti Aminah");
        assert_eq!(res.body["data"]["faculty"], "Law");
        assert_eq!(res.body["personal_data"]["nim"], "2201001");
        let stored = res.body["data"]["transcript"].as_str().unwrap();
        assert!(stored.starts_with(&format!("submissions/{form_id}/")));
        assert!(stored.ends_with(".pdf"));
        assert!(app.stored(stored));
    }

    #[tokio::test]
    async fn missing_required_field_is_rejected() {
        let app = TestApp::spawn().await;
        let admin = app.login("admin").await;
        let student = app.login("2201001").await;
        let form_id = scholarship_form(&app, &admin).await;

        let res = submit(
            &app,
            &student,
            &form_id,
            vec![Field::File("transcript", "t.pdf", pdf_bytes())],
        )
        .await;

        assert_eq!(res.status, 422);
        assert_eq!(res.body["code"], "FIELD_REQUIRED");
    }

    #[tokio::test]
    async fn unknown_dropdown_option_is_rejected() {
        let app = TestApp::spawn().await;
        let admin = app.login("admin").await;
        let student = app.login("2201001").await;
        let form_id = scholarship_form(&app, &admin).await;

        let res = submit(
            &app,
            &student,
            &form_id,
            vec![
                Field::Text("full_name", "Siti"),
                Field::Text("faculty", "Medicine"),
                Field::File("transcript", "t.pdf", pdf_bytes()),
            ],
        )
        .await;

        assert_eq!(res.status, 422);
        assert_eq!(res.body["code"], "INVALID_OPTION");
    }

    #[tokio::test]
    async fn wrong_file_type_is_rejected() {
        let app = TestApp::spawn().await;
        let admin = app.login("admin").await;
        let student = app.login("2201001").await;
        let form_id = scholarship_form(&app, &admin).await;

        let res = submit(
            &app,
            &student,
            &form_id,
            vec![
                Field::Text("full_name", "Siti"),
                Field::File("transcript", "transcript.exe", vec![0u8; 16]),
            ],
        )
        .await;

        assert_eq!(res.status, 422);
        assert_eq!(res.body["code"], "INVALID_FILE_TYPE");
    }

    #[tokio::test]
    async fn oversized_file_is_rejected_and_not_stored() {
        let app = TestApp::spawn().await;
        let admin = app.login("admin").await;
        let student = app.login("2201001").await;
        let form_id = scholarship_form(&app, &admin).await;

        let res = submit(
            &app,
            &student,
            &form_id,
            vec![
                Field::Text("full_name", "Siti"),
                Field::File("transcript", "big.pdf", vec![b'a'; 2 * 1024 * 1024 + 1]),
            ],
        )
        .await;

        assert_eq!(res.status, 422);
        assert_eq!(res.body["code"], "FILE_TOO_LARGE");
        assert!(!app.storage_root.join("submissions").join(&form_id).exists());
    }

    #[tokio::test]
    async fn passed_deadline_is_rejected() {
        let app = TestApp::spawn().await;
        let admin = app.login("admin").await;
        let student = app.login("2201001").await;
        let form_id = scholarship_form(&app, &admin).await;
        app.set_settings(
            &form_id,
            json!({"submission_deadline": "2020-01-01T00:00:00Z"}),
            &admin,
        )
        .await;

        let res = submit_valid(&app, &student, &form_id).await;

        assert_eq!(res.status, 422);
        assert_eq!(res.body["code"], "DEADLINE_PASSED");
    }

    #[tokio::test]
    async fn second_submission_is_refused_when_one_per_user() {
        let app = TestApp::spawn().await;
        let admin = app.login("admin").await;
        let student = app.login("2201001").await;
        let form_id = scholarship_form(&app, &admin).await;
        app.set_settings(&form_id, json!({"one_submission_per_email": true}), &admin)
            .await;

        let first = submit_valid(&app, &student, &form_id).await;
        assert_eq!(first.status, 201, "{}", first.text);
        let second = submit_valid(&app, &student, &form_id).await;

        assert_eq!(second.status, 422);
        assert_eq!(second.body["code"], "ALREADY_SUBMITTED");
    }

    #[tokio::test]
    async fn concurrent_submissions_never_exceed_the_quota() {
        let app = TestApp::spawn().await;
        let admin = app.login("admin").await;
        let form_id = scholarship_form(&app, &admin).await;
        app.set_settings(&form_id, json!({"max_submissions": 2}), &admin)
            .await;

        let mut tokens = Vec::new();
        for i in 0..6 {
            tokens.push(app.login(&format!("22010{i:02}")).await);
        }

        let mut tasks = tokio::task::JoinSet::new();
        for token in tokens {
            let client = app.client.clone();
            let url = app.url(routes::SUBMIT);
            let form_id = form_id.clone();
            tasks.spawn(async move {
                let form = reqwest::multipart::Form::new()
                    .text("form_id", form_id)
                    .text("full_name", "Siti")
                    .part(
                        "transcript",
                        reqwest::multipart::Part::bytes(pdf_bytes()).file_name("t.pdf"),
                    );
                client
                    .post(url)
                    .header("Authorization", format!("Bearer {token}"))
                    .multipart(form)
                    .send()
                    .await
                    .expect("Failed to send submission")
                    .status()
                    .as_u16()
            });
        }
        let results: Vec<u16> = tasks.join_all().await;

        let accepted = results.iter().filter(|s| **s == 201).count();
        let refused = results.iter().filter(|s| **s == 422).count();
        assert_eq!(accepted, 2, "statuses: {results:?}");
        assert_eq!(refused, 4, "statuses: {results:?}");
    }

    #[tokio::test]
    async fn staff_cannot_submit() {
        let app = TestApp::spawn().await;
        let admin = app.login("admin").await;
        let form_id = scholarship_form(&app, &admin).await;

        let res = submit_valid(&app, &admin, &form_id).await;

        assert_eq!(res.status, 403);
    }
}

mod edit {
    use super::*;

    #[tokio::test]
    async fn edit_without_new_file_keeps_the_stored_file() {
        let app = TestApp::spawn().await;
        let admin = app.login("admin").await;
        let student = app.login("2201001").await;
        let form_id = scholarship_form(&app, &admin).await;
        app.set_settings(&form_id, json!({"allow_edit": true}), &admin)
            .await;

        let created = submit_valid(&app, &student, &form_id).await;
        let id = created.id();
        let before = app.get_with_token(&routes::submission(&id), &student).await;
        let transcript = before.body["data"]["transcript"].as_str().unwrap().to_string();

        let res = app
            .multipart_with_token(
                Method::PUT,
                &routes::submission(&id),
                vec![
                    Field::Text("full_name", "Siti A."),
                    Field::Text("faculty", "Engineering"),
                ],
                &student,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["data"]["full_name"], "Siti A.");
        assert_eq!(res.body["data"]["transcript"], transcript.as_str());
        assert!(app.stored(&transcript));
    }

    #[tokio::test]
    async fn replacing_the_file_removes_the_old_one() {
        let app = TestApp::spawn().await;
        let admin = app.login("admin").await;
        let student = app.login("2201001").await;
        let form_id = scholarship_form(&app, &admin).await;
        app.set_settings(&form_id, json!({"allow_edit": true}), &admin)
            .await;

        let id = submit_valid(&app, &student, &form_id).await.id();
        let before = app.get_with_token(&routes::submission(&id), &student).await;
        let old = before.body["data"]["transcript"].as_str().unwrap().to_string();

        let res = app
            .multipart_with_token(
                Method::PUT,
                &routes::submission(&id),
                vec![
                    Field::Text("full_name", "Siti"),
                    Field::File("transcript", "new.png", vec![0x89, b'P', b'N', b'G']),
                ],
                &student,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        let new = res.body["data"]["transcript"].as_str().unwrap();
        assert!(new.ends_with(".png"));
        assert!(app.stored(new));
        assert!(!app.stored(&old));
    }

    #[tokio::test]
    async fn retyped_field_never_claims_a_foreign_file() {
        let app = TestApp::spawn().await;
        let admin = app.login("admin").await;
        let student = app.login("2201001").await;
        let form_id = app.create_form(&admin).await;
        app.set_fields(
            &form_id,
            json!([{"key": "doc", "label": "Document", "field_type": "text"}]),
            &admin,
        )
        .await;
        app.set_settings(&form_id, json!({"allow_edit": true}), &admin)
            .await;

        let upload = app
            .multipart_with_token(
                Method::POST,
                routes::ADMIN_UPLOADS,
                vec![
                    Field::Text("folder", "downloads"),
                    Field::File("file", "guide.pdf", pdf_bytes()),
                ],
                &admin,
            )
            .await;
        assert_eq!(upload.status, 201, "{}", upload.text);
        let foreign = upload.body["path"].as_str().unwrap().to_string();

        let id = submit(&app, &student, &form_id, vec![Field::Text("doc", &foreign)])
            .await
            .id();
        app.set_fields(
            &form_id,
            json!([{"key": "doc", "label": "Document", "field_type": "file"}]),
            &admin,
        )
        .await;

        let res = app
            .multipart_with_token(
                Method::PUT,
                &routes::submission(&id),
                vec![Field::Text("form_id", &form_id)],
                &student,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert!(res.body["data"]["doc"].is_null());

        let res = app
            .multipart_with_token(
                Method::PUT,
                &routes::submission(&id),
                vec![Field::File("doc", "mine.pdf", pdf_bytes())],
                &student,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        let own = res.body["data"]["doc"].as_str().unwrap();
        assert!(own.starts_with(&format!("submissions/{form_id}/")));
        assert!(app.stored(&foreign));
    }

    #[tokio::test]
    async fn edits_are_refused_unless_allowed() {
        let app = TestApp::spawn().await;
        let admin = app.login("admin").await;
        let student = app.login("2201001").await;
        let form_id = scholarship_form(&app, &admin).await;

        let id = submit_valid(&app, &student, &form_id).await.id();
        let res = app
            .multipart_with_token(
                Method::PUT,
                &routes::submission(&id),
                vec![Field::Text("full_name", "Other")],
                &student,
            )
            .await;

        assert_eq!(res.status, 422);
        assert_eq!(res.body["code"], "EDIT_NOT_ALLOWED");
    }

    #[tokio::test]
    async fn other_students_cannot_touch_a_submission() {
        let app = TestApp::spawn().await;
        let admin = app.login("admin").await;
        let owner = app.login("2201001").await;
        let other = app.login("2201002").await;
        let form_id = scholarship_form(&app, &admin).await;

        let id = submit_valid(&app, &owner, &form_id).await.id();

        let res = app.get_with_token(&routes::submission(&id), &other).await;
        assert_eq!(res.status, 403);
        let res = app.delete_with_token(&routes::submission(&id), &other).await;
        assert_eq!(res.status, 403);
    }
}

mod delete {
    use super::*;

    #[tokio::test]
    async fn deleting_removes_the_row_and_its_files() {
        let app = TestApp::spawn().await;
        let admin = app.login("admin").await;
        let student = app.login("2201001").await;
        let form_id = scholarship_form(&app, &admin).await;

        let id = submit_valid(&app, &student, &form_id).await.id();
        let before = app.get_with_token(&routes::submission(&id), &student).await;
        let stored = before.body["data"]["transcript"].as_str().unwrap().to_string();

        let res = app.delete_with_token(&routes::submission(&id), &student).await;
        assert_eq!(res.status, 204);
        assert!(!app.stored(&stored));

        let res = app.get_with_token(&routes::submission(&id), &student).await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn forms_with_submissions_cannot_be_deleted() {
        let app = TestApp::spawn().await;
        let admin = app.login("admin").await;
        let student = app.login("2201001").await;
        let form_id = scholarship_form(&app, &admin).await;
        submit_valid(&app, &student, &form_id).await;

        let res = app.delete_with_token(&routes::admin_form(&form_id), &admin).await;

        assert_eq!(res.status, 409);
    }
}

mod listing {
    use super::*;

    #[tokio::test]
    async fn students_see_their_own_and_staff_see_all() {
        let app = TestApp::spawn().await;
        let admin = app.login("admin").await;
        let first = app.login("2201001").await;
        let second = app.login("2201002").await;
        let form_id = scholarship_form(&app, &admin).await;
        submit_valid(&app, &first, &form_id).await;
        submit_valid(&app, &second, &form_id).await;

        let mine = app.get_with_token(routes::MY_SUBMISSIONS, &first).await;
        assert_eq!(mine.status, 200, "{}", mine.text);
        assert_eq!(mine.body["pagination"]["total"], 1);

        let all = app
            .get_with_token(&routes::form_submissions(&form_id), &admin)
            .await;
        assert_eq!(all.status, 200, "{}", all.text);
        assert_eq!(all.body["pagination"]["total"], 2);

        let res = app
            .get_with_token(&routes::form_submissions(&form_id), &first)
            .await;
        assert_eq!(res.status, 403);
    }
}
