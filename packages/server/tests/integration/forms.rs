use serde_json::json;

use crate::common::{TestApp, routes};

mod schema {
    use super::*;

    #[tokio::test]
    async fn new_form_is_open_with_default_settings() {
        let app = TestApp::spawn().await;
        let admin = app.login("admin").await;
        let form_id = app.create_form(&admin).await;

        let res = app.get_without_token(&routes::public_form(&form_id)).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["form"]["id"], form_id);
        assert_eq!(res.body["availability"], "open");
        assert_eq!(res.body["settings"]["accept_responses"], true);
        assert_eq!(res.body["fields"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn active_scholarships_list_their_active_forms() {
        let app = TestApp::spawn().await;
        let admin = app.login("admin").await;
        let open = app.create_form(&admin).await;
        let closed = app
            .post_with_token(
                routes::ADMIN_FORMS,
                &json!({"scholarship_id": "SCH001", "title": "Draft", "is_active": false}),
                &admin,
            )
            .await;
        assert_eq!(closed.status, 201, "{}", closed.text);

        let list = app.get_without_token(routes::SCHOLARSHIPS).await;
        assert_eq!(list.status, 200, "{}", list.text);
        assert_eq!(list.body["pagination"]["total"], 1);
        assert_eq!(list.body["data"][0]["id"], "SCH001");

        let res = app
            .get_without_token(&format!("{}/SCH001", routes::SCHOLARSHIPS))
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["title"], "Academic Excellence");
        let forms = res.body["forms"].as_array().unwrap();
        assert_eq!(forms.len(), 1);
        assert_eq!(forms[0]["id"], open.as_str());
    }

    #[tokio::test]
    async fn ids_are_sequential_per_prefix() {
        let app = TestApp::spawn().await;
        let admin = app.login("admin").await;

        let first = app.create_form(&admin).await;
        let second = app.create_form(&admin).await;

        assert_eq!(first, "FRM001");
        assert_eq!(second, "FRM002");
    }

    #[tokio::test]
    async fn replacing_fields_orders_them_and_keeps_ids_by_key() {
        let app = TestApp::spawn().await;
        let admin = app.login("admin").await;
        let form_id = app.create_form(&admin).await;

        let res = app
            .put_with_token(
                &routes::form_fields(&form_id),
                &json!({"fields": [
                    {"key": "full_name", "label": "Full name", "field_type": "text", "required": true},
                    {"key": "birth_date", "label": "Birth date", "field_type": "date"},
                    {"section_index": 1, "key": "transcript", "label": "Transcript", "field_type": "file", "required": true},
                ]}),
                &admin,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        let fields = res.body.as_array().unwrap();
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0]["field_index"], 0);
        assert_eq!(fields[1]["field_index"], 1);
        assert_eq!(fields[2]["section_index"], 1);
        assert_eq!(fields[2]["field_index"], 0);
        let transcript_id = fields[2]["id"].as_str().unwrap().to_string();

        let res = app
            .put_with_token(
                &routes::form_fields(&form_id),
                &json!({"fields": [
                    {"key": "transcript", "label": "Latest transcript", "field_type": "file", "required": true},
                ]}),
                &admin,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        let fields = res.body.as_array().unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0]["id"], transcript_id.as_str());
        assert_eq!(fields[0]["label"], "Latest transcript");
    }

    #[tokio::test]
    async fn dropdown_without_options_is_rejected() {
        let app = TestApp::spawn().await;
        let admin = app.login("admin").await;
        let form_id = app.create_form(&admin).await;

        let res = app
            .put_with_token(
                &routes::form_fields(&form_id),
                &json!({"fields": [
                    {"key": "faculty", "label": "Faculty", "field_type": "dropdown", "options": []},
                ]}),
                &admin,
            )
            .await;

        assert_eq!(res.status, 422);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn duplicate_keys_are_rejected() {
        let app = TestApp::spawn().await;
        let admin = app.login("admin").await;
        let form_id = app.create_form(&admin).await;

        let res = app
            .put_with_token(
                &routes::form_fields(&form_id),
                &json!({"fields": [
                    {"key": "name", "label": "Name", "field_type": "text"},
                    {"key": "name", "label": "Name again", "field_type": "text"},
                ]}),
                &admin,
            )
            .await;

        assert_eq!(res.status, 422);
    }

    #[tokio::test]
    async fn students_cannot_manage_forms() {
        let app = TestApp::spawn().await;
        let student = app.login("2201001").await;

        let res = app
            .post_with_token(
                routes::ADMIN_FORMS,
                &json!({"scholarship_id": "SCH001", "title": "x"}),
                &student,
            )
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }
}

mod settings {
    use super::*;

    #[tokio::test]
    async fn closed_form_reports_its_rejection_code() {
        let app = TestApp::spawn().await;
        let admin = app.login("admin").await;
        let form_id = app.create_form(&admin).await;

        app.set_settings(&form_id, json!({"accept_responses": false}), &admin)
            .await;
        let res = app.get_without_token(&routes::public_form(&form_id)).await;

        assert_eq!(res.body["availability"], "RESPONSES_CLOSED");
    }

    #[tokio::test]
    async fn start_after_deadline_is_rejected() {
        let app = TestApp::spawn().await;
        let admin = app.login("admin").await;
        let form_id = app.create_form(&admin).await;

        let res = app
            .put_with_token(
                &routes::form_settings(&form_id),
                &json!({
                    "submission_start": "2030-02-01T00:00:00Z",
                    "submission_deadline": "2030-01-01T00:00:00Z",
                }),
                &admin,
            )
            .await;

        assert_eq!(res.status, 422);
    }

    #[tokio::test]
    async fn inactive_forms_are_hidden_from_the_public() {
        let app = TestApp::spawn().await;
        let admin = app.login("admin").await;
        let form_id = app.create_form(&admin).await;

        let res = app
            .patch_with_token(
                &routes::admin_form(&form_id),
                &json!({"is_active": false}),
                &admin,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        let res = app.get_without_token(&routes::public_form(&form_id)).await;
        assert_eq!(res.status, 404);
    }
}

mod deletion {
    use super::*;

    #[tokio::test]
    async fn scholarship_with_forms_cannot_be_deleted() {
        let app = TestApp::spawn().await;
        let admin = app.login("admin").await;
        app.create_form(&admin).await;

        let res = app
            .delete_with_token(&routes::admin_scholarship("SCH001"), &admin)
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn empty_form_can_be_deleted() {
        let app = TestApp::spawn().await;
        let admin = app.login("admin").await;
        let form_id = app.create_form(&admin).await;

        let res = app.delete_with_token(&routes::admin_form(&form_id), &admin).await;
        assert_eq!(res.status, 204);

        let res = app.get_with_token(&routes::admin_form(&form_id), &admin).await;
        assert_eq!(res.status, 404);
    }
}
