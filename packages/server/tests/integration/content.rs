use reqwest::Method;
use serde_json::json;

use crate::common::{Field, TestApp, pdf_bytes, routes};

async fn upload(app: &TestApp, token: &str, folder: &str, file_name: &str) -> String {
    let res = app
        .multipart_with_token(
            Method::POST,
            routes::ADMIN_UPLOADS,
            vec![
                Field::Text("folder", folder),
                Field::File("file", file_name, pdf_bytes()),
            ],
            token,
        )
        .await;
    assert_eq!(res.status, 201, "upload failed: {}", res.text);
    res.body["path"].as_str().unwrap().to_string()
}

mod news {
    use super::*;

    #[tokio::test]
    async fn only_published_news_is_public() {
        let app = TestApp::spawn().await;
        let admin = app.login("admin").await;

        let draft = app
            .post_with_token(
                routes::ADMIN_NEWS,
                &json!({"title": "Draft", "content": "Not yet"}),
                &admin,
            )
            .await;
        assert_eq!(draft.status, 201, "{}", draft.text);
        assert!(draft.body["published_at"].is_null());

        let published = app
            .post_with_token(
                routes::ADMIN_NEWS,
                &json!({"title": "PKM 2025", "content": "Open now", "is_published": true}),
                &admin,
            )
            .await;
        assert_eq!(published.status, 201);
        assert!(published.body["published_at"].is_string());

        let list = app.get_without_token(routes::NEWS).await;
        assert_eq!(list.status, 200);
        assert_eq!(list.body["pagination"]["total"], 1);
        assert_eq!(list.body["data"][0]["title"], "PKM 2025");

        let res = app.get_without_token(&routes::news(&draft.id())).await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn publishing_later_stamps_published_at_once() {
        let app = TestApp::spawn().await;
        let admin = app.login("admin").await;
        let id = app
            .post_with_token(
                routes::ADMIN_NEWS,
                &json!({"title": "Later", "content": "Body"}),
                &admin,
            )
            .await
            .id();

        let first = app
            .patch_with_token(&routes::admin_news(&id), &json!({"is_published": true}), &admin)
            .await;
        assert_eq!(first.status, 200, "{}", first.text);
        let stamp = first.body["published_at"].clone();
        assert!(stamp.is_string());

        let second = app
            .patch_with_token(&routes::admin_news(&id), &json!({"title": "Later, edited"}), &admin)
            .await;
        assert_eq!(second.body["published_at"], stamp);
    }

    #[tokio::test]
    async fn thumbnail_must_be_uploaded_first() {
        let app = TestApp::spawn().await;
        let admin = app.login("admin").await;

        let res = app
            .post_with_token(
                routes::ADMIN_NEWS,
                &json!({
                    "title": "With image",
                    "content": "Body",
                    "thumbnail_path": "news/00000000-0000-0000-0000-000000000000.png",
                }),
                &admin,
            )
            .await;

        assert_eq!(res.status, 422);
    }

    #[tokio::test]
    async fn deleting_a_category_uncategorizes_its_news() {
        let app = TestApp::spawn().await;
        let admin = app.login("admin").await;

        let category = app
            .post_with_token(routes::ADMIN_CATEGORIES, &json!({"name": "Events"}), &admin)
            .await;
        assert_eq!(category.status, 201, "{}", category.text);
        let category_id = category.id();

        let duplicate = app
            .post_with_token(routes::ADMIN_CATEGORIES, &json!({"name": "Events"}), &admin)
            .await;
        assert_eq!(duplicate.status, 409);

        let news_id = app
            .post_with_token(
                routes::ADMIN_NEWS,
                &json!({"title": "Expo", "content": "Body", "category_id": category_id}),
                &admin,
            )
            .await
            .id();

        let res = app
            .delete_with_token(&routes::admin_category(&category_id), &admin)
            .await;
        assert_eq!(res.status, 204);

        let res = app.get_with_token(&routes::admin_news(&news_id), &admin).await;
        assert!(res.body["category_id"].is_null());
    }

    #[tokio::test]
    async fn students_cannot_write_news() {
        let app = TestApp::spawn().await;
        let student = app.login("2201001").await;

        let res = app
            .post_with_token(
                routes::ADMIN_NEWS,
                &json!({"title": "x", "content": "y"}),
                &student,
            )
            .await;

        assert_eq!(res.status, 403);
    }
}

mod files {
    use super::*;

    #[tokio::test]
    async fn uploaded_files_are_served_from_storage() {
        let app = TestApp::spawn().await;
        let admin = app.login("admin").await;

        let path = upload(&app, &admin, "general", "guide.pdf").await;
        assert!(path.starts_with("general/"));
        assert!(path.ends_with(".pdf"));

        let res = app
            .client
            .get(app.url(&format!("/storage/{path}")))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status().as_u16(), 200);
        assert_eq!(res.bytes().await.unwrap().to_vec(), pdf_bytes());
    }

    #[tokio::test]
    async fn unknown_folder_and_extension_are_rejected() {
        let app = TestApp::spawn().await;
        let admin = app.login("admin").await;

        let res = app
            .multipart_with_token(
                Method::POST,
                routes::ADMIN_UPLOADS,
                vec![
                    Field::Text("folder", "secrets"),
                    Field::File("file", "a.pdf", pdf_bytes()),
                ],
                &admin,
            )
            .await;
        assert_eq!(res.status, 422);

        let res = app
            .multipart_with_token(
                Method::POST,
                routes::ADMIN_UPLOADS,
                vec![
                    Field::Text("folder", "general"),
                    Field::File("file", "run.sh", b"echo".to_vec()),
                ],
                &admin,
            )
            .await;
        assert_eq!(res.status, 422);
    }

    #[tokio::test]
    async fn downloads_stream_with_an_attachment_name() {
        let app = TestApp::spawn().await;
        let admin = app.login("admin").await;
        let path = upload(&app, &admin, "downloads", "kip.pdf").await;

        let created = app
            .post_with_token(
                routes::ADMIN_DOWNLOADS,
                &json!({"title": "Panduan KIP", "file_path": path}),
                &admin,
            )
            .await;
        assert_eq!(created.status, 201, "{}", created.text);
        assert_eq!(created.body["file_name"], "Panduan KIP.pdf");

        let res = app
            .client
            .get(app.url(&routes::download_file(&created.id())))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status().as_u16(), 200);
        let disposition = res
            .headers()
            .get("content-disposition")
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.starts_with("attachment"));
        assert_eq!(res.bytes().await.unwrap().to_vec(), pdf_bytes());
    }

    #[tokio::test]
    async fn deleting_a_download_removes_its_file() {
        let app = TestApp::spawn().await;
        let admin = app.login("admin").await;
        let path = upload(&app, &admin, "downloads", "form.pdf").await;
        let id = app
            .post_with_token(
                routes::ADMIN_DOWNLOADS,
                &json!({"title": "Form", "file_path": path}),
                &admin,
            )
            .await
            .id();
        assert!(app.stored(&path));

        let res = app
            .delete_with_token(&format!("{}/{id}", routes::ADMIN_DOWNLOADS), &admin)
            .await;

        assert_eq!(res.status, 204);
        assert!(!app.stored(&path));
    }
}

mod carousel {
    use super::*;

    #[tokio::test]
    async fn slides_append_in_order_and_inactive_ones_are_hidden() {
        let app = TestApp::spawn().await;
        let admin = app.login("admin").await;
        let image = upload(&app, &admin, "carousel", "slide.png").await;

        for (title, active) in [("First", true), ("Hidden", false), ("Third", true)] {
            let res = app
                .post_with_token(
                    routes::ADMIN_CAROUSEL,
                    &json!({"title": title, "image_path": image, "is_active": active}),
                    &admin,
                )
                .await;
            assert_eq!(res.status, 201, "{}", res.text);
        }

        let res = app.get_without_token(routes::CAROUSEL).await;
        let slides = res.body.as_array().unwrap();
        assert_eq!(slides.len(), 2);
        assert_eq!(slides[0]["title"], "First");
        assert_eq!(slides[0]["position"], 0);
        assert_eq!(slides[1]["title"], "Third");
        assert_eq!(slides[1]["position"], 2);
    }
}

mod organizations {
    use super::*;

    #[tokio::test]
    async fn profiles_are_seeded_and_public() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(&routes::organization("bem")).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["kind"], "bem");

        let res = app.get_without_token(&routes::organization("senate")).await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn each_board_edits_only_its_own_profile() {
        let app = TestApp::spawn().await;
        let bem = app.login("bem-ketua").await;
        let body = json!({"name": "BEM Universitas", "vision": "Serve students"});

        let res = app
            .put_with_token(&routes::organization("bem"), &body, &bem)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["vision"], "Serve students");

        let res = app
            .put_with_token(&routes::organization("mpm"), &body, &bem)
            .await;
        assert_eq!(res.status, 403);
    }
}
