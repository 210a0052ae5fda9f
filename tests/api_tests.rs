use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use project_hub::{auth::USER_ID_HEADER, create_router, state::AppState, test_utils};
use serde_json::{json, Value};

async fn setup_server() -> TestServer {
    let state = test_utils::create_test_state().await;
    let app = create_router(state);
    TestServer::new(app).unwrap()
}

async fn setup_server_with_state() -> (TestServer, AppState) {
    let state = test_utils::create_test_state().await;
    let app = create_router(state.clone());
    (TestServer::new(app).unwrap(), state)
}

fn user_header(user_id: &str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static(USER_ID_HEADER),
        HeaderValue::from_str(user_id).unwrap(),
    )
}

async fn create_project(server: &TestServer, name: &str) -> String {
    let response = server
        .post("/api/projects")
        .json(&json!({
            "name": name,
            "status": "TODO",
            "priority": 3
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()["id"].as_str().unwrap().to_string()
}

async fn create_comment(server: &TestServer, body: Value) -> Value {
    let response = server.post("/api/comments").json(&body).await;
    response.assert_status(StatusCode::CREATED);
    response.json()
}

async fn sentinel_count(state: &AppState) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE email = $1")
        .bind("temp@example.com")
        .fetch_one(state.pool.as_ref())
        .await
        .unwrap()
}

fn id_of(body: &Value) -> String {
    body["id"].as_str().unwrap().to_string()
}

// ============================================================================
// Comment Tests
// ============================================================================

mod comment_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_comment_without_references() {
        let server = setup_server().await;

        let response = server
            .post("/api/comments")
            .json(&json!({
                "title": "Q1",
                "content": "ok",
                "projectId": null,
                "parentCommentId": null,
                "authorId": null
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        assert!(body["id"].is_string());
        assert_eq!(body["title"], "Q1");
        assert!(body["author"].is_null());
        assert!(body["project"].is_null());
        assert!(body["parentComment"].is_null());
        assert_eq!(body["_count"]["childComments"], 0);
        assert!(body.get("childComments").is_none());
    }

    #[tokio::test]
    async fn test_create_comment_with_author_and_project() {
        let (server, state) = setup_server_with_state().await;
        let user = test_utils::create_test_user(&state, "ada@example.com", "Ada").await;
        let project_id = create_project(&server, "Compiler").await;

        let body = create_comment(
            &server,
            json!({
                "title": "Parser",
                "content": "Needs error recovery",
                "projectId": project_id,
                "authorId": user.id.to_string()
            }),
        )
        .await;

        assert_eq!(body["authorId"], user.id.to_string());
        assert_eq!(body["author"]["name"], "Ada");
        assert_eq!(body["author"]["email"], "ada@example.com");
        assert_eq!(body["project"]["id"], project_id);
        assert_eq!(body["project"]["name"], "Compiler");
    }

    #[tokio::test]
    async fn test_create_reply_shows_parent_summary() {
        let (server, state) = setup_server_with_state().await;
        let user = test_utils::create_test_user(&state, "lin@example.com", "Lin").await;

        let parent = create_comment(
            &server,
            json!({ "title": "Root", "content": "first", "authorId": user.id.to_string() }),
        )
        .await;
        let parent_id = id_of(&parent);

        let reply = create_comment(
            &server,
            json!({
                "title": "Reply",
                "content": "second",
                "parentCommentId": parent_id,
                "authorId": null
            }),
        )
        .await;

        assert_eq!(reply["parentCommentId"], parent_id);
        assert_eq!(reply["parentComment"]["id"], parent_id);
        assert_eq!(reply["parentComment"]["title"], "Root");
        assert_eq!(reply["parentComment"]["author"]["name"], "Lin");
    }

    #[tokio::test]
    async fn test_create_with_unknown_author_persists_nothing() {
        let server = setup_server().await;

        let response = server
            .post("/api/comments")
            .json(&json!({
                "title": "Ghost",
                "content": "who wrote this",
                "authorId": uuid::Uuid::new_v4().to_string()
            }))
            .await;

        response.assert_status_not_found();
        assert_eq!(response.json::<Value>()["message"], "User not found");

        let list: Value = server.get("/api/comments").await.json();
        assert_eq!(list.as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_create_with_unknown_project_or_parent() {
        let server = setup_server().await;

        let response = server
            .post("/api/comments")
            .json(&json!({
                "title": "T",
                "content": "c",
                "projectId": uuid::Uuid::new_v4().to_string(),
                "authorId": null
            }))
            .await;
        response.assert_status_not_found();
        assert_eq!(response.json::<Value>()["message"], "Project not found");

        let response = server
            .post("/api/comments")
            .json(&json!({
                "title": "T",
                "content": "c",
                "parentCommentId": uuid::Uuid::new_v4().to_string(),
                "authorId": null
            }))
            .await;
        response.assert_status_not_found();
        assert_eq!(response.json::<Value>()["message"], "Parent comment not found");
    }

    #[tokio::test]
    async fn test_create_validation_errors() {
        let server = setup_server().await;

        let response = server
            .post("/api/comments")
            .json(&json!({
                "title": "",
                "content": "",
                "projectId": "not-a-uuid"
            }))
            .await;

        response.assert_status_bad_request();
        let body: Value = response.json();
        let fields: Vec<&str> = body["errors"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["field"].as_str().unwrap())
            .collect();
        assert!(fields.contains(&"title"));
        assert!(fields.contains(&"content"));
        assert!(fields.contains(&"projectId"));
        assert!(fields.contains(&"authorId"));
    }

    #[tokio::test]
    async fn test_create_requires_author_key() {
        let server = setup_server().await;

        let response = server
            .post("/api/comments")
            .json(&json!({ "title": "T", "content": "c" }))
            .await;

        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(
            body["errors"],
            json!([{ "field": "authorId", "message": "Required" }])
        );

        let response = server
            .post("/api/comments")
            .json(&json!({ "title": "T", "content": "c", "authorId": "" }))
            .await;
        response.assert_status(StatusCode::CREATED);
        assert!(response.json::<Value>()["authorId"].is_null());
    }

    #[tokio::test]
    async fn test_title_too_long() {
        let server = setup_server().await;

        let response = server
            .post("/api/comments")
            .json(&json!({ "title": "x".repeat(201), "content": "ok", "authorId": null }))
            .await;

        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["errors"][0]["field"], "title");
    }

    #[tokio::test]
    async fn test_title_length_counts_utf16_units() {
        let server = setup_server().await;

        // 150 emoji are 300 UTF-16 code units.
        let response = server
            .post("/api/comments")
            .json(&json!({
                "title": "\u{1F600}".repeat(150),
                "content": "ok",
                "authorId": null
            }))
            .await;
        response.assert_status_bad_request();
        assert_eq!(response.json::<Value>()["errors"][0]["field"], "title");

        let response = server
            .post("/api/comments")
            .json(&json!({
                "title": "\u{1F600}".repeat(100),
                "content": "ok",
                "authorId": null
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let server = setup_server().await;

        let response = server
            .post("/api/comments")
            .text("{ not json")
            .content_type("application/json")
            .await;

        response.assert_status_bad_request();
        assert_eq!(response.json::<Value>()["errors"][0]["field"], "body");
    }

    #[tokio::test]
    async fn test_round_trip_preserves_fields() {
        let server = setup_server().await;
        let project_id = create_project(&server, "Docs").await;

        let created = create_comment(
            &server,
            json!({
                "title": "Outline",
                "content": "Chapters 1-3",
                "projectId": project_id,
                "authorId": null
            }),
        )
        .await;

        let response = server.get(&format!("/api/comments/{}", id_of(&created))).await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["title"], "Outline");
        assert_eq!(body["content"], "Chapters 1-3");
        assert_eq!(body["projectId"], project_id);
        assert!(body["parentCommentId"].is_null());
        assert!(body["authorId"].is_null());
        assert_eq!(body["childComments"], json!([]));
    }

    #[tokio::test]
    async fn test_get_unknown_comment() {
        let server = setup_server().await;

        let response = server
            .get(&format!("/api/comments/{}", uuid::Uuid::new_v4()))
            .await;
        response.assert_status_not_found();
        assert_eq!(response.json::<Value>()["message"], "Comment not found");
    }

    #[tokio::test]
    async fn test_get_with_malformed_id() {
        let server = setup_server().await;

        let response = server.get("/api/comments/not-a-uuid").await;
        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn test_get_includes_children_oldest_first() {
        let server = setup_server().await;
        let root = create_comment(
            &server,
            json!({ "title": "Root", "content": "r", "authorId": null }),
        )
        .await;
        let root_id = id_of(&root);

        for title in ["first", "second", "third"] {
            create_comment(
                &server,
                json!({
                    "title": title,
                    "content": "reply",
                    "parentCommentId": root_id,
                    "authorId": null
                }),
            )
            .await;
        }

        let body: Value = server
            .get(&format!("/api/comments/{}", root_id))
            .await
            .json();
        let titles: Vec<&str> = body["childComments"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["first", "second", "third"]);
        assert_eq!(body["_count"]["childComments"], 3);
    }

    #[tokio::test]
    async fn test_list_defaults_to_root_comments_newest_first() {
        let server = setup_server().await;
        let older = create_comment(
            &server,
            json!({ "title": "Older", "content": "a", "authorId": null }),
        )
        .await;
        let newer = create_comment(
            &server,
            json!({ "title": "Newer", "content": "b", "authorId": null }),
        )
        .await;
        let reply = create_comment(
            &server,
            json!({
                "title": "Reply",
                "content": "c",
                "parentCommentId": id_of(&older),
                "authorId": null
            }),
        )
        .await;

        let list: Value = server.get("/api/comments").await.json();
        let ids: Vec<&str> = list
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec![id_of(&newer).as_str(), id_of(&older).as_str()]);
        assert!(!ids.contains(&id_of(&reply).as_str()));

        let older_entry = &list[1];
        assert_eq!(older_entry["childComments"][0]["id"], id_of(&reply));
        assert_eq!(older_entry["_count"]["childComments"], 1);
    }

    #[tokio::test]
    async fn test_list_by_parent_and_project() {
        let server = setup_server().await;
        let project_id = create_project(&server, "Filtered").await;

        let root = create_comment(
            &server,
            json!({ "title": "Root", "content": "r", "projectId": project_id, "authorId": null }),
        )
        .await;
        create_comment(
            &server,
            json!({ "title": "Elsewhere", "content": "e", "authorId": null }),
        )
        .await;
        let reply = create_comment(
            &server,
            json!({
                "title": "Reply",
                "content": "c",
                "parentCommentId": id_of(&root),
                "authorId": null
            }),
        )
        .await;

        let replies: Value = server
            .get("/api/comments")
            .add_query_param("parentCommentId", id_of(&root))
            .await
            .json();
        assert_eq!(replies.as_array().unwrap().len(), 1);
        assert_eq!(replies[0]["id"], id_of(&reply));

        let in_project: Value = server
            .get("/api/comments")
            .add_query_param("projectId", &project_id)
            .await
            .json();
        assert_eq!(in_project.as_array().unwrap().len(), 1);
        assert_eq!(in_project[0]["id"], id_of(&root));
    }

    #[tokio::test]
    async fn test_list_with_malformed_filter() {
        let server = setup_server().await;

        let response = server
            .get("/api/comments")
            .add_query_param("projectId", "nope")
            .await;
        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn test_update_replaces_fields() {
        let (server, state) = setup_server_with_state().await;
        let user = test_utils::create_test_user(&state, "mo@example.com", "Mo").await;
        let project_id = create_project(&server, "Updates").await;
        let created = create_comment(
            &server,
            json!({ "title": "Draft", "content": "v1", "authorId": null }),
        )
        .await;

        let response = server
            .put(&format!("/api/comments/{}", id_of(&created)))
            .json(&json!({
                "title": "Final",
                "content": "v2",
                "projectId": project_id,
                "authorId": user.id.to_string()
            }))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["title"], "Final");
        assert_eq!(body["content"], "v2");
        assert_eq!(body["project"]["name"], "Updates");
        assert_eq!(body["author"]["name"], "Mo");
        assert!(body.get("childComments").is_none());
    }

    #[tokio::test]
    async fn test_update_absent_keeps_and_null_clears() {
        let server = setup_server().await;
        let project_id = create_project(&server, "Keep").await;
        let created = create_comment(
            &server,
            json!({ "title": "T", "content": "c", "projectId": project_id, "authorId": null }),
        )
        .await;
        let path = format!("/api/comments/{}", id_of(&created));

        let kept: Value = server
            .put(&path)
            .json(&json!({ "title": "T2", "content": "c2", "authorId": null }))
            .await
            .json();
        assert_eq!(kept["projectId"], project_id);

        let cleared: Value = server
            .put(&path)
            .json(&json!({ "title": "T3", "content": "c3", "projectId": null, "authorId": null }))
            .await
            .json();
        assert!(cleared["projectId"].is_null());
        assert!(cleared["project"].is_null());
    }

    #[tokio::test]
    async fn test_update_requires_complete_payload() {
        let server = setup_server().await;
        let created = create_comment(
            &server,
            json!({ "title": "T", "content": "c", "authorId": null }),
        )
        .await;

        let response = server
            .put(&format!("/api/comments/{}", id_of(&created)))
            .json(&json!({ "title": "Only title" }))
            .await;
        response.assert_status_bad_request();
        assert_eq!(response.json::<Value>()["errors"][0]["field"], "content");
    }

    #[tokio::test]
    async fn test_update_unknown_comment_and_references() {
        let server = setup_server().await;

        let response = server
            .put(&format!("/api/comments/{}", uuid::Uuid::new_v4()))
            .json(&json!({ "title": "T", "content": "c", "authorId": null }))
            .await;
        response.assert_status_not_found();

        let created = create_comment(
            &server,
            json!({ "title": "T", "content": "c", "authorId": null }),
        )
        .await;
        let response = server
            .put(&format!("/api/comments/{}", id_of(&created)))
            .json(&json!({
                "title": "T",
                "content": "c",
                "authorId": uuid::Uuid::new_v4().to_string()
            }))
            .await;
        response.assert_status_not_found();
        assert_eq!(response.json::<Value>()["message"], "User not found");

        let response = server
            .put(&format!("/api/comments/{}", id_of(&created)))
            .json(&json!({
                "title": "T",
                "content": "c",
                "projectId": uuid::Uuid::new_v4().to_string(),
                "authorId": null
            }))
            .await;
        response.assert_status_not_found();
        assert_eq!(response.json::<Value>()["message"], "Project not found");

        let response = server
            .put(&format!("/api/comments/{}", id_of(&created)))
            .json(&json!({
                "title": "T",
                "content": "c",
                "parentCommentId": uuid::Uuid::new_v4().to_string(),
                "authorId": null
            }))
            .await;
        response.assert_status_not_found();
        assert_eq!(response.json::<Value>()["message"], "Parent comment not found");

        let unchanged: Value = server
            .get(&format!("/api/comments/{}", id_of(&created)))
            .await
            .json();
        assert!(unchanged["projectId"].is_null());
        assert!(unchanged["parentCommentId"].is_null());
    }

    #[tokio::test]
    async fn test_update_rejects_reply_cycles() {
        let server = setup_server().await;
        let root = create_comment(
            &server,
            json!({ "title": "Root", "content": "r", "authorId": null }),
        )
        .await;
        let reply = create_comment(
            &server,
            json!({
                "title": "Reply",
                "content": "c",
                "parentCommentId": id_of(&root),
                "authorId": null
            }),
        )
        .await;
        let root_path = format!("/api/comments/{}", id_of(&root));

        let response = server
            .put(&root_path)
            .json(&json!({
                "title": "Root",
                "content": "r",
                "parentCommentId": id_of(&root),
                "authorId": null
            }))
            .await;
        response.assert_status_bad_request();

        let response = server
            .put(&root_path)
            .json(&json!({
                "title": "Root",
                "content": "r",
                "parentCommentId": id_of(&reply),
                "authorId": null
            }))
            .await;
        response.assert_status_bad_request();
        assert_eq!(
            response.json::<Value>()["errors"][0]["field"],
            "parentCommentId"
        );
    }

    #[tokio::test]
    async fn test_delete_cascades_to_replies() {
        let server = setup_server().await;
        let root = create_comment(
            &server,
            json!({ "title": "Root", "content": "r", "authorId": null }),
        )
        .await;
        let root_id = id_of(&root);

        let mut reply_ids = Vec::new();
        for i in 0..3 {
            let reply = create_comment(
                &server,
                json!({
                    "title": format!("Reply {}", i),
                    "content": "c",
                    "parentCommentId": root_id,
                    "authorId": null
                }),
            )
            .await;
            reply_ids.push(id_of(&reply));
        }
        let nested = create_comment(
            &server,
            json!({
                "title": "Nested",
                "content": "n",
                "parentCommentId": reply_ids[0],
                "authorId": null
            }),
        )
        .await;

        let response = server.delete(&format!("/api/comments/{}", root_id)).await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["deletedId"], root_id);
        assert!(body["message"].is_string());

        for id in reply_ids.iter().chain(std::iter::once(&id_of(&nested))) {
            server
                .get(&format!("/api/comments/{}", id))
                .await
                .assert_status_not_found();
        }
    }

    #[tokio::test]
    async fn test_delete_unknown_comment() {
        let server = setup_server().await;

        server
            .delete(&format!("/api/comments/{}", uuid::Uuid::new_v4()))
            .await
            .assert_status_not_found();
    }
}

// ============================================================================
// Project Tests
// ============================================================================

mod project_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_project() {
        let server = setup_server().await;

        let response = server
            .post("/api/projects")
            .json(&json!({
                "name": "Website",
                "description": "Marketing site",
                "image": "https://example.com/site.png",
                "status": "IN_PROGRESS",
                "priority": 2,
                "startDate": "2025-03-01",
                "endDate": "2025-06-30T12:00:00Z"
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["name"], "Website");
        assert_eq!(body["status"], "IN_PROGRESS");
        assert_eq!(body["priority"], 2);
        assert!(body["startDate"].as_str().unwrap().starts_with("2025-03-01T00:00:00"));
        assert_eq!(body["creator"]["email"], "temp@example.com");
        assert_eq!(body["users"], json!([]));
        assert_eq!(body["comments"], json!([]));
        assert_eq!(body["_count"]["users"], 0);
        assert_eq!(body["_count"]["comments"], 0);
    }

    #[tokio::test]
    async fn test_create_project_empty_optionals_are_null() {
        let server = setup_server().await;

        let response = server
            .post("/api/projects")
            .json(&json!({
                "name": "Bare",
                "description": "",
                "image": "",
                "status": "TODO",
                "priority": 1,
                "startDate": null
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        assert!(body["description"].is_null());
        assert!(body["image"].is_null());
        assert!(body["startDate"].is_null());
        assert!(body["endDate"].is_null());
    }

    #[tokio::test]
    async fn test_create_project_validation() {
        let server = setup_server().await;

        let response = server
            .post("/api/projects")
            .json(&json!({
                "name": "",
                "image": "not a url",
                "status": "ARCHIVED",
                "priority": 9
            }))
            .await;

        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["message"], "Invalid data");
        assert_eq!(body["errors"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_sentinel_creator_is_provisioned_once() {
        let (server, state) = setup_server_with_state().await;

        let first = create_project(&server, "One").await;
        let second = create_project(&server, "Two").await;
        create_project(&server, "Three").await;

        assert_eq!(sentinel_count(&state).await, 1);

        let a = state.projects.get_by_id(first.parse().unwrap()).await.unwrap();
        let b = state.projects.get_by_id(second.parse().unwrap()).await.unwrap();
        assert!(a.creator_id.is_some());
        assert_eq!(a.creator_id, b.creator_id);
    }

    #[tokio::test]
    async fn test_session_user_becomes_creator() {
        let (server, state) = setup_server_with_state().await;
        let user = test_utils::create_test_user(&state, "owner@example.com", "Owner").await;
        let (name, value) = user_header(&user.id.to_string());

        let response = server
            .post("/api/projects")
            .add_header(name, value)
            .json(&json!({ "name": "Mine", "status": "REVIEW", "priority": 4 }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["creatorId"], user.id.to_string());
        assert_eq!(body["creator"]["name"], "Owner");
        assert_eq!(sentinel_count(&state).await, 0);
    }

    #[tokio::test]
    async fn test_unknown_session_user_falls_back_to_sentinel() {
        let server = setup_server().await;
        let (name, value) = user_header(&uuid::Uuid::new_v4().to_string());

        let response = server
            .post("/api/projects")
            .add_header(name, value)
            .json(&json!({ "name": "Orphan", "status": "TODO", "priority": 1 }))
            .await;

        response.assert_status(StatusCode::CREATED);
        assert_eq!(response.json::<Value>()["creator"]["email"], "temp@example.com");
    }

    #[tokio::test]
    async fn test_list_projects_with_recent_comments() {
        let server = setup_server().await;
        let older = create_project(&server, "Older").await;
        let newer = create_project(&server, "Newer").await;

        for i in 0..7 {
            create_comment(
                &server,
                json!({
                    "title": format!("Note {}", i),
                    "content": "c",
                    "projectId": newer,
                    "authorId": null
                }),
            )
            .await;
        }

        let list: Value = server.get("/api/projects").await.json();
        let projects = list.as_array().unwrap();
        assert_eq!(projects.len(), 2);
        assert_eq!(projects[0]["id"], newer);
        assert_eq!(projects[1]["id"], older);

        let recent = projects[0]["comments"].as_array().unwrap();
        assert_eq!(recent.len(), 5);
        assert_eq!(recent[0]["title"], "Note 6");
        assert_eq!(projects[0]["_count"]["comments"], 7);
    }

    #[tokio::test]
    async fn test_get_project_with_threads() {
        let server = setup_server().await;
        let project_id = create_project(&server, "Threads").await;

        let root = create_comment(
            &server,
            json!({ "title": "Root", "content": "r", "projectId": project_id, "authorId": null }),
        )
        .await;
        create_comment(
            &server,
            json!({
                "title": "Reply",
                "content": "c",
                "projectId": project_id,
                "parentCommentId": id_of(&root),
                "authorId": null
            }),
        )
        .await;

        let response = server.get(&format!("/api/projects/{}", project_id)).await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["name"], "Threads");
        assert_eq!(body["creator"]["role"], "USER");
        assert_eq!(body["_count"]["comments"], 2);

        let comments = body["comments"].as_array().unwrap();
        let root_entry = comments
            .iter()
            .find(|c| c["id"] == id_of(&root))
            .unwrap();
        assert_eq!(root_entry["childComments"][0]["title"], "Reply");
    }

    #[tokio::test]
    async fn test_get_unknown_project() {
        let server = setup_server().await;

        let response = server
            .get(&format!("/api/projects/{}", uuid::Uuid::new_v4()))
            .await;
        response.assert_status_not_found();
        assert_eq!(response.json::<Value>()["message"], "Project not found");
    }

    #[tokio::test]
    async fn test_update_project_any_status_transition() {
        let server = setup_server().await;
        let project_id = create_project(&server, "Lifecycle").await;
        let path = format!("/api/projects/{}", project_id);

        for status in ["DONE", "TODO", "CANCELLED", "IN_PROGRESS"] {
            let response = server
                .put(&path)
                .json(&json!({ "name": "Lifecycle", "status": status, "priority": 5 }))
                .await;
            response.assert_status_ok();
            assert_eq!(response.json::<Value>()["status"], status);
        }
    }

    #[tokio::test]
    async fn test_update_unknown_project() {
        let server = setup_server().await;

        server
            .put(&format!("/api/projects/{}", uuid::Uuid::new_v4()))
            .json(&json!({ "name": "X", "status": "TODO", "priority": 1 }))
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn test_delete_project_returns_summary() {
        let (server, state) = setup_server_with_state().await;
        let user = test_utils::create_test_user(&state, "m@example.com", "Member").await;
        let project_id = create_project(&server, "Doomed").await;
        server
            .post(&format!("/api/projects/{}/users/{}", project_id, user.id))
            .await
            .assert_status_ok();
        let comment = create_comment(
            &server,
            json!({ "title": "Bye", "content": "c", "projectId": project_id, "authorId": null }),
        )
        .await;

        let response = server.delete(&format!("/api/projects/{}", project_id)).await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["deletedProject"]["id"], project_id);
        assert_eq!(body["deletedProject"]["name"], "Doomed");
        assert_eq!(body["deletedProject"]["commentsCount"], 1);
        assert_eq!(body["deletedProject"]["usersCount"], 1);

        server
            .get(&format!("/api/projects/{}", project_id))
            .await
            .assert_status_not_found();

        // The comment survives without its project.
        let orphan: Value = server
            .get(&format!("/api/comments/{}", id_of(&comment)))
            .await
            .json();
        assert!(orphan["projectId"].is_null());
    }

    #[tokio::test]
    async fn test_membership_and_projects_by_user() {
        let (server, state) = setup_server_with_state().await;
        let user = test_utils::create_test_user(&state, "dev@example.com", "Dev").await;
        let assigned = create_project(&server, "Assigned").await;
        create_project(&server, "Unrelated").await;

        let path = format!("/api/projects/{}/users/{}", assigned, user.id);
        server.post(&path).await.assert_status_ok();
        server.post(&path).await.assert_status_ok();

        let mine: Value = server
            .get("/api/projects/projectByUser")
            .add_query_param("userId", user.id)
            .await
            .json();
        let mine = mine.as_array().unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0]["id"], assigned);
        assert_eq!(mine[0]["users"][0]["email"], "dev@example.com");
        assert_eq!(mine[0]["_count"]["users"], 1);

        server.delete(&path).await.assert_status_ok();
        server.delete(&path).await.assert_status_not_found();

        let mine: Value = server
            .get("/api/projects/projectByUser")
            .add_query_param("userId", user.id)
            .await
            .json();
        assert_eq!(mine.as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_projects_by_unknown_user() {
        let server = setup_server().await;

        server
            .get("/api/projects/projectByUser")
            .add_query_param("userId", uuid::Uuid::new_v4())
            .await
            .assert_status_not_found();

        server
            .get("/api/projects/projectByUser")
            .await
            .assert_status_bad_request();
    }
}

// ============================================================================
// Dashboard Tests
// ============================================================================

mod stats_tests {
    use super::*;

    #[tokio::test]
    async fn test_dashboard_stats() {
        let server = setup_server().await;

        let active = create_project(&server, "Active").await;
        server
            .put(&format!("/api/projects/{}", active))
            .json(&json!({ "name": "Active", "status": "IN_PROGRESS", "priority": 2 }))
            .await
            .assert_status_ok();
        let done = create_project(&server, "Done").await;
        server
            .put(&format!("/api/projects/{}", done))
            .json(&json!({ "name": "Done", "status": "DONE", "priority": 2 }))
            .await
            .assert_status_ok();
        create_project(&server, "Idle").await;

        let root = create_comment(
            &server,
            json!({ "title": "Root", "content": "r", "authorId": null }),
        )
        .await;
        create_comment(
            &server,
            json!({
                "title": "Reply",
                "content": "c",
                "parentCommentId": id_of(&root),
                "authorId": null
            }),
        )
        .await;

        let stats: Value = server.get("/api/stats").await.json();
        assert_eq!(stats["totalProjects"], 3);
        assert_eq!(stats["totalComments"], 2);
        assert_eq!(stats["activeProjects"], 1);
        assert_eq!(stats["completedProjects"], 1);
    }
}
