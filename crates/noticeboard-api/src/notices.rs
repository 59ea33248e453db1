use axum::{
    Form, Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{debug, info};

use noticeboard_db::models::AppendResult;
use noticeboard_types::api::{
    ACTION_GET_NOTICES, ACTION_POST_NOTICE, ActionQuery, ListNoticesResponse, NoticeRow,
    PostNoticeForm, PostOutcome,
};
use noticeboard_types::models::{Cursor, Notice};
use noticeboard_types::{MAX_CONTENT_CHARS, content_within_limit, new_notice_id, now_timestamp};

use crate::error::ApiError;
use crate::state::AppState;

/// GET /?action=getNotices&lastRowNumber=N
pub async fn get_action(
    State(state): State<AppState>,
    Query(query): Query<ActionQuery>,
) -> Result<Json<ListNoticesResponse>, ApiError> {
    if query.action.as_deref() != Some(ACTION_GET_NOTICES) {
        return Err(ApiError::UnknownAction);
    }

    let cursor = parse_cursor(query.last_row_number.as_deref())?;

    // Run the blocking query off the async runtime
    let db = state.clone();
    let limit = state.first_load_limit;
    let batch = tokio::task::spawn_blocking(move || db.db.list_since(cursor.0, limit))
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))??;

    debug!(
        "getNotices from {} -> {} rows, cursor {}",
        cursor,
        batch.notices.len(),
        batch.cursor
    );

    Ok(Json(ListNoticesResponse {
        rows: batch.notices.into_iter().map(NoticeRow::from).collect(),
        last_row_number: Cursor(batch.cursor),
    }))
}

/// POST /?action=postNotice with a form-encoded notice.
pub async fn post_action(
    State(state): State<AppState>,
    Query(query): Query<ActionQuery>,
    Form(form): Form<PostNoticeForm>,
) -> Result<impl IntoResponse, ApiError> {
    if query.action.as_deref() != Some(ACTION_POST_NOTICE) {
        return Err(ApiError::UnknownAction);
    }

    let notice = notice_from_form(form)?;
    let id = notice.id.clone();

    let db = state.clone();
    let result = tokio::task::spawn_blocking(move || db.db.append_notice(&notice))
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))??;

    match result {
        AppendResult::Appended { row_number } => {
            info!("Appended notice {} at row {}", id, row_number);
            Ok((StatusCode::OK, Json(PostOutcome::ok())))
        }
        AppendResult::DuplicateId => Err(ApiError::Duplicate),
    }
}

pub async fn health() -> &'static str {
    "ok"
}

/// A missing cursor means "never synced". Anything else must be a
/// non-negative integer.
fn parse_cursor(raw: Option<&str>) -> Result<Cursor, ApiError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(Cursor::START),
        Some(v) => v
            .parse::<u64>()
            .map(Cursor)
            .map_err(|_| ApiError::Validation(format!("Invalid lastRowNumber: {}", v))),
    }
}

fn non_blank(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.trim().is_empty())
}

/// Validate a submitted form and fill in server-assigned fields.
fn notice_from_form(form: PostNoticeForm) -> Result<Notice, ApiError> {
    let (Some(author), Some(content)) = (non_blank(form.author), non_blank(form.content)) else {
        return Err(ApiError::Validation("Author and content are required.".into()));
    };

    if !content_within_limit(&content) {
        return Err(ApiError::Validation(format!(
            "Notice content exceeds {} characters.",
            MAX_CONTENT_CHARS
        )));
    }

    Ok(Notice {
        id: non_blank(form.id).unwrap_or_else(new_notice_id),
        author,
        content,
        timestamp: non_blank(form.timestamp).unwrap_or_else(now_timestamp),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AppStateInner;
    use axum::body::Body;
    use axum::http::{Request, Response, header};
    use http_body_util::BodyExt;
    use noticeboard_db::Database;
    use tower::ServiceExt;

    fn app() -> (axum::Router, AppState) {
        let state = AppStateInner::new(Database::open_in_memory().unwrap());
        (crate::router(state.clone()), state)
    }

    async fn json_body(resp: Response<Body>) -> serde_json::Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/?action=postNotice")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn post_then_list_round_trip() {
        let (app, _) = app();

        let form = "id=abc&author=ann&content=hello+board&timestamp=2024-05-01+09%3A00%3A00";
        let resp = app.clone().oneshot(post(form)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            json_body(resp).await,
            serde_json::json!({ "success": true })
        );

        let resp = app
            .oneshot(get("/?action=getNotices&lastRowNumber=0"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            json_body(resp).await,
            serde_json::json!({
                "rows": [["abc", "ann", "hello board", "2024-05-01 09:00:00"]],
                "lastRowNumber": 1
            })
        );
    }

    #[tokio::test]
    async fn missing_cursor_is_treated_as_first_load() {
        let (app, state) = app();
        state
            .db
            .append_notice(&Notice::compose("ann", "hi"))
            .unwrap();

        let resp = app.oneshot(get("/?action=getNotices")).await.unwrap();
        let body = json_body(resp).await;
        assert_eq!(body["rows"].as_array().unwrap().len(), 1);
        assert_eq!(body["lastRowNumber"], 1);
    }

    #[tokio::test]
    async fn list_at_high_water_mark_echoes_cursor() {
        let (app, state) = app();
        state
            .db
            .append_notice(&Notice::compose("ann", "hi"))
            .unwrap();

        for _ in 0..2 {
            let resp = app
                .clone()
                .oneshot(get("/?action=getNotices&lastRowNumber=1"))
                .await
                .unwrap();
            assert_eq!(
                json_body(resp).await,
                serde_json::json!({ "rows": [], "lastRowNumber": 1 })
            );
        }
    }

    #[tokio::test]
    async fn server_fills_in_missing_id_and_timestamp() {
        let (app, state) = app();

        let resp = app.oneshot(post("author=bob&content=no+id")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let batch = state.db.list_since(0, 100).unwrap();
        let stored = &batch.notices[0];
        assert!(uuid_like(&stored.id));
        assert_eq!(stored.timestamp.len(), 19);
        assert_eq!(stored.author, "bob");
    }

    fn uuid_like(s: &str) -> bool {
        s.len() == 36 && s.chars().filter(|c| *c == '-').count() == 4
    }

    #[tokio::test]
    async fn blank_author_or_content_is_rejected() {
        let (app, state) = app();

        for body in ["author=&content=hi", "author=ann&content=+++", "content=hi"] {
            let resp = app.clone().oneshot(post(body)).await.unwrap();
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            assert_eq!(
                json_body(resp).await,
                serde_json::json!({ "success": false, "error": "Author and content are required." })
            );
        }
        assert_eq!(state.db.count_notices().unwrap(), 0);
    }

    #[tokio::test]
    async fn content_length_is_enforced_server_side() {
        let (app, state) = app();

        let ok = format!("author=ann&content={}", "a".repeat(MAX_CONTENT_CHARS));
        let resp = app.clone().oneshot(post(&ok)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let too_long = format!("author=ann&content={}", "a".repeat(MAX_CONTENT_CHARS + 1));
        let resp = app.oneshot(post(&too_long)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(resp).await["success"], false);

        assert_eq!(state.db.count_notices().unwrap(), 1);
    }

    #[tokio::test]
    async fn duplicate_id_is_a_conflict() {
        let (app, _) = app();
        let resp = app
            .clone()
            .oneshot(post("id=x1&author=ann&content=one"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = app
            .oneshot(post("id=x1&author=eve&content=two"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        assert_eq!(json_body(resp).await["success"], false);
    }

    #[tokio::test]
    async fn unknown_action_is_rejected() {
        let (app, _) = app();
        for uri in ["/", "/?action=deleteNotice"] {
            let resp = app.clone().oneshot(get(uri)).await.unwrap();
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            assert_eq!(json_body(resp).await["error"], "Unknown action");
        }
    }

    #[tokio::test]
    async fn malformed_cursor_is_a_validation_error() {
        let (app, _) = app();
        let resp = app
            .oneshot(get("/?action=getNotices&lastRowNumber=-3"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(resp).await["error"], "Invalid lastRowNumber: -3");
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (app, _) = app();
        let resp = app.oneshot(get("/health")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
