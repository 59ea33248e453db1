use std::sync::Arc;
use std::time::Duration;

use noticeboard_api::AppStateInner;
use noticeboard_client::{
    FeedView, HttpTransport, MemoryStore, NoticeStatus, NoticeTransport, PollOutcome, SyncEngine,
    SyncError,
};
use noticeboard_db::Database;
use noticeboard_types::models::{Cursor, Notice};

type Engine = SyncEngine<HttpTransport, FeedView, Arc<MemoryStore>>;

struct Board {
    url: String,
    _dir: tempfile::TempDir,
}

async fn start_board() -> Board {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(&dir.path().join("board.db")).unwrap();
    let app = noticeboard_api::router(AppStateInner::new(db));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Board {
        url: format!("http://{}/", addr),
        _dir: dir,
    }
}

fn merged(added: usize, duplicates: usize, cursor: u64) -> PollOutcome {
    PollOutcome::Merged {
        added,
        duplicates,
        cursor: Cursor(cursor),
    }
}

fn client(board: &Board) -> Engine {
    let transport = HttpTransport::new(board.url.clone(), Duration::from_secs(5)).unwrap();
    SyncEngine::new(transport, FeedView::new(), Arc::new(MemoryStore::new()))
}

#[tokio::test]
async fn post_is_confirmed_and_echo_is_not_duplicated() {
    let board = start_board().await;
    let engine = client(&board);

    let outcome = engine.poll().await.unwrap();
    assert_eq!(
        outcome,
        PollOutcome::Empty {
            cursor: Cursor::START
        }
    );

    let posted = engine.post_notice("ann", "  first notice  ").await.unwrap();
    assert_eq!(posted.content, "first notice");
    assert_eq!(
        engine.renderer().status_of(&posted.id),
        Some(NoticeStatus::Confirmed)
    );

    let outcome = engine.poll().await.unwrap();
    assert_eq!(outcome, merged(0, 1, 1));
    assert_eq!(engine.renderer().ids(), [posted.id.clone()]);
}

#[tokio::test]
async fn second_client_sees_the_post() {
    let board = start_board().await;
    let writer = client(&board);
    let reader = client(&board);

    for i in 0..3 {
        writer.post_notice("ann", &format!("notice {i}")).await.unwrap();
    }

    let outcome = reader.poll().await.unwrap();
    assert_eq!(outcome, merged(3, 0, 3));
    let contents: Vec<_> = reader
        .notices()
        .into_iter()
        .map(|n| n.content)
        .collect();
    assert_eq!(contents, ["notice 0", "notice 1", "notice 2"]);
    assert!(reader.renderer().entries().iter().all(|e| !e.own));

    writer.post_notice("ann", "notice 3").await.unwrap();
    let outcome = reader.poll().await.unwrap();
    assert_eq!(outcome, merged(1, 0, 4));
}

#[tokio::test]
async fn server_refusal_is_reported_as_rejected() {
    let board = start_board().await;
    let transport = HttpTransport::new(board.url.clone(), Duration::from_secs(5)).unwrap();

    let notice = Notice::compose("ann", "once only");
    transport.append(&notice).await.unwrap();
    let err = transport.append(&notice).await.unwrap_err();
    assert!(matches!(err, SyncError::Rejected(_)));

    let blank = Notice::compose("ann", "   ");
    let err = transport.append(&blank).await.unwrap_err();
    assert_eq!(
        err,
        SyncError::Rejected("Author and content are required.".into())
    );

    let listed = transport.list(Cursor::START).await.unwrap();
    assert_eq!(listed.rows.len(), 1);
    assert_eq!(listed.last_row_number, Cursor(1));
}

#[tokio::test]
async fn unreachable_server_rolls_the_post_back() {
    // Nothing listens on the port once the listener is dropped
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/", listener.local_addr().unwrap());
    drop(listener);

    let transport = HttpTransport::new(url, Duration::from_secs(2)).unwrap();
    let engine = SyncEngine::new(transport, FeedView::new(), Arc::new(MemoryStore::new()));

    let err = engine.post_notice("ann", "lost").await.unwrap_err();
    assert!(err.is_transient());
    assert!(engine.notices().is_empty());
    assert_eq!(engine.renderer().input(), "lost");

    assert!(engine.poll().await.unwrap_err().is_transient());
    assert_eq!(engine.cursor(), Cursor::START);
}
