// ABOUTME: Integration tests for cancellation forwarding
// ABOUTME: Handles, shared tokens, listener lifetime and the null backend's timed playback

use gsound::native::{MockBackend, MockController, NullBackend};
use gsound::{attr, Attributes, Cancellable, Context, ContextConfig, ErrorCode, SUCCESS};
use std::time::{Duration, Instant};
use tokio_test::task;
use tokio_test::{assert_pending, assert_ready_err};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn mock_context() -> (Context, MockController) {
    init_logging();
    let (backend, mock) = MockBackend::new();
    let ctx = Context::builder()
        .config(ContextConfig::new().application_name("cancellation-tests"))
        .backend(backend)
        .build()
        .unwrap();
    (ctx, mock)
}

fn bell() -> Attributes {
    Attributes::from([(attr::EVENT_ID, "bell")])
}

#[test]
fn test_cancel_forwards_once_with_submitted_handle() {
    let (ctx, mock) = mock_context();
    let token = Cancellable::new();

    let mut fut = task::spawn(ctx.play_full(&bell(), Some(&token)));
    assert_pending!(fut.poll());

    token.cancel();
    token.cancel();
    assert_eq!(mock.cancels(), vec![token.handle()]);

    // Cancelling never resolves the operation by itself
    assert!(!fut.is_woken());
    assert_pending!(fut.poll());

    assert_eq!(mock.complete_handle(token.handle(), ErrorCode::Canceled.code()), 1);
    let err = assert_ready_err!(fut.poll());
    assert!(err.is_canceled());
}

#[test]
fn test_play_simple_registers_cancellation() {
    let (ctx, mock) = mock_context();
    let token = Cancellable::new();

    ctx.play_simple(&bell(), Some(&token)).unwrap();
    assert_eq!(ctx.watched_cancellables(), 1);

    token.cancel();
    assert_eq!(mock.cancels(), vec![token.handle()]);
    assert_eq!(ctx.watched_cancellables(), 0);
}

#[test]
fn test_handles_follow_token_identity() {
    let (ctx, mock) = mock_context();
    let a = Cancellable::new();
    let b = Cancellable::new();
    let a_clone = a.clone();

    ctx.play_simple(&bell(), Some(&a)).unwrap();
    ctx.play_simple(&bell(), Some(&b)).unwrap();
    ctx.play_simple(&bell(), Some(&a_clone)).unwrap();
    ctx.play_simple(&bell(), None).unwrap();

    let handles: Vec<u32> = mock.plays().iter().map(|p| p.handle).collect();
    assert_ne!(handles[0], handles[1]);
    assert_eq!(handles[0], handles[2]);
    assert_eq!(handles[3], gsound::NO_CANCELLABLE_HANDLE);
    assert_ne!(handles[0], gsound::NO_CANCELLABLE_HANDLE);
}

#[test]
fn test_shared_token_cancels_a_batch_with_one_request() {
    let (ctx, mock) = mock_context();
    let token = Cancellable::new();

    ctx.play_simple(&bell(), Some(&token)).unwrap();
    let first = ctx.play_full(&bell(), Some(&token));
    let second = ctx.play_full(&bell(), Some(&token));
    assert_eq!(ctx.watched_cancellables(), 1);

    token.cancel();
    assert_eq!(mock.cancels(), vec![token.handle()]);

    assert_eq!(mock.complete_handle(token.handle(), ErrorCode::Canceled.code()), 2);
    assert!(ctx.play_full_finish(first).unwrap_err().is_canceled());
    assert!(ctx.play_full_finish(second).unwrap_err().is_canceled());
}

#[test]
fn test_token_shared_across_contexts_cancels_in_each() {
    let (ctx_a, mock_a) = mock_context();
    let (ctx_b, mock_b) = mock_context();
    let token = Cancellable::new();

    ctx_a.play_simple(&bell(), Some(&token)).unwrap();
    ctx_b.play_simple(&bell(), Some(&token)).unwrap();
    token.cancel();

    assert_eq!(mock_a.cancels(), vec![token.handle()]);
    assert_eq!(mock_b.cancels(), vec![token.handle()]);
}

#[test]
fn test_rejected_submission_does_not_watch_token() {
    let (ctx, mock) = mock_context();
    mock.set_play_status(ErrorCode::NotAvailable.code());
    let token = Cancellable::new();

    assert!(ctx.play_simple(&bell(), Some(&token)).is_err());
    let _op = ctx.play_full(&bell(), Some(&token));
    assert_eq!(ctx.watched_cancellables(), 0);

    token.cancel();
    assert!(mock.cancels().is_empty());
}

#[test]
fn test_already_cancelled_token_forwards_immediately() {
    let (ctx, mock) = mock_context();
    let token = Cancellable::new();
    token.cancel();

    ctx.play_simple(&bell(), Some(&token)).unwrap();
    assert_eq!(mock.cancels(), vec![token.handle()]);
    assert_eq!(ctx.watched_cancellables(), 0);
}

#[test]
fn test_listener_does_not_keep_context_alive() {
    let (ctx, mock) = mock_context();
    let token = Cancellable::new();

    ctx.play_simple(&bell(), Some(&token)).unwrap();
    drop(ctx);
    assert!(mock.is_dropped());

    token.cancel();
    assert!(mock.cancels().is_empty());
}

#[test]
fn test_dropped_tokens_are_forgotten() {
    let (ctx, _mock) = mock_context();
    for _ in 0..4 {
        let token = Cancellable::new();
        ctx.play_simple(&bell(), Some(&token)).unwrap();
    }
    let survivor = Cancellable::new();
    ctx.play_simple(&bell(), Some(&survivor)).unwrap();

    assert_eq!(ctx.watched_cancellables(), 1);
}

#[test]
fn test_completion_after_cancel_reports_native_status() {
    let (ctx, mock) = mock_context();
    let token = Cancellable::new();

    let op = ctx.play_full(&bell(), Some(&token));
    token.cancel();
    // Playback had already finished when the cancel arrived
    mock.complete_next(SUCCESS);
    ctx.play_full_finish(op).unwrap();
}

#[tokio::test]
async fn test_null_backend_cancels_timed_playback() {
    init_logging();
    let ctx = Context::builder()
        .backend(NullBackend::new().with_playback_duration(Duration::from_secs(30)))
        .build()
        .unwrap();
    let token = Cancellable::new();

    let started = Instant::now();
    let op = ctx.play_full(&bell(), Some(&token));
    let canceller = {
        let token = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            token.cancel();
        })
    };

    let err = tokio::time::timeout(Duration::from_secs(5), op)
        .await
        .expect("cancelled playback should resolve promptly")
        .unwrap_err();
    assert!(err.is_canceled());
    assert!(started.elapsed() < Duration::from_secs(5));
    canceller.await.unwrap();
}

#[tokio::test]
async fn test_null_backend_timed_playback_finishes() {
    init_logging();
    let ctx = Context::builder()
        .backend(NullBackend::new().with_playback_duration(Duration::from_millis(20)))
        .build()
        .unwrap();

    ctx.play_full(&bell(), Some(&Cancellable::new()))
        .await
        .unwrap();
}

#[test]
fn test_cancelled_init_does_not_open() {
    init_logging();
    let (backend, mock) = MockBackend::new();
    let token = Cancellable::new();
    token.cancel();

    let err = Context::builder()
        .backend(backend)
        .build_uninit()
        .and_then(|ctx| ctx.init(Some(&token)).map(|_| ctx))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::Canceled);
    assert_eq!(mock.opens(), 0);
}
