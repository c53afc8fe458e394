//! End-to-end tests for send and publish through a built mediator.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use conduit_config::PipelineConfig;
use conduit_core::fixtures::{
    AddCommand, AddCommandHandler, EchoQuery, EchoQueryHandler, FailingHandler,
    RecordingHandler, TouchCommand, TouchCommandHandler, UserCreated,
};
use conduit_core::{
    BoxFuture, CancellationToken, DispatchError, DispatchResult, HandlerFamily, QueryHandler,
    QueryKind, Request,
};
use conduit_mediator::{Mediator, MediatorBuilder};
use conduit_pipeline::{AnyResponse, FnBehavior};

// ============================================================================
// Test types
// ============================================================================

/// Query whose handler sleeps far longer than any test waits.
#[derive(Debug)]
struct SlowQuery;

impl Request for SlowQuery {
    type Response = u32;
    type Kind = QueryKind;
}

#[derive(Debug, Default, Clone)]
struct SlowQueryHandler {
    finished: Arc<AtomicUsize>,
}

impl QueryHandler<SlowQuery> for SlowQueryHandler {
    fn handle<'a>(
        &'a self,
        _query: &'a SlowQuery,
        _cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, DispatchResult<u32>> {
        Box::pin(async move {
            tokio::time::sleep(Duration::from_secs(60)).await;
            self.finished.fetch_add(1, Ordering::SeqCst);
            Ok(7)
        })
    }
}

#[derive(Debug, PartialEq, Eq)]
struct InsufficientFunds {
    missing: u64,
}

impl fmt::Display for InsufficientFunds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "insufficient funds: missing {}", self.missing)
    }
}

impl std::error::Error for InsufficientFunds {}

#[derive(Debug)]
struct Withdraw {
    amount: u64,
}

impl Request for Withdraw {
    type Response = u64;
    type Kind = conduit_core::CommandKind;
}

struct WithdrawHandler {
    balance: u64,
}

impl conduit_core::CommandHandler<Withdraw> for WithdrawHandler {
    fn handle<'a>(
        &'a self,
        command: &'a Withdraw,
        _cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, DispatchResult<u64>> {
        Box::pin(async move {
            self.balance.checked_sub(command.amount).ok_or_else(|| {
                DispatchError::handler(InsufficientFunds {
                    missing: command.amount - self.balance,
                })
            })
        })
    }
}

fn uppercase() -> impl conduit_pipeline::Behavior {
    FnBehavior::new("uppercase", |_request, next, _cancel| {
        Box::pin(async move {
            next.run().await.map(|response| match response.downcast::<String>() {
                Ok(text) => Box::new(text.to_uppercase()) as AnyResponse,
                Err(other) => other,
            })
        })
    })
}

// ============================================================================
// Send
// ============================================================================

#[tokio::test]
async fn test_command_round_trip() {
    let mediator = Mediator::builder()
        .command_handler::<AddCommand, _>(AddCommandHandler)
        .build();

    let response = mediator.send(AddCommand::new("OK")).await.unwrap();
    assert_eq!(response, "OK");
}

#[tokio::test]
async fn test_query_and_unit_command_share_a_mediator() {
    let echo = EchoQueryHandler::default();
    let touch = TouchCommandHandler::default();
    let mediator = Mediator::builder()
        .query_handler::<EchoQuery, _>(echo.clone())
        .command_handler::<TouchCommand, _>(touch.clone())
        .build();

    assert_eq!(mediator.send(EchoQuery::new("ping")).await.unwrap(), "ping");
    mediator.send(TouchCommand).await.unwrap();

    assert_eq!(echo.calls(), 1);
    assert_eq!(touch.calls(), 1);
    assert_eq!(mediator.registry().len(), 2);
}

#[tokio::test]
async fn test_missing_handler_names_request_type() {
    let mediator = Mediator::builder().build();

    let err = mediator.send(EchoQuery::new("ping")).await.unwrap_err();

    match &err {
        DispatchError::HandlerNotFound {
            request_type,
            family,
        } => {
            assert!(request_type.ends_with("EchoQuery"));
            assert_eq!(*family, HandlerFamily::Query);
        }
        other => panic!("expected HandlerNotFound, got {other:?}"),
    }
    assert!(err.to_string().contains("EchoQuery"));
}

#[tokio::test]
async fn test_missing_handler_is_retried_not_cached() {
    let mediator = Mediator::builder().build();

    for _ in 0..3 {
        let err = mediator.send(AddCommand::new("OK")).await.unwrap_err();
        assert!(err.is_handler_not_found());
    }
    assert!(mediator.registry().is_empty());
}

#[tokio::test]
async fn test_duplicate_command_handlers_fail_resolution() {
    let mediator = Mediator::builder()
        .command_handler::<AddCommand, _>(AddCommandHandler)
        .command_handler::<AddCommand, _>(AddCommandHandler)
        .build();

    let err = mediator.send(AddCommand::new("OK")).await.unwrap_err();
    assert!(matches!(err, DispatchError::Resolution { .. }));
}

#[tokio::test]
async fn test_handler_error_reaches_caller_unchanged() {
    let mediator = Mediator::builder()
        .command_handler::<Withdraw, _>(WithdrawHandler { balance: 30 })
        .behavior(uppercase())
        .build();

    assert_eq!(mediator.send(Withdraw { amount: 10 }).await.unwrap(), 20);

    let err = mediator.send(Withdraw { amount: 50 }).await.unwrap_err();
    assert_eq!(
        err.handler_error::<InsufficientFunds>(),
        Some(&InsufficientFunds { missing: 20 })
    );
    assert_eq!(err.to_string(), "insufficient funds: missing 20");
}

#[tokio::test]
async fn test_factory_handler_resolved_per_send() {
    let built = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&built);

    let mediator = Mediator::builder()
        .command_handler_factory::<AddCommand, _, _>(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            AddCommandHandler
        })
        .build();

    for _ in 0..3 {
        mediator.send(AddCommand::new("OK")).await.unwrap();
    }

    assert_eq!(built.load(Ordering::SeqCst), 3);
    assert_eq!(mediator.registry().len(), 1);
}

// ============================================================================
// Behaviors
// ============================================================================

#[tokio::test]
async fn test_behavior_transforms_response() {
    let mediator = Mediator::builder()
        .query_handler::<EchoQuery, _>(EchoQueryHandler::default())
        .behavior(uppercase())
        .build();

    let response = mediator.send(EchoQuery::new("hola")).await.unwrap();
    assert_eq!(response, "HOLA");
}

#[tokio::test]
async fn test_behavior_short_circuits_handler() {
    let handler = EchoQueryHandler::default();
    let mediator = Mediator::builder()
        .query_handler::<EchoQuery, _>(handler.clone())
        .behavior(FnBehavior::new("cache", |_request, _next, _cancel| {
            Box::pin(async { Ok(Box::new("intercepted".to_string()) as AnyResponse) })
        }))
        .build();

    let response = mediator.send(EchoQuery::new("hola")).await.unwrap();
    assert_eq!(response, "intercepted");
    assert_eq!(handler.calls(), 0);
}

#[tokio::test]
async fn test_behavior_returning_wrong_type_is_reported() {
    let mediator = Mediator::builder()
        .command_handler::<AddCommand, _>(AddCommandHandler)
        .behavior(FnBehavior::new("broken", |_request, next, _cancel| {
            Box::pin(async move { next.run().await.map(|_| Box::new(42_u32) as AnyResponse) })
        }))
        .build();

    let err = mediator.send(AddCommand::new("OK")).await.unwrap_err();
    match err {
        DispatchError::ResponseTypeMismatch {
            request_type,
            expected,
        } => {
            assert!(request_type.ends_with("AddCommand"));
            assert!(expected.contains("String"));
        }
        other => panic!("expected ResponseTypeMismatch, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_configured_timeout() {
    let handler = SlowQueryHandler::default();
    let mediator = MediatorBuilder::new()
        .query_handler::<SlowQuery, _>(handler.clone())
        .with_config(&PipelineConfig {
            tracing: true,
            metrics: false,
            timeout_ms: Some(50),
        })
        .build();

    let err = mediator.send(SlowQuery).await.unwrap_err();

    assert!(matches!(err, DispatchError::Timeout(d) if d == Duration::from_millis(50)));
    assert_eq!(handler.finished.load(Ordering::SeqCst), 0);
}

// ============================================================================
// Cancellation
// ============================================================================

#[tokio::test]
async fn test_cancelled_token_skips_handler() {
    let handler = EchoQueryHandler::default();
    let mediator = Mediator::builder()
        .query_handler::<EchoQuery, _>(handler.clone())
        .tracing()
        .build();

    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = mediator
        .send_with(EchoQuery::new("ping"), &cancel)
        .await
        .unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(handler.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_interrupts_running_handler() {
    let handler = SlowQueryHandler::default();
    let mediator = Mediator::builder()
        .query_handler::<SlowQuery, _>(handler.clone())
        .build();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let err = mediator.send_with(SlowQuery, &cancel).await.unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(handler.finished.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_cancelled_publish_invokes_nothing() {
    let log = RecordingHandler::log();
    let mediator = Mediator::builder()
        .notification_handler::<UserCreated, _>(RecordingHandler::new("a", &log))
        .build();

    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = mediator
        .publish_with(UserCreated::new("ada"), &cancel)
        .await
        .unwrap_err();
    assert!(err.is_cancelled());
    assert!(log.lock().is_empty());
}

// ============================================================================
// Publish
// ============================================================================

#[tokio::test]
async fn test_publish_fans_out_in_registration_order() {
    let log = RecordingHandler::log();
    let mediator = Mediator::builder()
        .notification_handler::<UserCreated, _>(RecordingHandler::new("audit", &log))
        .notification_handler::<UserCreated, _>(RecordingHandler::new("email", &log))
        .notification_handler::<UserCreated, _>(RecordingHandler::new("search", &log))
        .build();

    mediator.publish(UserCreated::new("ada")).await.unwrap();

    assert_eq!(*log.lock(), vec!["audit:ada", "email:ada", "search:ada"]);
}

#[tokio::test]
async fn test_publish_without_handlers_succeeds() {
    let mediator = Mediator::builder().build();
    assert!(mediator.publish(UserCreated::new("ada")).await.is_ok());
}

#[tokio::test]
async fn test_publish_stops_at_first_failure() {
    let log = RecordingHandler::log();
    let mediator = Mediator::builder()
        .notification_handler::<UserCreated, _>(RecordingHandler::new("a", &log))
        .notification_handler::<UserCreated, _>(FailingHandler::new("b", &log))
        .notification_handler::<UserCreated, _>(RecordingHandler::new("c", &log))
        .build();

    let err = mediator.publish(UserCreated::new("ada")).await.unwrap_err();

    assert_eq!(err.to_string(), "b failed");
    assert_eq!(*log.lock(), vec!["a:ada", "b:failed"]);
}

#[tokio::test]
async fn test_publish_bypasses_behaviors() {
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);
    let log = RecordingHandler::log();

    let mediator = Mediator::builder()
        .notification_handler::<UserCreated, _>(RecordingHandler::new("a", &log))
        .behavior(FnBehavior::new("count", move |_request, next, _cancel| {
            counter.fetch_add(1, Ordering::SeqCst);
            next.run()
        }))
        .build();

    mediator.publish(UserCreated::new("ada")).await.unwrap();

    assert_eq!(seen.load(Ordering::SeqCst), 0);
    assert_eq!(log.lock().len(), 1);
}

#[tokio::test]
async fn test_notification_factory_builds_per_publish() {
    let built = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&built);
    let log = RecordingHandler::log();
    let shared = Arc::clone(&log);

    let mediator = Mediator::builder()
        .notification_handler_factory::<UserCreated, _, _>(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            RecordingHandler::new("fresh", &shared)
        })
        .build();

    mediator.publish(UserCreated::new("ada")).await.unwrap();
    mediator.publish(UserCreated::new("grace")).await.unwrap();

    assert_eq!(built.load(Ordering::SeqCst), 2);
    assert_eq!(*log.lock(), vec!["fresh:ada", "fresh:grace"]);
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_sends_share_one_invoker() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mediator = Arc::new(
        Mediator::builder()
            .query_handler::<EchoQuery, _>(EchoQueryHandler::with_counter(Arc::clone(&calls)))
            .tracing()
            .build(),
    );

    let tasks: Vec<_> = (0..64)
        .map(|i| {
            let mediator = Arc::clone(&mediator);
            tokio::spawn(async move { mediator.send(EchoQuery::new(format!("m{i}"))).await })
        })
        .collect();

    for (i, task) in tasks.into_iter().enumerate() {
        assert_eq!(task.await.unwrap().unwrap(), format!("m{i}"));
    }

    assert_eq!(calls.load(Ordering::SeqCst), 64);
    assert_eq!(mediator.registry().len(), 1);
}
