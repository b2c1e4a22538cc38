//! Test: Failure Handling - fail-fast, error classification and cancellation

use crate::helpers::*;
use crew_pipeline::core::{PipelineInput, PipelineSpec, RunState, StepError};
use crew_pipeline::execution::{CancellationFlag, RunEvent};
use crew_pipeline::model::ModelError;
use std::sync::Arc;

fn chain() -> PipelineSpec {
    PipelineSpec::new(
        "chain",
        vec![
            step("a", "{{ topic }}"),
            step("b", "{{ steps.a.output }}").depends_on(["a"]),
            step("c", "{{ steps.b.output }}").depends_on(["b"]),
        ],
    )
    .unwrap()
}

fn inputs() -> PipelineInput {
    PipelineInput::new().with("topic", "cacao")
}

/// Failure at step k stops the run; no later step is invoked
#[tokio::test]
async fn test_fail_fast_at_middle_step() {
    let model = Arc::new(ScriptedModel::from_results(vec![
        Ok("uno".to_string()),
        Err(ModelError::RateLimited("quota exceeded".to_string())),
        Ok("never".to_string()),
    ]));
    let runner = runner_with(model.clone());

    let run = runner.execute(&chain(), &inputs()).await;

    assert_run_failed_at(&run, 1, "b");
    assert_eq!(model.calls(), 2);
    assert_eq!(run.step_output("a"), Some("uno"));
    assert!(run.context.get("c").is_none());

    let error = run.error().unwrap();
    assert!(error.cause.is_rate_limited());
    assert!(error.message().contains("quota exceeded"));
}

#[tokio::test]
async fn test_authentication_failure_at_first_step() {
    let model = Arc::new(ScriptedModel::from_results(vec![Err(
        ModelError::AuthenticationFailure("invalid key".to_string()),
    )]));
    let runner = runner_with(model.clone());

    let run = runner.execute(&chain(), &inputs()).await;

    assert_run_failed_at(&run, 0, "a");
    assert_eq!(model.calls(), 1);
    assert_model_error(&run.error().unwrap().cause, |e| {
        matches!(e, ModelError::AuthenticationFailure(_))
    });
}

#[tokio::test]
async fn test_blank_reply_is_empty_response() {
    let model = Arc::new(ScriptedModel::new(vec!["uno", "  \n "]));
    let runner = runner_with(model.clone());

    let err = runner.run(&chain(), &inputs()).await.unwrap_err();

    assert_eq!(err.step, "b");
    assert_eq!(err.cause, StepError::Model(ModelError::EmptyResponse));
    assert_eq!(model.calls(), 2);
}

#[tokio::test]
async fn test_failure_event_reported() {
    let model = Arc::new(ScriptedModel::from_results(vec![Err(ModelError::TransportFailure(
        "connection reset".to_string(),
    ))]));
    let (runner, events) = recording_runner(model);

    runner.execute(&chain(), &inputs()).await;

    let events = events.lock().unwrap();
    assert!(events.iter().any(|e| matches!(
        e,
        RunEvent::StepFailed { index: 0, error, .. } if error.contains("connection reset")
    )));
    assert!(matches!(
        events.last(),
        Some(RunEvent::PipelineFinished { state: RunState::Failed(0), .. })
    ));
}

/// Cancellation before the run starts invokes nothing
#[tokio::test]
async fn test_cancelled_before_start() {
    let model = Arc::new(ScriptedModel::new(vec!["uno", "dos", "tres"]));
    let flag = CancellationFlag::new();
    flag.cancel();
    let runner = runner_with(model.clone());

    let run = runner.execute_with(&chain(), &inputs(), &flag).await;

    assert_eq!(run.state, RunState::Cancelled(0));
    assert_eq!(model.calls(), 0);
    assert_eq!(run.error().unwrap().cause, StepError::Cancelled);
}

/// A cancelled run leaves later runs on the same runner untouched
#[tokio::test]
async fn test_cancellation_does_not_outlive_its_run() {
    let model = Arc::new(ScriptedModel::new(vec!["uno", "dos", "tres"]));
    let runner = runner_with(model.clone());
    let flag = CancellationFlag::new();
    flag.cancel();

    let first = runner.execute_with(&chain(), &inputs(), &flag).await;
    let second = runner.execute(&chain(), &inputs()).await;

    assert_eq!(first.state, RunState::Cancelled(0));
    assert_run_completed(&second, "tres");
    assert_eq!(model.calls(), 3);
}

/// Cancelling one of two concurrent runs leaves the other running
#[tokio::test]
async fn test_concurrent_run_survives_sibling_cancellation() {
    let model = Arc::new(EchoModel::default());
    let runner = runner_with(model.clone());
    let cancelled = CancellationFlag::new();
    cancelled.cancel();
    let spec = chain();
    let inputs = inputs();

    let (stopped, finished) = tokio::join!(
        runner.execute_with(&spec, &inputs, &cancelled),
        runner.execute(&spec, &inputs)
    );

    assert_eq!(stopped.state, RunState::Cancelled(0));
    assert_eq!(finished.state, RunState::Completed);
    assert_eq!(model.calls(), 3);
}

/// Cancellation between steps stops before the next one
#[tokio::test]
async fn test_cancelled_between_steps() {
    let model = Arc::new(ScriptedModel::new(vec!["uno", "dos", "tres"]));
    let flag = CancellationFlag::new();
    let trigger = flag.clone();
    let runner = runner_with(model.clone()).with_event_handler(move |event| {
        if matches!(event, RunEvent::StepCompleted { index: 0, .. }) {
            trigger.cancel();
        }
    });

    let run = runner.execute_with(&chain(), &inputs(), &flag).await;

    assert_eq!(run.state, RunState::Cancelled(1));
    assert_eq!(model.calls(), 1);
    assert_eq!(run.step_output("a"), Some("uno"));
    assert_eq!(run.error().unwrap().step, "b");
    assert!(run.output().is_none());
}
