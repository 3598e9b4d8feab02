#![allow(missing_docs, clippy::unwrap_used, clippy::expect_used)]
//! # Workflow Integration Tests
//!
//! Every console workflow end to end against a scripted remote: request
//! shape, reconciliation into history and controls, session flags and the
//! messages left in the queue.

use assert_matches::assert_matches;
use serde_json::json;
use std::time::Duration;

use codekeep_app::views::notifications::{
    CODE_DEACTIVATED, CODE_DELETED, CODE_INVALID, DOWNLOAD_FAILED, DOWNLOAD_PREPARING,
    SETUP_NOT_VERIFIED, SETUP_VERIFIED,
};
use codekeep_app::views::{BatchStatus, CounterField, WorkflowPhase};
use codekeep_app::workflows::forms::DAYS_TO_EXPIRY;
use codekeep_app::{
    ActionId, AppError, Decision, DownloadedFile, FormSubmission, Rendered, WorkflowOutcome,
};
use codekeep_testkit::{batch, code_operation_success, TestConsole, TEST_TOKEN};

fn no_form() -> FormSubmission {
    FormSubmission::new()
}

async fn generated(harness: &TestConsole, n: u128) {
    harness.script_generation(ActionId::Regenerate, &batch(n), &["AAAA-1111", "BBBB-2222"]);
    let outcome = harness.run(ActionId::Regenerate, &no_form()).await;
    assert!(outcome.is_rendered(), "generation failed: {outcome:?}");
}

// ============================================================================
// Generation
// ============================================================================

#[tokio::test]
async fn test_regenerate_renders_codes_and_history() {
    let harness = TestConsole::new();
    let record = batch(1);
    harness.script_generation(ActionId::Regenerate, &record, &["AAAA-1111", "BBBB-2222"]);

    let outcome = harness.run(ActionId::Regenerate, &no_form()).await;

    assert_eq!(
        outcome,
        WorkflowOutcome::Rendered(Rendered::Generated {
            batch_id: Some(record.id),
            codes: 2,
            total_issued: 2,
        })
    );
    assert_eq!(
        harness.renderer.last_codes(),
        Some(vec!["AAAA-1111".to_string(), "BBBB-2222".to_string()])
    );
    assert_eq!(harness.renderer.last_total(), Some(2));
    let history = harness.renderer.last_history().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, record.id);

    let requests = harness.remote.requests();
    let request = &requests[0];
    assert_eq!(request.body, Some(json!({ "forceUpdate": true })));
    assert_eq!(request.anti_forgery_token.as_deref(), Some(TEST_TOKEN));
    assert_eq!(
        harness
            .remote
            .calls_to(&harness.console.config().endpoints.viewed),
        1
    );

    let session = harness.console.session();
    assert!(!session.is_code_being_generated());
    assert_eq!(session.pending_action(), None);
    assert_eq!(harness.renderer.verification_visible(), Some(true));
    assert_eq!(
        harness.console.controls().phase(ActionId::Regenerate),
        WorkflowPhase::Rendered
    );
    assert!(harness
        .pending_messages()
        .contains(&"Your new recovery codes are ready".to_string()));
}

#[tokio::test]
async fn test_generate_with_expiry_forwards_days() {
    let harness = TestConsole::new();
    harness.script_generation(ActionId::GenerateWithExpiry, &batch(1), &["AAAA-1111"]);
    let form = FormSubmission::new().with(DAYS_TO_EXPIRY, "7");

    let outcome = harness.run(ActionId::GenerateWithExpiry, &form).await;

    assert!(outcome.is_rendered());
    let requests = harness.remote.requests();
    let request = &requests[0];
    assert_eq!(
        request.body,
        Some(json!({ "daysToExpiry": 7, "forceUpdate": true }))
    );
    assert!(harness.dialog.prompts()[0].body.contains("7 days"));
}

#[tokio::test]
async fn test_generate_with_expiry_rejects_non_positive_days() {
    let harness = TestConsole::new();

    let outcome = harness
        .run(
            ActionId::GenerateWithExpiry,
            &FormSubmission::new().with(DAYS_TO_EXPIRY, "0"),
        )
        .await;

    assert_matches!(outcome, WorkflowOutcome::Invalid(_));
    assert_eq!(harness.remote.total_calls(), 0);
    assert!(!harness.console.session().is_code_being_generated());
}

#[tokio::test]
async fn test_generate_without_expiry_uses_its_own_endpoint() {
    let harness = TestConsole::new();
    harness.script_generation(ActionId::GenerateWithoutExpiry, &batch(1), &["AAAA-1111"]);

    let outcome = harness
        .run(ActionId::GenerateWithoutExpiry, &no_form())
        .await;

    assert!(outcome.is_rendered());
    assert_eq!(
        harness
            .remote
            .calls_to(&harness.endpoint(ActionId::GenerateWithoutExpiry)),
        1
    );
}

#[tokio::test]
async fn test_new_batch_retires_the_previous_one() {
    let harness = TestConsole::new();
    generated(&harness, 1).await;
    generated(&harness, 2).await;

    let history = harness.console.history().lock().await;
    assert_eq!(history.ids(), vec![batch(2).id, batch(1).id]);
    assert!(history.front().unwrap().is_active());
    assert_eq!(history.get(1).unwrap().status, BatchStatus::Deleted);
}

#[tokio::test(start_paused = true)]
async fn test_failed_generation_holds_flag_for_grace_period() {
    let harness = TestConsole::new();
    harness.remote.fail(
        &harness.endpoint(ActionId::Regenerate),
        AppError::remote("/auth/recovery-codes/regenerate/", 500, "boom"),
    );

    let outcome = harness.run(ActionId::Regenerate, &no_form()).await;

    assert!(outcome.is_failed());
    assert!(harness.console.session().is_code_being_generated());
    assert!(harness.console.navigation_guard().should_block());
    assert!(harness.console.history().lock().await.is_empty());
    assert!(harness.console.controls().is_interactive(ActionId::Regenerate));

    tokio::time::sleep(harness.console.config().generation_grace() + Duration::from_millis(10))
        .await;
    assert!(!harness.console.session().is_code_being_generated());
    assert!(!harness.console.navigation_guard().should_block());
}

#[tokio::test]
async fn test_refused_generation_shows_server_message() {
    let harness = TestConsole::new();
    harness.remote.respond_json(
        &harness.endpoint(ActionId::Regenerate),
        json!({
            "SUCCESS": true,
            "CAN_GENERATE": false,
            "MESSAGE": "You can generate new codes again tomorrow"
        }),
    );

    let outcome = harness.run(ActionId::Regenerate, &no_form()).await;

    assert_eq!(
        outcome,
        WorkflowOutcome::Failed {
            message: "You can generate new codes again tomorrow".to_string()
        }
    );
    assert!(harness.renderer.last_codes().is_none());
}

#[tokio::test]
async fn test_codes_the_renderer_cannot_show_fail_the_workflow() {
    let harness = TestConsole::new();
    harness.renderer.reject_codes();
    harness.script_generation(ActionId::Regenerate, &batch(1), &["AAAA-1111"]);

    let outcome = harness.run(ActionId::Regenerate, &no_form()).await;

    assert!(outcome.is_failed());
    assert!(harness.console.history().lock().await.is_empty());
}

// ============================================================================
// Invalidate / delete
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_invalidate_increments_counter_after_confirmation() {
    let harness = TestConsole::new();
    generated(&harness, 1).await;
    harness.remote.respond_json(
        &harness.endpoint(ActionId::Invalidate),
        code_operation_success(CODE_DEACTIVATED),
    );
    let form = FormSubmission::new().with("invalidate_code", "AAAA-1111");

    let outcome = harness.run(ActionId::Invalidate, &form).await;

    assert_eq!(
        outcome,
        WorkflowOutcome::Rendered(Rendered::CodeUpdated {
            counter: CounterField::Invalidated,
            value: Some(1),
        })
    );
    let request = harness.remote.requests().pop().unwrap();
    assert_eq!(request.body, Some(json!({ "code": "AAAA-1111" })));

    let id = batch(1).id;
    {
        let history = harness.console.history().lock().await;
        assert_eq!(history.front().unwrap().number_invalidated, 1);
        assert!(history.is_highlighted(id, CounterField::Invalidated, tokio::time::Instant::now()));
    }

    tokio::time::sleep(harness.console.config().highlight()).await;
    let history = harness.console.history().lock().await;
    assert!(!history.is_highlighted(id, CounterField::Invalidated, tokio::time::Instant::now()));
}

#[tokio::test]
async fn test_delete_one_increments_removed() {
    let harness = TestConsole::new();
    generated(&harness, 1).await;
    harness.remote.respond_json(
        &harness.endpoint(ActionId::DeleteOne),
        code_operation_success(CODE_DELETED),
    );

    let outcome = harness
        .run(
            ActionId::DeleteOne,
            &FormSubmission::new().with("delete_code", "BBBB-2222"),
        )
        .await;

    assert_matches!(
        outcome,
        WorkflowOutcome::Rendered(Rendered::CodeUpdated {
            counter: CounterField::Removed,
            value: Some(1)
        })
    );
}

#[tokio::test]
async fn test_informational_alert_leaves_counters_alone() {
    let harness = TestConsole::new();
    generated(&harness, 1).await;
    harness.remote.respond_json(
        &harness.endpoint(ActionId::Invalidate),
        code_operation_success("Code already invalidated"),
    );

    let outcome = harness
        .run(
            ActionId::Invalidate,
            &FormSubmission::new().with("invalidate_code", "AAAA-1111"),
        )
        .await;

    assert_matches!(outcome, WorkflowOutcome::Rendered(Rendered::Notice { .. }));
    let history = harness.console.history().lock().await;
    assert_eq!(history.front().unwrap().number_invalidated, 0);
}

#[tokio::test]
async fn test_unrecognised_code_reports_invalid() {
    let harness = TestConsole::new();
    harness
        .remote
        .respond_json(&harness.endpoint(ActionId::Invalidate), json!({}));

    let outcome = harness
        .run(
            ActionId::Invalidate,
            &FormSubmission::new().with("invalidate_code", "ZZZZ-0000"),
        )
        .await;

    assert_eq!(
        outcome,
        WorkflowOutcome::Failed {
            message: CODE_INVALID.to_string()
        }
    );
}

#[tokio::test]
async fn test_rejected_code_uses_fallback_texts() {
    let harness = TestConsole::new();
    harness.remote.respond_json(
        &harness.endpoint(ActionId::DeleteOne),
        json!({ "SUCCESS": true, "OPERATION_SUCCESS": false }),
    );

    let outcome = harness
        .run(
            ActionId::DeleteOne,
            &FormSubmission::new().with("delete_code", "ZZZZ-0000"),
        )
        .await;

    assert_eq!(
        outcome,
        WorkflowOutcome::Failed {
            message: "Code not valid: The code entered is no longer valid".to_string()
        }
    );
}

#[tokio::test]
async fn test_delete_all_retires_batch_and_disables_batch_actions() {
    let harness = TestConsole::new();
    generated(&harness, 1).await;
    harness.remote.respond_json(
        &harness.endpoint(ActionId::DeleteAll),
        json!({ "SUCCESS": true, "MESSAGE": "All codes deleted" }),
    );

    let outcome = harness.run(ActionId::DeleteAll, &no_form()).await;

    assert_eq!(
        outcome,
        WorkflowOutcome::Rendered(Rendered::BatchDeleted {
            batch_id: Some(batch(1).id)
        })
    );
    assert_eq!(
        harness.console.history().lock().await.front().unwrap().status,
        BatchStatus::Deleted
    );
    for action in [ActionId::Invalidate, ActionId::Email, ActionId::Download] {
        assert!(!harness.console.controls().is_interactive(action));
    }

    // A fresh batch brings them back
    generated(&harness, 2).await;
    for action in [ActionId::Invalidate, ActionId::Email, ActionId::Download] {
        assert!(harness.console.controls().is_interactive(action));
    }
}

// ============================================================================
// Email / download
// ============================================================================

#[tokio::test]
async fn test_email_is_single_use_per_batch() {
    let harness = TestConsole::new();
    let endpoint = harness.endpoint(ActionId::Email);
    harness
        .remote
        .respond_always(&endpoint, Ok(codekeep_app::RemoteResponse::Json(json!({
            "SUCCESS": true,
            "MESSAGE": "Email sent"
        }))));

    let first = harness.run(ActionId::Email, &no_form()).await;
    let second = harness.run(ActionId::Email, &no_form()).await;

    assert_eq!(first, WorkflowOutcome::Rendered(Rendered::Emailed));
    assert_eq!(second, WorkflowOutcome::Ignored);
    assert_eq!(harness.remote.calls_to(&endpoint), 1);
    assert_eq!(harness.dialog.prompt_count(), 1);
    assert_eq!(
        harness.console.controls().state(ActionId::Email).done_label.as_deref(),
        Some("You have already emailed yourself this code")
    );

    // Regeneration re-arms it
    generated(&harness, 1).await;
    let third = harness.run(ActionId::Email, &no_form()).await;
    assert!(third.is_rendered());
    assert_eq!(harness.remote.calls_to(&endpoint), 2);
}

#[tokio::test]
async fn test_email_failure_keeps_control_usable() {
    let harness = TestConsole::new();
    harness.remote.respond_json(
        &harness.endpoint(ActionId::Email),
        json!({ "SUCCESS": false, "MESSAGE": "The email wasn't sent" }),
    );

    let outcome = harness.run(ActionId::Email, &no_form()).await;

    assert!(outcome.is_failed());
    assert!(harness.console.controls().is_interactive(ActionId::Email));
}

#[tokio::test]
async fn test_download_is_single_use_and_skips_confirmation() {
    let harness = TestConsole::new();
    let endpoint = harness.endpoint(ActionId::Download);
    let file = DownloadedFile::new("recovery_codes.txt", b"AAAA-1111\n".to_vec(), true);
    harness.remote.respond_file(&endpoint, file.clone());

    let first = harness.run(ActionId::Download, &no_form()).await;
    let second = harness.run(ActionId::Download, &no_form()).await;

    assert_eq!(first, WorkflowOutcome::Rendered(Rendered::Downloaded(file)));
    assert_eq!(second, WorkflowOutcome::Ignored);
    assert_eq!(harness.remote.calls_to(&endpoint), 1);
    assert_eq!(harness.dialog.prompt_count(), 0);
    assert_eq!(harness.pending_messages()[0], DOWNLOAD_PREPARING);
}

#[tokio::test]
async fn test_unsuccessful_download_can_be_retried() {
    let harness = TestConsole::new();
    harness.remote.respond_file(
        &harness.endpoint(ActionId::Download),
        DownloadedFile::new("recovery_codes.txt", Vec::new(), false),
    );

    let outcome = harness.run(ActionId::Download, &no_form()).await;

    assert_eq!(
        outcome,
        WorkflowOutcome::Failed {
            message: DOWNLOAD_FAILED.to_string()
        }
    );
    assert!(harness.console.controls().is_interactive(ActionId::Download));
}

#[tokio::test]
async fn test_download_json_answer_is_a_notice() {
    let harness = TestConsole::new();
    harness.remote.respond_json(
        &harness.endpoint(ActionId::Download),
        json!({ "SUCCESS": false, "MESSAGE": "No active codes to download" }),
    );

    let outcome = harness.run(ActionId::Download, &no_form()).await;

    assert_eq!(
        outcome,
        WorkflowOutcome::Rendered(Rendered::Notice {
            message: "No active codes to download".to_string()
        })
    );
    assert!(harness.console.controls().is_interactive(ActionId::Download));
}

// ============================================================================
// Verify setup
// ============================================================================

fn verify_form() -> FormSubmission {
    FormSubmission::new().with("verify_code", "AAAA-1111")
}

#[tokio::test]
async fn test_verify_success_hides_the_affordance_for_the_session() {
    let harness = TestConsole::new();
    let endpoint = harness.endpoint(ActionId::VerifySetup);
    harness.remote.respond_json(
        &endpoint,
        json!({
            "SUCCESS": true,
            "FAILURE": false,
            "CODE_CHECK": "Code accepted",
            "BATCH_CHECK": "Batch is active"
        }),
    );

    let outcome = harness.run(ActionId::VerifySetup, &verify_form()).await;

    let lines = match outcome {
        WorkflowOutcome::Rendered(Rendered::Verified { lines }) => lines,
        other => panic!("unexpected outcome {other:?}"),
    };
    let texts: Vec<_> = lines.iter().map(|line| line.text.as_str()).collect();
    assert_eq!(texts, vec!["Code accepted", "Batch is active"]);
    assert_eq!(harness.renderer.verification_lines(), lines);

    let session = harness.console.session();
    assert!(session.is_setup_verified());
    assert!(!session.is_verification_in_progress());
    assert!(harness.console.controls().state(ActionId::VerifySetup).hidden);
    assert_eq!(harness.renderer.verification_visible(), Some(false));
    assert!(harness.pending_messages().contains(&SETUP_VERIFIED.to_string()));

    let again = harness.run(ActionId::VerifySetup, &verify_form()).await;
    assert_eq!(again, WorkflowOutcome::Ignored);
    assert_eq!(harness.remote.calls_to(&endpoint), 1);

    // Later generations do not bring the affordance back
    generated(&harness, 1).await;
    assert!(harness.console.controls().state(ActionId::VerifySetup).hidden);
}

#[tokio::test]
async fn test_verify_failure_keeps_the_affordance() {
    let harness = TestConsole::new();
    harness.remote.respond_json(
        &harness.endpoint(ActionId::VerifySetup),
        json!({ "SUCCESS": false, "FAILURE": true, "CODE_CHECK": "Code rejected" }),
    );

    let outcome = harness.run(ActionId::VerifySetup, &verify_form()).await;

    assert_eq!(
        outcome,
        WorkflowOutcome::Failed {
            message: SETUP_NOT_VERIFIED.to_string()
        }
    );
    assert!(!harness.console.session().is_setup_verified());
    assert!(harness.console.controls().is_interactive(ActionId::VerifySetup));
    assert_eq!(harness.renderer.verification_lines().len(), 1);
}

#[tokio::test]
async fn test_verification_flag_is_set_only_while_in_flight() {
    let harness = TestConsole::new();
    harness.remote.respond_json(
        &harness.endpoint(ActionId::VerifySetup),
        json!({ "SUCCESS": true, "FAILURE": false }),
    );
    harness.remote.hold();

    let form = verify_form();
    let (outcome, ()) = tokio::join!(harness.run(ActionId::VerifySetup, &form), async {
        while harness.remote.total_calls() == 0 {
            tokio::task::yield_now().await;
        }
        assert!(harness.console.session().is_verification_in_progress());
        assert!(harness.console.navigation_guard().should_block());
        harness.remote.release(1);
    });

    assert!(outcome.is_rendered());
    assert!(!harness.console.session().is_verification_in_progress());
}

#[tokio::test]
async fn test_declined_verification_leaves_flag_clear() {
    let harness = TestConsole::new();
    harness.dialog.answer(Decision::Denied);

    let outcome = harness.run(ActionId::VerifySetup, &verify_form()).await;

    assert_eq!(outcome, WorkflowOutcome::Declined(Decision::Denied));
    assert!(!harness.console.session().is_verification_in_progress());
}
