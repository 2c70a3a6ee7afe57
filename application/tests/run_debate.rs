//! Automated debates and agentic flows through the service

mod common;

use agora_application::{
    DebateProgressNotifier, DebateService, DebateServiceError, FlowRequest, RunDebateUseCase,
    ServiceParams, TurnInput,
};
use agora_domain::{
    AgenticFlowConfiguration, AgenticFlowType, Debate, DebateConfig, DebateStatus, FlowStatus,
    Model, NewParticipant, RoundClosure,
};
use common::{FixedProvider, FlakyProvider, MemoryStore, RecordingPublisher};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct Progress {
    turns: Mutex<Vec<(u32, String, bool)>>,
    rounds: Mutex<Vec<u32>>,
    finished: Mutex<bool>,
}

impl DebateProgressNotifier for Progress {
    fn on_round_start(&self, _round: u32, _max_rounds: u32, _turns: usize) {}

    fn on_turn_complete(&self, round: u32, participant: &str, success: bool) {
        self.turns
            .lock()
            .unwrap()
            .push((round, participant.to_string(), success));
    }

    fn on_round_complete(&self, closure: &RoundClosure) {
        self.rounds.lock().unwrap().push(closure.round_number);
    }

    fn on_debate_complete(&self, _debate: &Debate) {
        *self.finished.lock().unwrap() = true;
    }
}

fn bot(name: &str, position: &str) -> NewParticipant {
    NewParticipant::ai(name, position, "anthropic", Model::ClaudeSonnet45)
}

#[tokio::test]
async fn test_runner_plays_every_round() {
    let provider = Arc::new(FixedProvider::new("Dense cities need fewer cars."));
    let events = Arc::new(RecordingPublisher::default());
    let service = DebateService::builder(provider.clone())
        .with_events(events.clone())
        .build();
    let id = service
        .create_debate(
            "Should cities ban private cars?",
            DebateConfig::default().with_max_rounds(2),
        )
        .await
        .unwrap();
    service.join_debate(id, bot("Pro", "pro")).await.unwrap();
    service.join_debate(id, bot("Con", "con")).await.unwrap();

    let progress = Progress::default();
    let debate = RunDebateUseCase::new(Arc::clone(&service))
        .execute_with_progress(id, &progress)
        .await
        .unwrap();

    assert_eq!(debate.status(), DebateStatus::DebateComplete);
    assert_eq!(debate.response_count(), 4);
    assert_eq!(provider.calls(), 4);
    assert_eq!(*progress.rounds.lock().unwrap(), vec![1, 2]);
    assert_eq!(progress.turns.lock().unwrap().len(), 4);
    assert!(progress.turns.lock().unwrap().iter().all(|(_, _, ok)| *ok));
    assert!(*progress.finished.lock().unwrap());
    assert_eq!(events.count("debate_completed"), 1);
}

#[tokio::test]
async fn test_runner_retries_unavailable_provider() {
    let provider = Arc::new(FlakyProvider::new(1));
    let service = DebateService::builder(provider.clone())
        .with_params(ServiceParams::default().with_max_turn_attempts(2))
        .build();
    let id = service
        .create_debate(
            "Should cities ban private cars?",
            DebateConfig::default().with_max_rounds(1),
        )
        .await
        .unwrap();
    let pro = service.join_debate(id, bot("Pro", "pro")).await.unwrap();
    service
        .join_debate(id, NewParticipant::human("Ada", "con"))
        .await
        .unwrap();
    service.initialize_debate(id).await.unwrap();
    service.start_debate(id).await.unwrap();

    // The human never answers; without a time limit the runner closes the
    // round once the AI turns are done.
    let debate = RunDebateUseCase::new(Arc::clone(&service))
        .execute(id)
        .await
        .unwrap();

    assert_eq!(provider.calls(), 2);
    assert_eq!(debate.status(), DebateStatus::DebateComplete);
    let round = &debate.rounds()[0];
    assert!(round.has_answered(pro));
    assert_eq!(round.missed().len(), 1);
    assert!(round.failed().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_runner_waits_for_deadline_then_expires() {
    let service = DebateService::builder(Arc::new(FixedProvider::new("Yes.")))
        .with_params(ServiceParams::default().with_round_grace(Duration::from_secs(30)))
        .build();
    let id = service
        .create_debate(
            "Should cities ban private cars?",
            DebateConfig::default()
                .with_max_rounds(1)
                .with_round_time_limit(Duration::from_secs(5)),
        )
        .await
        .unwrap();
    service.join_debate(id, bot("Pro", "pro")).await.unwrap();
    let person = service
        .join_debate(id, NewParticipant::human("Ada", "con"))
        .await
        .unwrap();

    let debate = RunDebateUseCase::new(Arc::clone(&service))
        .execute(id)
        .await
        .unwrap();

    assert_eq!(debate.status(), DebateStatus::DebateComplete);
    assert_eq!(debate.rounds()[0].missed(), vec![person]);
    assert!(debate.rounds()[0].timed_out);
}

#[tokio::test]
async fn test_runner_rejects_finished_debate() {
    let service = DebateService::builder(Arc::new(FixedProvider::new("Yes."))).build();
    let id = service
        .create_debate(
            "Should cities ban private cars?",
            DebateConfig::default().with_max_rounds(1),
        )
        .await
        .unwrap();
    service.join_debate(id, bot("Pro", "pro")).await.unwrap();
    service.join_debate(id, bot("Con", "con")).await.unwrap();

    let runner = RunDebateUseCase::new(Arc::clone(&service));
    runner.execute(id).await.unwrap();
    service.archive_debate(id).await.unwrap();

    let err = runner.execute(id).await.unwrap_err();
    assert!(err.to_string().contains("ARCHIVED"));
}

#[tokio::test]
async fn test_participant_flow_generates_recorded_turn() {
    let store = Arc::new(MemoryStore::default());
    let provider = Arc::new(FixedProvider::new("Cars should give way to transit."));
    let service = DebateService::builder(provider.clone())
        .with_execution_repository(store.clone())
        .build();
    let id = service
        .create_debate("Should cities ban private cars?", DebateConfig::default())
        .await
        .unwrap();
    let ensemble = AgenticFlowConfiguration::new(AgenticFlowType::EnsembleVoting)
        .with_param("ensemble_size", 3);
    let pro = service
        .join_debate(id, bot("Pro", "pro").with_flow(ensemble))
        .await
        .unwrap();
    service
        .join_debate(id, NewParticipant::human("Ada", "con"))
        .await
        .unwrap();
    service.initialize_debate(id).await.unwrap();
    service.start_debate(id).await.unwrap();

    let outcome = service
        .submit_response(id, pro, TurnInput::generate())
        .await
        .unwrap();

    assert_eq!(outcome.response.content, "Cars should give way to transit.");
    assert!(!outcome.response.flagged);
    assert_eq!(provider.calls(), 3);

    let history = service.debate_executions(id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(Some(history[0].id), outcome.response.execution_id);
    assert_eq!(history[0].participant_id, Some(pro));
    let result = history[0].result.as_ref().unwrap();
    assert_eq!(result.metric("votes"), Some(&serde_json::json!(3)));
}

#[tokio::test]
async fn test_low_confidence_turn_is_flagged() {
    let provider = Arc::new(FixedProvider::new("Perhaps.\nConfidence: 0.2"));
    let service = DebateService::builder(provider.clone()).build();
    let id = service
        .create_debate("Should cities ban private cars?", DebateConfig::default())
        .await
        .unwrap();
    let pro = service.join_debate(id, bot("Pro", "pro")).await.unwrap();
    service.join_debate(id, bot("Con", "con")).await.unwrap();
    service.initialize_debate(id).await.unwrap();
    service.start_debate(id).await.unwrap();

    let scoring = AgenticFlowConfiguration::new(AgenticFlowType::ConfidenceScoring)
        .with_param("threshold", 0.7);
    let outcome = service
        .submit_response(id, pro, TurnInput::Flow(FlowRequest::inline(scoring)))
        .await
        .unwrap();

    assert!(outcome.response.flagged);
    assert_eq!(outcome.response.content, "Perhaps.");
    // Initial answer plus one recall
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn test_prompt_chaining_through_service() {
    let provider = Arc::new(FixedProvider::new("Refined."));
    let service = DebateService::builder(provider.clone()).build();
    let chain = AgenticFlowConfiguration::new(AgenticFlowType::PromptChaining).with_param(
        "stages",
        serde_json::json!(["Outline: {prompt}", "Expand: {previous}", "Polish: {previous}"]),
    );

    let result = service
        .execute_agentic_flow(&chain, "Why walkable streets?", None, None)
        .await
        .unwrap();

    assert_eq!(result.final_response, "Refined.");
    assert_eq!(result.provider_calls, 3);
    assert_eq!(result.processing_steps.len(), 3);
    assert_eq!(provider.calls(), 3);
}

#[tokio::test]
async fn test_stored_flow_lifecycle() {
    let store = Arc::new(MemoryStore::default());
    let service = DebateService::builder(Arc::new(FixedProvider::new("Answer.")))
        .with_flow_repository(store.clone())
        .with_execution_repository(store.clone())
        .build();

    let flow = service
        .create_flow(
            "careful",
            Some("acme".to_string()),
            AgenticFlowConfiguration::new(AgenticFlowType::StepBackPrompting),
        )
        .await
        .unwrap();
    assert_eq!(service.list_flows(Some("acme")).await.unwrap().len(), 1);
    assert!(service.list_flows(Some("other")).await.unwrap().is_empty());

    service.execute_stored_flow(flow.id, "Why?").await.unwrap();
    service.execute_stored_flow(flow.id, "Why not?").await.unwrap();
    let stats = service.flow_statistics(flow.id).await.unwrap();
    assert_eq!(stats.executions, 2);
    assert_eq!(stats.errors, 0);

    service
        .set_flow_status(flow.id, FlowStatus::Disabled)
        .await
        .unwrap();
    let err = service.execute_stored_flow(flow.id, "Again").await.unwrap_err();
    assert_eq!(err, DebateServiceError::FlowDisabled(flow.id));
    assert_eq!(service.flow_history(flow.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_invalid_flow_is_rejected_on_join() {
    let service = DebateService::builder(Arc::new(FixedProvider::new("Answer."))).build();
    let id = service
        .create_debate("Should cities ban private cars?", DebateConfig::default())
        .await
        .unwrap();
    let bad = AgenticFlowConfiguration::new(AgenticFlowType::TreeOfThoughts)
        .with_param("branches", 12);

    let err = service
        .join_debate(id, bot("Pro", "pro").with_flow(bad))
        .await
        .unwrap_err();
    assert!(matches!(err, DebateServiceError::Domain(_)));
    assert!(service.get_debate(id).await.unwrap().participants().is_empty());
}
