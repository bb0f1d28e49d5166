use application::embedding_cache::{CacheStatus, EmbeddingCacheManager};
use application::rag_service::RagService;
use domain::conversation::{ConversationMessage, Role, HISTORY_WINDOW};
use domain::error::{ProviderError, ServiceError};
use domain::models::{ChatRequest, ChatResponse, Corpus};
use infrastructure::embedding_storage::EmbeddingStorage;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tests::{riddor_corpus, safety_corpus, KeywordEmbedder, RecordingCompleter};

struct Harness {
    _dir: TempDir,
    embedder: Arc<KeywordEmbedder>,
    completer: Arc<RecordingCompleter>,
    service: RagService<KeywordEmbedder, RecordingCompleter>,
}

fn harness(corpus: Corpus, completer: RecordingCompleter) -> Harness {
    let dir = TempDir::new().unwrap();
    let corpus = Arc::new(corpus);
    let embedder = Arc::new(KeywordEmbedder::new());
    let completer = Arc::new(completer);
    let cache = Arc::new(EmbeddingCacheManager::new(
        Arc::clone(&corpus),
        Arc::clone(&embedder),
        EmbeddingStorage::new(dir.path().join("faq_embeddings.json")),
    ));
    let service = RagService::new(corpus, cache, Arc::clone(&completer));
    Harness {
        _dir: dir,
        embedder,
        completer,
        service,
    }
}

fn history(n: usize) -> Vec<ConversationMessage> {
    (0..n)
        .map(|i| {
            if i % 2 == 0 {
                ConversationMessage::user(format!("turn {i}"))
            } else {
                ConversationMessage::agent(format!("turn {i}"))
            }
        })
        .collect()
}

#[tokio::test]
async fn riddor_query_retrieves_the_only_entry() {
    let h = harness(riddor_corpus(), RecordingCompleter::replying("ok"));
    let entry = h.service.retrieve("Tell me about RIDDOR").await.unwrap();
    assert_eq!(entry.map(|e| e.question.as_str()), Some("What is RIDDOR?"));
}

#[tokio::test]
async fn best_entry_is_injected_into_the_knowledge_slot() {
    let h = harness(safety_corpus(), RecordingCompleter::replying("Report it within 10 days."));
    let response = h
        .service
        .answer(&ChatRequest::new("When do I report under RIDDOR?"))
        .await
        .unwrap();

    assert_eq!(
        response,
        ChatResponse {
            answer: "Report it within 10 days.\n\n— SafeWork UK".to_string()
        }
    );

    let messages = h.completer.last_messages().unwrap();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0], ConversationMessage::system("You are the SafeWork UK assistant."));
    assert_eq!(
        messages[1],
        ConversationMessage::system(
            "Use this reference if relevant:\nQ: What is RIDDOR?\nA: A UK reporting regime..."
        )
    );
    assert_eq!(messages[2], ConversationMessage::user("When do I report under RIDDOR?"));

    // corpus batch, then the query on its own
    let batches = h.embedder.batches();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[1], vec!["When do I report under RIDDOR?".to_string()]);
}

#[tokio::test]
async fn long_history_is_cut_to_the_most_recent_turns() {
    let h = harness(safety_corpus(), RecordingCompleter::replying("ok"));
    let request = ChatRequest::new("Fire doors?").with_history(history(10));
    h.service.answer(&request).await.unwrap();

    let messages = h.completer.last_messages().unwrap();
    assert_eq!(messages.len(), 1 + HISTORY_WINDOW + 1 + 1);
    let carried: Vec<&str> = messages[1..=HISTORY_WINDOW]
        .iter()
        .map(|m| m.content.as_str())
        .collect();
    assert_eq!(carried, ["turn 4", "turn 5", "turn 6", "turn 7", "turn 8", "turn 9"]);
    assert_eq!(messages[HISTORY_WINDOW + 1].role, Role::System);
    assert_eq!(messages.last().unwrap(), &ConversationMessage::user("Fire doors?"));
}

#[tokio::test]
async fn short_history_is_kept_whole() {
    let h = harness(safety_corpus(), RecordingCompleter::replying("ok"));
    let request = ChatRequest::new("Fire doors?").with_history(history(3));
    h.service.answer(&request).await.unwrap();
    assert_eq!(h.completer.last_messages().unwrap().len(), 1 + 3 + 1 + 1);
}

#[tokio::test]
async fn signed_replies_are_not_signed_twice() {
    let h = harness(safety_corpus(), RecordingCompleter::replying("All done.\n\n— SafeWork UK\n"));
    let response = h.service.answer(&ChatRequest::new("fire")).await.unwrap();
    assert_eq!(response.answer, "All done.\n\n— SafeWork UK\n");
}

#[tokio::test]
async fn empty_message_is_rejected_before_any_provider_call() {
    let h = harness(safety_corpus(), RecordingCompleter::replying("ok"));
    let err = h.service.answer(&ChatRequest::new("")).await.unwrap_err();

    assert!(err.is_validation());
    assert_eq!(h.embedder.calls(), 0);
    assert_eq!(h.completer.calls(), 0);
}

#[tokio::test]
async fn empty_corpus_keeps_an_empty_knowledge_slot() {
    let corpus = Corpus::new("Be brief.", Vec::new(), None);
    let h = harness(corpus, RecordingCompleter::replying("Hello."));
    let response = h.service.answer(&ChatRequest::new("hi")).await.unwrap();

    assert_eq!(response.answer, "Hello.");
    let messages = h.completer.last_messages().unwrap();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1], ConversationMessage::system(""));
}

#[tokio::test]
async fn completion_failures_surface_as_provider_errors() {
    let h = harness(
        safety_corpus(),
        RecordingCompleter::failing(ProviderError::RateLimited {
            body: "quota".to_string(),
        }),
    );
    let err = h.service.answer(&ChatRequest::new("fire")).await.unwrap_err();
    match err {
        ServiceError::Provider(provider) => assert!(provider.is_retryable()),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn embedding_failure_stops_the_request() {
    let h = harness(safety_corpus(), RecordingCompleter::replying("ok"));
    h.embedder.set_failing(true);
    let err = h.service.answer(&ChatRequest::new("fire")).await.unwrap_err();
    assert!(matches!(err, ServiceError::Provider(ProviderError::Unavailable { .. })));
    assert_eq!(h.completer.calls(), 0);
}

#[tokio::test]
async fn deadline_turns_a_slow_completion_into_a_timeout() {
    let h = harness(
        safety_corpus(),
        RecordingCompleter::slow("late", Duration::from_millis(500)),
    );
    let err = h
        .service
        .answer_with_deadline(&ChatRequest::new("fire"), Duration::from_millis(50))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Provider(ProviderError::Timeout)));
}

#[tokio::test]
async fn generous_deadline_returns_the_answer() {
    let h = harness(safety_corpus(), RecordingCompleter::replying("fine"));
    let response = h
        .service
        .answer_with_deadline(&ChatRequest::new("fire"), Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(response.answer, "fine\n\n— SafeWork UK");
}

#[tokio::test]
async fn deadline_during_cache_rebuild_leaves_cache_unloaded() {
    let dir = TempDir::new().unwrap();
    let corpus = Arc::new(safety_corpus());
    let embedder = Arc::new(KeywordEmbedder::with_delay(Duration::from_millis(300)));
    let cache = Arc::new(EmbeddingCacheManager::new(
        Arc::clone(&corpus),
        Arc::clone(&embedder),
        EmbeddingStorage::new(dir.path().join("faq_embeddings.json")),
    ));
    let service = RagService::new(
        corpus,
        Arc::clone(&cache),
        Arc::new(RecordingCompleter::replying("fine")),
    );

    let err = service
        .answer_with_deadline(&ChatRequest::new("fire"), Duration::from_millis(20))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Provider(ProviderError::Timeout)));
    assert_eq!(cache.status(), CacheStatus::Unloaded);
}
