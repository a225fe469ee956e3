//! Classifier Tests
//!
//! Safety override, no-credential fallback, backend failure taxonomy,
//! structured-to-plain retry and confidence gating, driven through `MockBackend`.

use super::fixtures::{classifier_with, eligible_bank, payload, small_bank, MockBackend};
use crate::backend::{BackendError, ReplyFormat, JSON_ONLY_INSTRUCTION};
use crate::brain::classifier::{GATE_RATIONALE, PARSE_FAILURE_RATIONALE};
use crate::brain::{IntentClassifier, SafetyRules, EMERGENCY_PHRASES, URGENT_SUPPORT_INTENT};
use crate::config::ClassifierConfig;
use crate::models::NO_MATCH;
use std::sync::Arc;

#[cfg(test)]
mod safety_tests {
    use super::*;

    #[tokio::test]
    async fn test_every_emergency_phrase_routes_to_urgent_support() {
        let backend = Arc::new(MockBackend::scripted(vec![]));
        let classifier = classifier_with(small_bank(), Some(backend.clone()));

        for phrase in EMERGENCY_PHRASES {
            let result = classifier.classify(&format!("my baby has {} right now", phrase)).await;
            assert_eq!(result.intent_id, URGENT_SUPPORT_INTENT, "phrase: {}", phrase);
            assert_eq!(result.confidence, 1.0);
        }
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_override_is_case_insensitive() {
        let classifier = classifier_with(small_bank(), None);
        let result = classifier.classify("My son has BLUE LIPS").await;
        assert_eq!(result.intent_id, URGENT_SUPPORT_INTENT);
        assert!(result.rationale.contains("blue lips"));
    }

    #[tokio::test]
    async fn test_override_without_urgent_intent_is_no_match() {
        let backend = Arc::new(MockBackend::replying(payload("eligible", 0.99)));
        let classifier = classifier_with(eligible_bank(), Some(backend.clone()));

        let result = classifier.classify("This is an emergency").await;
        assert_eq!(result.intent_id, NO_MATCH);
        assert_eq!(result.confidence, 1.0);
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_custom_rules_replace_defaults() {
        let rules = SafetyRules::new(["Fainted"], "symptoms");
        let classifier = classifier_with(small_bank(), None).with_safety_rules(rules);

        assert_eq!(classifier.classify("she fainted").await.intent_id, "symptoms");
        // default phrases no longer apply
        assert_eq!(classifier.classify("emergency").await.intent_id, NO_MATCH);
    }
}

#[cfg(test)]
mod fallback_tests {
    use super::*;

    #[test]
    fn test_reports_configured_model_and_threshold() {
        let config = ClassifierConfig {
            model: "gpt-4o-mini".to_string(),
            confidence_threshold: 0.8,
            ..ClassifierConfig::default()
        };
        let classifier = IntentClassifier::new(eligible_bank(), config);
        assert_eq!(classifier.model(), "gpt-4o-mini");
        assert_eq!(classifier.confidence_threshold(), 0.8);
        assert!(!classifier.has_credential());
    }

    #[tokio::test]
    async fn test_no_credential_is_actionable_no_match() {
        let classifier = classifier_with(eligible_bank(), None);
        assert!(!classifier.has_credential());

        let result = classifier.classify("Am I eligible?").await;
        assert_eq!(result.intent_id, NO_MATCH);
        assert_eq!(result.confidence, 0.0);
        assert!(result.rationale.contains("OPENAI_API_KEY"));
    }

    #[tokio::test]
    async fn test_authentication_failure() {
        let backend = Arc::new(MockBackend::failing(BackendError::Authentication("401".into())));
        let classifier = classifier_with(eligible_bank(), Some(backend));

        let result = classifier.classify("Am I eligible?").await;
        assert!(result.is_no_match());
        assert!(result.rationale.contains("rejected the API key"));
    }

    #[tokio::test]
    async fn test_network_failure() {
        let backend = Arc::new(MockBackend::failing(BackendError::Network("connection refused".into())));
        let classifier = classifier_with(eligible_bank(), Some(backend));

        let result = classifier.classify("Am I eligible?").await;
        assert!(result.is_no_match());
        assert!(result.rationale.to_lowercase().contains("unable to reach"));
    }

    #[tokio::test]
    async fn test_status_failure_includes_code() {
        let backend = Arc::new(MockBackend::failing(BackendError::Status {
            code: 429,
            message: "Too Many Requests".into(),
        }));
        let classifier = classifier_with(eligible_bank(), Some(backend));

        let result = classifier.classify("Am I eligible?").await;
        assert!(result.is_no_match());
        assert!(result.rationale.contains("429"));
    }

    #[tokio::test]
    async fn test_unparseable_reply() {
        let backend = Arc::new(MockBackend::replying("I think it's eligibility, probably."));
        let classifier = classifier_with(eligible_bank(), Some(backend));

        let result = classifier.classify("Am I eligible?").await;
        assert_eq!(result.intent_id, NO_MATCH);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.rationale, PARSE_FAILURE_RATIONALE);
    }
}

#[cfg(test)]
mod retry_tests {
    use super::*;

    #[tokio::test]
    async fn test_rejected_structured_format_retries_once_as_plain_text() {
        let backend = Arc::new(MockBackend::scripted(vec![
            Err(BackendError::UnsupportedResponseFormat("response_format".into())),
            Ok(format!("```json\n{}\n```", payload("eligible", 0.9))),
        ]));
        let classifier = classifier_with(eligible_bank(), Some(backend.clone()));

        let result = classifier.classify("Am I eligible?").await;
        assert_eq!(result.intent_id, "eligible");

        let requests = backend.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].format, ReplyFormat::JsonObject);
        assert_eq!(requests[1].format, ReplyFormat::PlainText);
        assert_eq!(requests[0].user_message, requests[1].user_message);
        assert!(!requests[0].system_prompt.contains(JSON_ONLY_INSTRUCTION));
    }

    #[tokio::test]
    async fn test_retry_happens_at_most_once() {
        let backend = Arc::new(MockBackend::scripted(vec![
            Err(BackendError::UnsupportedResponseFormat("response_format".into())),
            Err(BackendError::UnsupportedResponseFormat("response_format".into())),
            Ok(payload("eligible", 0.9)),
        ]));
        let classifier = classifier_with(eligible_bank(), Some(backend.clone()));

        let result = classifier.classify("Am I eligible?").await;
        assert!(result.is_no_match());
        assert_eq!(backend.call_count(), 2);
    }

    #[tokio::test]
    async fn test_other_failures_are_not_retried() {
        let backend = Arc::new(MockBackend::scripted(vec![
            Err(BackendError::Status { code: 500, message: "oops".into() }),
            Ok(payload("eligible", 0.9)),
        ]));
        let classifier = classifier_with(eligible_bank(), Some(backend.clone()));

        assert!(classifier.classify("Am I eligible?").await.is_no_match());
        assert_eq!(backend.call_count(), 1);
    }
}

#[cfg(test)]
mod gate_tests {
    use super::*;

    #[tokio::test]
    async fn test_confident_known_intent_is_accepted() {
        let backend = Arc::new(MockBackend::replying(payload("eligible", 0.9)));
        let classifier = classifier_with(eligible_bank(), Some(backend.clone()));

        let result = classifier.classify("Am I eligible for the RSV shot?").await;
        assert_eq!(result.intent_id, "eligible");
        assert_eq!(result.confidence, 0.9);
        assert_eq!(backend.call_count(), 1);

        let answer = classifier.response_bank().intent_by_id(&result.intent_id).unwrap();
        assert_eq!(answer.response, "Eligibility details.");
    }

    #[tokio::test]
    async fn test_threshold_is_inclusive() {
        let backend = Arc::new(MockBackend::replying(payload("eligible", 0.7)));
        let classifier = classifier_with(eligible_bank(), Some(backend));
        assert_eq!(classifier.classify("eligible?").await.intent_id, "eligible");
    }

    #[tokio::test]
    async fn test_low_confidence_is_demoted_keeping_confidence_and_slots() {
        let reply = serde_json::json!({
            "intent_id": "eligible",
            "confidence": 0.4,
            "slots": {"age": "70"},
            "rationale": "unsure"
        })
        .to_string();
        let backend = Arc::new(MockBackend::replying(reply));
        let classifier = classifier_with(eligible_bank(), Some(backend));

        let result = classifier.classify("maybe eligible?").await;
        assert_eq!(result.intent_id, NO_MATCH);
        assert_eq!(result.confidence, 0.4);
        assert_eq!(result.slots.get("age").map(String::as_str), Some("70"));
        assert_eq!(result.rationale, GATE_RATIONALE);
    }

    #[tokio::test]
    async fn test_invented_intent_is_demoted() {
        let backend = Arc::new(MockBackend::replying(payload("made_up_intent", 0.99)));
        let classifier = classifier_with(eligible_bank(), Some(backend));

        let result = classifier.classify("tell me a joke").await;
        assert_eq!(result.intent_id, NO_MATCH);
        assert_eq!(result.confidence, 0.99);
        assert_eq!(result.rationale, GATE_RATIONALE);
    }

    #[tokio::test]
    async fn test_model_choosing_no_match_stays_no_match() {
        let backend = Arc::new(MockBackend::replying(payload(NO_MATCH, 0.95)));
        let classifier = classifier_with(eligible_bank(), Some(backend));
        assert!(classifier.classify("weather tomorrow?").await.is_no_match());
    }

    #[tokio::test]
    async fn test_prompt_lists_every_allowed_intent() {
        let backend = Arc::new(MockBackend::replying(payload("timing", 0.9)));
        let bank = small_bank();
        let classifier = classifier_with(bank.clone(), Some(backend.clone()));

        classifier.classify("when do I get it").await;
        let prompt = &backend.requests()[0].system_prompt;
        for intent in bank.intents() {
            assert!(prompt.contains(&intent.intent_id));
        }
        assert!(prompt.contains(NO_MATCH));
        assert!(prompt.contains("Never invent new intents."));
    }

    #[tokio::test]
    async fn test_concurrent_classification_shares_classifier() {
        let replies = (0..8).map(|_| Ok(payload("eligible", 0.9))).collect();
        let backend = Arc::new(MockBackend::scripted(replies));
        let classifier = Arc::new(classifier_with(eligible_bank(), Some(backend.clone())));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let classifier = classifier.clone();
                tokio::spawn(async move { classifier.classify(&format!("question {}", i)).await })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().intent_id, "eligible");
        }
        assert_eq!(backend.call_count(), 8);
    }
}
