//! System instruction for the constrained classification call.

use crate::models::NO_MATCH;
use crate::response_bank::ResponseBank;

/// Builds the system prompt listing every allowed intent with its question and examples.
pub fn build_system_prompt(bank: &ResponseBank) -> String {
    let mut lines = vec![
        "You classify user RSV questions into intents and never provide medical advice.".to_string(),
        format!(
            "Select the best intent_id from the approved list. If nothing fits, return {}.",
            NO_MATCH
        ),
        "Use only the JSON schema supplied and avoid additional text.".to_string(),
        "Allowed intents:".to_string(),
    ];

    for intent in bank.intents() {
        lines.push(format!(
            "- {}: {} (examples: {})",
            intent.intent_id,
            intent.question(),
            intent.sample_user_phrases.join(", ")
        ));
    }

    lines.push("Never invent new intents.".to_string());
    lines.push("Do not generate medical recommendations or diagnoses.".to_string());
    lines.push(
        "Reply with a single JSON object: {\"intent_id\": string, \"confidence\": number between 0 and 1, \
         \"slots\": object of string values, \"rationale\": string}."
            .to_string(),
    );
    lines.join("\n")
}
