//! Prompt templates for classification and response generation.

/// Response used when the completion service cannot produce a reply.
pub const APOLOGY_RESPONSE: &str =
    "I apologize, I'm having trouble right now. Could you please try again?";

/// Labels the classifier must emit, one per line, in this order.
pub const CLASSIFICATION_LABELS: [&str; 6] = [
    "MEDICAL CONDITIONS",
    "ALLERGIES",
    "MEDICATIONS",
    "CURRENT SYMPTOMS",
    "PAIN LEVEL",
    "PREFERENCES",
];

/// Build the fixed-grammar classification prompt for one patient statement.
pub fn classification_prompt(utterance: &str) -> String {
    format!(
        r#"Analyze this patient statement and extract medical information. Categorize each piece of information:

Patient statement: "{utterance}"

Extract and categorize information into these categories:

MEDICAL CONDITIONS: Any diseases, disorders, or chronic conditions (diabetes, asthma, hypertension, arthritis, etc.)

ALLERGIES: Any allergies, intolerances, or adverse reactions (food allergies, drug allergies, environmental allergies like dust, pollen, etc.)

MEDICATIONS: Any medications, drugs, treatments, or supplements being taken

CURRENT SYMPTOMS: Current health complaints, symptoms, or problems happening now (pain, headache, nausea, etc.)

PAIN LEVEL: Any pain scale ratings (1-10 scale, mild/moderate/severe)

PREFERENCES: Appointment preferences, communication preferences, lifestyle habits, exercise habits

Respond in this exact format:
MEDICAL CONDITIONS: [list items separated by semicolons, or "none"]
ALLERGIES: [list items separated by semicolons, or "none"]
MEDICATIONS: [list items separated by semicolons, or "none"]
CURRENT SYMPTOMS: [list items separated by semicolons, or "none"]
PAIN LEVEL: [rating or "none"]
PREFERENCES: [list items separated by semicolons, or "none"]

Examples:
- "I have dust allergy" → ALLERGIES: dust
- "I'm allergic to shellfish" → ALLERGIES: shellfish
- "My back hurts" → CURRENT SYMPTOMS: back pain
- "I take pills for my heart" → MEDICATIONS: heart medication
- "I have diabetes" → MEDICAL CONDITIONS: diabetes"#
    )
}

/// Prompt used before the patient has given their name.
pub fn greeting_prompt() -> String {
    r#"You are a friendly medical assistant. The user just started talking to you.
Greet them warmly and ask for their name in a natural way.
Be professional but approachable."#
        .to_string()
}

/// Prompt used once the patient is known, grounded in their assembled context.
pub fn response_prompt(patient_name: &str, context: &str, utterance: &str) -> String {
    format!(
        r#"You are a caring medical assistant talking to {patient_name}.

PATIENT CONTEXT:
{context}

The patient just said: "{utterance}"

Respond naturally and professionally:
- If you recognize them from their medical history, acknowledge it warmly
- If they mention symptoms, relate to their previous visits when relevant
- If they mention new symptoms, ask appropriate follow-up questions
- Reference their known conditions, allergies, and medications when relevant
- Be empathetic and show continuity of care
- Keep responses conversational and helpful

Show that you know their medical history and care about their ongoing health."#
    )
}
