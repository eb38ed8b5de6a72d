//! Prompt builders for the four generation call sites.
//!
//! Every prompt is self-contained text: history, summary, and retrieved
//! exemplars are rendered into it rather than sent as chat messages.

/// Example labels shown to the issue classifier.
pub const ISSUE_EXAMPLES: &[&str] = &[
    "Chronic stress",
    "Social anxiety",
    "Work burnout",
    "Relationship conflict",
    "Academic pressure",
    "Sleep difficulties",
    "Low self-esteem",
    "Decision paralysis",
    "Imposter syndrome",
    "Financial anxiety",
    "Family tension",
    "Career uncertainty",
];

/// Example lines shown to the activity generator.
pub const ACTIVITY_EXAMPLES: &[&str] = &[
    "Take 5 deep breaths and focus on your exhale",
    "Write down three things you're grateful for today",
    "Go for a 10-minute walk outside",
    "Listen to calming music for 15 minutes",
    "Call a friend or family member",
];

/// Everything woven into the empathetic-response prompt.
#[derive(Debug, Clone, Default)]
pub struct ResponsePromptInput<'a> {
    /// Retrieved exemplar documents, already joined by blank lines
    pub rag_context: &'a str,
    pub history: &'a str,
    pub summary: &'a str,
    /// Output of the relevance filter
    pub relevant_context: &'a str,
    pub emotion: &'a str,
    pub user_message: &'a str,
}

pub fn issue_prompt(emotion: &str, user_message: &str, history: &str) -> String {
    let examples = ISSUE_EXAMPLES
        .iter()
        .map(|e| format!("- {e}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Based on the user's emotional state, their current message, and the conversation history, \
identify a specific psychological or emotional issue/condition they might be experiencing.

Emotion detected: {emotion}
Current user message: {user_message}

Conversation history:
{history}

Generate a concise, specific issue name (2-4 words maximum) that best describes what the user \
might be dealing with, considering the full context of the conversation.

Examples of good issue names:
{examples}

Respond with ONLY the issue name, nothing else."
    )
}

pub fn summary_prompt(history: &str) -> String {
    format!(
        "Analyze this conversation and provide a brief summary of the main themes, emotions, and issues discussed:

Conversation:
{history}

Provide a concise summary (2-3 sentences) that captures:
1. The main emotional themes
2. Key issues or concerns mentioned
3. Any progress or patterns in the conversation

Summary:"
    )
}

pub fn response_prompt(input: &ResponsePromptInput<'_>) -> String {
    let ResponsePromptInput {
        rag_context,
        history,
        summary,
        relevant_context,
        emotion,
        user_message,
    } = input;

    format!(
        "You are an empathetic AI assistant. Use the following information to generate a caring, \
emotionally aware, and contextually relevant response.

RAG Context from similar conversations:
{rag_context}

Conversation History:
{history}

Conversation Summary:
{summary}

Relevant Previous Context:
{relevant_context}

The detected emotion for this conversation is: {emotion}

Current User Message: {user_message}

Instructions:
- Acknowledge the conversation history and show that you remember what was discussed before
- Provide a thoughtful, empathetic response that considers the user's emotional state of \"{emotion}\"
- Reference previous parts of the conversation when relevant
- Focus ONLY on providing emotional support, validation, and understanding
- Do NOT include any activity suggestions or recommendations in your response
- Keep your response conversational, supportive, and contextually aware
- If this is a follow-up to previous issues, acknowledge the continuity"
    )
}

/// The conversation context handed to the activity generator.
pub fn activity_context(history: &str, issue: &str) -> String {
    format!("{history}\n\nCurrent issue: {issue}")
}

pub fn activity_prompt(emotion: &str, user_message: &str, conversation_context: &str) -> String {
    let examples = ACTIVITY_EXAMPLES.join("\n");

    format!(
        "Generate 4-5 short, actionable activity suggestions for someone feeling \"{emotion}\".

Current user message: {user_message}
Conversation context: {conversation_context}

Requirements:
- Each activity should be 1-2 sentences maximum
- Make them specific and actionable
- Tailor them to the \"{emotion}\" emotional state
- Consider the conversation context for personalized suggestions
- Focus on practical, immediate actions
- Format as a simple list, one activity per line
- No bullet points, numbers, or special formatting

Example format:
{examples}"
    )
}
