//! Prompt templates for every model call in a turn.
//!
//! Each renderer returns a complete prompt string. User-supplied text is
//! interpolated with `format!`, never by placeholder substitution, so braces in
//! a question cannot be mistaken for template slots.

/// The fixed reply the answer prompt asks for when context is insufficient.
pub const CLARIFICATION_REPLY: &str =
    "I'm not sure how to answer your question, can you rephrase that?";

const SEPARATOR: &str = "----------";

/// Labelled examples for the few-shot classifier: `(question, label)`.
pub const CLASSIFICATION_EXAMPLES: [(&str, &str); 7] = [
    ("Tell me about your role in this company", "general"),
    ("Tell me about the database migration project you were involved in", "specific"),
    ("What did you do in this role?", "general"),
    ("Tell me about a time you had to lead a team", "general"),
    ("What challenges did you face when you implemented this feature?", "specific"),
    ("What experience do you have with project management?", "general"),
    ("What are your top skills?", "general"),
];

const CLASSIFICATION_PREFIX: &str = "Classify the user's query into \"general\" or \"specific\". \
The broader the scope of the user's query, the more \"general\" it is; likewise, the more \
targeted the search terms, the more \"specific\" it is. Reply with the label only.";

/// Few-shot prompt asking the fast model for a `general` / `specific` label.
pub fn classification(question: &str) -> String {
    let mut prompt = String::from(CLASSIFICATION_PREFIX);
    prompt.push_str("\n\n");
    for (input, label) in CLASSIFICATION_EXAMPLES {
        prompt.push_str(&format!("Human: {input}\n{label}\n\n"));
    }
    prompt.push_str(&format!("Human: {question}\n"));
    prompt
}

/// Prompt asking the fast model to turn a follow-up into a standalone question.
pub fn rewrite_question(chat_history: &str, question: &str) -> String {
    format!(
        "Given the following conversation and a follow up question, rephrase the follow up \
question to be a standalone question. If the context is inadequate, simply return the \
original question.
{SEPARATOR}
CHAT HISTORY: {chat_history}
{SEPARATOR}
FOLLOWUP QUESTION: {question}
{SEPARATOR}
Standalone question:"
    )
}

/// Prompt asking the slow model for a grounded, first-person answer.
pub fn answer(persona: Option<&str>, context: &str, chat_history: &str, question: &str) -> String {
    let persona_line = persona
        .map(|name| format!("The name of your persona is: {name}.\n"))
        .unwrap_or_default();
    format!(
        "{persona_line}The context provided below is from your accomplishments; use it to answer \
the question at the end in the first person.
DO NOT MAKE ANYTHING UP THAT ISN'T IN THE CONTEXT. If the context is insufficient, simply \
reply with \"{CLARIFICATION_REPLY}\"
{SEPARATOR}
CONTEXT: {context}
{SEPARATOR}
CHAT HISTORY: {chat_history}
{SEPARATOR}
QUESTION: {question}
{SEPARATOR}
Helpful Answer:"
    )
}

/// Prompt asking for a polished version of a generated answer.
pub fn refine(context: &str, question: &str, response: &str) -> String {
    format!(
        "Given a previously generated AI response and the context it was based on, refine the \
response to be more contextually accurate, grammatically correct, and professional while \
remaining conversational. Do not add anything that is not supported by the context. Emphasize \
readability by breaking a large paragraph into smaller paragraphs wherever appropriate. Avoid \
flowery language.
{SEPARATOR}
CONTEXT: {context}
{SEPARATOR}
QUESTION: {question}
{SEPARATOR}
RESPONSE: {response}
{SEPARATOR}
Refined answer:"
    )
}

/// Prompt asking the model to translate a question into a structured metadata query.
pub fn self_query(question: &str) -> String {
    format!(
        "Your goal is to structure the user's query to match the request schema below.

The data source is: context of a client's work history.
Structured attributes:
- company (string): the client's past or current employer
- jobTitle (string): the client's job title
- startDate (string): the year the client started work at the company
- endDate (string): the year the client stopped working at the company; empty if still employed
- headline (string): the headline or title of an accomplishment
- skills (array of strings): the skills used to accomplish the task

Respond with a single JSON object and nothing else:
{{\"query\": \"<text to compare against accomplishment contents>\", \"filter\": null}}
or
{{\"query\": \"<text>\", \"filter\": {{\"attribute\": \"<attribute name>\", \"comparator\": \"eq\" | \"contains\", \"value\": \"<string>\"}}}}
Use \"filter\": null unless the query clearly names a value of one of the attributes.

User query: {question}
Structured request:"
    )
}
