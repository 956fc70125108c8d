//! crates/docqa_core/src/prompt.rs
//!
//! The fixed instruction template sent to the answering model for every question.

const PROMPT_TEMPLATE: &str = r#"You are an AI assistant helping answer questions based on a document.

Document Content:
{document}

User Question:
{question}

Instructions:
- If the answer can be found in the document, answer strictly using the document content and mention that it's from the document.
- If not, use your general knowledge to answer helpfully, and mention that it's not found in the document.
- Do not fabricate information.
- Do NOT say the document is irrelevant.
- Keep answers clear and concise.
"#;

/// Builds the prompt for `question` about `document_text`.
///
/// Both inputs are embedded verbatim; placeholders inside the document are not
/// re-expanded.
pub fn build_prompt(document_text: &str, question: &str) -> String {
    let (head, rest) = PROMPT_TEMPLATE
        .split_once("{document}")
        .unwrap_or((PROMPT_TEMPLATE, ""));
    let rest = rest.replacen("{question}", question, 1);

    let mut prompt = String::with_capacity(PROMPT_TEMPLATE.len() + document_text.len() + question.len());
    prompt.push_str(head);
    prompt.push_str(document_text);
    prompt.push_str(&rest);
    prompt
}
