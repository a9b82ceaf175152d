//! Prompt templates for answering, HyDE expansion, and evaluation.
//! The orchestrator formats these fully before any provider sees them.

/// Answer prompt. The model must answer from the supplied context only
/// and fall back to the literal refusal sentence when unsupported.
const ANSWER_TEMPLATE: &str = r#"You are an AI assistant specialized in answering questions about documents. You will receive a
question along with relevant context from an extracted part of a document. Your response
should be clear, concise, and structured as follows:

You can skip any of the headings mentioned in the below structure which are "Answer Summary,
Supporting Details, Key Points and Additional Notes", if you don't find it necessary to include the
heading in the response and make sure that the answer does not contain repetitive text.

**Answer Summary:** Provide a brief answer to the question. If the answer is not found in the provided context,
say: "Hmm, I'm not sure." Do not invent or assume information.

**Supporting Details:** Provide any supporting details from the context that helped you derive the answer in detail.
Don't skip over or summarize any part here. If the context is insufficient to fully answer the question,
mention that explicitly in bold letters.

**Key Points:** Highlight any important facts or key takeaways relevant to the question that were found in the
context with proper formatting eg using bullet points or any other way.

**Additional Notes:** If there are related topics or clarifications needed, include them here. If the answer can
be derived from multiple pieces of context, mention how they were integrated.

If you don't know the answer, just say "Hmm, I'm not sure." Don't try to make up an answer.
Question: {question}
=========
{context}
=========
Answer in Markdown: "#;

/// HyDE prompt: a conversational answer drawn from model knowledge, used
/// as the hypothetical document whose embedding drives retrieval.
const HYDE_TEMPLATE: &str = r#"You are an AI assistant for answering questions about the various documents from the user.
You are given the following extracted parts of a long document and a question. If you are not provided with any extracted
parts of the documents then try to generate an answer based on your knowledge and facts in your knowledge. Remember to provide a conversational answer.
If you don't know the answer, just say "Hmm, I'm not sure." Don't try to make up an answer.
Question: {question}
=========
{context}
=========
Answer in Markdown: "#;

pub fn answer_prompt(question: &str, context: &str) -> String {
    ANSWER_TEMPLATE.replace("{question}", question).replace("{context}", context)
}

/// The hypothetical document is generated with no context at all.
pub fn hyde_prompt(question: &str) -> String {
    HYDE_TEMPLATE.replace("{question}", question).replace("{context}", "")
}

/// Instruct prompt synthesising a ground truth for a query. Answers are
/// expected prefixed with `A:`.
const GROUND_TRUTH_TEMPLATE: &str = r#"You are an AI assistant for generating ground truth based on the user query and your knowledge.
Please provide ground truths clearly labeled as follows:
    - Ground truths (answers) prefixed with "A:"

Query: {query}"#;

pub fn ground_truth_prompt(query: &str) -> String {
    GROUND_TRUTH_TEMPLATE.replace("{query}", query)
}

/// Reward exchange for scoring the generated answer. The candidate answer
/// goes in the assistant turn.
pub fn llm_eval_prompt(question: &str, context: &str, ground_truth: &str) -> String {
    format!(
        "user_query: {question} Based on the below context answer the user's query\n\
         context: {context}\n\
         Expected Answer: {ground_truth}"
    )
}

/// Reward exchange for scoring the retrieved context, which is presented
/// as the assistant turn by the caller.
pub fn retriever_eval_prompt(question: &str, ground_truth: &str) -> String {
    format!("Question: {question}\nExpected Answer: {ground_truth}")
}

/// The refusal sentence the answer prompt mandates.
pub const UNSURE_ANSWER: &str = "Hmm, I'm not sure.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answer_prompt_embeds_question_and_context() {
        let p = answer_prompt("capital of Atlantis?", "Orichalcum is the capital.");
        assert!(p.contains("Question: capital of Atlantis?"));
        assert!(p.contains("Orichalcum is the capital."));
        assert!(p.contains(UNSURE_ANSWER));
    }

    #[test]
    fn hyde_prompt_has_empty_context_section() {
        let p = hyde_prompt("capital of Atlantis?");
        assert!(p.contains("Question: capital of Atlantis?"));
        assert!(p.contains("=========\n\n========="));
    }
}
