//! Prompt construction for classification and the retrieval tools.
//!
//! All builders are pure functions over the query and retrieved chunks,
//! which keeps prompt wording testable without a backend.

use panacea_index::DocChunk;

use crate::tool::ToolName;

/// Join chunk contents into a single context block.
pub fn join_chunks(chunks: &[DocChunk]) -> String {
    chunks
        .iter()
        .map(|c| c.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Build the classification prompt enumerating the four tools.
pub fn classification_prompt(query: &str) -> String {
    let mut prompt = String::from(
        "You are an intelligent query classifier for an agent application. \
         The application has four tools:\n",
    );
    for (i, tool) in ToolName::ALL.iter().enumerate() {
        prompt.push_str(&format!(
            "{}. {}: {}\n",
            i + 1,
            tool.label(),
            tool.description()
        ));
    }
    prompt.push_str(&format!(
        "\nBased on the above tools, classify the following query:\n\
         Query: \"{query}\"\n\n\
         Respond only with one of these tool names: \
         Summarizer, Recommender, QA, or Alternative Search."
    ));
    prompt
}

/// Build the summarization prompt over retrieved documents.
pub fn summarizer_prompt(query: &str, chunks: &[DocChunk]) -> String {
    format!(
        "You are an expert medical summarizer. Read the following documents and \
         provide a concise and informative summary relevant to the query \"{query}\".\n\n\
         Documents:\n{docs}\n\n\
         Summary:",
        docs = join_chunks(chunks)
    )
}

/// Build the recommendation prompt over retrieved documents.
pub fn recommender_prompt(query: &str, chunks: &[DocChunk]) -> String {
    format!(
        "You are a medical assistant. Analyze the following documents and provide \
         a detailed answer to the query \"{query}\".\n\
         If necessary, recommend alternative medications and include reasoning \
         based on the information provided.\n\n\
         Documents:\n{docs}\n\n\
         Recommendation:",
        docs = join_chunks(chunks)
    )
}

/// Build the question-answering prompt over retrieved context.
///
/// The instruction to say "I don't know" is what makes refusals
/// detectable downstream; keep it in sync with the refusal phrases the
/// question-answering tool checks for.
pub fn question_prompt(query: &str, chunks: &[DocChunk]) -> String {
    format!(
        "Use the following pieces of context to answer the question at the end. \
         If you don't know the answer, just say that you don't know, don't try \
         to make up an answer.\n\n\
         {context}\n\n\
         Question: {query}\n\
         Helpful Answer:",
        context = join_chunks(chunks)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunks() -> Vec<DocChunk> {
        vec![
            DocChunk::new("Take with food.", "Dosage", "aspirin.pdf"),
            DocChunk::new("Store below 25C.", "Storage", "aspirin.pdf"),
        ]
    }

    #[test]
    fn test_join_chunks_separator() {
        assert_eq!(join_chunks(&chunks()), "Take with food.\n\nStore below 25C.");
        assert_eq!(join_chunks(&[]), "");
    }

    #[test]
    fn test_classification_prompt_lists_all_tools() {
        let prompt = classification_prompt("is aspirin safe");
        assert!(prompt.contains("1. Summarizer:"));
        assert!(prompt.contains("2. Recommender:"));
        assert!(prompt.contains("3. QA:"));
        assert!(prompt.contains("4. Alternative Search:"));
        assert!(prompt.contains("Query: \"is aspirin safe\""));
        assert!(prompt.contains("Respond only with one of these tool names"));
    }

    #[test]
    fn test_summarizer_prompt_embeds_docs() {
        let prompt = summarizer_prompt("aspirin", &chunks());
        assert!(prompt.starts_with("You are an expert medical summarizer."));
        assert!(prompt.contains("Take with food.\n\nStore below 25C."));
        assert!(prompt.ends_with("Summary:"));
    }

    #[test]
    fn test_recommender_prompt_shape() {
        let prompt = recommender_prompt("alternatives to aspirin", &chunks());
        assert!(prompt.starts_with("You are a medical assistant."));
        assert!(prompt.contains("recommend alternative medications"));
        assert!(prompt.ends_with("Recommendation:"));
    }

    #[test]
    fn test_question_prompt_shape() {
        let prompt = question_prompt("what is the dosage", &chunks());
        assert!(prompt.contains("just say that you don't know"));
        assert!(prompt.contains("Question: what is the dosage"));
        assert!(prompt.ends_with("Helpful Answer:"));
    }
}
