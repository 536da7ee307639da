use async_trait::async_trait;
use futures::stream;
use std::collections::HashMap;

use super::interface::{ChunkStream, TranslationJob, Translator};
use crate::error::Result;

/// Deterministic stand-in for the inference service. The streamed chunks
/// always concatenate to exactly the synchronous output.
pub struct MockTranslator {
    languages: HashMap<String, String>,
}

impl MockTranslator {
    pub fn new() -> Self {
        let languages = [
            ("English", "eng_Latn"),
            ("German", "deu_Latn"),
            ("Ferrarese", "fer_Latn"),
        ]
        .into_iter()
        .map(|(name, code)| (name.to_string(), code.to_string()))
        .collect();
        Self { languages }
    }

    fn render(&self, job: &TranslationJob) -> String {
        format!("[{}] {}", job.tgt_lang, job.text)
    }
}

#[async_trait]
impl Translator for MockTranslator {
    async fn translate(&self, job: &TranslationJob) -> Result<String> {
        Ok(self.render(job))
    }

    async fn stream(&self, job: &TranslationJob) -> Result<ChunkStream> {
        let full = self.render(job);
        let chunks: Vec<Result<String>> = full
            .split_inclusive(' ')
            .map(|piece| Ok(piece.to_string()))
            .collect();
        Ok(Box::new(stream::iter(chunks)))
    }

    fn languages(&self) -> &HashMap<String, String> {
        &self.languages
    }
}
