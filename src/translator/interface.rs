use async_trait::async_trait;
use futures::Stream;
use serde::Serialize;
use std::collections::HashMap;

use crate::error::Result;

/// One unit of translation work handed to the model service.
#[derive(Debug, Clone, Serialize)]
pub struct TranslationJob {
    pub text: String,
    pub src_lang: String,
    pub tgt_lang: String,
    /// Segment the input into sentences before translating.
    pub by_sentence: bool,
    /// Apply text normalization before translating.
    pub preprocess: bool,
}

pub type ChunkStream = Box<dyn Stream<Item = Result<String>> + Send + Unpin>;

/// Translator interface - the model, tokenizer and sentence splitter live
/// behind it. Language-code validation is its concern too; codes are passed
/// through unchecked.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate the whole input and return the full output.
    async fn translate(&self, job: &TranslationJob) -> Result<String>;

    /// Translate incrementally. The stream is finite and not restartable;
    /// a fresh call starts a fresh sequence.
    async fn stream(&self, job: &TranslationJob) -> Result<ChunkStream>;

    /// Mapping of language name to 8-letter code (e.g. "English" ->
    /// "eng_Latn"). Fixed for the process lifetime.
    fn languages(&self) -> &HashMap<String, String>;

    async fn health_check(&self) -> bool {
        true
    }
}
