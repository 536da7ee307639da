use async_trait::async_trait;
use futures_util::{future, Stream, StreamExt};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::info;

use super::interface::{ChunkStream, TranslationJob, Translator};
use crate::error::{AppError, Result};

/// Decodes a byte stream into text chunks. The transport is free to split
/// a multi-byte UTF-8 sequence across two chunks, so an incomplete tail is
/// carried over and decoded with the bytes that follow it.
fn decode_utf8_chunks<S>(bytes: S) -> impl Stream<Item = Result<String>>
where
    S: Stream<Item = Result<Vec<u8>>>,
{
    bytes
        .scan(Vec::new(), |carry, chunk| {
            let item = chunk.and_then(|chunk| {
                let mut buf = std::mem::take(carry);
                buf.extend_from_slice(&chunk);
                match std::str::from_utf8(&buf) {
                    Ok(text) => Ok(text.to_string()),
                    Err(e) if e.error_len().is_none() => {
                        // Incomplete sequence at the chunk boundary; hold
                        // the tail back for the next chunk.
                        let text =
                            String::from_utf8_lossy(&buf[..e.valid_up_to()]).into_owned();
                        *carry = buf[e.valid_up_to()..].to_vec();
                        Ok(text)
                    }
                    Err(e) => Err(AppError::Translator(format!(
                        "invalid UTF-8 in translation stream: {}",
                        e
                    ))),
                }
            });
            future::ready(Some(item))
        })
        .filter(|item| {
            future::ready(match item {
                Ok(text) => !text.is_empty(),
                Err(_) => true,
            })
        })
}

/// Client for the translation inference service.
///
/// The fine-tuned NLLB model runs in a separate process; this wrapper
/// speaks plain JSON to it.
pub struct RemoteTranslator {
    client: Client,
    base_url: String,
    languages: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    translation: String,
}

impl RemoteTranslator {
    /// Builds the client and fetches the language table once. The table
    /// does not change while the model is loaded, so it is cached here.
    pub async fn connect(base_url: String) -> Result<Self> {
        let client = Client::new();
        let url = format!("{}/list-languages", base_url);
        let languages: HashMap<String, String> = client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        info!(
            "Translator service at {} supports {} languages",
            base_url,
            languages.len()
        );

        Ok(Self {
            client,
            base_url,
            languages,
        })
    }
}

#[async_trait]
impl Translator for RemoteTranslator {
    async fn translate(&self, job: &TranslationJob) -> Result<String> {
        let url = format!("{}/translate", self.base_url);
        let response: TranslateResponse = self
            .client
            .post(&url)
            .json(job)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.translation)
    }

    async fn stream(&self, job: &TranslationJob) -> Result<ChunkStream> {
        let url = format!("{}/translate/stream", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(job)
            .send()
            .await?
            .error_for_status()?;

        let bytes = response
            .bytes_stream()
            .map(|chunk| chunk.map(|b| b.to_vec()).map_err(AppError::Upstream));

        Ok(Box::new(decode_utf8_chunks(bytes).boxed()))
    }

    fn languages(&self) -> &HashMap<String, String> {
        &self.languages
    }

    async fn health_check(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}
