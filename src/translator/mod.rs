pub mod interface;
pub mod remote;

#[cfg(test)]
pub mod mock;

pub use interface::{ChunkStream, TranslationJob, Translator};
pub use remote::RemoteTranslator;
