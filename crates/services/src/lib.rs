pub mod store;

pub use store::http::{HttpLexiconStore, HttpTranscriptStore};
pub use store::memory::{InMemoryTranscriptStore, StaticLexicon};
