pub mod chat_llm;
pub mod db;
pub mod doc_llm;
pub mod gemini;

pub use chat_llm::GeminiChatAdapter;
pub use db::SqliteStateAdapter;
pub use doc_llm::GeminiDocAdapter;
pub use gemini::GeminiClient;
