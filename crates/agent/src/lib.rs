pub mod llm;
pub mod mapper;
pub mod writer;

pub use llm::{AdapterError, ChatRequest, LlmClient, OpenAiChatClient, ScriptedLlmClient};
pub use mapper::{DraftItem, QuoteDraft, QuoteMapper};
pub use writer::TextImprover;
