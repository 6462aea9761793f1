pub mod fallback;
pub mod local_store;
pub mod pdf;
pub mod records;
pub mod remote_store;
pub mod story_llm;

pub use fallback::FallbackStore;
pub use local_store::LocalStoreAdapter;
pub use pdf::PdfBookRenderer;
pub use remote_store::RemoteStoreAdapter;
pub use story_llm::OpenAiStoryAdapter;
