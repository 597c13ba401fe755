pub mod knowledge_store;
pub mod memory_store;

pub use knowledge_store::KnowledgeStore;
pub use memory_store::MemoryStore;
