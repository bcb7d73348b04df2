// Worker pool used to fan particle updates out across threads
pub mod thread_pool;

pub use thread_pool::*;
