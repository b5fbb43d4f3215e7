pub mod analysis;
pub mod memory;

pub use analysis::AnalysisCache;
pub use memory::MemoryCache;
