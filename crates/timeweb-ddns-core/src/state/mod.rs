// # State Store Implementations
//
// - [`FileStateStore`]: `ip.txt` and `cookies.json` under the data directory
// - [`MemoryStateStore`]: nothing persisted, for tests and dry runs

pub mod file;
pub mod memory;

pub use file::FileStateStore;
pub use memory::MemoryStateStore;
