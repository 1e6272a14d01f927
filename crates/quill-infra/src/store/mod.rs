//! Post storage backends.

mod fs;
mod memory;

pub use fs::FsPostRepository;
pub use memory::InMemoryPostRepository;
