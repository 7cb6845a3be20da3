// Engine orchestration: session lifecycle, worker loop, and staging.

pub mod session;
pub mod traits;
pub mod vfs;
pub mod worker;
