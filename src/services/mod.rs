pub mod session;
pub mod sync;
