pub mod backoff;
pub mod cleaner;
pub mod fetcher;
pub mod normalize;
pub mod scheduler;
pub mod session;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;
pub mod writer;
