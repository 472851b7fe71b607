mod batch;

pub use batch::{process_feeds, BatchError, BatchResult};
