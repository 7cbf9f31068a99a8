pub mod manager;

pub use manager::{FeedManager, Subscription};
