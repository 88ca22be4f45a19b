pub mod store;

pub use store::SubmissionStore;
