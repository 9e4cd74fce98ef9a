pub mod id;

pub use id::JobId;
