pub mod credentials;
pub mod job;
