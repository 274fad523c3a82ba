pub mod aws;
pub mod credentials;
pub mod object_store;
