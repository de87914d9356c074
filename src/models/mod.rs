pub mod artifact;
pub mod user;
pub mod wizard;
