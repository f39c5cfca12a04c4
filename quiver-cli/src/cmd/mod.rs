pub mod execute;
pub mod monitor;
pub mod requests;
pub mod validate;
