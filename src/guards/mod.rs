mod basic_auth;
mod operator;

pub use basic_auth::*;
pub use operator::*;
