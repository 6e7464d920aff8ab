pub mod hashing;
pub mod jwt;
pub mod rate_limit;
pub mod secrets;
pub mod security;
pub mod session;
