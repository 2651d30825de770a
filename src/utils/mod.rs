pub mod random;

pub use random::secure_token;
