pub mod password_reset_tokens;
pub mod products;
pub mod users;
