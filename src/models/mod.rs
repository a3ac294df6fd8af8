pub mod password_reset_token;
pub mod product;
pub mod user;

pub use password_reset_token::PasswordResetToken;
pub use product::{NewProduct, Product, ProductImage};
pub use user::{User, UserProfile};
