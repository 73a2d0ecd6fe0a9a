pub mod currency;
pub mod email;
pub mod order_number;
pub mod password;
pub mod token;

pub use currency::*;
pub use email::*;
pub use order_number::*;
pub use password::*;
pub use token::*;
