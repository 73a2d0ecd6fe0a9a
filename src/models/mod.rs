pub mod employee;
pub mod ledger;
pub mod merchant;
pub mod order;
pub mod order_status;
pub mod pagination;
pub mod promo;
pub mod settings;
pub mod user;

pub use employee::*;
pub use ledger::*;
pub use merchant::*;
pub use order::*;
pub use order_status::*;
pub use pagination::*;
pub use promo::*;
pub use settings::*;
pub use user::*;
