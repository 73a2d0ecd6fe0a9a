pub mod delivery_service;
pub mod employee_service;
pub mod merchant_service;
pub mod order_service;
pub mod promo_service;
pub mod settings_service;
pub mod user_service;

pub use delivery_service::*;
pub use employee_service::*;
pub use merchant_service::*;
pub use order_service::*;
pub use promo_service::*;
pub use settings_service::*;
pub use user_service::*;
