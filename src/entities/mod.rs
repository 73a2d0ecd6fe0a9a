pub mod cart_items;
pub mod carts;
pub mod categories;
pub mod email_verification_tokens;
pub mod employees;
pub mod merchants;
pub mod order_items;
pub mod orders;
pub mod password_reset_tokens;
pub mod products;
pub mod promo_codes;
pub mod site_settings;
pub mod subcategories;
pub mod users;
pub mod withdrawal_requests;

pub use cart_items as cart_item_entity;
pub use carts as cart_entity;
pub use categories as category_entity;
pub use email_verification_tokens as email_verification_token_entity;
pub use employees as employee_entity;
pub use merchants as merchant_entity;
pub use order_items as order_item_entity;
pub use orders as order_entity;
pub use password_reset_tokens as password_reset_token_entity;
pub use products as product_entity;
pub use promo_codes as promo_code_entity;
pub use site_settings as site_setting_entity;
pub use subcategories as subcategory_entity;
pub use users as user_entity;
pub use withdrawal_requests as withdrawal_request_entity;
