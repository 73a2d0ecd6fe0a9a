use serde::Deserialize;

pub const ROLE_SUPER_ADMIN: &str = "super_admin";
pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_MANAGER: &str = "manager";
pub const ROLE_LIVREUR: &str = "livreur";

pub const EMPLOYEE_ROLES: [&str; 4] = [ROLE_SUPER_ADMIN, ROLE_ADMIN, ROLE_MANAGER, ROLE_LIVREUR];

pub const EMPLOYEE_ACTIVE: &str = "active";
pub const EMPLOYEE_INACTIVE: &str = "inactive";
pub const EMPLOYEE_SUSPENDED: &str = "suspended";

#[derive(Debug, Clone, Deserialize)]
pub struct NewEmployee {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}
