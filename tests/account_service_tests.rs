use chrono::{Duration, Utc};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, ColumnTrait, Database, DatabaseConnection, EntityTrait,
    QueryFilter, Set};

use douka_backend::entities::{
    email_verification_token_entity, employee_entity, merchant_entity,
};
use douka_backend::models::{NewEmployee, NewUser};
use douka_backend::services::{EmployeeService, UserService};
use douka_backend::utils::verify_password;
use douka_backend::AppError;

async fn setup() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");
    Migrator::up(&db, None).await.expect("Migrations failed");
    db
}

fn new_user(email: &str) -> NewUser {
    NewUser {
        email: email.to_string(),
        password: "comores123".to_string(),
        first_name: "Amina".to_string(),
        last_name: "Said".to_string(),
        phone: Some("3321111".to_string()),
        address: None,
        city: Some("Moroni".to_string()),
        country: Some("Comores".to_string()),
    }
}

fn new_employee(email: &str, role: &str) -> NewEmployee {
    NewEmployee {
        email: email.to_string(),
        password: "douka2025".to_string(),
        first_name: "Fatima".to_string(),
        last_name: "Abdou".to_string(),
        phone: Some("3311234".to_string()),
        role: role.to_string(),
        permissions: Vec::new(),
    }
}

async fn seed_merchant(db: &DatabaseConnection, email: &str) -> merchant_entity::Model {
    merchant_entity::ActiveModel {
        email: Set(email.to_string()),
        password_hash: Set("x".to_string()),
        store_name: Set("Boutique Moroni".to_string()),
        balance: Set(0.0),
        status: Set("active".to_string()),
        email_verified: Set(true),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert merchant")
}

async fn seed_raw_employee(db: &DatabaseConnection, email: &str, role: &str) -> employee_entity::Model {
    employee_entity::ActiveModel {
        email: Set(email.to_string()),
        password_hash: Set("x".to_string()),
        first_name: Set("Irene".to_string()),
        last_name: Set("Mohamed".to_string()),
        role: Set(role.to_string()),
        status: Set("active".to_string()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert employee")
}

#[tokio::test]
async fn test_user_registration_guards() {
    let db = setup().await;
    let service = UserService::new(db.clone());

    let user = service
        .create_user(new_user("amina@moroni.km"))
        .await
        .expect("create user");
    assert!(!user.email_verified, "a fresh account starts unverified");

    let err = service
        .create_user(new_user("amina@moroni.km"))
        .await
        .expect_err("duplicate email rejected");
    assert!(err.to_string().contains("existe déjà"));

    let err = service
        .create_user(new_user("pas-un-email"))
        .await
        .expect_err("malformed email rejected");
    assert!(err.to_string().contains("Adresse email invalide"));

    let mut weak = new_user("said@mutsamudu.km");
    weak.password = "abc".to_string();
    let err = service
        .create_user(weak)
        .await
        .expect_err("short password rejected");
    assert!(err.to_string().contains("6 et 128 caractères"));
}

#[tokio::test]
async fn test_email_verification_flow() {
    let db = setup().await;
    let service = UserService::new(db.clone());
    service
        .create_user(new_user("amina@moroni.km"))
        .await
        .expect("create user");

    let token = service
        .issue_verification_token("amina@moroni.km")
        .await
        .expect("issue token");
    assert_eq!(token.token.len(), 48);
    assert!(!token.used);

    let user = service
        .confirm_email(&token.token)
        .await
        .expect("confirm email");
    assert!(user.email_verified);

    // 令牌单次有效
    let err = service
        .confirm_email(&token.token)
        .await
        .expect_err("token reuse rejected");
    assert!(err.to_string().contains("déjà été utilisé"));

    let err = service
        .confirm_email("JETON-INCONNU")
        .await
        .expect_err("unknown token rejected");
    assert!(matches!(err, AppError::NotFound(_)));

    let err = service
        .issue_verification_token("inconnu@moroni.km")
        .await
        .expect_err("token only for known accounts");
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_expired_verification_token_is_rejected() {
    let db = setup().await;
    let service = UserService::new(db.clone());
    service
        .create_user(new_user("amina@moroni.km"))
        .await
        .expect("create user");

    email_verification_token_entity::ActiveModel {
        email: Set("amina@moroni.km".to_string()),
        token: Set("JETONPERIME".to_string()),
        expires_at: Set(Utc::now() - Duration::hours(1)),
        used: Set(false),
        created_at: Set(Utc::now() - Duration::hours(25)),
        ..Default::default()
    }
    .insert(&db)
    .await
    .expect("insert stale token");

    let err = service
        .confirm_email("JETONPERIME")
        .await
        .expect_err("expired token rejected");
    assert!(err.to_string().contains("a expiré"));
}

#[tokio::test]
async fn test_password_reset_for_each_account_type() {
    let db = setup().await;
    let service = UserService::new(db.clone());
    service
        .create_user(new_user("amina@moroni.km"))
        .await
        .expect("create user");
    seed_merchant(&db, "boutique@moroni.km").await;
    seed_raw_employee(&db, "irene@douka-km.com", "admin").await;

    // 顾客账号
    let token = service
        .issue_password_reset_token("amina@moroni.km", "user")
        .await
        .expect("issue reset token");
    service
        .reset_password(&token.token, "nouveau123")
        .await
        .expect("reset user password");
    let user = service
        .find_by_email("amina@moroni.km")
        .await
        .expect("find user")
        .expect("user exists");
    assert!(verify_password("nouveau123", &user.password_hash).expect("verify"));

    // 商家账号
    let token = service
        .issue_password_reset_token("boutique@moroni.km", "merchant")
        .await
        .expect("issue merchant reset");
    service
        .reset_password(&token.token, "boutique456")
        .await
        .expect("reset merchant password");
    let merchant = merchant_entity::Entity::find()
        .filter(merchant_entity::Column::Email.eq("boutique@moroni.km"))
        .one(&db)
        .await
        .expect("find merchant")
        .expect("merchant exists");
    assert!(verify_password("boutique456", &merchant.password_hash).expect("verify"));

    // 后台账号
    let token = service
        .issue_password_reset_token("irene@douka-km.com", "admin")
        .await
        .expect("issue admin reset");
    service
        .reset_password(&token.token, "interne789")
        .await
        .expect("reset admin password");
    let employee = employee_entity::Entity::find()
        .filter(employee_entity::Column::Email.eq("irene@douka-km.com"))
        .one(&db)
        .await
        .expect("find employee")
        .expect("employee exists");
    assert!(verify_password("interne789", &employee.password_hash).expect("verify"));
}

#[tokio::test]
async fn test_password_reset_guards() {
    let db = setup().await;
    let service = UserService::new(db.clone());
    service
        .create_user(new_user("amina@moroni.km"))
        .await
        .expect("create user");

    let err = service
        .issue_password_reset_token("amina@moroni.km", "visiteur")
        .await
        .expect_err("unknown account type rejected");
    assert!(err.to_string().contains("Invalid reset user type"));

    let err = service
        .issue_password_reset_token("inconnu@moroni.km", "user")
        .await
        .expect_err("unknown account rejected");
    assert!(err.to_string().contains("Compte non trouvé"));

    let err = service
        .reset_password("JETON-INCONNU", "nouveau123")
        .await
        .expect_err("unknown token rejected");
    assert!(matches!(err, AppError::NotFound(_)));

    // 令牌单次有效
    let token = service
        .issue_password_reset_token("amina@moroni.km", "user")
        .await
        .expect("issue reset token");
    service
        .reset_password(&token.token, "nouveau123")
        .await
        .expect("first reset");
    let err = service
        .reset_password(&token.token, "autre456")
        .await
        .expect_err("token reuse rejected");
    assert!(err.to_string().contains("déjà été utilisé"));
}

#[tokio::test]
async fn test_employee_creation_guards() {
    let db = setup().await;
    let service = EmployeeService::new(db.clone());

    let livreur = service
        .create_employee(new_employee("fatima@douka-km.com", "livreur"))
        .await
        .expect("create livreur");
    assert_eq!(livreur.status, "active");
    assert_eq!(livreur.role, "livreur");

    let err = service
        .create_employee(new_employee("fatima@douka-km.com", "livreur"))
        .await
        .expect_err("duplicate email rejected");
    assert!(err.to_string().contains("existe déjà"));

    let err = service
        .create_employee(new_employee("said@douka-km.com", "stagiaire"))
        .await
        .expect_err("unknown role rejected");
    assert!(err.to_string().contains("Rôle invalide"));

    let livreurs = service.find_livreurs().await.expect("list livreurs");
    assert_eq!(livreurs.len(), 1);
    assert_eq!(livreurs[0].email, "fatima@douka-km.com");
}

#[tokio::test]
async fn test_employee_authentication() {
    let db = setup().await;
    let service = EmployeeService::new(db.clone());
    service
        .create_employee(new_employee("fatima@douka-km.com", "admin"))
        .await
        .expect("create employee");

    let logged_in = service
        .authenticate("fatima@douka-km.com", "douka2025")
        .await
        .expect("valid credentials");
    assert!(logged_in.last_login.is_some(), "login refreshes last_login");

    let err = service
        .authenticate("fatima@douka-km.com", "mauvais")
        .await
        .expect_err("wrong password rejected");
    assert!(err.to_string().contains("Email ou mot de passe incorrect"));

    // 停用账号即使密码正确也拒绝
    let employee = service
        .find_by_email("fatima@douka-km.com")
        .await
        .expect("find employee")
        .expect("employee exists");
    let mut active: employee_entity::ActiveModel = employee.into();
    active.status = Set("inactive".to_string());
    active.update(&db).await.expect("deactivate");

    let err = service
        .authenticate("fatima@douka-km.com", "douka2025")
        .await
        .expect_err("deactivated account rejected");
    assert!(err.to_string().contains("Ce compte est désactivé"));
}

#[tokio::test]
async fn test_fix_manager_roles_targets_team_addresses_only() {
    let db = setup().await;
    let service = EmployeeService::new(db.clone());

    seed_raw_employee(&db, "irene@douka-km.com", "manager").await;
    seed_raw_employee(&db, "sala@anjouan.km", "manager").await;
    seed_raw_employee(&db, "chef@douka-km.com", "admin").await;

    let updated = service.fix_manager_roles().await.expect("fix roles");
    assert_eq!(updated.len(), 1);
    assert_eq!(updated[0].email, "irene@douka-km.com");
    assert_eq!(updated[0].role, "admin");

    let outsider = service
        .find_by_email("sala@anjouan.km")
        .await
        .expect("find employee")
        .expect("employee exists");
    assert_eq!(outsider.role, "manager", "non-team managers stay untouched");
}
