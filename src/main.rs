use chrono::Local;
use clap::{ArgAction, Parser, Subcommand};
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter
use std::path::{Path, PathBuf};

use douka_backend::{
    config::Config,
    database::{
        backup_database, create_pool, list_backups, restore_database, run_migrations,
        write_postgres_env, write_sqlite_env,
    },
    external::Mailer,
    models::AssignmentLedger,
    services::{DeliveryService, EmployeeService, OrderService},
    utils::format_kmf,
};
use migration::SchemaManager;

#[derive(Parser)]
#[command(
    name = "douka-backend",
    about = "Outils d'exploitation de la place de marché DOUKA KM",
    version
)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Répondre oui à toutes les confirmations"
    )]
    yes: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Appliquer les migrations en attente
    Migrate,
    /// Re-jouer les compléments de colonnes connus sur une base existante
    RepairSchema,
    /// Recoller les livreurs des commandes livrées depuis un registre JSON
    BackfillDelivery {
        #[arg(long, help = "Fichier JSON du registre d'affectation")]
        ledger: PathBuf,
    },
    /// Affecter le premier livreur actif aux commandes livrées orphelines
    AssignLivreur,
    /// Couverture des instantanés de livraison sur les commandes livrées
    DeliveryReport,
    /// Lister les dernières commandes
    Orders {
        #[arg(long, default_value_t = 20)]
        limit: u64,
    },
    /// Sauvegarder la base SQLite
    Backup,
    /// Lister les sauvegardes disponibles
    Backups,
    /// Restaurer une sauvegarde SQLite
    Restore { name: String },
    /// Basculer .env vers SQLite local
    UseSqlite,
    /// Basculer .env vers PostgreSQL
    UsePostgres { url: String },
    /// Vérifier les rôles des employés (--fix pour corriger)
    CheckRoles {
        #[arg(long, action = ArgAction::SetTrue)]
        fix: bool,
    },
    /// Tester la connexion SMTP configurée
    SmtpCheck,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    let cli = Cli::parse();

    let config = match Config::from_toml() {
        Ok(config) => config,
        Err(err) => {
            log::error!("Failed to load configuration: {err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = run(cli, config).await {
        eprintln!("❌ {err}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    match cli.command {
        Commands::Migrate => {
            let pool = create_pool(&config.database).await?;
            run_migrations(&pool).await?;
            println!("✅ Migrations appliquées");
        }
        Commands::RepairSchema => {
            let pool = create_pool(&config.database).await?;
            let manager = SchemaManager::new(&pool);
            let report = migration::patch::repair_known_columns(&manager).await?;
            for column in &report.added {
                println!("✓ Colonne {column} ajoutée");
            }
            println!(
                "✅ Vérification terminée: {} ajoutée(s), {} déjà présente(s)",
                report.added.len(),
                report.already_present.len()
            );
            for column in &report.failed {
                println!("⚠️ Colonne {column} non appliquée (voir les logs)");
            }
        }
        Commands::BackfillDelivery { ledger } => {
            let ledger = AssignmentLedger::from_json_file(&ledger)?;
            if ledger.is_empty() {
                println!("⚠️ Registre d'affectation vide, rien à recoller");
                return Ok(());
            }
            let pool = create_pool(&config.database).await?;
            let report = DeliveryService::new(pool).backfill_delivered(&ledger).await?;
            println!(
                "✅ {} commandes admin et {} commandes marchand mises à jour",
                report.admin_updated, report.merchant_updated
            );
            println!("   {} déjà affectées (ignorées)", report.already_assigned);
            for email in &report.missing_livreurs {
                println!("⚠️ Livreur non trouvé: {email}");
            }
            if !report.unmatched.is_empty() {
                println!(
                    "⚠️ Sans correspondance dans le registre: {:?}",
                    report.unmatched
                );
            }
        }
        Commands::AssignLivreur => {
            if !confirm(
                "Affecter le premier livreur actif à toutes les commandes livrées orphelines ?",
                cli.yes,
            ) {
                println!("Opération annulée");
                return Ok(());
            }
            let pool = create_pool(&config.database).await?;
            let outcome = DeliveryService::new(pool).assign_default_livreur().await?;
            match outcome.livreur {
                None => println!("✅ Aucune commande orpheline"),
                Some(livreur) => {
                    for (order_id, order_type) in &outcome.orders {
                        println!(
                            "✅ {} Commande {} -> Livreur: {}",
                            order_type.display_fr(),
                            order_id,
                            livreur.full_name()
                        );
                    }
                    println!(
                        "✅ {} commandes affectées à {}",
                        outcome.orders.len(),
                        livreur.email
                    );
                }
            }
        }
        Commands::DeliveryReport => {
            let pool = create_pool(&config.database).await?;
            let report = DeliveryService::new(pool).delivery_report().await?;
            println!("📊 Commandes livrées: {}", report.total_delivered);
            println!(
                "   Admin: {} avec livreur, {} sans livreur",
                report.admin_with_snapshot, report.admin_without_snapshot
            );
            println!(
                "   Marchand: {} avec livreur, {} sans livreur",
                report.merchant_with_snapshot, report.merchant_without_snapshot
            );
            if !report.without_snapshot.is_empty() {
                println!(
                    "⚠️ Sans instantané de livraison: {:?}",
                    report.without_snapshot
                );
            }
        }
        Commands::Orders { limit } => {
            let pool = create_pool(&config.database).await?;
            let orders = OrderService::new(pool).list_recent(limit).await?;
            if orders.is_empty() {
                println!("Aucune commande");
                return Ok(());
            }
            for order in orders {
                println!(
                    "{} | {} | {} KMF | {} | {}",
                    order.order_number,
                    order.status_text,
                    format_kmf(order.total),
                    order.customer_name.as_deref().unwrap_or("-"),
                    order.created_at.format("%d/%m/%Y %H:%M")
                );
            }
        }
        Commands::Backup => {
            let entry = backup_database(&config.database, &config.backup)?;
            println!("✅ Sauvegarde créée: {}", entry.path.display());
            println!("📄 Taille: {} bytes", entry.size);
        }
        Commands::Backups => {
            let entries = list_backups(&config.backup)?;
            if entries.is_empty() {
                println!("📁 Aucune sauvegarde trouvée");
                return Ok(());
            }
            println!("📁 Sauvegardes disponibles:");
            for (i, entry) in entries.iter().enumerate() {
                println!(
                    "  {}. {} ({} bytes, {})",
                    i + 1,
                    entry.name,
                    entry.size,
                    entry.modified.format("%d/%m/%Y %H:%M")
                );
            }
        }
        Commands::Restore { name } => {
            if !confirm(
                &format!("Écraser la base actuelle avec la sauvegarde {name} ?"),
                cli.yes,
            ) {
                println!("Opération annulée");
                return Ok(());
            }
            let target = restore_database(&config.database, &config.backup, &name)?;
            println!("✅ Base restaurée: {}", target.display());
            println!("🔄 Redémarrez l'application pour appliquer les changements");
        }
        Commands::UseSqlite => {
            write_sqlite_env(Path::new("."))?;
            println!("✅ Configuration basculée vers SQLite LOCAL");
            println!("🔄 Redémarrez l'application pour appliquer les changements");
        }
        Commands::UsePostgres { url } => {
            write_postgres_env(Path::new("."), &url)?;
            println!("✅ Configuration basculée vers PostgreSQL");
            println!("🔄 Redémarrez l'application pour appliquer les changements");
            println!("⚠️ ATTENTION: vous travaillez peut-être sur une base de PRODUCTION");
        }
        Commands::CheckRoles { fix } => {
            let pool = create_pool(&config.database).await?;
            let service = EmployeeService::new(pool);
            let employees = service.list_employees().await?;
            println!("=== EMPLOYÉS TROUVÉS ({}) ===", employees.len());
            for employee in &employees {
                println!(
                    "{} | {} | {} | {} | créé {}",
                    employee.email,
                    employee.full_name(),
                    employee.role,
                    employee.status,
                    employee.created_at.format("%d/%m/%Y")
                );
            }
            if fix {
                let updated = service.fix_manager_roles().await?;
                if updated.is_empty() {
                    println!("ℹ️ Aucun employé à mettre à jour");
                } else {
                    println!("✅ {} employés mis à jour:", updated.len());
                    for employee in &updated {
                        println!(
                            "  - {}: rôle changé vers '{}'",
                            employee.email, employee.role
                        );
                    }
                }
            }
        }
        Commands::SmtpCheck => {
            let mailer = Mailer::new(config.email.clone());
            if mailer.test_connection() {
                println!("✅ Connexion SMTP réussie ({})", config.email.provider);
            } else {
                anyhow::bail!("Échec de la connexion SMTP ({})", config.email.provider);
            }
        }
    }
    Ok(())
}

fn confirm(question: &str, assume_yes: bool) -> bool {
    if assume_yes {
        return true;
    }
    print!("{question} (o/N) : ");
    let _ = std::io::stdout().flush();
    let mut answer = String::new();
    if std::io::stdin().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(
        answer.trim().to_lowercase().as_str(),
        "o" | "oui" | "y" | "yes"
    )
}
