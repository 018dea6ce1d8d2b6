//! Identity command line - user administration, sign-in/out and migrations
//! in one process.

use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, error};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use auth_service_lib::config::AuthServiceConfig;
use auth_service_lib::{AuthService, Authenticator, JwtIssuer};
use common::{AppError, AppResult, PaginationParams};
use domain::{
    AddUserModel, Credentials, Role, Roles, UpdateUserModel, UserStatus, DEFAULT_PAGE_NUMBER,
    DEFAULT_PAGE_SIZE,
};
use user_service_lib::config::UserServiceConfig;
use user_service_lib::infra::Database;
use user_service_lib::repository::{Persistence, UnitOfWork};
use user_service_lib::service::{AuditLog, UserLogManager, UserManager, UserService};

#[derive(Parser)]
#[command(name = "identity")]
#[command(about = "User administration and authentication")]
struct Cli {
    /// Force debug logging regardless of RUST_LOG
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Verify credentials and print a token
    SignIn {
        #[arg(long)]
        login: String,
        #[arg(long, env = "IDENTITY_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Record a logout
    SignOut { user_id: i64 },
    /// Show the authentication events of a user
    Logs { user_id: i64 },
}

#[derive(Subcommand, Clone, Copy)]
enum MigrateAction {
    /// Run pending migrations
    Up,
    /// Rollback last migration
    Down,
    /// Show migration status
    Status,
    /// Reset database and run all migrations
    Fresh,
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a user
    Add {
        #[command(flatten)]
        profile: Profile,
        #[arg(long)]
        login: String,
        #[arg(long, env = "IDENTITY_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Replace a user's profile, roles and status
    Update {
        user_id: i64,
        #[command(flatten)]
        profile: Profile,
        #[arg(long, default_value = "active")]
        status: UserStatus,
    },
    /// Delete a user
    Delete { user_id: i64 },
    /// List users, optionally one page at a time
    List {
        #[arg(long)]
        page: Option<u64>,
        #[arg(long)]
        per_page: Option<u64>,
    },
    /// Show one user
    Show { user_id: i64 },
}

#[derive(Args)]
struct Profile {
    #[arg(long)]
    name: String,
    #[arg(long)]
    surname: String,
    #[arg(long)]
    email: String,
    /// Repeat for several roles
    #[arg(long = "role", default_value = "user")]
    roles: Vec<Role>,
}

impl Profile {
    fn roles(&self) -> Roles {
        self.roles.iter().copied().collect()
    }
}

/// Everything a command needs, wired over one database pool.
struct Services {
    users: UserManager,
    audit: Arc<dyn AuditLog>,
    auth: Authenticator,
}

impl Services {
    async fn connect() -> AppResult<Self> {
        let user_config = UserServiceConfig::from_env()?;
        let auth_config = AuthServiceConfig::from_env()?;
        debug!(?user_config, ?auth_config, "Loaded configuration");

        let db = Database::connect(&user_config.database).await?;
        let uow = Arc::new(Persistence::new(db.get_connection()));
        let hasher = user_config.hashing.build_hasher()?;
        let tokens = Arc::new(JwtIssuer::new(&auth_config.jwt)?);

        let audit: Arc<dyn AuditLog> = Arc::new(UserLogManager::new(uow.clone()));
        let users = UserManager::new(uow.clone(), hasher.clone());
        let auth = Authenticator::new(uow.users(), audit.clone(), tokens, hasher);

        Ok(Self { users, audit, auth })
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn print_json<T: Serialize>(value: &T) -> AppResult<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::internal(format!("Output encoding failed: {}", e)))?;
    println!("{}", json);
    Ok(())
}

async fn migrate(action: MigrateAction) -> AppResult<()> {
    let config = UserServiceConfig::from_env()?;
    let action = match action {
        MigrateAction::Up => user_service_lib::MigrateAction::Up,
        MigrateAction::Down => user_service_lib::MigrateAction::Down,
        MigrateAction::Status => user_service_lib::MigrateAction::Status,
        MigrateAction::Fresh => user_service_lib::MigrateAction::Fresh,
    };
    let status = user_service_lib::run_migrations(&config, action).await?;
    let rows: Vec<_> = status
        .into_iter()
        .map(|(name, applied)| serde_json::json!({ "migration": name, "applied": applied }))
        .collect();
    print_json(&rows)
}

async fn manage_users(services: &Services, action: UserAction) -> AppResult<()> {
    match action {
        UserAction::Add {
            profile,
            login,
            password,
        } => {
            let roles = profile.roles();
            let model = AddUserModel::new(
                profile.name,
                profile.surname,
                profile.email,
                login,
                password,
            )
            .with_roles(roles);
            let user_id = services.users.add(model).await?;
            print_json(&serde_json::json!({ "user_id": user_id }))
        }
        UserAction::Update {
            user_id,
            profile,
            status,
        } => {
            let roles = profile.roles();
            let model = UpdateUserModel {
                user_id,
                name: profile.name,
                surname: profile.surname,
                email: profile.email,
                roles,
                status,
            };
            services.users.update(model).await
        }
        UserAction::Delete { user_id } => services.users.delete(user_id).await,
        UserAction::List { page, per_page } => {
            if page.is_none() && per_page.is_none() {
                print_json(&services.users.list().await?)
            } else {
                let params = PaginationParams::new(
                    page.unwrap_or(DEFAULT_PAGE_NUMBER),
                    per_page.unwrap_or(DEFAULT_PAGE_SIZE),
                );
                print_json(&services.users.list_paged(params).await?)
            }
        }
        UserAction::Show { user_id } => print_json(&services.users.select(user_id).await?),
    }
}

async fn run(command: Commands) -> AppResult<()> {
    match command {
        Commands::Migrate { action } => migrate(action).await,
        Commands::User { action } => manage_users(&Services::connect().await?, action).await,
        Commands::SignIn { login, password } => {
            let services = Services::connect().await?;
            let token = services
                .auth
                .sign_in(Credentials::new(login, password))
                .await?;
            print_json(&serde_json::json!({ "token": token }))
        }
        Commands::SignOut { user_id } => Services::connect().await?.auth.sign_out(user_id).await,
        Commands::Logs { user_id } => {
            let services = Services::connect().await?;
            print_json(&services.audit.list(user_id).await?)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(code = e.code(), "{}", e.user_message());
            ExitCode::FAILURE
        }
    }
}
