use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use notifydesk::config::{ClientConfig, ConfigError};
use notifydesk::net::api::ApiClient;
use notifydesk::net::error::ApiError;
use notifydesk::net::transport::TransportError;
use notifydesk::net::types::{
    LoginRequest, Notification, NotificationLog, NotificationStatus, NotificationType, SignupRequest, User,
};
use notifydesk::state::auth::AuthService;
use notifydesk::state::session::SessionStore;
use notifydesk::state::storage::FileStorage;
use notifydesk::util::auth::{RouteGuard, route_guard};
use notifydesk::util::display::{badge, format_timestamp, status_badge, type_badge};
use notifydesk::util::forms::{NotificationEdit, NotificationForm};
use notifydesk::util::schedule::{SendMode, build_send_request, parse_local_datetime};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[cfg(test)]
#[path = "main_test.rs"]
mod main_test;

const LOGIN_HINT: &str = "run `notifydesk login` to sign in";

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("HTTP client setup failed: {0}")]
    Transport(#[from] TransportError),
    #[error("{}", .0.user_message())]
    Api(#[from] ApiError),
    #[error("{}", .0.user_message())]
    Rejected(ApiError),
    #[error("not logged in; run `notifydesk login` to sign in")]
    NotLoggedIn,
    #[error("session is still loading")]
    SessionLoading,
    #[error("invalid JSON output: {0}")]
    Json(#[from] serde_json::Error),
    #[error("I/O failed: {0}")]
    Io(#[from] io::Error),
}

#[derive(Parser, Debug)]
#[command(name = "notifydesk", about = "Create, send, and schedule notifications")]
struct Cli {
    /// Overrides `NOTIFYDESK_API_BASE_URL`.
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Overrides `NOTIFYDESK_SESSION_PATH`.
    #[arg(long, global = true)]
    session_path: Option<PathBuf>,

    /// Print raw JSON instead of tables.
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "NOTIFYDESK_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Signup(SignupArgs),
    Logout,
    Whoami,
    Notification(NotificationCommand),
    Logs {
        #[arg(long)]
        status: Option<NotificationStatus>,
    },
}

#[derive(Args, Debug)]
struct SignupArgs {
    #[arg(long)]
    email: String,
    #[arg(long, env = "NOTIFYDESK_PASSWORD", hide_env_values = true)]
    password: String,
    #[arg(long)]
    fname: String,
    #[arg(long)]
    lname: String,
    #[arg(long, default_value = "")]
    designation: String,
}

#[derive(Args, Debug)]
struct NotificationCommand {
    #[command(subcommand)]
    command: NotificationSubcommand,
}

#[derive(Subcommand, Debug)]
enum NotificationSubcommand {
    List,
    Get {
        id: String,
    },
    Create {
        #[arg(long = "type", default_value = "email")]
        kind: NotificationType,
        /// Comma-separated recipients.
        #[arg(long)]
        recipients: String,
        #[arg(long)]
        subject: String,
        #[arg(long)]
        message: String,
    },
    Update {
        id: String,
        #[arg(long = "type")]
        kind: Option<NotificationType>,
        #[arg(long)]
        recipients: Option<String>,
        #[arg(long)]
        subject: Option<String>,
        #[arg(long)]
        message: Option<String>,
    },
    Delete {
        id: String,
        /// Skip the confirmation prompt.
        #[arg(long, short = 'y', default_value_t = false)]
        yes: bool,
    },
    Send {
        id: String,
        /// Local date/time to schedule at (`YYYY-MM-DDTHH:MM`); sends now when absent.
        #[arg(long)]
        at: Option<String>,
    },
}

impl Command {
    /// Login and signup report their own failures; a 401 there is a rejected
    /// credential, not an expired session.
    fn is_auth_attempt(&self) -> bool {
        matches!(self, Self::Login { .. } | Self::Signup(_))
    }
}

struct App {
    auth: AuthService,
    json: bool,
    color: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        // Already reported by the auth-expired listener.
        Err(CliError::Api(e)) if e.is_session_expiry() => ExitCode::from(2),
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let app = build_app(&cli)?;
    match cli.command {
        Command::Login { email, password } => {
            let user = app
                .auth
                .login(&LoginRequest { email, password })
                .await
                .map_err(CliError::Rejected)?;
            println!("Logged in as {}", describe_user(&user));
            Ok(())
        }
        Command::Signup(args) => {
            let profile = SignupRequest {
                email: args.email,
                password: args.password,
                fname: args.fname,
                lname: args.lname,
                designation: args.designation,
            };
            let user = app.auth.signup(&profile).await.map_err(CliError::Rejected)?;
            println!("Account created; logged in as {}", describe_user(&user));
            Ok(())
        }
        Command::Logout => {
            app.auth.logout()?;
            println!("Logged out");
            Ok(())
        }
        Command::Whoami => {
            app.require_login()?;
            let user = app.auth.current_user().ok_or(CliError::NotLoggedIn)?;
            if app.json {
                return print_json(&user);
            }
            println!("{}", describe_user(&user));
            if !user.designation.is_empty() {
                println!("designation: {}", user.designation);
            }
            println!("id: {}", user.id);
            Ok(())
        }
        Command::Notification(command) => {
            app.require_login()?;
            run_notification(&app, command.command).await
        }
        Command::Logs { status } => {
            app.require_login()?;
            let logs = app.auth.api().list_logs(status).await?;
            if app.json {
                return print_json(&logs);
            }
            print!("{}", render_logs(&logs, app.color));
            Ok(())
        }
    }
}

fn build_app(cli: &Cli) -> Result<App, CliError> {
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = &cli.base_url {
        config = config.with_base_url(url)?;
    }
    if let Some(path) = &cli.session_path {
        config.session_path.clone_from(path);
    }
    tracing::debug!(base_url = %config.api_base_url, session = %config.session_path.display(), "client configured");

    let session = Arc::new(SessionStore::new(FileStorage::new(&config.session_path)));
    let api = Arc::new(ApiClient::from_config(&config, session)?);
    if !cli.command.is_auth_attempt() {
        api.on_auth_expired(|| eprintln!("session expired; {LOGIN_HINT}"));
    }

    let auth = AuthService::new(api);
    auth.init();
    let color = io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none();
    Ok(App { auth, json: cli.json, color })
}

impl App {
    fn require_login(&self) -> Result<(), CliError> {
        match route_guard(&self.auth.phase()) {
            RouteGuard::Render => Ok(()),
            RouteGuard::RedirectToLogin => Err(CliError::NotLoggedIn),
            RouteGuard::Wait => Err(CliError::SessionLoading),
        }
    }
}

async fn run_notification(app: &App, command: NotificationSubcommand) -> Result<(), CliError> {
    let api = app.auth.api();
    match command {
        NotificationSubcommand::List => {
            let notifications = api.list_notifications().await?;
            if app.json {
                return print_json(&notifications);
            }
            print!("{}", render_notifications(&notifications, app.color));
            Ok(())
        }
        NotificationSubcommand::Get { id } => {
            let notification = api.get_notification(&id).await?;
            if app.json {
                return print_json(&notification);
            }
            print!("{}", render_notification_detail(&notification, app.color));
            Ok(())
        }
        NotificationSubcommand::Create { kind, recipients, subject, message } => {
            let request = NotificationForm { kind, recipients, subject, message }.into_create_request()?;
            let created = api.create_notification(&request).await?;
            if app.json {
                return print_json(&created);
            }
            println!("Created notification {}", created.id);
            Ok(())
        }
        NotificationSubcommand::Update { id, kind, recipients, subject, message } => {
            let request = NotificationEdit { kind, recipients, subject, message }.into_update_request()?;
            let updated = api.update_notification(&id, &request).await?;
            if app.json {
                return print_json(&updated);
            }
            println!("Updated notification {}", updated.id);
            Ok(())
        }
        NotificationSubcommand::Delete { id, yes } => {
            if !yes && !confirm(&format!("Delete notification {id}?"))? {
                println!("Cancelled");
                return Ok(());
            }
            api.delete_notification(&id).await?;
            println!("Deleted notification {id}");
            Ok(())
        }
        NotificationSubcommand::Send { id, at } => {
            let mode = match at.as_deref() {
                Some(raw) => SendMode::ScheduledAt(parse_local_datetime(raw)?),
                None => SendMode::Immediately,
            };
            let request = build_send_request(&id, mode)?;
            let log = api.send_notification(&request).await?;
            if app.json {
                return print_json(&log);
            }
            match mode {
                SendMode::Immediately => println!("Notification sent ({})", log.status),
                SendMode::ScheduledAt(local) => {
                    println!("Notification scheduled for {} ({})", local.format("%Y-%m-%d %H:%M"), log.status);
                }
            }
            Ok(())
        }
    }
}

fn confirm(prompt: &str) -> Result<bool, CliError> {
    eprint!("{prompt} [y/N] ");
    io::stderr().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(is_affirmative(&answer))
}

fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn describe_user(user: &User) -> String {
    format!("{} <{}>", user.display_name(), user.email)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

fn render_notifications(notifications: &[Notification], color: bool) -> String {
    if notifications.is_empty() {
        return "No notifications yet. Create one with `notifydesk notification create`.\n".to_owned();
    }
    let mut out = String::new();
    for n in notifications {
        out.push_str(&format!(
            "{}  {:<5}  {}\n    to: {}\n    created: {}\n",
            n.id,
            badge(n.kind.as_str(), type_badge(n.kind), color),
            n.subject,
            n.recipients.join(", "),
            format_timestamp(n.created_at.as_ref()),
        ));
    }
    out
}

fn render_notification_detail(n: &Notification, color: bool) -> String {
    format!(
        "{} {}\nsubject: {}\nto: {}\ncreated: {}\nupdated: {}\n\n{}\n",
        badge(n.kind.as_str(), type_badge(n.kind), color),
        n.id,
        n.subject,
        n.recipients.join(", "),
        format_timestamp(n.created_at.as_ref()),
        format_timestamp(n.updated_at.as_ref()),
        n.message,
    )
}

fn render_logs(logs: &[NotificationLog], color: bool) -> String {
    if logs.is_empty() {
        return "No logs found.\n".to_owned();
    }
    let mut out = String::new();
    for log in logs {
        out.push_str(&format!(
            "{}  {}  notification {}\n",
            log.id,
            badge(log.status.as_str(), status_badge(log.status), color),
            log.notification_id,
        ));
        if log.scheduled_at.is_some() {
            out.push_str(&format!("    scheduled: {}\n", format_timestamp(log.scheduled_at.as_ref())));
        }
        if log.sent_at.is_some() {
            out.push_str(&format!("    sent: {}\n", format_timestamp(log.sent_at.as_ref())));
        }
        if let Some(message_id) = &log.message_id {
            out.push_str(&format!("    message id: {message_id}\n"));
        }
        if let Some(error) = &log.error_message {
            out.push_str(&format!("    error: {error}\n"));
        }
        out.push_str(&format!("    created: {}\n", format_timestamp(log.created_at.as_ref())));
    }
    out
}
