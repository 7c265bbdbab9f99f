//! Command-line front end over [`ApiClient`].
//!
//! Every command prints its result as pretty JSON on stdout. Diagnostics go
//! to stderr through `tracing`.

use crate::auth::Registration;
use crate::client::ApiClient;
use crate::config::{ClientConfig, ConfigError, SessionBackend};
use crate::error::ApiError;
use crate::session::{FileSessionStore, KeyringSessionStore, Session, SessionStore, StoreError};
use crate::signal::AuthSignal;
use crate::types::{
    Amount, BudgetItemInput, ChecklistItemInput, ChecklistStatus, EventInput, ExpenseInput,
    NewTeamMember, Role,
};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("session storage: {0}")]
    Store(#[from] StoreError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("failed to encode output: {0}")]
    Output(#[from] serde_json::Error),
    #[error("not signed in; run `plantra login` first")]
    NotSignedIn,
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: i64 },
    #[error("invalid {field}: {value:?}")]
    Validation { field: &'static str, value: String },
}

/// Plantra - event planning dashboard from the terminal.
#[derive(Debug, Parser)]
#[command(name = "plantra")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Log request dispatch and refresh activity.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in and store the session.
    Login {
        email: String,
        #[arg(long, env = "PLANTRA_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create an organization owner account.
    Register {
        email: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        organization: String,
        #[arg(long, env = "PLANTRA_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget the stored session.
    Logout,

    /// Show the signed-in profile.
    Whoami,

    /// Change the display name kept with the session.
    Profile {
        #[arg(long)]
        name: String,
    },

    #[command(subcommand)]
    Events(EventsCommand),

    /// Budget, expense and checklist roll-up for one event.
    Summary { event: i64 },

    #[command(subcommand)]
    Budget(BudgetCommand),

    #[command(subcommand)]
    Expenses(ExpensesCommand),

    #[command(subcommand)]
    Checklist(ChecklistCommand),

    #[command(subcommand)]
    Team(TeamCommand),
}

/// Event commands.
#[derive(Debug, Subcommand)]
pub enum EventsCommand {
    List,
    Create {
        name: String,
        #[arg(long)]
        location: String,
        /// Event date, YYYY-MM-DD.
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        budget: String,
        #[arg(long, default_value_t = 0)]
        attendance: u32,
        #[arg(long)]
        revenue: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// User id of the team lead.
        #[arg(long)]
        team_lead: Option<i64>,
    },
    Delete { id: i64 },
}

/// Budget line commands.
#[derive(Debug, Subcommand)]
pub enum BudgetCommand {
    List { event: i64 },
    Add {
        event: i64,
        name: String,
        #[arg(long)]
        cost: String,
    },
    Delete { id: i64 },
}

/// Expense commands.
#[derive(Debug, Subcommand)]
pub enum ExpensesCommand {
    List { event: i64 },
    Add {
        event: i64,
        name: String,
        #[arg(long)]
        amount: String,
        /// Budget line this expense is paid from.
        #[arg(long)]
        budget_item: Option<i64>,
        #[arg(long)]
        description: Option<String>,
    },
    Delete { id: i64 },
}

/// Checklist commands.
#[derive(Debug, Subcommand)]
pub enum ChecklistCommand {
    List { event: i64 },
    Add {
        event: i64,
        title: String,
        #[arg(long)]
        due: Option<NaiveDate>,
        #[arg(long)]
        assignee: Option<i64>,
    },
    /// Change the status of one item.
    Status {
        event: i64,
        id: i64,
        #[arg(value_enum)]
        status: StatusArg,
    },
    Delete { id: i64 },
}

/// Team commands (account managers only).
#[derive(Debug, Subcommand)]
pub enum TeamCommand {
    List,
    Add {
        email: String,
        #[arg(long)]
        name: String,
        #[arg(long, value_enum)]
        role: RoleArg,
        #[arg(long, env = "PLANTRA_MEMBER_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Remove { id: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    Pending,
    InProgress,
    Completed,
}

impl From<StatusArg> for ChecklistStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Pending => ChecklistStatus::Pending,
            StatusArg::InProgress => ChecklistStatus::InProgress,
            StatusArg::Completed => ChecklistStatus::Completed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RoleArg {
    TeamLead,
    TeamMember,
}

impl From<RoleArg> for Role {
    fn from(arg: RoleArg) -> Self {
        match arg {
            RoleArg::TeamLead => Role::TeamLead,
            RoleArg::TeamMember => Role::TeamMember,
        }
    }
}

pub fn init_tracing(verbose: bool) {
    let default = if verbose {
        "plantra_client=debug"
    } else {
        "plantra_client=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn open_store(config: &ClientConfig) -> Result<Arc<dyn SessionStore>, CliError> {
    if config.session_backend == SessionBackend::Keyring {
        let keyring = KeyringSessionStore::new();
        if keyring.is_available() {
            return Ok(Arc::new(keyring));
        }
        tracing::warn!(
            path = %config.session_file.display(),
            "OS keyring unavailable, falling back to the session file"
        );
    }
    let store = FileSessionStore::open(config.session_file.clone())?;
    tracing::debug!(path = %store.path().display(), "using session file");
    Ok(Arc::new(store))
}

fn amount(field: &'static str, raw: &str) -> Result<Amount, CliError> {
    let value = Amount::new(raw);
    match value.to_f64() {
        Some(v) if v >= 0.0 => Ok(value),
        _ => Err(CliError::Validation {
            field,
            value: raw.to_string(),
        }),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn watch_signals(client: &ApiClient) {
    let mut signals = client.subscribe();
    tokio::spawn(async move {
        while let Ok(signal) = signals.recv().await {
            match signal {
                AuthSignal::Refreshed => tracing::debug!("session refreshed"),
                AuthSignal::LoggedOut { redirect_to } => {
                    tracing::warn!(%redirect_to, "session ended, sign in again");
                }
            }
        }
    });
}

pub async fn run(cli: Cli) -> Result<(), CliError> {
    let config = ClientConfig::from_env()?;
    let store = open_store(&config)?;
    let client = ApiClient::new(config, store)?;
    watch_signals(&client);

    match cli.command {
        Command::Login { email, password } => {
            let session = client.login(&email, &password).await?;
            print_json(&session)
        }
        Command::Register {
            email,
            name,
            organization,
            password,
        } => {
            let account = client
                .register(&Registration {
                    email,
                    name,
                    organization_name: organization,
                    password,
                })
                .await?;
            print_json(&account)
        }
        Command::Logout => {
            client.logout()?;
            Ok(())
        }
        Command::Whoami => match client.session().load()? {
            Some(session) => print_json(&session),
            None => Err(CliError::NotSignedIn),
        },
        Command::Profile { name } => print_json(&rename(&client, &name)?),
        Command::Events(cmd) => run_events(&client, cmd).await,
        Command::Summary { event } => print_json(&client.event_summary(event).await?),
        Command::Budget(cmd) => run_budget(&client, cmd).await,
        Command::Expenses(cmd) => run_expenses(&client, cmd).await,
        Command::Checklist(cmd) => run_checklist(&client, cmd).await,
        Command::Team(cmd) => run_team(&client, cmd).await,
    }
}

fn rename(client: &ApiClient, name: &str) -> Result<Session, CliError> {
    if name.trim().is_empty() {
        return Err(CliError::Validation {
            field: "name",
            value: name.to_string(),
        });
    }
    if client.session().load()?.is_none() {
        return Err(CliError::NotSignedIn);
    }
    client.session().set_name(name)?;
    client.session().load()?.ok_or(CliError::NotSignedIn)
}

async fn run_events(client: &ApiClient, cmd: EventsCommand) -> Result<(), CliError> {
    match cmd {
        EventsCommand::List => print_json(&client.list_events().await?),
        EventsCommand::Create {
            name,
            location,
            date,
            budget,
            attendance,
            revenue,
            description,
            team_lead,
        } => {
            let input = EventInput {
                name,
                description,
                location,
                event_date: date,
                expected_budget: amount("budget", &budget)?,
                actual_budget: None,
                expected_attendance: attendance,
                expected_revenue: revenue.map(|r| amount("revenue", &r)).transpose()?,
                status: None,
                team_lead,
            };
            print_json(&client.create_event(&input).await?)
        }
        EventsCommand::Delete { id } => Ok(client.delete_event(id).await?),
    }
}

async fn run_budget(client: &ApiClient, cmd: BudgetCommand) -> Result<(), CliError> {
    match cmd {
        BudgetCommand::List { event } => print_json(&client.list_budget_items(event).await?),
        BudgetCommand::Add { event, name, cost } => {
            let input = BudgetItemInput {
                name,
                estimated_cost: amount("cost", &cost)?,
                actual_cost: None,
                status: None,
            };
            print_json(&client.create_budget_item(event, &input).await?)
        }
        BudgetCommand::Delete { id } => Ok(client.delete_budget_item(id).await?),
    }
}

async fn run_expenses(client: &ApiClient, cmd: ExpensesCommand) -> Result<(), CliError> {
    match cmd {
        ExpensesCommand::List { event } => print_json(&client.list_expenses(event).await?),
        ExpensesCommand::Add {
            event,
            name,
            amount: raw,
            budget_item,
            description,
        } => {
            let input = ExpenseInput {
                name,
                amount: amount("amount", &raw)?,
                description,
                budget_item,
            };
            print_json(&client.create_expense(event, &input).await?)
        }
        ExpensesCommand::Delete { id } => Ok(client.delete_expense(id).await?),
    }
}

async fn run_checklist(client: &ApiClient, cmd: ChecklistCommand) -> Result<(), CliError> {
    match cmd {
        ChecklistCommand::List { event } => print_json(&client.list_checklist_items(event).await?),
        ChecklistCommand::Add {
            event,
            title,
            due,
            assignee,
        } => {
            let input = ChecklistItemInput {
                title,
                description: None,
                assigned_to: assignee,
                due_date: due,
                status: None,
            };
            print_json(&client.create_checklist_item(event, &input).await?)
        }
        ChecklistCommand::Status { event, id, status } => {
            let items = client.list_checklist_items(event).await?;
            let item = items
                .iter()
                .find(|item| item.id == id)
                .ok_or(CliError::NotFound {
                    kind: "checklist item",
                    id,
                })?;
            print_json(&client.set_checklist_status(item, status.into()).await?)
        }
        ChecklistCommand::Delete { id } => Ok(client.delete_checklist_item(id).await?),
    }
}

async fn run_team(client: &ApiClient, cmd: TeamCommand) -> Result<(), CliError> {
    match cmd {
        TeamCommand::List => print_json(&client.list_team().await?),
        TeamCommand::Add {
            email,
            name,
            role,
            password,
        } => {
            let member = NewTeamMember {
                email,
                name,
                password,
                role: role.into(),
            };
            print_json(&client.create_team_member(&member).await?)
        }
        TeamCommand::Remove { id } => Ok(client.delete_team_member(id).await?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::keys::{KEY_ACCESS_TOKEN, KEY_NAME};
    use crate::session::MemorySessionStore;
    use crate::testing::client_for;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_checklist_status() {
        let cli = Cli::try_parse_from(["plantra", "checklist", "status", "3", "11", "in-progress"])
            .unwrap();
        match cli.command {
            Command::Checklist(ChecklistCommand::Status { event, id, status }) => {
                assert_eq!((event, id), (3, 11));
                assert_eq!(ChecklistStatus::from(status), ChecklistStatus::InProgress);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn team_add_cannot_request_account_manager() {
        let err = Cli::try_parse_from([
            "plantra",
            "team",
            "add",
            "x@acme.test",
            "--name",
            "X",
            "--role",
            "account-manager",
            "--password",
            "pw",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }

    #[test]
    fn event_dates_are_parsed() {
        let cli = Cli::try_parse_from([
            "plantra", "events", "create", "Gala", "--location", "Hall", "--date", "2026-04-18",
            "--budget", "15000",
        ])
        .unwrap();
        match cli.command {
            Command::Events(EventsCommand::Create { date, attendance, .. }) => {
                assert_eq!(date, NaiveDate::from_ymd_opt(2026, 4, 18).unwrap());
                assert_eq!(attendance, 0);
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert!(Cli::try_parse_from([
            "plantra", "events", "create", "Gala", "--location", "Hall", "--date", "18/04/2026",
            "--budget", "15000",
        ])
        .is_err());
    }

    #[test]
    fn rename_requires_a_session() {
        let store = Arc::new(MemorySessionStore::with_values([(KEY_NAME, "Ada")]));
        let client = client_for("http://127.0.0.1:9/", store);
        assert!(matches!(
            rename(&client, "Grace"),
            Err(CliError::NotSignedIn)
        ));
    }

    #[test]
    fn rename_updates_the_stored_profile() {
        let store = Arc::new(MemorySessionStore::with_values([
            (KEY_ACCESS_TOKEN, "tok1"),
            (KEY_NAME, "Ada"),
        ]));
        let client = client_for("http://127.0.0.1:9/", store.clone());

        let session = rename(&client, " Ada Lovelace ").unwrap();

        assert_eq!(session.profile.name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(store.get(KEY_NAME).unwrap().as_deref(), Some("Ada Lovelace"));
        assert!(matches!(
            rename(&client, "  "),
            Err(CliError::Validation { field: "name", .. })
        ));
    }

    #[test]
    fn file_backend_opens_the_configured_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ClientConfig::new("http://127.0.0.1:9/").unwrap();
        config.session_file = dir.path().join("session.json");

        let store = open_store(&config).unwrap();
        store.set(KEY_ACCESS_TOKEN, "tok1").unwrap();

        assert!(config.session_file.exists());
    }

    #[test]
    fn amounts_must_be_non_negative_numbers() {
        assert_eq!(amount("cost", " 250.50 ").unwrap().as_str(), "250.50");
        assert!(matches!(
            amount("cost", "-1"),
            Err(CliError::Validation { field: "cost", .. })
        ));
        assert!(amount("cost", "lots").is_err());
    }
}
