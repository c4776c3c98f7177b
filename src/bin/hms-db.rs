//! Database utility: create tables, seed departments, bootstrap admins.
//!
//! The only path by which an administrator identity comes into being.

use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use rusqlite::Connection;

use hms_lib::accounts::{self, AccountError, NewAdmin};
use hms_lib::config::{self, AppConfig};
use hms_lib::crypto::MIN_PASSWORD_LENGTH;
use hms_lib::db::{self, DatabaseError};
use hms_lib::seed;

#[derive(Parser)]
#[command(name = "hms-db")]
#[command(about = "Hospital management database utility", version)]
struct Cli {
    /// Database file (defaults to the configured data directory)
    #[arg(long, global = true, env = config::ENV_DATABASE)]
    database: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create tables, seed default departments, then create an admin
    Init {
        #[command(flatten)]
        admin: AdminArgs,
    },
    /// Create an administrator account
    Admin {
        #[command(flatten)]
        admin: AdminArgs,
        /// Create even if another administrator exists
        #[arg(long)]
        allow_multiple: bool,
    },
    /// Drop all tables, recreate them and reseed departments
    Reset {
        /// Confirm destruction of all data
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Args, Debug, Clone)]
struct AdminArgs {
    #[arg(long, default_value = "admin")]
    username: String,
    #[arg(long, default_value = "admin@example.com")]
    email: String,
    #[arg(long, default_value = "Admin")]
    full_name: String,
    /// Password; prompted without echo when absent
    #[arg(long, env = "HMS_ADMIN_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

#[derive(Debug, thiserror::Error)]
enum ToolError {
    #[error("{0}")]
    Config(#[from] config::ConfigError),
    #[error("{0}")]
    Database(#[from] DatabaseError),
    #[error("{0}")]
    Account(#[from] AccountError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Passwords do not match.")]
    PasswordMismatch,
    #[error("An administrator already exists. Pass --allow-multiple to add another.")]
    AdminExists,
    #[error("Refusing to reset without --yes.")]
    ResetNotConfirmed,
}

fn main() {
    hms_lib::init_tracing();
    let cli = Cli::parse();
    if let Err(e) = execute(cli) {
        eprintln!("hms-db: {e}");
        std::process::exit(1);
    }
}

fn execute(cli: Cli) -> Result<(), ToolError> {
    let path = match cli.database {
        Some(path) => path,
        None => AppConfig::from_env()?.database_path,
    };

    match cli.command {
        Commands::Init { admin } => {
            let conn = db::open_database(&path)?;
            report_tables(&conn, &path)?;
            let created = seed::seed_default_departments(&conn)?;
            println!("Seeded {created} department(s).");
            if accounts::admin_exists(&conn)? {
                println!("An administrator already exists; skipping admin creation.");
                return Ok(());
            }
            let form = admin_form(&admin, read_password)?;
            create_admin(&conn, &form, false)
        }
        Commands::Admin {
            admin,
            allow_multiple,
        } => {
            let conn = db::open_database(&path)?;
            let form = admin_form(&admin, read_password)?;
            create_admin(&conn, &form, allow_multiple)
        }
        Commands::Reset { yes } => {
            if !yes {
                return Err(ToolError::ResetNotConfirmed);
            }
            let conn = db::open_database(&path)?;
            reset(&conn)?;
            report_tables(&conn, &path)?;
            Ok(())
        }
    }
}

fn report_tables(conn: &Connection, path: &Path) -> Result<(), ToolError> {
    println!(
        "Database ready at {} ({} tables).",
        path.display(),
        db::count_tables(conn)?
    );
    Ok(())
}

/// Resolve the admin form, asking for the password twice when needed.
fn admin_form(
    args: &AdminArgs,
    mut ask: impl FnMut(&str) -> io::Result<String>,
) -> Result<NewAdmin, ToolError> {
    let password = match &args.password {
        Some(password) => password.clone(),
        None => {
            let first = ask(&format!(
                "Admin password (min {MIN_PASSWORD_LENGTH} characters): "
            ))?;
            let second = ask("Confirm password: ")?;
            if first != second {
                return Err(ToolError::PasswordMismatch);
            }
            first
        }
    };
    Ok(NewAdmin {
        username: args.username.clone(),
        email: args.email.clone(),
        full_name: args.full_name.clone(),
        password,
    })
}

/// Terminal input is read with echo off; piped input line by line.
fn read_password(label: &str) -> io::Result<String> {
    if io::stdin().is_terminal() {
        rpassword::prompt_password(label)
    } else {
        prompt(&mut io::stdin().lock(), &mut io::stderr(), label)
    }
}

fn prompt(input: &mut impl BufRead, output: &mut impl Write, label: &str) -> io::Result<String> {
    output.write_all(label.as_bytes())?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn create_admin(conn: &Connection, form: &NewAdmin, allow_multiple: bool) -> Result<(), ToolError> {
    if !allow_multiple && accounts::admin_exists(conn)? {
        return Err(ToolError::AdminExists);
    }
    let user = accounts::create_admin(conn, form)?;
    println!("Administrator '{}' created.", user.username);
    Ok(())
}

fn reset(conn: &Connection) -> Result<(), ToolError> {
    db::reset_database(conn)?;
    let created = seed::seed_default_departments(conn)?;
    println!("All tables dropped and recreated; seeded {created} department(s).");
    Ok(())
}
