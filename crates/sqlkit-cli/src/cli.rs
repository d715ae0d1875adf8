//! sqlkit command line
//!
//! ```text
//! sqlkit query "SELECT * FROM users" --format json
//! sqlkit drop users
//! sqlkit import users.csv --types "VARCHAR(50),INT" --primary-key name
//! ```

mod config;
mod logging;
mod output;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use sqlkit_core::Connection;
use sqlkit_drivers::DriverRegistry;
use sqlkit_services::{
    CsvImportProgress, CsvImportSettings, ImportPlan, ServiceError, TableOptions, TableService,
};

use config::{CliConfig, ConnectionArgs};
use logging::LoggingConfig;
use output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "sqlkit", version, about = "Run queries, drop tables and create tables from CSV files")]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Config file (default: <config dir>/sqlkit/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// File of KEY=value pairs loaded into the environment
    #[arg(long, global = true, default_value = ".env")]
    env_file: PathBuf,

    /// Debug logging for sqlkit crates
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Also write JSON logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a SQL statement and print its result
    Query {
        sql: String,

        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },

    /// Drop a table if it exists
    Drop { table: String },

    /// Create a table from a CSV file and insert its rows
    Import(ImportArgs),
}

#[derive(clap::Args, Debug)]
struct ImportArgs {
    /// CSV file with a header row
    csv: PathBuf,

    /// Column types in CSV column order, e.g. "VARCHAR(50),INT" or repeated values
    #[arg(long, required = true, num_args = 1..)]
    types: Vec<String>,

    /// Do not add the `<table>_id` auto-increment column
    #[arg(long)]
    no_auto_id: bool,

    /// Composite or single primary key columns
    #[arg(long, value_delimiter = ',')]
    primary_key: Vec<String>,

    /// Foreign key as column=table.column (repeatable)
    #[arg(long, value_parser = parse_foreign_key)]
    foreign_key: Vec<(String, String, String)>,

    /// Table name (default: CSV file stem)
    #[arg(long)]
    table: Option<String>,

    /// Field delimiter
    #[arg(long, default_value = ",", value_parser = parse_delimiter)]
    delimiter: u8,

    /// Print the statements without connecting
    #[arg(long)]
    dry_run: bool,
}

impl ImportArgs {
    fn declared_types(&self) -> Vec<String> {
        self.types.iter().flat_map(|t| split_type_list(t)).collect()
    }

    fn table_options(&self) -> TableOptions {
        let mut options = TableOptions::default().with_auto_id(!self.no_auto_id);
        if !self.primary_key.is_empty() {
            options = options.with_primary_key(self.primary_key.iter().cloned());
        }
        for (column, table, referenced) in &self.foreign_key {
            options = options.with_foreign_key(column, table, referenced);
        }
        options
    }

    fn csv_settings(&self) -> CsvImportSettings {
        CsvImportSettings {
            delimiter: self.delimiter,
            table_name: self.table.clone(),
        }
    }
}

/// Split a comma-separated type list, keeping commas inside parentheses
/// (`DECIMAL(10,2)`, `ENUM('a','b')`) with their type.
fn split_type_list(list: &str) -> Vec<String> {
    let mut types = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();

    for c in list.chars() {
        match c {
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => types.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    types.push(current);

    types
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

fn parse_foreign_key(s: &str) -> Result<(String, String, String), String> {
    let (column, target) = s
        .split_once('=')
        .ok_or_else(|| format!("expected column=table.column, got '{s}'"))?;
    let (table, referenced) = target
        .rsplit_once('.')
        .ok_or_else(|| format!("expected column=table.column, got '{s}'"))?;
    if column.is_empty() || table.is_empty() || referenced.is_empty() {
        return Err(format!("expected column=table.column, got '{s}'"));
    }
    Ok((column.to_string(), table.to_string(), referenced.to_string()))
}

fn parse_delimiter(s: &str) -> Result<u8, String> {
    match s {
        "\\t" | "tab" => Ok(b'\t'),
        _ => match s.as_bytes() {
            [b] => Ok(*b),
            _ => Err(format!("delimiter must be a single byte, got '{s}'")),
        },
    }
}

/// A command whose input has been checked and is ready to run against a connection
enum Task<'a> {
    Query { sql: &'a str, format: OutputFormat },
    Drop { table: &'a str },
    Import { plan: ImportPlan, source: &'a Path },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let logging = LoggingConfig {
        verbose: cli.verbose,
        log_file: cli.log_file.clone(),
    };
    let _guard = match logging::init(&logging) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("error: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            exit_code(&err)
        }
    }
}

/// 2 for rejected input, 1 for everything else
fn exit_code(err: &anyhow::Error) -> ExitCode {
    let validation = err
        .downcast_ref::<ServiceError>()
        .is_some_and(ServiceError::is_validation);
    if validation { ExitCode::from(2) } else { ExitCode::FAILURE }
}

async fn run(cli: Cli) -> Result<()> {
    config::load_env_file(&cli.env_file)?;
    let file_config = CliConfig::load_or_default(cli.config.as_deref())?;

    let mut service = TableService::new();
    if let Command::Import(args) = &cli.command {
        service = service
            .with_csv_settings(args.csv_settings())
            .with_progress_callback(Arc::new(|p: CsvImportProgress| {
                tracing::debug!(
                    table = %p.table_name,
                    rows_processed = p.rows_processed,
                    total_rows = p.total_rows,
                    "{}",
                    p.message
                );
            }));
    }

    // Input is validated before credentials are resolved or a driver dials.
    let task = prepare(&service, &cli.command)?;
    if let (Task::Import { plan, .. }, Command::Import(args)) = (&task, &cli.command) {
        if args.dry_run {
            print!("{}", output::render_plan(plan));
            return Ok(());
        }
    }

    let password = config::resolve_password(cli.connection.password.clone());
    let connection_config = file_config.connection_config(&cli.connection, password);
    let connection = DriverRegistry::with_defaults()
        .connect(&connection_config)
        .await
        .map_err(ServiceError::from)?;

    let outcome = execute(&service, connection.clone(), task).await;

    if let Err(err) = connection.close().await {
        tracing::warn!(error = %err, "failed to close connection");
    }
    outcome
}

fn prepare<'a>(service: &TableService, command: &'a Command) -> Result<Task<'a>> {
    match command {
        Command::Query { sql, format } => {
            if sql.trim().is_empty() {
                bail!("no SQL given");
            }
            Ok(Task::Query {
                sql: sql.as_str(),
                format: *format,
            })
        }
        Command::Drop { table } => Ok(Task::Drop {
            table: table.as_str(),
        }),
        Command::Import(args) => {
            let types = args.declared_types();
            let plan = service.plan_csv_import(&args.csv, types.as_slice(), args.table_options())?;
            Ok(Task::Import {
                plan,
                source: args.csv.as_path(),
            })
        }
    }
}

async fn execute(service: &TableService, connection: Arc<dyn Connection>, task: Task<'_>) -> Result<()> {
    match task {
        Task::Query { sql, format } => {
            let result = service.query(connection, sql).await?;
            println!("{}", output::render_query_result(&result, format)?);
        }
        Task::Drop { table } => {
            service.drop_table(connection, table).await?;
            println!("Dropped table {table} (if it existed)");
        }
        Task::Import { plan, source } => {
            let result = service
                .execute_import(connection, &plan)
                .await
                .with_context(|| format!("Import of {} failed", source.display()))?;
            println!("Created table {} with {} rows", result.table_name, result.rows_added);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn type_list_keeps_parenthesized_commas() {
        assert_eq!(
            split_type_list("VARCHAR(50), DECIMAL(10,2),ENUM('a','b'),INT"),
            vec!["VARCHAR(50)", "DECIMAL(10,2)", "ENUM('a','b')", "INT"]
        );
        assert_eq!(split_type_list("INT,"), vec!["INT"]);
    }

    #[test]
    fn foreign_key_flag() {
        assert_eq!(
            parse_foreign_key("user_id=users.id").unwrap(),
            ("user_id".to_string(), "users".to_string(), "id".to_string())
        );
        assert!(parse_foreign_key("user_id").is_err());
        assert!(parse_foreign_key("user_id=users").is_err());
        assert!(parse_foreign_key("=users.id").is_err());
    }

    #[test]
    fn delimiter_flag() {
        assert_eq!(parse_delimiter(";").unwrap(), b';');
        assert_eq!(parse_delimiter("tab").unwrap(), b'\t');
        assert!(parse_delimiter(";;").is_err());
    }

    #[test]
    fn import_flags_build_options() {
        let cli = Cli::parse_from([
            "sqlkit",
            "import",
            "orders.csv",
            "--types",
            "INT,DECIMAL(10,2)",
            "--no-auto-id",
            "--primary-key",
            "order_id",
            "--foreign-key",
            "user_id=users.id",
        ]);
        let Command::Import(args) = cli.command else {
            panic!("expected import");
        };
        assert_eq!(args.declared_types(), vec!["INT", "DECIMAL(10,2)"]);

        let options = args.table_options();
        assert!(!options.auto_id);
        assert_eq!(options.primary_key, Some(vec!["order_id".to_string()]));
        assert_eq!(options.foreign_keys["user_id"].table, "users");
    }

    #[test]
    fn connection_flags_after_subcommand() {
        let cli = Cli::parse_from(["sqlkit", "drop", "users", "--driver", "sqlite", "--database", "shop.db"]);
        assert_eq!(cli.connection.driver.as_deref(), Some("sqlite"));
        assert_eq!(cli.connection.database.as_deref(), Some("shop.db"));
    }

    /// Temp dir holding `people.csv`, an empty config file and no env file
    fn import_fixture(csv: &str) -> (tempfile::TempDir, Vec<String>) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("people.csv"), csv).unwrap();
        std::fs::write(dir.path().join("config.toml"), "").unwrap();
        let path = |name: &str| dir.path().join(name).display().to_string();
        let globals = vec![
            "--config".to_string(),
            path("config.toml"),
            "--env-file".to_string(),
            path("missing.env"),
        ];
        (dir, globals)
    }

    fn cli_from(args: &[&str], globals: &[String]) -> Cli {
        let mut argv: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        argv.extend(globals.iter().cloned());
        Cli::parse_from(argv)
    }

    #[tokio::test]
    async fn invalid_type_is_reported_before_connecting() {
        let (dir, globals) = import_fixture("name\nAlice\n");
        let csv = dir.path().join("people.csv").display().to_string();

        // Reaching the driver would fail with a missing credential instead.
        let cli = cli_from(
            &["sqlkit", "import", &csv, "--types", "FOOBAR", "--host", "203.0.113.9", "--password", ""],
            &globals,
        );
        let err = run(cli).await.unwrap_err();

        let service_err = err.downcast_ref::<ServiceError>().expect("service error");
        assert!(service_err.is_validation(), "unexpected error: {err:#}");
        assert!(err.to_string().contains("FOOBAR"));
        assert_eq!(exit_code(&err), ExitCode::from(2));
    }

    #[tokio::test]
    async fn column_count_mismatch_is_reported_before_connecting() {
        let (dir, globals) = import_fixture("name,age\nAlice,28\n");
        let csv = dir.path().join("people.csv").display().to_string();

        let cli = cli_from(&["sqlkit", "import", &csv, "--types", "TEXT", "--driver", "nosuch"], &globals);
        let err = run(cli).await.unwrap_err();

        assert_eq!(exit_code(&err), ExitCode::from(2));
    }

    #[tokio::test]
    async fn dry_run_never_connects() {
        let (dir, globals) = import_fixture("name\nAlice\n");
        let csv = dir.path().join("people.csv").display().to_string();

        let cli = cli_from(
            &["sqlkit", "import", &csv, "--types", "TEXT", "--driver", "nosuch", "--dry-run"],
            &globals,
        );
        run(cli).await.expect("dry run should not need a driver");
    }

    #[tokio::test]
    async fn import_into_sqlite_file() {
        let (dir, globals) = import_fixture("name,age\nAlice,28\nBob,\n");
        let csv = dir.path().join("people.csv").display().to_string();
        let db = dir.path().join("shop.db").display().to_string();

        let cli = cli_from(
            &["sqlkit", "import", &csv, "--types", "TEXT,INT", "--driver", "sqlite", "--database", &db],
            &globals,
        );
        run(cli).await.expect("import should succeed");

        let conn = DriverRegistry::with_defaults()
            .connect(&sqlkit_core::ConnectionConfig::new_sqlite(&db))
            .await
            .unwrap();
        let result = conn
            .query("SELECT name, age FROM people ORDER BY name", &[])
            .await
            .unwrap();
        assert_eq!(result.row_count(), 2);
        assert_eq!(result.rows[1].get(1), Some(&sqlkit_core::Value::Null));
    }

    #[tokio::test]
    async fn unknown_driver_is_not_a_validation_failure() {
        let (_dir, globals) = import_fixture("");
        let cli = cli_from(&["sqlkit", "drop", "people", "--driver", "nosuch"], &globals);
        let err = run(cli).await.unwrap_err();
        assert_eq!(exit_code(&err), ExitCode::FAILURE);
    }

    #[test]
    fn exit_code_sees_through_context() {
        let (dir, _) = import_fixture("name\nAlice\n");
        let rejected = TableService::new()
            .plan_csv_import(&dir.path().join("people.csv"), &["FOOBAR"], TableOptions::default())
            .unwrap_err();
        let validation = anyhow::Error::from(rejected).context("Import of people.csv failed");
        assert_eq!(exit_code(&validation), ExitCode::from(2));

        let store: anyhow::Error = ServiceError::from(sqlkit_core::SqlKitError::Query("duplicate key".into())).into();
        assert_eq!(exit_code(&store.context("Import of people.csv failed")), ExitCode::FAILURE);

        let plain = anyhow::anyhow!("no SQL given");
        assert_eq!(exit_code(&plain), ExitCode::FAILURE);
    }
}
