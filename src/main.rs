//! Kaychen CLI - inspect databases managed by the Kaychen ORM

use clap::{Parser, Subcommand};
use kaychen::config::{self, KaychenConfig};
use kaychen::ui;
use kaychen::Database;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "kaychen")]
#[command(version)]
#[command(about = "Inspect SQLite databases created by the Kaychen ORM")]
#[command(long_about = r#"
Kaychen stores one table per schema, with an autoincrement id followed by
the schema's columns in name order. This tool lists those tables and their
live columns.

Example usage:
  kaychen init --database app.db
  kaychen tables
  kaychen columns --table book
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the tables in a database
    Tables {
        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Show the live columns of a table
    Columns {
        /// Table name
        #[arg(short, long)]
        table: String,

        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Write a config file pointing at a database
    Init {
        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let loaded = config::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Tables { database } => {
            let path = config::resolve_database(database, loaded.as_ref());
            if !config::database_exists(&path) {
                if cli.json {
                    println!("[]");
                } else {
                    ui::warn(&format!("No database at {}", path.display()));
                }
                return Ok(());
            }
            let db = Database::open(&path)?;

            let mut tables = Vec::new();
            for name in db.tables()? {
                let columns = db.table_columns(&name)?.len();
                tables.push((name, columns));
            }

            if cli.json {
                let data: Vec<_> = tables
                    .iter()
                    .map(|(name, columns)| serde_json::json!({ "table": name, "columns": columns }))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else if tables.is_empty() {
                ui::warn(&format!("No tables in {}", path.display()));
            } else {
                ui::header(&format!("{}", path.display()));
                println!("{}", ui::tables_table(&tables));
            }
        }

        Commands::Columns { table, database } => {
            let path = config::resolve_database(database, loaded.as_ref());
            if !config::database_exists(&path) {
                ui::error(&format!("No database at {}", path.display()));
                anyhow::bail!("database {} not found", path.display());
            }
            let db = Database::open(&path)?;
            let columns = db.table_columns(&table)?;

            if columns.is_empty() {
                ui::error(&format!("No table named {} in {}", table, path.display()));
                anyhow::bail!("table {} not found", table);
            }

            if cli.json {
                let data: Vec<_> = columns
                    .iter()
                    .map(|(name, sql_type)| serde_json::json!({ "name": name, "type": sql_type }))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else {
                ui::section(&table);
                ui::info("Database", &ui::dim(&path.display().to_string()));
                println!("{}", ui::columns_table(&columns));
            }
        }

        Commands::Init { database, force } => {
            let config_path = cli.config.unwrap_or_else(config::default_config_path);
            let db_path = config::resolve_database(database, None);
            config::ensure_db_dir(&db_path)?;

            let new_config = KaychenConfig {
                database: Some(db_path.display().to_string()),
            };
            config::write_config(&config_path, &new_config, force)?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&new_config)?);
            } else {
                ui::success(&format!("Wrote {}", config_path.display()));
                ui::info("Database", &db_path.display().to_string());
            }
        }
    }

    Ok(())
}
