//! Program catalog command-line front end
//!
//! Reads and writes the catalog through [`ProgramCatalogService`] and prints
//! results as JSON on stdout. Logs go to stderr.

use anyhow::{bail, Context, Result};
use catalog_core::{CatalogConfig, LinkStorage, ProgramCatalogService};
use catalog_model::{EffortPayload, NewProgram};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("program-catalog")
        .version(catalog_core::VERSION)
        .about("Versioned program hierarchy and software-effort catalog")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Path to a TOML config file"),
        )
        .arg(
            Arg::new("database")
                .long("database")
                .global(true)
                .env("CATALOG_DATABASE")
                .value_parser(value_parser!(PathBuf))
                .help("SQLite database path (overrides config)"),
        )
        .arg(
            Arg::new("link-storage")
                .long("link-storage")
                .global(true)
                .value_parser(value_parser!(LinkStorage))
                .help("Linked-effort storage: relation or identifier-list"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand(Command::new("tree").about("Print the program hierarchy"))
        .subcommand(Command::new("programs").about("List current program versions"))
        .subcommand(
            Command::new("program")
                .about("Show the current version of one program")
                .arg(Arg::new("program_id").required(true).help("Business program id")),
        )
        .subcommand(
            Command::new("efforts")
                .about("List the software efforts of a program")
                .arg(Arg::new("program_id").required(true).help("Business program id")),
        )
        .subcommand(
            Command::new("effort")
                .about("Show one software effort")
                .arg(Arg::new("uuid").required(true).help("Effort UUID")),
        )
        .subcommand(
            Command::new("save-effort")
                .about("Create or update a software effort from a JSON payload")
                .arg(Arg::new("program_id").required(true).help("Owning program id"))
                .arg(
                    Arg::new("payload")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Path to the effort payload JSON"),
                ),
        )
        .subcommand(
            Command::new("delete-effort")
                .about("Delete a software effort and its local profiles")
                .arg(Arg::new("uuid").required(true).help("Effort UUID")),
        )
        .subcommand(
            Command::new("import")
                .about("Import program versions from a JSON array")
                .arg(
                    Arg::new("programs")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Path to the programs JSON"),
                ),
        )
}

fn init_tracing(json: bool) -> Result<()> {
    let filter = EnvFilter::from_default_env().add_directive("catalog_core=info".parse()?);
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

fn load_config(matches: &ArgMatches) -> Result<CatalogConfig> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => CatalogConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => CatalogConfig::new(),
    };
    if let Some(path) = matches.get_one::<PathBuf>("database") {
        config = config.with_database_path(path);
    }
    if let Some(shape) = matches.get_one::<LinkStorage>("link-storage") {
        config = config.with_link_storage(*shape);
    }
    Ok(config)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn required<'a>(args: &'a ArgMatches, name: &str) -> Result<&'a String> {
    args.get_one::<String>(name)
        .with_context(|| format!("missing argument <{name}>"))
}

async fn run(service: &ProgramCatalogService, matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("tree", _)) => print_json(&service.get_program_tree().await?),
        Some(("programs", _)) => print_json(&service.get_all_programs().await?),
        Some(("program", args)) => {
            let program_id = required(args, "program_id")?;
            match service.get_program_by_id(program_id).await? {
                Some(program) => print_json(&program),
                None => bail!("program {program_id} not found"),
            }
        }
        Some(("efforts", args)) => {
            let program_id = required(args, "program_id")?;
            match service.get_efforts_for_program(program_id).await? {
                Some(efforts) => print_json(&efforts),
                None => bail!("program {program_id} not found"),
            }
        }
        Some(("effort", args)) => {
            let uuid = required(args, "uuid")?;
            match service.get_effort(uuid).await? {
                Some(effort) => print_json(&effort),
                None => bail!("effort {uuid} not found"),
            }
        }
        Some(("save-effort", args)) => {
            let program_id = required(args, "program_id")?;
            let path = args
                .get_one::<PathBuf>("payload")
                .context("missing argument <payload>")?;
            let payload: EffortPayload = read_json(path)?;
            let outcome = service.save_effort(program_id, Some(payload)).await?;
            print_json(&outcome)?;
            if !outcome.is_saved() {
                bail!("effort not saved");
            }
            Ok(())
        }
        Some(("delete-effort", args)) => {
            let uuid = required(args, "uuid")?;
            let deleted = service.delete_effort(uuid).await?;
            print_json(&serde_json::json!({ "uuid": uuid, "deleted": deleted }))
        }
        Some(("import", args)) => {
            let path = args
                .get_one::<PathBuf>("programs")
                .context("missing argument <programs>")?;
            let programs: Vec<NewProgram> = read_json(path)?;
            let keys = service.import_programs(programs).await?;
            print_json(&serde_json::json!({ "imported": keys.len() }))
        }
        Some((other, _)) => bail!("unknown command {other}"),
        None => bail!("no command given"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("log-json"))?;

    let config = load_config(&matches)?;
    info!(
        database = ?config.database_path,
        link_storage = ?config.link_storage,
        "opening program catalog"
    );
    let service = ProgramCatalogService::from_config(&config)?;
    run(&service, &matches).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_definition_is_valid() {
        cli().debug_assert();
    }

    #[test]
    fn global_options_reach_config() {
        let matches = cli()
            .try_get_matches_from([
                "program-catalog",
                "--database",
                "/tmp/catalog.db",
                "--link-storage",
                "identifier-list",
                "programs",
            ])
            .unwrap();
        let config = load_config(&matches).unwrap();
        assert_eq!(config.database_path, Some(PathBuf::from("/tmp/catalog.db")));
        assert_eq!(config.link_storage, LinkStorage::IdentifierList);
    }

    #[test]
    fn save_effort_requires_payload() {
        let result = cli().try_get_matches_from(["program-catalog", "save-effort", "110"]);
        assert!(result.is_err());
    }
}
