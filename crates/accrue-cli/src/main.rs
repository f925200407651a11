use std::path::PathBuf;

use accrue::{Repository, UpdateOptions, ALL_COLUMNS};
use accrue_config::{generate_default_config, Config};
use accrue_db::{Attributes, ModelContainer, Record};
use clap::Parser;
use cli::{Args, Commands, ConditionArgs, ConfigAction, ConstraintArgs};
use error::{CliError, CliResult};
use logging::setup_logging;
use tracing::{debug, info};
use utils::{parse_assignment, parse_filter, parse_ordering, parse_set_membership, parse_value};

mod cli;
mod error;
mod logging;
mod output;
mod utils;

fn load_config(args: &Args) -> CliResult<Config> {
    let config = match args.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::new()?,
    };
    Ok(config)
}

fn open_repository(
    args: &Args,
    config: &Config,
    table: &str,
) -> CliResult<Repository<Record>> {
    let path = args
        .db
        .clone()
        .or_else(|| config.database.as_ref().map(PathBuf::from))
        .ok_or(CliError::NoDatabase)?;
    debug!(path = %path.display(), table, "opening database");

    let mut container = ModelContainer::open(&path)?;
    container.register_table(table)?;

    Ok(Repository::<Record>::for_model(&container, table)?
        .with_page_defaults(config.pagination_defaults()))
}

fn columns(columns: &[String]) -> Vec<&str> {
    if columns.is_empty() {
        ALL_COLUMNS.to_vec()
    } else {
        columns.iter().map(String::as_str).collect()
    }
}

fn attributes(values: &[String]) -> CliResult<Attributes> {
    values.iter().map(|v| parse_assignment(v)).collect()
}

fn apply_conditions(repo: &mut Repository<Record>, args: &ConditionArgs) -> CliResult<()> {
    for filter in &args.filters {
        let filter = parse_filter(filter)?;
        repo.where_op(&filter.column, &filter.operator, filter.value);
    }
    for membership in &args.set_memberships {
        let (column, values) = parse_set_membership(membership)?;
        repo.where_in(&column, values);
    }
    Ok(())
}

fn apply_orderings(repo: &mut Repository<Record>, orderings: &[String]) {
    for ordering in orderings {
        let (column, direction) = parse_ordering(ordering);
        repo.order_by(column, direction);
    }
}

fn apply_constraints(repo: &mut Repository<Record>, args: &ConstraintArgs) -> CliResult<()> {
    apply_conditions(repo, &args.conditions)?;
    apply_orderings(repo, &args.orderings);
    if let Some(limit) = args.limit {
        repo.limit(limit);
    }
    Ok(())
}

fn handle_config(args: &Args, action: &ConfigAction) -> CliResult<()> {
    match action {
        ConfigAction::Init => {
            setup_logging(args, None);
            generate_default_config(args.config.as_deref())?;
        }
        ConfigAction::Show => {
            let config = load_config(args)?;
            setup_logging(args, config.log_level.as_deref());
            if args.json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                print!("{}", config.to_toml()?);
            }
        }
    }
    Ok(())
}

fn handle_cli(args: Args) -> CliResult<()> {
    let command = match &args.command {
        Commands::Config {
            action,
        } => return handle_config(&args, action),
        command => command,
    };

    let config = load_config(&args)?;
    setup_logging(&args, config.log_level.as_deref());

    let json = args.json;
    match command {
        Commands::All {
            table,
            columns: cols,
        } => {
            let mut repo = open_repository(&args, &config, table)?;
            output::print_records(&repo.all(&columns(cols))?, json)?;
        }
        Commands::Get {
            table,
            constraints,
            columns: cols,
        } => {
            let mut repo = open_repository(&args, &config, table)?;
            apply_constraints(&mut repo, constraints)?;
            output::print_records(&repo.get(&columns(cols))?, json)?;
        }
        Commands::First {
            table,
            constraints,
            columns: cols,
        } => {
            let mut repo = open_repository(&args, &config, table)?;
            apply_constraints(&mut repo, constraints)?;
            output::print_record(&repo.first(&columns(cols))?, json)?;
        }
        Commands::Find {
            table,
            id,
            by,
            columns: cols,
        } => {
            let mut repo = open_repository(&args, &config, table)?;
            let id = parse_value(id);
            match by {
                Some(column) => match repo.get_by_column(id, column, &columns(cols))? {
                    Some(record) => output::print_record(&record, json)?,
                    None => info!("No row where {column} matches"),
                },
                None => output::print_record(&repo.get_by_id(id, &columns(cols))?, json)?,
            }
        }
        Commands::Count {
            table,
        } => {
            let repo = open_repository(&args, &config, table)?;
            output::print_number("count", repo.count()?, json)?;
        }
        Commands::Pluck {
            table,
            column,
            key,
        } => {
            let mut repo = open_repository(&args, &config, table)?;
            output::print_plucked(&repo.pluck(column, key.as_deref())?, json)?;
        }
        Commands::Paginate {
            table,
            conditions,
            orderings,
            per_page,
            page,
        } => {
            let mut repo = open_repository(&args, &config, table)?;
            apply_conditions(&mut repo, conditions)?;
            apply_orderings(&mut repo, orderings);
            let page = repo.paginate(*per_page, ALL_COLUMNS, None, *page)?;
            output::print_page(&page, json)?;
        }
        Commands::Create {
            table,
            values,
        } => {
            let mut repo = open_repository(&args, &config, table)?;
            let record = repo.create(attributes(values)?)?;
            output::print_record(&record, json)?;
        }
        Commands::Update {
            table,
            id,
            values,
            no_touch,
        } => {
            let mut repo = open_repository(&args, &config, table)?;
            let options = UpdateOptions {
                touch: !no_touch,
            };
            let record = repo.update_by_id(parse_value(id), attributes(values)?, options)?;
            output::print_record(&record, json)?;
        }
        Commands::Delete {
            table,
            conditions,
        } => {
            let mut repo = open_repository(&args, &config, table)?;
            apply_conditions(&mut repo, conditions)?;
            let deleted = repo.delete()?;
            info!("Deleted {deleted} row(s) from {table}");
            if json {
                output::print_number("deleted", deleted as u64, json)?;
            }
        }
        Commands::Destroy {
            table,
            ids,
        } => {
            let mut repo = open_repository(&args, &config, table)?;
            let deleted = match ids.as_slice() {
                [id] => usize::from(repo.delete_by_id(parse_value(id))?),
                ids => {
                    let ids: Vec<_> = ids.iter().map(|id| parse_value(id)).collect();
                    repo.delete_multiple_by_id(ids)?
                }
            };
            info!("Deleted {deleted} row(s) from {table}");
            if json {
                output::print_number("deleted", deleted as u64, json)?;
            }
        }
        Commands::Config {
            ..
        } => unreachable!(),
    }

    Ok(())
}

fn main() -> miette::Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .build(),
        )
    }))
    .ok();

    let args = Args::parse();
    if args.no_color {
        utils::set_color(false);
    }

    handle_cli(args)?;
    Ok(())
}
