mod app;
mod cli;

use tdsync::{ClientConfig, PullOutcome};
use tracing_subscriber::EnvFilter;

fn main() {
    init_tracing();
    if let Err(err) = run() {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("TDSYNC_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json(value: &impl serde::Serialize) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).expect("json serialization should work")
    );
}

fn load_config(path: Option<&std::path::Path>) -> Result<ClientConfig, app::AppError> {
    let config = match path {
        Some(path) => ClientConfig::load(path)?,
        None => match ClientConfig::default_path() {
            Some(path) => ClientConfig::load(&path)?,
            None => ClientConfig::default(),
        },
    };
    Ok(config)
}

fn run() -> Result<(), app::AppError> {
    use clap::Parser;
    use cli::Commands;

    let cli = cli::Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let mut app = app::App::open(&config, cli.state_dir, cli.token)?;

    match cli.command {
        Commands::Pull => {
            let outcome = app.pull()?;
            if cli.json {
                print_json(&outcome);
            } else {
                match outcome {
                    PullOutcome::Skipped => println!("pull skipped: last pull is still fresh"),
                    PullOutcome::Pulled(summary) => println!(
                        "pulled {} items, {} projects, {} labels, {} notes{}",
                        summary.items,
                        summary.projects,
                        summary.labels,
                        summary.notes,
                        if summary.full_sync { " (full sync)" } else { "" }
                    ),
                }
            }
        }
        Commands::Items(args) => {
            let items = app.items(&app::ItemFilter {
                projects: args.projects,
                label: args.label,
                content: args.content,
                checked: args.checked,
                due: args.due,
                include_deleted: args.include_deleted,
            })?;
            if cli.json {
                print_json(&items);
            } else {
                for item in &items {
                    let mut line = format!("{}  {}", item.id, item.content);
                    if !item.labels.is_empty() {
                        line.push_str(&format!("  @{}", item.labels.join(" @")));
                    }
                    if let Some(due) = &item.due {
                        line.push_str(&format!("  due {}", due));
                    }
                    println!("{line}");
                }
            }
        }
        Commands::Projects(args) => {
            let projects = app.projects(args.archived);
            if cli.json {
                print_json(&projects);
            } else {
                for project in &projects {
                    let archived = if project.is_archived { "  (archived)" } else { "" };
                    println!("{}  {}{}", project.id, project.name, archived);
                }
            }
        }
        Commands::Labels => {
            let labels = app.labels();
            if cli.json {
                print_json(&labels);
            } else {
                for label in &labels {
                    println!("{}  {}", label.id, label.name);
                }
            }
        }
        Commands::AddItem(args) => {
            let added = app.add_item(app::NewItem {
                content: args.content,
                project: args.project,
                labels: args.labels,
                due: args.due,
                priority: args.priority,
            })?;
            if cli.json {
                print_json(&added);
            } else {
                match added.id {
                    Some(id) => println!("added {}", id),
                    None => println!("added (temp id {})", added.temp_id),
                }
            }
        }
        Commands::CloseItem(args) => {
            let item = app.close_item(args.id)?;
            if cli.json {
                print_json(&item);
            } else {
                println!("closed {}", args.id);
            }
        }
        Commands::Reset => {
            app.reset()?;
            if cli.json {
                print_json(&serde_json::json!({ "reset": true }));
            } else {
                println!("local state cleared; next pull is a full sync");
            }
            return Ok(());
        }
    }

    app.save()
}
