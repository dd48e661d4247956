use chrono::Local;
use clap::{Args as ClapArgs, Parser, Subcommand};
use rwb_core::backups;
use rwb_core::{BackupError, ConfigStore};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "rwb-cli",
    about = "Browse Train Simulator Classic scenarios and manage CurrentSave.bin backups",
    version
)]
struct Cli {
    /// Settings file (defaults to the per-user config directory)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    /// RailWorks installation folder, overriding the saved one
    #[arg(long, global = true, value_name = "DIR")]
    root: Option<PathBuf>,
    /// Language tag for display names, overriding the saved one
    #[arg(long, global = true, value_name = "TAG")]
    lang: Option<String>,
    /// More log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Print routes and scenarios of the installation
    Scan(ScanArgs),
    /// Resolve the display name stored in a properties XML file
    Name(NameArgs),
    /// List backups of a scenario, newest first
    List(ScenarioArgs),
    /// Back up the scenario's CurrentSave.bin
    Create(ScenarioArgs),
    /// Overwrite CurrentSave.bin with a backup
    Restore(BackupArgs),
    /// Delete a backup and its checksum file
    Delete(BackupArgs),
    /// Show or change saved settings
    #[command(subcommand)]
    Config(ConfigCmd),
}

#[derive(ClapArgs, Debug)]
struct ScanArgs {
    /// Only show routes/scenarios whose name contains this text
    #[arg(long)]
    filter: Option<String>,
    /// Emit JSON instead of a tree
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(ClapArgs, Debug)]
struct NameArgs {
    /// RouteProperties.xml or ScenarioProperties.xml
    path: PathBuf,
}

#[derive(ClapArgs, Debug)]
struct ScenarioArgs {
    /// Scenario folder (holds CurrentSave.bin)
    scenario: PathBuf,
}

#[derive(ClapArgs, Debug)]
struct BackupArgs {
    /// Scenario folder (holds CurrentSave.bin)
    scenario: PathBuf,
    /// Backup identifier as printed by `list`, e.g. CurrentSave-2024-06-01-12-00-00
    id: String,
    /// Do not ask for confirmation
    #[arg(long, short = 'y', default_value_t = false)]
    yes: bool,
}

#[derive(Subcommand, Debug)]
enum ConfigCmd {
    /// Print the settings file
    Show,
    /// Save the installation folder
    SetRoot { path: PathBuf },
    /// Save the language tag (e.g. zh, en, de)
    SetLang { tag: String },
    /// Look for an installation in the default Steam locations and save it
    Detect,
}

fn main() {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let store = match &cli.config {
        Some(p) => ConfigStore::load(p),
        None => ConfigStore::open_default(),
    };
    let lang = cli
        .lang
        .clone()
        .unwrap_or_else(|| store.language().to_string());
    let root = cli
        .root
        .clone()
        .or_else(|| store.installation_path().map(Path::to_path_buf));
    match cli.cmd {
        Cmd::Scan(a) => cmd_scan(root, &lang, a),
        Cmd::Name(a) => cmd_name(&lang, a),
        Cmd::List(a) => cmd_list(&a.scenario),
        Cmd::Create(a) => cmd_create(&a.scenario),
        Cmd::Restore(a) => cmd_restore(a),
        Cmd::Delete(a) => cmd_delete(a),
        Cmd::Config(c) => cmd_config(store, c),
    }
}

fn cmd_scan(root: Option<PathBuf>, lang: &str, args: ScanArgs) {
    let Some(root) = root else {
        eprintln!("error: no installation folder; pass --root or run `config detect`");
        std::process::exit(2);
    };
    let catalog = rwb_core::scan_catalog(&root, lang).unwrap_or_else(|e| {
        eprintln!("error: {}", e);
        std::process::exit(2);
    });
    let catalog = match &args.filter {
        Some(q) => catalog.filter(q),
        None => catalog,
    };
    if args.json {
        match serde_json::to_string_pretty(&catalog) {
            Ok(s) => println!("{}", s),
            Err(e) => {
                eprintln!("error: {}", e);
                std::process::exit(5);
            }
        }
        return;
    }
    for route in &catalog.routes {
        println!("{}\t[{}]", route.display_name, route.id);
        for s in &route.scenarios {
            let n = backups::list_backups(&s.path).len();
            println!("  {}\t[{}]\t{} backup(s)", s.display_name, s.id, n);
            println!("    {}", s.path.display());
        }
    }
    println!(
        "{} route(s), {} scenario(s)",
        catalog.routes.len(),
        catalog.scenario_count()
    );
}

fn cmd_name(lang: &str, args: NameArgs) {
    let name = rwb_core::resolve_display_name(&args.path, lang);
    if name.is_empty() {
        eprintln!("no display name in {}", args.path.display());
        std::process::exit(3);
    }
    println!("{}", name);
}

fn cmd_list(scenario: &Path) {
    let ids = backups::try_list_backups(scenario).unwrap_or_else(|e| {
        eprintln!("error: {}", e);
        std::process::exit(4);
    });
    if ids.is_empty() {
        println!("no backups in {}", backups::backup_dir(scenario).display());
        return;
    }
    for id in ids {
        let when = backups::backup_time(&id)
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default();
        let md5 = if backups::has_checksum(scenario, &id) {
            "md5"
        } else {
            "-"
        };
        println!("{}\t{}\t{}", id, when, md5);
    }
}

fn cmd_create(scenario: &Path) {
    match backups::create_backup_at(scenario, Local::now().naive_local()) {
        Ok(id) => println!("{}", id),
        Err(BackupError::NoSave) => {
            eprintln!(
                "no {} in {}; save the game first (F2 or the pause menu)",
                backups::SAVE_FILE,
                scenario.display()
            );
            std::process::exit(3);
        }
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(4);
        }
    }
}

fn cmd_restore(args: BackupArgs) {
    if !args.yes
        && !confirm(&format!(
            "Overwrite {} with {}?",
            backups::save_path(&args.scenario).display(),
            args.id
        ))
    {
        eprintln!("aborted");
        std::process::exit(1);
    }
    if let Err(e) = backups::try_restore_backup(&args.scenario, &args.id) {
        eprintln!("error: {}", e);
        std::process::exit(4);
    }
    println!("restored {}", args.id);
}

fn cmd_delete(args: BackupArgs) {
    if !args.yes && !confirm(&format!("Delete backup {}?", args.id)) {
        eprintln!("aborted");
        std::process::exit(1);
    }
    if let Err(e) = backups::try_delete_backup(&args.scenario, &args.id) {
        eprintln!("error: {}", e);
        std::process::exit(4);
    }
    println!("deleted {}", args.id);
}

fn cmd_config(mut store: ConfigStore, cmd: ConfigCmd) {
    let res = match cmd {
        ConfigCmd::Show => {
            println!("# {}", store.path().display());
            match serde_json::to_string_pretty(store.config()) {
                Ok(s) => println!("{}", s),
                Err(e) => {
                    eprintln!("error: {}", e);
                    std::process::exit(5);
                }
            }
            Ok(())
        }
        ConfigCmd::SetRoot { path } => {
            if !rwb_core::install::is_installation(&path) {
                eprintln!("warning: {} does not look like a RailWorks folder", path.display());
            }
            store.set_installation_path(path)
        }
        ConfigCmd::SetLang { tag } => store.set_language(tag),
        ConfigCmd::Detect => match rwb_core::detect_installation() {
            Some(path) => {
                println!("{}", path.display());
                store.set_installation_path(path)
            }
            None => {
                eprintln!("no installation found in the default locations");
                std::process::exit(3);
            }
        },
    };
    if let Err(e) = res {
        eprintln!("error writing {}: {}", store.path().display(), e);
        std::process::exit(5);
    }
}

fn confirm(question: &str) -> bool {
    print!("{} [y/N] ", question);
    io::stdout().flush().ok();
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line).is_err() {
        return false;
    }
    matches!(line.trim().to_lowercase().as_str(), "y" | "yes")
}
