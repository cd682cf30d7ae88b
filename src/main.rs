use clap::Parser;
use tracing_subscriber::EnvFilter;

use vigil::cli::{CheckArgs, Cli, Command, HistoryArgs, PruneArgs, ShowArgs};
use vigil::config::{self, Config};
use vigil::fetch::HttpFetcher;
use vigil::monitor::{self, TargetStatus};
use vigil::notify::ResendNotifier;
use vigil::store::{self, Store};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Check(args) => run_check(args),
        Command::History(args) => run_history(args),
        Command::Show(args) => run_show(args),
        Command::Prune(args) => run_prune(args),
    }
}

fn open_store(db: Option<std::path::PathBuf>) -> Store {
    let result = match config::resolve_db(db) {
        Some(path) => Store::open(&path),
        None => Store::open_default(),
    };

    match result {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Error opening snapshot store: {e}");
            std::process::exit(1);
        }
    }
}

fn run_check(args: CheckArgs) {
    let config = match Config::from_check_args(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let mut store = open_store(config.db_path.clone());

    let fetcher = match HttpFetcher::new(config.timeout) {
        Ok(fetcher) => fetcher,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let notifier = ResendNotifier::from_config(&config);

    let report = monitor::run_cycle(&config, &fetcher, &notifier, &mut store);

    if args.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error rendering JSON: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    let skipped =
        report.count(TargetStatus::FetchFailed) + report.count(TargetStatus::EmptyContent);
    println!(
        "checked {} targets: {} changed, {} unchanged, {} first seen, {} skipped ({:.2}s)",
        report.targets.len(),
        report.count(TargetStatus::Changed),
        report.count(TargetStatus::Unchanged),
        report.count(TargetStatus::FirstObservation),
        skipped,
        report.duration_ms.unwrap_or(0) as f64 / 1000.0,
    );
}

fn run_history(args: HistoryArgs) {
    let store = open_store(args.db);

    let key = args.url.as_deref().map(store::target_key);
    let metas = match store.list(key.as_deref()) {
        Ok(metas) => metas,
        Err(e) => {
            eprintln!("Error listing snapshots: {e}");
            std::process::exit(1);
        }
    };

    if args.json {
        match serde_json::to_string_pretty(&metas) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error rendering JSON: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    if metas.is_empty() {
        println!("No snapshots found. Run 'vigil check' to create some.");
        return;
    }

    println!("{:<6} {:<20} {:<10} {}", "ID", "Date", "Bytes", "URL");
    println!("{}", "-".repeat(70));

    for meta in metas {
        let datetime = chrono::DateTime::from_timestamp_millis(meta.captured_ms)
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "unknown".to_string());

        println!(
            "{:<6} {:<20} {:<10} {}",
            meta.id, datetime, meta.content_bytes, meta.url
        );
    }
}

fn run_show(args: ShowArgs) {
    let store = open_store(args.db);

    let snapshot = if let Some(id) = args.id {
        match store.get(id) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                eprintln!("Error loading snapshot {id}: {e}");
                std::process::exit(1);
            }
        }
    } else {
        let key = store::target_key(&args.url);
        match store.most_recent(&key) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                eprintln!("Error loading latest snapshot: {e}");
                std::process::exit(1);
            }
        }
    };

    match snapshot {
        Some(snapshot) => {
            println!("{}", snapshot.content);
        }
        None => {
            eprintln!("No snapshot found for {}", args.url);
            std::process::exit(1);
        }
    }
}

fn run_prune(args: PruneArgs) {
    let keep = match config::resolve_keep(args.keep) {
        Ok(keep) => keep,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let mut store = open_store(args.db);

    let keys = match store.targets() {
        Ok(keys) => keys,
        Err(e) => {
            eprintln!("Error listing targets: {e}");
            std::process::exit(1);
        }
    };

    let mut deleted = 0usize;
    for key in &keys {
        match store.prune(key, keep) {
            Ok(n) => deleted += n,
            Err(e) => {
                eprintln!("prune failed for target {key}: {e}");
            }
        }
    }

    println!(
        "pruned {} snapshots across {} targets (keeping {} per target)",
        deleted,
        keys.len(),
        keep.max(1)
    );
}
