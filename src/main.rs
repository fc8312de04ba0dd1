use clap::Parser;
use miette::Result;
use neo::cli::commands::utils::{open_database, resolve_config, Context};
use neo::cli::commands::{completions, inspect, interactive, query, rank, search, stats};
use neo::cli::{Cli, Commands, GlobalOpts};
use neo::core::query::RankOrder;

fn init_tracing(global: &GlobalOpts) {
    //   --quiet   → "off"
    //   --verbose → RUST_LOG if set, otherwise "info"
    //   default   → "warn", so skipped rows and unlinked approaches are visible
    let filter = if global.quiet {
        tracing_subscriber::EnvFilter::new("off")
    } else if global.verbose {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())
    } else {
        tracing_subscriber::EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    // Reset SIGPIPE so piping into `head` terminates quietly instead of panicking
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;
    init_tracing(&global);

    // Completions need no data
    let command = match cli.command {
        Commands::Completions(args) => return completions::run(args),
        command => command,
    };

    let config = resolve_config(&global);
    let ctx = Context::new(&global, &config);
    let db = open_database(&config)?;

    match command {
        Commands::Inspect(args) => inspect::run(args, &db, &ctx),
        Commands::Query(args) => query::run(args, &db, &ctx),
        Commands::Search(args) => search::run(args, &db, &ctx),
        Commands::Closest(args) => rank::run(RankOrder::Closest, args, &db, &ctx),
        Commands::Fastest(args) => rank::run(RankOrder::Fastest, args, &db, &ctx),
        Commands::Recent(args) => rank::run(RankOrder::Recent, args, &db, &ctx),
        Commands::Stats(args) => stats::run(args, &db, &ctx),
        Commands::Interactive(args) => {
            interactive::run(args, &db, &ctx, vec![config.neofile(), config.cadfile()])
        }
        Commands::Completions(_) => unreachable!("completions are handled before loading data"),
    }
}
