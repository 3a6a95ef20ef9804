use clap::Parser;
use otpvault::cli::commands;
use otpvault::cli::commands::add::AddArgs;
use otpvault::cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

/// Environment variable controlling diagnostic logging (e.g. `debug`).
const LOG_ENV: &str = "OTPVAULT_LOG";

fn init_tracing() {
    let env_filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Install => commands::install::execute(&cli),
        Commands::CleanInstall { force } => commands::clean_install::execute(&cli, force),
        Commands::Add {
            ref secret,
            ref issuer,
            ref account,
            ref kind,
            counter,
            ref uri,
            ref category,
            ref tags,
        } => commands::add::execute(
            &cli,
            &AddArgs {
                secret: secret.as_deref(),
                issuer,
                account: account.as_deref(),
                kind,
                counter,
                uri: uri.as_deref(),
                category: category.as_deref(),
                tags,
            },
        ),
        Commands::List {
            ref search,
            ref category,
        } => commands::list::execute(&cli, search.as_deref(), category.as_deref()),
        Commands::Generate { id, no_clip } => commands::generate::execute(&cli, id, no_clip),
        Commands::Remove { id, force } => commands::delete::execute(&cli, id, force),
        Commands::Export {
            ref format,
            ref output,
        } => commands::export::execute(&cli, format, output.as_deref()),
        Commands::Import {
            ref file,
            ref format,
        } => commands::import_cmd::execute(&cli, file, format.as_deref()),
        Commands::Backup => commands::backup::execute_backup(&cli),
        Commands::Backups => commands::backup::execute_list(&cli),
        Commands::Restore { ref file, force } => {
            commands::backup::execute_restore(&cli, file, force)
        }
        Commands::Categories => commands::categories::execute(&cli),
        Commands::Qr { id, ref output } => commands::qr::execute(&cli, id, output.as_deref()),
        Commands::Passwd => commands::rotate::execute(&cli),
        Commands::Validate => commands::validate::execute(&cli),
        Commands::Version => commands::version::execute(),
        Commands::Completions { shell } => commands::completions::execute(shell),
    };

    if let Err(e) = result {
        otpvault::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}
