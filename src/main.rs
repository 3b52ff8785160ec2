use clap::Parser;
use notekeeper::cli::{handle_serve, handle_user_add, handle_user_list, Cli, Commands, UserAction};
use notekeeper::logging::{init_logging, Verbosity};
use notekeeper::Config;

fn main() {
    let cli = Cli::parse();

    init_logging(Verbosity::from_flags(cli.quiet, cli.verbose));

    let result = Config::load_from(cli.config.as_deref()).and_then(|mut config| {
        if let Some(database) = cli.database {
            config.storage.database_path = database;
        }

        match cli.command {
            Commands::Serve { bind } => handle_serve(config, bind),
            Commands::User(user_cmd) => match user_cmd.action {
                UserAction::Add {
                    username,
                    password,
                    stdin,
                } => handle_user_add(&config, username, password, stdin),
                UserAction::List { json } => handle_user_list(&config, json),
            },
        }
    });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
