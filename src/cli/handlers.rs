use std::io::{self, Read};

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{NotekeeperError, Result};
use crate::storage::{SqliteStore, UserRepository};
use crate::web::{self, AppState};

fn open_store(config: &Config) -> Result<SqliteStore> {
    SqliteStore::open(&config.storage.database_path, config.search.clone())
}

pub fn handle_serve(mut config: Config, bind: Option<String>) -> Result<()> {
    if let Some(bind) = bind {
        config.server.bind = bind;
    }
    let addr = config.bind_addr()?;
    let store = open_store(&config)?;
    info!(
        database = %config.storage.database_path.display(),
        case_sensitive_search = config.search.case_sensitive,
        "opened store"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        let shutdown = CancellationToken::new();
        let trigger = shutdown.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("shutdown requested"),
                Err(e) => warn!(error = %e, "could not listen for ctrl-c"),
            }
            trigger.cancel();
        });

        let state = AppState::new(store).with_sessions(config.session);
        web::serve(state, addr, shutdown).await
    })
}

pub fn handle_user_add(
    config: &Config,
    username: String,
    password: Option<String>,
    stdin: bool,
) -> Result<()> {
    let password = if stdin {
        let mut input = String::new();
        io::stdin().read_to_string(&mut input)?;
        input.trim_end_matches(['\r', '\n']).to_string()
    } else {
        password.unwrap_or_default()
    };
    if password.is_empty() {
        return Err(NotekeeperError::validation(
            "password",
            "provide --password or --stdin",
        ));
    }

    let store = open_store(config)?;
    let user = store.create_user(&username, &password)?;
    info!(user_id = %user.id, "user created");

    println!("Created user {} (id {})", user.username, user.id);
    Ok(())
}

pub fn handle_user_list(config: &Config, json: bool) -> Result<()> {
    let store = open_store(config)?;
    let users = store.list_users()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&users)?);
        return Ok(());
    }

    if users.is_empty() {
        println!("No users.");
    }
    for user in &users {
        println!(
            "{:>4}  {}  (joined {})",
            user.id,
            user.username,
            user.created_at.format("%Y-%m-%d")
        );
    }
    Ok(())
}
