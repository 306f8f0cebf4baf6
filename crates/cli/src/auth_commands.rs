use std::io::BufRead;

use {
    anyhow::Result,
    clap::Subcommand,
    redwind_gateway::{
        auth::{CredentialStore, hash_password},
        server::{database_path, open_database},
    },
};

#[derive(Subcommand)]
pub enum AuthAction {
    /// Hash an owner password for `auth.password_hash`.
    HashPassword {
        /// Password to hash. Read from stdin when omitted.
        #[arg(long)]
        password: Option<String>,
    },
    /// Delete expired login sessions from the database.
    PruneSessions,
}

pub async fn handle_auth(action: AuthAction) -> Result<()> {
    match action {
        AuthAction::HashPassword { password } => print_hash(password),
        AuthAction::PruneSessions => prune_sessions().await,
    }
}

fn print_hash(password: Option<String>) -> Result<()> {
    let password = match password {
        Some(p) => p,
        None => {
            eprintln!("Password:");
            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line)?;
            line.trim_end_matches(['\r', '\n']).to_string()
        },
    };
    if password.is_empty() {
        anyhow::bail!("password must not be empty");
    }

    println!("{}", hash_password(&password)?);
    eprintln!("Add it to your config under [auth] password_hash.");
    Ok(())
}

async fn prune_sessions() -> Result<()> {
    let config = redwind_config::discover_and_load();
    let pool = open_database(&database_path(&config)).await?;
    let store = CredentialStore::new(pool, &config.auth).await?;
    let removed = store.cleanup_expired_sessions().await?;
    println!("Removed {removed} expired session(s).");
    Ok(())
}
