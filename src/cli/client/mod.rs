//! Client command - calls a running server and keeps the token on disk

use clap::{Args, Subcommand};

use crate::client::{AuthClient, ClientError, TokenStore};

/// Arguments for the client command
#[derive(Args, Clone, Debug)]
pub struct ClientArgs {
    /// Base URL of the auth service
    #[arg(long, env = "AUTH_SERVER_URL", default_value = "http://localhost:3000")]
    pub server_url: String,

    /// Where the session token is stored
    #[arg(long, default_value = ".pmp-auth-token")]
    pub token_file: String,

    #[command(subcommand)]
    pub action: ClientAction,
}

#[derive(Subcommand, Clone, Debug)]
pub enum ClientAction {
    /// Create an account
    Signup { username: String, password: String },

    /// Log in and store the token
    Login { username: String, password: String },

    /// Show the profile for the stored token
    Profile,

    /// Forget the stored token
    Logout,
}

pub async fn run(args: ClientArgs) -> anyhow::Result<()> {
    let client = AuthClient::new(&args.server_url);
    let store = TokenStore::new(&args.token_file);

    match args.action {
        ClientAction::Signup { username, password } => {
            let message = client.signup(&username, &password).await?;
            println!("{}", message);
        }
        ClientAction::Login { username, password } => {
            let login = client.login(&username, &password).await?;
            store.save(&login.token).await?;
            println!("{} (token saved to {})", login.message, store.path().display());
        }
        ClientAction::Profile => {
            let token = store.load().await?.ok_or(ClientError::NotLoggedIn)?;
            let profile = client.profile(&token).await?;
            println!("Username: {}", profile.username);
        }
        ClientAction::Logout => {
            if store.delete().await? {
                println!("Logged out");
            } else {
                println!("No stored token");
            }
        }
    }

    Ok(())
}
