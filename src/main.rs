use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use auth_client::auth::{ActivityEvent, ActivityTracker, AuthApi, AuthService, SessionKeeper};
use auth_client::config::{self, Command, Config};
use auth_client::http_client::HttpClient;
use auth_client::models::{LoginRequest, RegisterRequest, User, UserUpdate};
use auth_client::storage::{SqliteStorage, TokenStorage};
use auth_client::store::{AuthStore, MainStore, SessionStore};
use auth_client::users::UserApi;

/// Everything a command needs, wired once at startup
struct App {
    config: Config,
    http: HttpClient,
    storage: Arc<dyn TokenStorage>,
    auth: Arc<AuthApi>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let (config, command) = Config::load()?;
    config.validate()?;

    // Initialize logging with a configured level
    let log_level = config.log_level.to_lowercase();
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(
        auth_api = %config.auth_api_url,
        graphql = %config.graphql_url,
        db = %config.db_file.display(),
        "Configuration loaded"
    );

    let http = HttpClient::new(
        config.http_max_connections,
        config.http_connect_timeout,
        config.http_request_timeout,
    )?;
    let storage: Arc<dyn TokenStorage> = Arc::new(
        SqliteStorage::open(&config.db_file)
            .with_context(|| format!("Failed to open {}", config.db_file.display()))?,
    );
    let auth = Arc::new(AuthApi::new(
        config.auth_api_url.clone(),
        http.clone(),
        storage.clone(),
    ));

    let app = App {
        config,
        http,
        storage,
        auth,
    };

    match command {
        Command::Login {
            email,
            password,
            graphql,
        } => {
            let email = config::prompt_email(email)?;
            let password = config::prompt_password(password, false)?;
            if graphql {
                app.graphql_login(&email, &password).await
            } else {
                app.login(LoginRequest::new(email, password)).await
            }
        }
        Command::Register {
            email,
            password,
            first_name,
            last_name,
        } => {
            let request = RegisterRequest {
                email: config::prompt_email(email)?,
                password: config::prompt_password(password, true)?,
                first_name,
                last_name,
            };
            app.register(request).await
        }
        Command::Logout => app.logout().await,
        Command::Refresh => app.refresh().await,
        Command::Profile => app.profile().await,
        Command::Me => app.me().await,
        Command::UpdateUser {
            first_name,
            last_name,
            email,
        } => {
            app.update_user(UserUpdate {
                first_name,
                last_name,
                email,
            })
            .await
        }
        Command::Status => app.status().await,
        Command::Keepalive => app.keepalive().await,
    }
}

impl App {
    fn auth_store(&self) -> Result<AuthStore> {
        let service: Arc<dyn AuthService> = self.auth.clone();
        Ok(AuthStore::new(service, self.storage.clone())?)
    }

    fn main_store(&self) -> MainStore {
        let service: Arc<dyn AuthService> = self.auth.clone();
        let session = Arc::new(SessionStore::new(service.clone()));
        MainStore::new(service, session)
    }

    fn user_api(&self) -> UserApi {
        UserApi::new(
            self.config.graphql_url.clone(),
            self.http.clone(),
            self.auth.clone(),
        )
    }

    async fn login(&self, request: LoginRequest) -> Result<()> {
        let store = self.auth_store()?;
        if store.login(&request).await.is_err() {
            anyhow::bail!(store.error().unwrap_or_else(|| "Login failed".to_string()));
        }

        print_signed_in(store.current_user().as_ref());
        Ok(())
    }

    async fn graphql_login(&self, email: &str, password: &str) -> Result<()> {
        let tokens = self.user_api().login(email, password).await?;
        tracing::info!(token_type = %tokens.token_type, "Signed in via GraphQL");
        println!("Signed in");
        Ok(())
    }

    async fn register(&self, request: RegisterRequest) -> Result<()> {
        let store = self.auth_store()?;
        if store.register(&request).await.is_err() {
            anyhow::bail!(store
                .error()
                .unwrap_or_else(|| "Registration failed".to_string()));
        }

        print_signed_in(store.current_user().as_ref());
        Ok(())
    }

    async fn logout(&self) -> Result<()> {
        self.auth_store()?.logout().await?;
        println!("Signed out");
        Ok(())
    }

    async fn refresh(&self) -> Result<()> {
        self.auth_store()?
            .refresh_access_token()
            .await
            .context("Session expired, sign in again")?;
        println!("Access token refreshed");
        Ok(())
    }

    async fn profile(&self) -> Result<()> {
        let user = self.auth_store()?.fetch_profile().await?;
        print_user(&user);
        Ok(())
    }

    async fn me(&self) -> Result<()> {
        let session = SessionStore::new(self.auth.clone());
        let users = &self.user_api();
        let auth = &self.auth;

        // Re-read the token on each attempt so a retry uses the refreshed one
        let user = session
            .with_session_refresh(move || async move {
                let token = auth.token().await?.unwrap_or_default();
                users.current_user(&token).await
            })
            .await?;

        print_user(&user);
        Ok(())
    }

    async fn update_user(&self, update: UserUpdate) -> Result<()> {
        if update.is_empty() {
            anyhow::bail!("Nothing to update (pass --first-name, --last-name or --email)");
        }

        let session = SessionStore::new(self.auth.clone());
        let users = &self.user_api();
        let auth = &self.auth;
        let update = &update;

        let user = session
            .with_session_refresh(move || async move {
                let token = auth.token().await?.unwrap_or_default();
                let current = users.current_user(&token).await?;
                users.update_user(&current.id, update).await
            })
            .await?;

        print_user(&user);
        Ok(())
    }

    async fn status(&self) -> Result<()> {
        let store = self.main_store();
        if store.initialize_auth().await {
            print_signed_in(store.user().as_ref());
        } else {
            println!("Not signed in");
        }
        Ok(())
    }

    /// Refresh the session on an interval while lines keep arriving on stdin.
    /// Stops on EOF or Ctrl+C.
    async fn keepalive(&self) -> Result<()> {
        let store = self.main_store();
        if !store.initialize_auth().await {
            anyhow::bail!("Not signed in");
        }
        print_signed_in(store.user().as_ref());

        let tracker = ActivityTracker::new();
        let (events, receiver) = mpsc::unbounded_channel();
        let listener = tracker.listen(receiver);

        let keeper = SessionKeeper::new(
            self.auth.clone(),
            tracker,
            std::time::Duration::from_secs(self.config.session_refresh_interval),
            chrono::Duration::seconds(self.config.activity_window as i64),
        )
        .spawn();

        tracing::info!(
            interval = self.config.session_refresh_interval,
            window = self.config.activity_window,
            "Keepalive running, press Enter to register activity"
        );

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            tokio::select! {
                line = lines.next_line() => match line.context("Failed to read stdin")? {
                    Some(_) => {
                        if events.send(ActivityEvent::Click).is_err() {
                            break;
                        }
                    }
                    None => break,
                },
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Received Ctrl+C, stopping keepalive");
                    break;
                }
            }
        }

        keeper.abort();
        drop(events);
        listener.await.ok();
        Ok(())
    }
}

fn print_signed_in(user: Option<&User>) {
    match user {
        Some(user) => println!("Signed in as {} <{}>", user.display_name(), user.email),
        None => println!("Signed in"),
    }
}

fn print_user(user: &User) {
    println!("  Id:     {}", user.id);
    println!("  Email:  {}", user.email);
    println!("  Name:   {}", user.display_name());
}
