//! SmartLibrary - terminal client for the SmartLibrary book-lending service.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use smartlibrary::{
    api::{profile::image_data_url, ApiClient, ApiError},
    browse::{BrowseCommand, HELP},
    catalog::{CatalogSource, CatalogView, PublicCatalog},
    catalog::source::DEFAULT_VOLUMES_URL,
    config::{ClientConfig, DEFAULT_API_URL, DEFAULT_LANGUAGE},
    model::{BookId, BookQuery, NewBook, NewReview},
    render,
    session::{Landing, Session, SessionStore},
    validate::{FieldErrors, LoginForm, RegistrationForm},
};

/// Terminal client for SmartLibrary.
#[derive(Parser)]
#[command(name = "smartlibrary", about = "Browse, review and reserve books from SmartLibrary")]
struct Cli {
    /// SmartLibrary API URL.
    #[arg(long, global = true, env = "SMARTLIBRARY_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Directory holding the saved session.
    #[arg(long, global = true, env = "SMARTLIBRARY_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Browse the public book-search API instead of the backend catalog.
    #[arg(long, global = true, env = "SMARTLIBRARY_PUBLIC_CATALOG")]
    public_catalog: bool,

    /// Public book-search `volumes` endpoint.
    #[arg(long, global = true, env = "SMARTLIBRARY_VOLUMES_URL", default_value = DEFAULT_VOLUMES_URL)]
    volumes_url: String,

    /// Language restriction for the public catalog.
    #[arg(long, global = true, env = "SMARTLIBRARY_LANGUAGE", default_value = DEFAULT_LANGUAGE)]
    language: String,

    /// Request timeout in seconds.
    #[arg(long, global = true, default_value_t = 30)]
    timeout_secs: u64,

    /// Alternate admin route prefix tried once after a 403 (e.g. /api/admin).
    #[arg(long, global = true, env = "SMARTLIBRARY_ADMIN_FALLBACK")]
    admin_fallback: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and save the session.
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },

    /// Forget the saved session.
    Logout,

    /// Create an account.
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Print one page of the catalog.
    Catalog {
        /// Server-side title search.
        #[arg(long)]
        title: Option<String>,

        /// Server-side genre filter.
        #[arg(long)]
        genre: Option<String>,

        /// Local genre filter over categories, genre and description.
        #[arg(long)]
        filter: Option<String>,

        /// Page to show, starting at 1.
        #[arg(long, default_value_t = 1)]
        page: usize,
    },

    /// Search the public book-search API.
    Search {
        query: String,
    },

    /// Browse the catalog interactively.
    Browse {
        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        genre: Option<String>,
    },

    /// Show a book with its reviews.
    Book {
        id: String,
    },

    /// Review a book (requires a reservation).
    Review {
        book_id: String,

        /// Rating from 1 to 5.
        #[arg(long)]
        rating: u8,

        #[arg(long)]
        comment: Option<String>,
    },

    /// Reserve a book.
    Reserve {
        book_id: String,
    },

    /// Show the profile and reservations.
    Profile,

    /// Upload a profile image.
    Avatar {
        path: PathBuf,
    },

    /// Delete the account.
    DeleteAccount {
        /// Confirm deletion.
        #[arg(long)]
        yes: bool,
    },

    /// Admin console.
    #[command(subcommand)]
    Admin(AdminCommands),
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Add a book to the catalog.
    AddBook {
        #[arg(long)]
        title: String,
        #[arg(long)]
        author: String,
        #[arg(long)]
        genre: String,
        #[arg(long)]
        year: Option<i32>,
        #[arg(long, default_value_t = 0)]
        copies: u32,
        #[arg(long)]
        cover_url: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },

    /// Delete a book.
    DeleteBook {
        id: String,
    },

    /// Delete a review.
    DeleteReview {
        id: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "smartlibrary=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let app = App::new(&cli)?;

    match cli.command {
        Commands::Login { username, password } => app.login(&username, &password).await?,
        Commands::Logout => app.logout()?,
        Commands::Register {
            username,
            email,
            password,
        } => app.register(&username, &email, &password).await?,
        Commands::Catalog {
            title,
            genre,
            filter,
            page,
        } => {
            app.catalog(BookQuery::new(title, genre), filter, page)
                .await?
        }
        Commands::Search { query } => app.search(&query).await?,
        Commands::Browse { title, genre } => app.browse(BookQuery::new(title, genre)).await?,
        Commands::Book { id } => app.book(&BookId::from(id.as_str())).await?,
        Commands::Review {
            book_id,
            rating,
            comment,
        } => {
            app.review(&BookId::from(book_id.as_str()), rating, comment.as_deref())
                .await?
        }
        Commands::Reserve { book_id } => app.reserve(&BookId::from(book_id.as_str())).await?,
        Commands::Profile => app.profile().await?,
        Commands::Avatar { path } => app.avatar(&path).await?,
        Commands::DeleteAccount { yes } => app.delete_account(yes).await?,
        Commands::Admin(command) => app.admin(command).await?,
    }

    Ok(())
}

/// Config, stored session and API client for one invocation.
struct App {
    config: ClientConfig,
    store: SessionStore,
    session: Session,
    api: ApiClient,
}

impl App {
    fn new(cli: &Cli) -> Result<Self> {
        let mut config = ClientConfig::new(cli.api_url.as_str())
            .with_public_catalog(cli.public_catalog)
            .with_volumes_url(cli.volumes_url.as_str())
            .with_language(cli.language.as_str())
            .with_timeout(Duration::from_secs(cli.timeout_secs));
        if let Some(dir) = &cli.data_dir {
            config = config.with_data_dir(dir.clone());
        }
        if let Some(prefix) = &cli.admin_fallback {
            config = config.with_admin_fallback(prefix.as_str());
        }

        let store = config.session_store();
        let session = store.load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Ignoring unreadable session");
            Session::default()
        });
        let api = ApiClient::new(&config)?.with_token(session.token.clone());

        tracing::debug!(api_url = %config.api_url, authenticated = session.is_authenticated(), "Client ready");

        Ok(Self {
            config,
            store,
            session,
            api,
        })
    }

    fn source(&self) -> CatalogSource {
        if self.config.public_catalog {
            CatalogSource::Public(self.public_catalog())
        } else {
            CatalogSource::Backend(self.api.clone())
        }
    }

    fn public_catalog(&self) -> PublicCatalog {
        PublicCatalog::new(
            self.api.http().clone(),
            self.config.volumes_url.as_str(),
            self.config.language.as_str(),
        )
    }

    /// Turn an API error into a user-facing one. A rejected token is dropped
    /// from the stored session.
    fn fail(&self, error: ApiError) -> anyhow::Error {
        match error {
            ApiError::NotAuthenticated => {
                anyhow!("Not authenticated. Log in with `smartlibrary login`.")
            }
            ApiError::Unauthorized(_) => {
                if let Err(e) = self.store.clear_token() {
                    tracing::warn!(error = %e, "Could not clear expired token");
                }
                tracing::info!("Stored token rejected, cleared");
                anyhow!("Session expired. Log in again with `smartlibrary login`.")
            }
            ApiError::Network(_) => anyhow!("Could not reach the server at {}", self.api.base_url()),
            other => other.into(),
        }
    }

    fn require_session(&self) -> Result<()> {
        if !self.api.has_token() {
            anyhow::bail!("Not authenticated. Log in with `smartlibrary login`.");
        }
        Ok(())
    }

    async fn login(&self, username: &str, password: &str) -> Result<()> {
        let form = LoginForm::new(username, password);
        let response = match self.api.login(&form).await {
            Ok(response) => response,
            Err(ApiError::Validation(errors)) => {
                print_field_errors(&errors);
                anyhow::bail!("Login failed");
            }
            Err(ApiError::InvalidCredentials) => anyhow::bail!("Wrong username or password"),
            Err(e) => return Err(self.fail(e)),
        };

        let session = Session::from_login(&response);
        if !session.is_authenticated() {
            anyhow::bail!("Login response did not include a token");
        }
        self.store.save(&session)?;

        println!(
            "Logged in as {}",
            session.username.as_deref().unwrap_or(form.username.as_str())
        );
        match session.landing() {
            Landing::AdminConsole => println!("Admin console: see `smartlibrary admin --help`"),
            Landing::Catalog => println!("Catalog: run `smartlibrary browse`"),
        }
        Ok(())
    }

    fn logout(&self) -> Result<()> {
        self.store.clear()?;
        tracing::info!("Logged out");
        println!("Logged out.");
        Ok(())
    }

    async fn register(&self, username: &str, email: &str, password: &str) -> Result<()> {
        let form = RegistrationForm::new(username, email, password);
        match self.api.register(&form).await {
            Ok(()) => {
                println!("Registration complete. Log in with `smartlibrary login`.");
                Ok(())
            }
            Err(e) => match e.field_errors() {
                Some(errors) => {
                    print_field_errors(&errors);
                    anyhow::bail!("Registration failed");
                }
                None => Err(self.fail(e)),
            },
        }
    }

    async fn catalog(&self, query: BookQuery, filter: Option<String>, page: usize) -> Result<()> {
        let books = self.source().load(&query).await.map_err(|e| self.fail(e))?;
        let mut view = CatalogView::new(books);
        if let Some(filter) = filter {
            view.set_genre_filter(filter);
        }
        while view.page() < page && view.next_page() {}

        println!("{}", render::catalog_page(&view));
        Ok(())
    }

    async fn search(&self, query: &str) -> Result<()> {
        let books = self
            .public_catalog()
            .search(query)
            .await
            .map_err(|e| self.fail(e))?;

        if books.is_empty() {
            println!("No results for \"{}\".", query);
            return Ok(());
        }
        for (index, book) in books.iter().enumerate() {
            println!("{}", render::book_line(index, book));
        }
        Ok(())
    }

    async fn browse(&self, query: BookQuery) -> Result<()> {
        let source = self.source();
        let books = source.load(&query).await.map_err(|e| self.fail(e))?;
        tracing::info!(count = books.len(), backend = source.is_backend(), "Catalog loaded");

        let mut view = CatalogView::new(books);
        println!("{}", render::catalog_page(&view));
        println!("(type `help` for commands)");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            print!("> ");
            std::io::stdout().flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            let command = match BrowseCommand::parse(&line) {
                None => continue,
                Some(Err(e)) => {
                    println!("{}", e);
                    continue;
                }
                Some(Ok(command)) => command,
            };

            match command {
                BrowseCommand::Quit => break,
                BrowseCommand::Help => {
                    println!("{}", HELP);
                    continue;
                }
                BrowseCommand::Review { rating, comment } => {
                    let Some(id) = view.detail().book_id().cloned() else {
                        println!("Open a book first.");
                        continue;
                    };
                    match self.review(&id, rating, comment.as_deref()).await {
                        Ok(()) => view.reload_reviews(),
                        Err(e) => {
                            println!("{}", e);
                            continue;
                        }
                    }
                }
                BrowseCommand::Reserve => {
                    let Some(book) = view.current_book() else {
                        println!("Open a book first.");
                        continue;
                    };
                    if !book.is_available() {
                        println!("This book is not available.");
                        continue;
                    }
                    let id = book.id.clone();
                    if let Err(e) = self.reserve(&id).await {
                        println!("{}", e);
                    }
                    continue;
                }
                command => {
                    if !command.apply(&mut view) {
                        continue;
                    }
                }
            }

            if view.detail().needs_reviews() {
                if let Some(id) = view.detail().book_id().cloned() {
                    let outcome = self.api.reviews(&id).await;
                    view.apply_reviews(outcome);
                }
            }

            match (view.current_detail(), view.detail().reviews()) {
                (Some(detail), Some(reviews)) => {
                    println!("{}", render::book_detail(&detail));
                    println!();
                    println!("Reviews");
                    println!("-------");
                    println!("{}", render::reviews(reviews));
                    let prev = if detail.can_prev { "[h] prev  " } else { "" };
                    let next = if detail.can_next { "[l] next  " } else { "" };
                    println!("\n{}{}[q] close", prev, next);
                }
                _ => println!("{}", render::catalog_page(&view)),
            }
        }

        Ok(())
    }

    async fn book(&self, id: &BookId) -> Result<()> {
        let book = self.api.get_book(id).await.map_err(|e| self.fail(e))?;
        let mut view = CatalogView::new(vec![book]);
        view.open_detail(0);
        view.apply_reviews(self.api.reviews(id).await);

        if let (Some(detail), Some(reviews)) = (view.current_detail(), view.detail().reviews()) {
            println!("{}", render::book_detail(&detail));
            println!();
            println!("Reviews");
            println!("-------");
            println!("{}", render::reviews(reviews));
        }
        Ok(())
    }

    async fn review(&self, book_id: &BookId, rating: u8, comment: Option<&str>) -> Result<()> {
        let review = match NewReview::new(rating, comment) {
            Ok(review) => review,
            Err(errors) => {
                print_field_errors(&errors);
                anyhow::bail!("Review not sent");
            }
        };

        match self.api.add_review(book_id, &review).await {
            Ok(()) => {
                println!("Review submitted. Thank you!");
                Ok(())
            }
            Err(ApiError::Forbidden(_)) => {
                anyhow::bail!("You are not permitted to review this book (a reservation is required)")
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    async fn reserve(&self, book_id: &BookId) -> Result<()> {
        self.api.reserve(book_id).await.map_err(|e| self.fail(e))?;
        println!("Book reserved. Collect it at the library.");
        Ok(())
    }

    async fn profile(&self) -> Result<()> {
        self.require_session()?;

        let profile = self.api.me().await.map_err(|e| self.fail(e))?;
        println!("{}", render::profile(&profile));
        println!();

        let entries = self
            .api
            .reservations_with_books()
            .await
            .map_err(|e| self.fail(e))?;

        println!("Reservations");
        println!("------------");
        if entries.is_empty() {
            println!("No reservations yet.");
        }
        for (reservation, book) in &entries {
            println!("{}", render::reservation(reservation, book.as_ref()));
        }
        Ok(())
    }

    async fn avatar(&self, path: &std::path::Path) -> Result<()> {
        self.require_session()?;

        let data_url = image_data_url(path)?;
        self.api
            .upload_profile_image(&data_url)
            .await
            .map_err(|e| self.fail(e))?;

        println!("Profile image updated.");
        Ok(())
    }

    async fn delete_account(&self, confirmed: bool) -> Result<()> {
        self.require_session()?;
        if !confirmed {
            anyhow::bail!("This permanently deletes the account. Pass --yes to confirm.");
        }

        match self.api.delete_account().await {
            Ok(()) => {
                self.store.clear()?;
                println!("Account deleted.");
                Ok(())
            }
            Err(ApiError::Forbidden(_)) => anyhow::bail!("Access denied"),
            Err(ApiError::Status { status, .. }) => {
                anyhow::bail!("Account deletion failed ({})", status)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    async fn admin(&self, command: AdminCommands) -> Result<()> {
        if !self.api.has_token() {
            anyhow::bail!("Login required");
        }
        match self.api.require_admin().await {
            Ok(profile) => {
                tracing::debug!(username = %profile.display_name(), "Admin access granted")
            }
            Err(ApiError::Forbidden(_)) => anyhow::bail!("Admins only"),
            Err(_) => anyhow::bail!("Login required"),
        }

        match command {
            AdminCommands::AddBook {
                title,
                author,
                genre,
                year,
                copies,
                cover_url,
                description,
            } => {
                let book = NewBook {
                    title,
                    author,
                    genre,
                    publication_year: year,
                    copies_available: copies,
                    cover_image_url: cover_url,
                    description,
                };
                match self.api.add_book(book).await {
                    Ok(()) => println!("Book added."),
                    Err(ApiError::Validation(errors)) => {
                        print_field_errors(&errors);
                        anyhow::bail!("Book not added");
                    }
                    Err(e) => return Err(self.fail(e)),
                }
            }
            AdminCommands::DeleteBook { id } => {
                self.api
                    .delete_book(&BookId::from(id.as_str()))
                    .await
                    .map_err(|e| self.fail(e))?;
                println!("Book deleted.");
            }
            AdminCommands::DeleteReview { id } => {
                self.api.delete_review(id).await.map_err(|e| self.fail(e))?;
                println!("Review deleted.");
            }
        }
        Ok(())
    }
}

fn print_field_errors(errors: &FieldErrors) {
    for (field, message) in errors.iter() {
        eprintln!("  {}: {}", field, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("smartlibrary").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_add_book_copies_default_to_zero() {
        let cli = parse(&["admin", "add-book", "--title", "Emma", "--author", "Austen", "--genre", "Romance"]);
        match cli.command {
            Commands::Admin(AdminCommands::AddBook { copies, year, .. }) => {
                assert_eq!(copies, 0);
                assert_eq!(year, None);
            }
            _ => panic!("expected admin add-book"),
        }
    }

    #[test]
    fn test_volumes_url_reaches_config() {
        let temp = tempfile::TempDir::new().unwrap();
        let data_dir = temp.path().to_string_lossy().into_owned();
        let cli = parse(&[
            "--data-dir",
            data_dir.as_str(),
            "--volumes-url",
            "http://localhost:9999/volumes",
            "search",
            "dune",
        ]);
        let config = App::new(&cli).unwrap().config;
        assert_eq!(config.volumes_url, "http://localhost:9999/volumes");
    }
}
