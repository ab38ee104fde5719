use std::io::{self, Write};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tarih_blog::articles::{self, ABOUT, AUTHOR, Article};
use tarih_blog::catalog::Category;
use tarih_blog::config::{ConfigError, ServiceConfig, SiteConfig};
use tarih_blog::remote::{self, ServiceError, SupabaseClient};
use tarih_blog::services::auth_flow::{AuthFlow, FlowError, FlowOutcome};
use tarih_blog::services::saved::{SaveError, ToggleOutcome};
use tarih_blog::state::AppState;
use tarih_blog::view::{RouteError, View};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Service(#[from] ServiceError),
    #[error("{0}")]
    Save(#[from] SaveError),
    #[error("{0}")]
    Flow(#[from] FlowError),
    #[error("{0}")]
    Route(#[from] RouteError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("input closed before {0} was entered")]
    InputClosed(&'static str),
    #[error("not signed in; run `tarih-blog login` first")]
    NotSignedIn,
    #[error("{0}")]
    Rejected(String),
}

#[derive(Parser, Debug)]
#[command(name = "tarih-blog", about = "Digital history blog reader")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List articles, optionally filtered by category or saved state.
    List {
        #[arg(long, default_value = "all", help = "Tümü, Teknoloji, Analiz, Eğitim, or any tag text")]
        category: Category,
        #[arg(long, default_value_t = false)]
        saved: bool,
    },
    /// Print one article as raw markdown.
    Read { id: String },
    About,
    /// Sign in with email, password, and an emailed one-time code.
    Login {
        #[arg(long, env = "BLOG_EMAIL")]
        email: Option<String>,
    },
    Register {
        #[arg(long, env = "BLOG_EMAIL")]
        email: Option<String>,
    },
    /// Request a password-reset email.
    Forgot {
        #[arg(long, env = "BLOG_EMAIL")]
        email: Option<String>,
    },
    Whoami,
    /// Save the article, or remove it if already saved.
    Save { id: String },
    Logout,
    /// Change the password of the signed-in account.
    Password,
    /// Open a confirmation or password-recovery link from an email.
    Recover { url: String },
    DeleteAccount {
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
}

struct Prompt {
    lines: Lines<BufReader<Stdin>>,
}

impl Prompt {
    fn new() -> Self {
        Self { lines: BufReader::new(tokio::io::stdin()).lines() }
    }

    async fn ask(&mut self, label: &'static str) -> Result<String, CliError> {
        print!("{label}: ");
        io::stdout().flush()?;
        self.lines.next_line().await?.ok_or(CliError::InputClosed(label))
    }

    async fn ask_or(&mut self, given: Option<String>, label: &'static str) -> Result<String, CliError> {
        match given {
            Some(value) => Ok(value),
            None => self.ask(label).await,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt().with_writer(io::stderr).init();
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            tracing::warn!(error = %e, "failed to load .env");
        }
    }

    let cli = Cli::parse();
    let site = SiteConfig::from_env();
    let service = ServiceConfig::from_env();
    if matches!(cli.command, Command::Login { .. } | Command::Recover { .. })
        && service.as_ref().is_ok_and(|c| c.session_file.is_none())
    {
        tracing::warn!("BLOG_SESSION_FILE not set; the session ends with this command");
    }

    let mut prompt = Prompt::new();
    match cli.command {
        Command::About => {
            println!("{AUTHOR}\n\n{ABOUT}");
            Ok(())
        }
        Command::Recover { url } => run_recover(service?, site, &url, &mut prompt).await,
        command => {
            let mut app = AppState::new(remote::connect(service), site);
            app.bootstrap().await;
            run(&mut app, command, &mut prompt).await
        }
    }
}

async fn run(app: &mut AppState, command: Command, prompt: &mut Prompt) -> Result<(), CliError> {
    match command {
        Command::List { category, saved } => run_list(app, category, saved),
        Command::Read { id } => run_read(app, &id),
        Command::Login { email } => run_login(app, email, prompt).await,
        Command::Register { email } => run_register(app, email, prompt).await,
        Command::Forgot { email } => run_forgot(app, email, prompt).await,
        Command::Whoami => {
            match app.session() {
                Some(session) => {
                    println!("{} ({})", session.email(), session.user_id());
                    println!("{} saved article(s)", app.saved().len());
                }
                None => println!("not signed in"),
            }
            Ok(())
        }
        Command::Save { id } => run_save(app, &id).await,
        Command::Logout => {
            if !app.is_signed_in() {
                println!("not signed in");
                return Ok(());
            }
            app.logout().await;
            println!("signed out");
            Ok(())
        }
        Command::Password => {
            app.open_settings().map_err(|_| CliError::NotSignedIn)?;
            let password = prompt.ask("new password").await?;
            app.update_password(&password).await?;
            println!("password updated");
            Ok(())
        }
        Command::DeleteAccount { yes } => {
            app.open_settings().map_err(|_| CliError::NotSignedIn)?;
            app.delete_account(yes).await?;
            println!("account deleted");
            Ok(())
        }
        Command::About | Command::Recover { .. } => Ok(()),
    }
}

// =============================================================================
// CATALOG
// =============================================================================

fn run_list(app: &mut AppState, category: Category, saved: bool) -> Result<(), CliError> {
    if saved {
        if app.navigate(View::Saved)? != &View::Saved {
            return Err(CliError::NotSignedIn);
        }
    } else {
        app.select_category(category);
    }

    let articles = app.visible_articles();
    if articles.is_empty() {
        println!("no articles");
    }
    for article in articles {
        let marker = if app.saved().contains(article.id) { "*" } else { " " };
        println!(
            "{marker} {:>2}  {}  [{}, {} dk]",
            article.id,
            article.title,
            article.primary_tag().unwrap_or("-"),
            article.read_time_minutes
        );
    }
    Ok(())
}

fn run_read(app: &mut AppState, id: &str) -> Result<(), CliError> {
    app.navigate(View::Article(id.to_owned()))?;
    let article: &Article = articles::find(id).ok_or_else(|| RouteError::UnknownArticle(id.to_owned()))?;
    println!("# {}\n", article.title);
    println!("{} · {} · {} dk · impact: {}", article.author, article.date, article.read_time_minutes, article.impact);
    println!("{}\n", article.tags.join(" "));
    if app.saved().contains(article.id) {
        println!("(saved)\n");
    }
    println!("{}", article.body_markdown);
    Ok(())
}

async fn run_save(app: &mut AppState, id: &str) -> Result<(), CliError> {
    let result = app.toggle_save(id).await;
    if let Some(alert) = app.acknowledge_alert() {
        eprintln!("{alert}");
    }
    match result? {
        ToggleOutcome::Saved => println!("saved article {id}"),
        ToggleOutcome::Removed => println!("removed article {id} from saved"),
    }
    Ok(())
}

// =============================================================================
// AUTH
// =============================================================================

fn active_flow(app: &AppState) -> Result<AuthFlow, CliError> {
    app.auth_flow().cloned().ok_or(CliError::Flow(FlowError::Unmounted))
}

/// Print the flow's message and turn a failed submit into an error.
fn report(flow: &AuthFlow, outcome: &FlowOutcome) -> Result<(), CliError> {
    let message = flow.snapshot().message;
    match (outcome, message) {
        (FlowOutcome::Failed(_), Some(m)) => Err(CliError::Rejected(m.text().to_owned())),
        (_, Some(m)) if m.is_error() => Err(CliError::Rejected(m.text().to_owned())),
        (_, Some(m)) => {
            println!("{}", m.text());
            Ok(())
        }
        (_, None) => Ok(()),
    }
}

async fn run_login(app: &mut AppState, email: Option<String>, prompt: &mut Prompt) -> Result<(), CliError> {
    app.navigate(View::Login)?;
    let flow = active_flow(app)?;
    flow.set_email(&prompt.ask_or(email, "email").await?)?;
    flow.set_password(&prompt.ask("password").await?)?;
    let outcome = flow.submit().await?;
    report(&flow, &outcome)?;

    loop {
        let code = prompt.ask("one-time code (empty to cancel)").await?;
        if code.trim().is_empty() {
            flow.back()?;
            println!("cancelled");
            return Ok(());
        }
        flow.set_code(&code)?;
        let outcome = flow.submit().await?;
        match report(&flow, &outcome) {
            Ok(()) => {
                app.handle_flow_outcome(&outcome).await;
                if let Some(session) = app.session() {
                    println!("signed in as {}", session.email());
                }
                return Ok(());
            }
            Err(e) => eprintln!("{e}"),
        }
    }
}

async fn run_register(app: &mut AppState, email: Option<String>, prompt: &mut Prompt) -> Result<(), CliError> {
    app.navigate(View::Register)?;
    let flow = active_flow(app)?;
    flow.set_email(&prompt.ask_or(email, "email").await?)?;
    flow.set_password(&prompt.ask("password").await?)?;
    let outcome = flow.submit().await?;
    report(&flow, &outcome)?;
    app.handle_flow_outcome(&outcome).await;
    Ok(())
}

async fn run_forgot(app: &mut AppState, email: Option<String>, prompt: &mut Prompt) -> Result<(), CliError> {
    app.navigate(View::Login)?;
    let flow = active_flow(app)?;
    flow.set_email(&prompt.ask_or(email, "email").await?)?;
    flow.choose_forgot_password()?;
    let outcome = flow.submit().await?;
    report(&flow, &outcome)
}

async fn run_recover(config: ServiceConfig, site: SiteConfig, url: &str, prompt: &mut Prompt) -> Result<(), CliError> {
    let client = Arc::new(SupabaseClient::new(config)?);
    let mut app = AppState::new(client.clone(), site);
    app.bootstrap().await;

    client.session_from_redirect(url).await?;
    app.drain_auth_events().await;
    if !app.account().in_recovery() {
        if let Some(session) = app.session() {
            println!("signed in as {}", session.email());
        }
        return Ok(());
    }

    let password = prompt.ask("new password").await?;
    app.update_password(&password).await?;
    println!("password updated");
    Ok(())
}
