use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use secrecy::{ExposeSecret, SecretString};
use std::io::BufRead;
use std::path::PathBuf;

use newsdesk::auth::{Access, AuthService};
use newsdesk::browse::ArticleBrowser;
use newsdesk::config::Config;
use newsdesk::console::{ConsoleState, Modal};
use newsdesk::filter::category_options;
use newsdesk::model::{Article, Category, QueryParams, Role};
use newsdesk::query::{CategoriesQuery, QueryResult};
use newsdesk::remote::{ArticleDraft, CategorySource, RemoteClient, SnapshotSource};
use newsdesk::util::{excerpt, truncate_to_width};

const TITLE_WIDTH: usize = 48;
const EXCERPT_WIDTH: usize = 72;

#[derive(Parser, Debug)]
#[command(name = "newsdesk", about = "Browse and manage a newsdesk publishing site")]
struct Cli {
    /// Config file (default: ~/.config/newsdesk/config.toml)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// API base URL, overrides the config file
    #[arg(long, value_name = "URL", global = true)]
    api: Option<String>,

    /// Snapshot location (URL or directory), overrides the config file
    #[arg(long, value_name = "LOCATION", global = true)]
    fallback: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct ListArgs {
    #[arg(long, default_value_t = 1)]
    page: usize,
    /// Items per page (default: page_size from config)
    #[arg(long)]
    limit: Option<usize>,
    #[arg(long)]
    search: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List articles
    Articles {
        #[command(flatten)]
        list: ListArgs,
        /// Category name, or "all"
        #[arg(long)]
        category: Option<String>,
    },
    /// List categories
    Categories {
        #[command(flatten)]
        list: ListArgs,
    },
    /// Print the category selector options
    CategoryNames,
    /// Show one article
    Article { id: String },
    /// Sign in and print the API token (password read from stdin)
    Login { username: String },
    /// Create an account (password read from stdin)
    Register {
        username: String,
        #[arg(long)]
        admin: bool,
    },
    /// Show the user the API token belongs to
    Whoami,
    /// Create, rename or delete a category (admin)
    #[command(subcommand)]
    Category(CategoryCommand),
    /// Create or delete an article (admin)
    #[command(subcommand)]
    Post(PostCommand),
}

#[derive(Subcommand, Debug)]
enum CategoryCommand {
    Create { name: String },
    Rename { id: String, name: String },
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
enum PostCommand {
    Create {
        #[arg(long)]
        title: String,
        /// Article body (HTML); "-" reads it from stdin
        #[arg(long)]
        content: String,
        #[arg(long)]
        category_id: String,
        #[arg(long)]
        image_url: Option<String>,
    },
    Delete { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config_path = match &cli.config {
        Some(path) => Some(path.clone()),
        None => Config::default_path(),
    };
    let config = match &config_path {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    let api = cli.api.as_deref().unwrap_or(&config.api_base_url);
    let fallback = cli.fallback.as_deref().unwrap_or(&config.fallback_base);
    let snapshot = SnapshotSource::parse(fallback).context("Invalid fallback location")?;
    let client = RemoteClient::new(api, snapshot)
        .with_context(|| format!("Invalid API base URL '{api}'"))?
        .with_timeout(config.request_timeout());

    match cli.command {
        Command::Articles { list, category } => {
            let page_size = list.limit.unwrap_or(config.grid_page_size);
            let mut browser = ArticleBrowser::new(client, page_size, config.search_debounce());
            if let Some(category) = category {
                browser.select_category(category);
            }
            if let Some(search) = list.search {
                browser.type_search(search);
                browser.submit_search();
            }
            browser.go_to_page(list.page);
            browser.load();
            let result = browser.settle().await;
            print_articles(result)?;
        }
        Command::Categories { list } => {
            let mut query = CategoriesQuery::new(CategorySource::new(client));
            query.set_params(list_params(&list, config.page_size));
            let result = query.settle().await;
            print_categories(result)?;
        }
        Command::CategoryNames => {
            for name in category_options(&CategorySource::new(client)).await {
                println!("{name}");
            }
        }
        Command::Article { id } => {
            let article = client
                .fetch_article(&id)
                .await
                .with_context(|| format!("Failed to fetch article {id}"))?;
            print_article(&article);
        }
        Command::Login { username } => {
            let password = read_password()?;
            let session = AuthService::new(client)
                .login(&username, &password)
                .await
                .context("Login failed")?;
            eprintln!("Signed in as {} ({:?})", session.user.username, session.user.role);
            // Printed so it can be exported as NEWSDESK_API_TOKEN
            println!("{}", session.token().expose_secret());
        }
        Command::Register { username, admin } => {
            let password = read_password()?;
            let role = if admin { Role::Admin } else { Role::User };
            let user = AuthService::new(client)
                .register(&username, &password, role)
                .await
                .context("Registration failed")?;
            println!("Registered {} ({:?})", user.username, user.role);
        }
        Command::Whoami => {
            let token = require_token(&config)?;
            let user = AuthService::new(client)
                .profile(&token)
                .await
                .context("Failed to fetch profile")?;
            println!("{} ({:?}, id {})", user.username, user.role, user.id);
        }
        Command::Category(command) => {
            let mut console = admin_console(client, &config).await?;
            let (modal, input) = match command {
                CategoryCommand::Create { name } => (Modal::CreateCategory, Some(name)),
                CategoryCommand::Rename { id, name } => (
                    Modal::EditCategory {
                        id,
                        name: String::new(),
                    },
                    Some(name),
                ),
                CategoryCommand::Delete { id } => (Modal::delete_category(id, String::new()), None),
            };
            console.open_modal(modal);
            let outcome = console
                .submit_modal(input.as_deref())
                .await
                .context("Category change failed")?;
            println!("{outcome:?}");
        }
        Command::Post(command) => {
            let mut console = admin_console(client, &config).await?;
            match command {
                PostCommand::Create {
                    title,
                    content,
                    category_id,
                    image_url,
                } => {
                    let content = if content == "-" {
                        std::io::read_to_string(std::io::stdin())
                            .context("Failed to read article content from stdin")?
                    } else {
                        content
                    };
                    let draft = ArticleDraft {
                        title,
                        content,
                        category_id,
                        image_url,
                    };
                    let article = console
                        .create_article(&draft)
                        .await
                        .context("Failed to create article")?;
                    println!("Created article {}", article.id);
                }
                PostCommand::Delete { id } => {
                    console.open_modal(Modal::delete_article(id, String::new()));
                    let outcome = console
                        .submit_modal(None)
                        .await
                        .context("Failed to delete article")?;
                    println!("{outcome:?}");
                }
            }
        }
    }

    Ok(())
}

fn list_params(list: &ListArgs, default_limit: usize) -> QueryParams {
    QueryParams::new(list.page, list.limit.unwrap_or(default_limit))
        .with_search(list.search.clone().unwrap_or_default())
}

fn read_password() -> Result<SecretString> {
    eprint!("Password: ");
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read password from stdin")?;
    Ok(SecretString::from(line.trim_end_matches(['\r', '\n']).to_owned()))
}

fn require_token(config: &Config) -> Result<SecretString> {
    config.api_token().ok_or_else(|| {
        anyhow::anyhow!("No API token: set NEWSDESK_API_TOKEN or api_token in the config file")
    })
}

async fn admin_console(client: RemoteClient, config: &Config) -> Result<ConsoleState> {
    let token = require_token(config)?;
    let session = AuthService::new(client.clone())
        .restore(token)
        .await
        .ok_or_else(|| anyhow::anyhow!("API token was rejected; log in again"))?;

    let mut console = ConsoleState::new(client);
    console.sign_in(session);
    match console.access() {
        Access::Granted => Ok(console),
        Access::RedirectToHome => anyhow::bail!("This command requires an admin account"),
        Access::RedirectToLogin => anyhow::bail!("Not signed in"),
    }
}

fn check_error<T>(result: &QueryResult<T>) -> Result<()> {
    match &result.error {
        Some(e) => Err(anyhow::anyhow!("{e}")),
        None => Ok(()),
    }
}

fn print_articles(result: &QueryResult<Article>) -> Result<()> {
    check_error(result)?;
    for article in result.items.iter() {
        println!(
            "{:>6}  {:<14}  {}",
            article.id,
            truncate_to_width(article.category_name().unwrap_or("-"), 14),
            truncate_to_width(&article.title, TITLE_WIDTH)
        );
        let summary = excerpt(&article.content, EXCERPT_WIDTH);
        if !summary.is_empty() {
            println!("        {summary}");
        }
    }
    println!(
        "Page {}/{} ({} articles)",
        result.page,
        result.total_pages(),
        result.total
    );
    Ok(())
}

fn print_categories(result: &QueryResult<Category>) -> Result<()> {
    check_error(result)?;
    for category in result.items.iter() {
        println!("{:>6}  {}", category.id, category.name);
    }
    println!(
        "Page {}/{} ({} categories)",
        result.page,
        result.total_pages(),
        result.total
    );
    Ok(())
}

fn print_article(article: &Article) {
    println!("{}", article.title);
    if let Some(category) = article.category_name() {
        println!("Category: {category}");
    }
    if let Some(user) = &article.user {
        println!("By: {}", user.username);
    }
    if let Some(created) = article.created_at {
        println!("Published: {}", created.format("%Y-%m-%d %H:%M"));
    }
    println!();
    println!("{}", excerpt(&article.content, usize::MAX));
}
