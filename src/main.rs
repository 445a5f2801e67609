//! catalog-console - command-line front end for the catalog access layer
//!
//! Each subcommand plays one user action: initialize the schema, log in,
//! browse products with a filter, or add a product. Connection settings come
//! from `DB_*` environment variables (or a `.env` file).

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use catalog_access::handlers::{
    self, CategoryChoice, LoginForm, NewProductForm, Notice, Page, ProductFilter, PRICE_MAX,
    PRICE_MIN,
};
use catalog_access::{CatalogStore, DbConfig, Session};

#[derive(Parser, Debug)]
#[command(name = "catalog-console", version, about = "Product catalog with user logins")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug)]
struct Credentials {
    #[arg(long, short = 'u')]
    username: String,

    #[arg(long, short = 'p')]
    password: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create tables and seed the admin account and sample products
    Init,

    /// Check a username and password
    Login {
        #[command(flatten)]
        credentials: Credentials,
    },

    /// Log in and list products matching a filter
    Products {
        #[command(flatten)]
        credentials: Credentials,

        /// Category to show ("All" for every category)
        #[arg(long, default_value = "All")]
        category: String,

        #[arg(long, default_value_t = PRICE_MIN)]
        min_price: Decimal,

        #[arg(long, default_value_t = PRICE_MAX)]
        max_price: Decimal,
    },

    /// Log in and add a product
    AddProduct {
        #[command(flatten)]
        credentials: Credentials,

        #[arg(long)]
        name: String,

        #[arg(long)]
        category: String,

        #[arg(long)]
        price: Decimal,

        #[arg(long, default_value_t = 0)]
        inventory: u32,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,catalog_access=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = DbConfig::from_env();
    tracing::debug!(?config, "Configuration loaded");

    let store = match CatalogStore::connect(&config).await {
        Ok(store) => store,
        Err(err) => {
            eprintln!("Database unavailable: {err}");
            std::process::exit(1);
        }
    };

    let mut session = Session::new();

    match cli.command {
        Command::Init => {
            store.initialize_database().await?;
            println!("Database initialized");
        }
        Command::Login { credentials } => {
            if log_in(&store, &mut session, credentials).await {
                println!("Logged in as {}", session.username().unwrap_or_default());
            }
        }
        Command::Products {
            credentials,
            category,
            min_price,
            max_price,
        } => {
            if !log_in(&store, &mut session, credentials).await {
                return Ok(());
            }
            let filter =
                ProductFilter::new(CategoryChoice::from(category.as_str()), min_price, max_price);
            match handlers::render(&store, &session, &filter).await {
                Page::Products(view) => {
                    println!("{}", view.welcome);
                    let options: Vec<String> =
                        view.categories.iter().map(ToString::to_string).collect();
                    println!("Categories: {}", options.join(", "));
                    println!("Showing: {}", view.selected_category);
                    print_notices(&view.notices);
                    if let Some(products) = view.products {
                        print!("{products}");
                    }
                }
                Page::Login(view) => print_notices(&view.notices),
            }
            handlers::logout(&mut session);
        }
        Command::AddProduct {
            credentials,
            name,
            category,
            price,
            inventory,
        } => {
            if !log_in(&store, &mut session, credentials).await {
                return Ok(());
            }
            let form = NewProductForm {
                name,
                category,
                price,
                inventory,
            };
            let notice = handlers::add_product(&store, &session, &form).await;
            println!("{notice}");
            handlers::logout(&mut session);
        }
    }

    store.pool().close().await;
    Ok(())
}

async fn log_in(store: &CatalogStore, session: &mut Session, credentials: Credentials) -> bool {
    let form = LoginForm {
        username: credentials.username,
        password: credentials.password,
    };
    let view = handlers::login(store, session, &form).await;
    print_notices(&view.notices);
    session.is_authenticated()
}

fn print_notices(notices: &[Notice]) {
    for notice in notices {
        println!("{notice}");
    }
}
