use bscr::{
    SearchQuery,
    config::{DbConfig, ScrapeConfig},
    db::{PgStore, connect},
    pipeline::{Stored, persist, scrape},
    render,
    scrape::ChromeDriver,
};
use chrono::NaiveDate;

#[derive(clap::Parser)]
#[command(about = "Search bus listings from the command line")]
struct Args {
    #[command(subcommand)]
    command: Commands,
    #[command(flatten)]
    db: DbConfig,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Run one search, print the listings and save them
    Search {
        #[arg(long = "from", value_name = "ORIGIN")]
        source: String,
        #[arg(long = "to", value_name = "DESTINATION")]
        destination: String,
        /// Travel date, YYYY-MM-DD
        #[arg(long)]
        date: NaiveDate,
        /// Print only, do not touch the database
        #[arg(long)]
        no_store: bool,
        /// Print listings as JSON instead of a table
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        scrape: ScrapeConfig,
    },
    /// Create the listings table if it does not exist
    InitDb,
    /// Remove every saved listing
    Truncate,
    /// Show the most recently saved listings
    History {
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: i64,
        #[arg(long)]
        json: bool,
    },
}

async fn store(db: &DbConfig) -> anyhow::Result<PgStore> {
    let store = PgStore::new(connect(db).await?);
    store.ensure_schema().await?;
    Ok(store)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use clap::Parser;

    pretty_env_logger::init_timed();

    let args = Args::parse();

    match args.command {
        Commands::Search {
            source,
            destination,
            date,
            no_store,
            json,
            scrape: config,
        } => {
            let query = SearchQuery::new(&source, &destination, date)?;
            let driver = ChromeDriver::new(config);

            let listings = match scrape(&driver, &query).await {
                Ok(l) => l,
                Err(e) => {
                    tracing::error!(target: "scrape", "{e}");
                    anyhow::bail!(e.user_message());
                }
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&listings)?);
            } else {
                print!("{}", render::text_table(&listings));
            }

            if !no_store {
                let store = store(&args.db).await?;
                match persist(&store, &query, &listings).await {
                    Stored::Skipped => (),
                    Stored::Rows(n) => eprintln!("saved {n} rows"),
                    Stored::Failed(e) => anyhow::bail!("could not save listings: {e}"),
                }
            }
        }
        Commands::InitDb => {
            store(&args.db).await?;
        }
        Commands::Truncate => {
            store(&args.db).await?.truncate().await?;
        }
        Commands::History { limit, json } => {
            let rows = store(&args.db).await?.recent(limit.max(1)).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                for row in &rows {
                    println!(
                        "#{:<6} {} -> {} {}  {}  {} - {} ({})  {}",
                        row.id,
                        row.query.source,
                        row.query.destination,
                        row.query.date,
                        row.listing.operator,
                        row.listing.departure_time,
                        row.listing.arrival_time,
                        row.listing.duration,
                        render::format_price(row.listing.price),
                    );
                }
                println!("{} rows", rows.len());
            }
        }
    }

    Ok(())
}
