use std::error::Error;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use item_search::commands::parse_date_arg;
use item_search::{AppConfig, AppError, BackendKind, SearchArgs, Services};
use item_search_shared::datetime::now_formatted;
use item_search_shared::{ItemDocument, Page};

#[derive(Parser)]
#[command(name = "item-search")]
#[command(about = "Load and search the item index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// OpenSearch URL (overrides OPENSEARCH_URL)
    #[arg(long, global = true)]
    opensearch_url: Option<String>,

    /// Index name (overrides INDEX_NAME)
    #[arg(long, global = true)]
    index_name: Option<String>,

    /// Search backend: opensearch or memory (overrides SEARCH_BACKEND)
    #[arg(long, global = true)]
    backend: Option<BackendKind>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the index with the item mappings
    CreateIndex,
    /// Index the five demo items one by one
    IndexSamples,
    /// Index a single item
    IndexOne {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        brand: Option<String>,
        #[arg(long)]
        price: Option<f64>,
        #[arg(long)]
        images: Option<String>,
        /// Creation time, defaults to now
        #[arg(long)]
        create_time: Option<String>,
    },
    /// Bulk-index generated items with staggered creation times
    BulkIndex {
        #[arg(long, default_value = "994")]
        count: usize,
        #[arg(long, default_value = "6")]
        start_id: i64,
        /// Documents per bulk write (overrides BULK_BATCH_SIZE)
        #[arg(long)]
        batch_size: Option<usize>,
        /// Date the creation times count back from, defaults to now
        #[arg(long)]
        base_date: Option<String>,
    },
    /// Search items
    Search(SearchArgs),
    /// Fetch an item by id
    Get { id: i64 },
    /// Check whether an item exists
    Exists { id: i64 },
    /// Count indexed items
    Count,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let fmt = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        fmt.json().init();
    } else {
        fmt.init();
    }
}

fn load_config(cli: &Cli) -> Result<AppConfig, AppError> {
    let mut config = AppConfig::from_env()?;

    if let Some(url) = &cli.opensearch_url {
        config.opensearch_url = url.clone();
    }
    if let Some(name) = &cli.index_name {
        config.index.name = name.clone();
    }
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }
    Ok(config)
}

fn print_page(page: &Page<ItemDocument>) {
    println!(
        "total={} pages={} page={} size={}",
        page.total_elements(),
        page.total_pages(),
        page.number(),
        page.size()
    );
    for item in page {
        println!("{} showTime={}", item, item.show_time.as_deref().unwrap_or(""));
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let config = load_config(&cli)?;
    let services = Services::connect(&config).await?;

    match cli.command {
        Commands::CreateIndex => {
            let created = services.create_index().await?;
            println!("{}", created);
        }
        Commands::IndexSamples => {
            let count = services
                .index_samples(chrono::Utc::now().timestamp_millis())
                .await?;
            println!("{}", count);
        }
        Commands::IndexOne {
            id,
            title,
            category,
            brand,
            price,
            images,
            create_time,
        } => {
            let create_time = match create_time {
                Some(text) => parse_date_arg(&text)?,
                None => chrono::Utc::now().timestamp_millis(),
            };

            let mut item = ItemDocument::new(id).with_create_time(Some(create_time));
            item.title = title;
            item.category = category;
            item.brand = brand;
            item.price = price;
            item.images = images;

            services.index_one(&item).await?;
            println!("{}", item);
        }
        Commands::BulkIndex {
            count,
            start_id,
            batch_size,
            base_date,
        } => {
            let base_date = base_date.unwrap_or_else(now_formatted);
            let summary = services
                .bulk_index(start_id, count, &base_date, batch_size)
                .await?;
            info!(
                documents = summary.documents,
                batches = summary.batches,
                index_created = summary.index_created,
                "Bulk index finished"
            );
            println!("{}", summary.documents);
        }
        Commands::Search(args) => {
            let page = services.search(&args).await?;
            print_page(&page);
        }
        Commands::Get { id } => match services.client.find_by_id(id).await? {
            Some(item) => println!("{}", item),
            None => println!("not found"),
        },
        Commands::Exists { id } => {
            println!("{}", services.client.exists_by_id(id).await?);
        }
        Commands::Count => {
            println!("{}", services.client.count().await?);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        error!("Command failed: {}", e);
        eprintln!("Error: {}", e);

        let mut source = e.source();
        while let Some(err) = source {
            eprintln!("  Caused by: {}", err);
            source = err.source();
        }

        std::process::exit(1);
    }
}
