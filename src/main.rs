use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use tracing_subscriber::EnvFilter;

use cookpress::config::{Config, ConfigArgs};
use cookpress::wordpress::{MetaFilter, NewComment, Pagination, SearchFilters};
use cookpress::ContentClient;

#[derive(Parser, Debug)]
#[command(name = "cookpress", about = "Query a WordPress recipe site's content API")]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Latest posts
    Posts {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        size: Option<u32>,
    },
    /// One post by slug, or by id with --id
    Post {
        slug: Option<String>,
        #[arg(long)]
        id: Option<u64>,
    },
    /// Recipe fields of a post
    Recipe { post_id: u64 },
    /// Search posts with optional taxonomy and recipe filters
    Search {
        query: Option<String>,
        #[arg(long = "category")]
        categories: Vec<u64>,
        #[arg(long = "tag")]
        tags: Vec<u64>,
        /// Cooking time in minutes
        #[arg(long)]
        time: Option<String>,
        #[arg(long)]
        difficulty: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// A category and its posts
    Category {
        slug: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// A tag and its posts
    Tag {
        slug: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// An author and their posts
    Author {
        slug: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Posts from a year, or one month of it
    Archive {
        year: i32,
        month: Option<u32>,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Archive months with post counts
    Archives,
    Recent {
        #[arg(long, default_value_t = 5)]
        limit: u32,
    },
    Popular {
        #[arg(long, default_value_t = 5)]
        limit: u32,
    },
    /// Sticky posts
    Featured,
    /// Posts sharing a category with the given post
    Related {
        slug: String,
        #[arg(long, default_value_t = 3)]
        limit: u32,
    },
    /// Previous and next posts by publish date
    Adjacent { slug: String },
    /// Posts of a custom post type
    Custom {
        post_type: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    Categories,
    Tags,
    /// Categories and tags offered as search filters
    Facets,
    Taxonomies,
    Terms { taxonomy: String },
    Comments { post_id: u64 },
    RecentComments {
        #[arg(long, default_value_t = 5)]
        limit: u32,
    },
    /// Submit a comment on a post
    Comment {
        post_id: u64,
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        content: String,
        #[arg(long)]
        parent: Option<u64>,
    },
    Pages {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    Page { slug: String },
    Media { id: u64 },
    Menus,
    MenuLocations,
    Menu { location: String },
    Navigation { id: u64 },
    NavigationItems { id: u64 },
    /// Site-wide search across content types
    Find {
        keyword: String,
        #[arg(long, default_value = "post")]
        kind: String,
    },
    Site,
    Types,
    /// Total post and page counts
    Totals,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;
    tracing::debug!("Content API: {}", config.api.base_url);

    let client = ContentClient::new(&config)?;
    run(&client, cli.command).await
}

async fn run(client: &ContentClient, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Posts { page, size } => {
            let pagination = Pagination {
                page,
                per_page: size,
            };
            print_json(&client.posts(pagination).await?)
        }
        Command::Post { slug, id } => match (id, slug) {
            (Some(id), _) => print_json(&client.post(id).await?),
            (None, Some(slug)) => print_json(&client.post_by_slug(&slug).await?),
            (None, None) => anyhow::bail!("either a slug or --id is required"),
        },
        Command::Recipe { post_id } => print_json(&client.recipe_details(post_id).await?),
        Command::Search {
            query,
            categories,
            tags,
            time,
            difficulty,
            page,
        } => {
            let filters = SearchFilters {
                query,
                categories,
                tags,
                meta: MetaFilter {
                    cooking_time: time,
                    difficulty,
                },
                pagination: Pagination::page(page),
            };
            print_json(&client.search_with_filters(&filters).await?)
        }
        Command::Category { slug, page } => {
            let category = client.category_by_slug(&slug).await?;
            let posts = client
                .posts_by_category(category.id, Pagination::page(page))
                .await?;
            print_json(&json!({ "category": category, "posts": posts }))
        }
        Command::Tag { slug, page } => {
            let tag = client.tag_by_slug(&slug).await?;
            let posts = client.posts_by_tag(tag.id, Pagination::page(page)).await?;
            print_json(&json!({ "tag": tag, "posts": posts }))
        }
        Command::Author { slug, page } => {
            let author = client.author_by_slug(&slug).await?;
            let posts = client
                .posts_by_author(author.id, Pagination::page(page))
                .await?;
            print_json(&json!({ "author": author, "posts": posts }))
        }
        Command::Archive { year, month, page } => print_json(
            &client
                .posts_by_date(year, month, Pagination::page(page))
                .await?,
        ),
        Command::Archives => print_json(&client.archive_months().await?),
        Command::Recent { limit } => print_json(&client.recent_posts(limit).await?),
        Command::Popular { limit } => print_json(&client.popular_posts(limit).await?),
        Command::Featured => print_json(&client.featured_posts().await?),
        Command::Related { slug, limit } => {
            let post = client.post_by_slug(&slug).await?;
            print_json(
                &client
                    .related_posts(post.id, &post.categories, limit)
                    .await?,
            )
        }
        Command::Adjacent { slug } => {
            let post = client.post_by_slug(&slug).await?;
            let (previous, next) =
                tokio::try_join!(client.previous_post(&post), client.next_post(&post))?;
            print_json(&json!({ "previous": previous, "next": next }))
        }
        Command::Custom { post_type, page } => print_json(
            &client
                .custom_posts(&post_type, Pagination::page(page))
                .await?,
        ),
        Command::Categories => print_json(&client.categories().await?),
        Command::Tags => print_json(&client.tags().await?),
        Command::Facets => print_json(&client.search_facets().await?),
        Command::Taxonomies => print_json(&client.taxonomies().await?),
        Command::Terms { taxonomy } => print_json(&client.terms(&taxonomy).await?),
        Command::Comments { post_id } => print_json(&client.comments(post_id).await?),
        Command::RecentComments { limit } => print_json(&client.recent_comments(limit).await?),
        Command::Comment {
            post_id,
            name,
            email,
            content,
            parent,
        } => {
            let comment = NewComment {
                post: post_id,
                author_name: name,
                author_email: email,
                content,
                parent,
            };
            let created = client.submit_comment(&comment).await?;
            tracing::info!("Submitted comment {} on post {}", created.id, post_id);
            print_json(&created)
        }
        Command::Pages { page } => print_json(&client.pages(Pagination::page(page)).await?),
        Command::Page { slug } => print_json(&client.page_by_slug(&slug).await?),
        Command::Media { id } => print_json(&client.media(id).await?),
        Command::Menus => print_json(&client.menus().await?),
        Command::MenuLocations => print_json(&client.menu_locations().await?),
        Command::Menu { location } => print_json(&client.menu_by_location(&location).await?),
        Command::Navigation { id } => print_json(&client.navigation(id).await?),
        Command::NavigationItems { id } => print_json(&client.navigation_items(id).await?),
        Command::Find { keyword, kind } => {
            print_json(&client.search_content(&keyword, &kind).await?)
        }
        Command::Site => print_json(&client.site_info().await?),
        Command::Types => print_json(&client.post_types().await?),
        Command::Totals => {
            let (total_posts, total_pages) =
                tokio::try_join!(client.total_posts(), client.total_pages())?;
            print_json(&json!({ "total_posts": total_posts, "total_pages": total_pages }))
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
