use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use movie_browser::media::{image_url, truncate_description, ImageSize};
use movie_browser::{AppSettings, BrowseRequest, DiscoverFilters, MovieBrowser, SortOption};

#[derive(Debug, Parser)]
#[command(name = "movie-browser", version, about = "Discover movies and where to watch them")]
struct Cli {
    /// Language preferences, most preferred first (e.g. "fr-FR,en")
    #[arg(long, global = true)]
    language: Option<String>,

    /// Two-letter region used for release filters and streaming links
    #[arg(long, global = true)]
    region: Option<String>,

    /// Alternate config file instead of ~/.config/movie-browser/config.json
    #[arg(long, global = true)]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Discover movies, or search them when a query is given
    Browse {
        #[arg(short, long, default_value = "")]
        query: String,
        #[arg(long, default_value_t = SortOption::PopularityDesc)]
        sort: SortOption,
        #[arg(long)]
        year: Option<u32>,
        #[arg(long)]
        genre: Option<u64>,
        #[arg(long)]
        page: Option<u32>,
    },
    /// List movie genres
    Genres,
    /// Show the detail overlay of a movie
    Detail { id: u64 },
    /// List where a movie can be watched
    Providers { id: u64 },
}

fn load_settings(cli: &Cli) -> Result<AppSettings> {
    let mut settings = match &cli.config {
        Some(path) => AppSettings::load_from(path)
            .with_context(|| format!("loading {}", path.display()))?
            .with_overrides(|key| std::env::var(key).ok()),
        None => AppSettings::load(),
    };
    if let Some(language) = &cli.language {
        settings.language = language.clone();
    }
    if let Some(region) = &cli.region {
        settings.region = Some(region.clone());
    }
    Ok(settings)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = load_settings(&cli)?;
    let browser = MovieBrowser::from_settings(&settings)?;

    match cli.command {
        Command::Browse {
            query,
            sort,
            year,
            genre,
            page,
        } => {
            let request = BrowseRequest {
                query,
                filters: DiscoverFilters {
                    sort_by: sort,
                    year,
                    genre_id: genre,
                    page,
                },
            };
            let page = browser.browse(&request).await?;
            for movie in &page.results {
                println!(
                    "{:>8}  {} ({})  ★ {:.1}",
                    movie.id,
                    movie.title,
                    movie.year().map_or(String::from("----"), |y| y.to_string()),
                    movie.vote_average
                );
            }
            println!(
                "page {}/{} ({} results)",
                page.page, page.total_pages, page.total_results
            );
        }
        Command::Genres => {
            for genre in browser.genres().await? {
                println!("{:>6}  {}", genre.id, genre.name);
            }
        }
        Command::Detail { id } => {
            let overlay = browser.load_detail_overlay_by_id(id).await?;
            println!("{}", overlay.title);
            if let Some(poster) = &overlay.poster_path {
                println!("{}", image_url(poster, ImageSize::Poster));
            }
            if let Ok(Some(runtime)) = overlay.runtime {
                println!("{}h {:02}m", runtime / 60, runtime % 60);
            }
            println!("\n{}\n", truncate_description(&overlay.overview, 600));

            match &overlay.cast {
                Ok(_) => {
                    for member in overlay.top_cast(8) {
                        let profile = member
                            .profile_path
                            .as_deref()
                            .map(|p| image_url(p, ImageSize::Profile))
                            .unwrap_or_default();
                        println!("  {} as {}  {}", member.name, member.character, profile);
                    }
                }
                Err(err) => println!("  cast unavailable: {err}"),
            }

            if let Some(trailer) = overlay.best_trailer() {
                if let Some(url) = trailer.video.watch_url() {
                    println!("\ntrailer: {} ({} views)", url, trailer.view_count);
                }
            }

            print_links(&overlay.streaming_links);
        }
        Command::Providers { id } => {
            print_links(&browser.streaming_links(id).await);
        }
    }

    Ok(())
}

fn print_links(links: &[movie_browser::StreamingLink]) {
    if links.is_empty() {
        println!("\nno streaming links found");
        return;
    }
    println!("\nwatch on:");
    for link in links {
        let logo = link.logo_url.as_deref().unwrap_or_default();
        println!("  [{}] {}  {}  {}", link.kind, link.display_name(), link.web_url, logo);
    }
}
