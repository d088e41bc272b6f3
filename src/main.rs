//! CLI entry point for mdxpress

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "mdxpress")]
#[command(version)]
#[command(about = "A fast static blog engine for MDX content", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new site
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        folder: PathBuf,
    },

    /// Create a new post or page
    New {
        /// Layout to use (post, page, draft, or a model layout)
        #[arg(short, long)]
        layout: Option<String>,

        /// Title of the new entry
        title: String,

        /// File path relative to the target directory, without extension
        #[arg(short, long)]
        path: Option<String>,
    },

    /// Build the static site
    #[command(alias = "b")]
    Build {
        /// Watch for file changes and rebuild
        #[arg(short, long)]
        watch: bool,
    },

    /// Start a local server
    #[command(alias = "s")]
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "localhost")]
        ip: String,

        /// Open browser automatically
        #[arg(short, long)]
        open: bool,

        /// Serve without file watching or live reload
        #[arg(long)]
        r#static: bool,
    },

    /// Remove the public directory
    Clean,

    /// List site content
    List {
        /// Type of content to list (post, page, tag, model)
        #[arg(default_value = "post")]
        r#type: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.debug {
        "mdxpress=debug,info"
    } else {
        "mdxpress=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Init { folder } => {
            let target_dir = if folder.is_absolute() {
                folder
            } else {
                base_dir.join(folder)
            };
            tracing::info!("Initializing site in {:?}", target_dir);
            mdxpress::commands::init::init_site(&target_dir)?;
            println!("Initialized new site in {:?}", target_dir);
        }

        Commands::New {
            layout,
            title,
            path,
        } => {
            let site = mdxpress::Site::load(&base_dir)?;
            let layout = layout.as_deref().unwrap_or(&site.config.default_layout);
            tracing::info!("Creating new {} titled: {}", layout, title);
            mdxpress::commands::new::create_entry(&site, &title, layout, path.as_deref())?;
        }

        Commands::Build { watch } => {
            let site = mdxpress::Site::load(&base_dir)?;
            site.build()?;
            println!("Built successfully!");

            if watch {
                mdxpress::commands::build::watch(&site).await?;
            }
        }

        Commands::Serve {
            port,
            ip,
            open,
            r#static,
        } => {
            let site = mdxpress::Site::load(&base_dir)?;

            site.build()?;

            tracing::info!("Starting server at http://{}:{}", ip, port);
            mdxpress::server::start(&site, &ip, port, !r#static, open).await?;
        }

        Commands::Clean => {
            let site = mdxpress::Site::load(&base_dir)?;
            site.clean()?;
            println!("Cleaned successfully!");
        }

        Commands::List { r#type } => {
            let site = mdxpress::Site::load(&base_dir)?;
            mdxpress::commands::list::run(&site, &r#type)?;
        }
    }

    Ok(())
}
