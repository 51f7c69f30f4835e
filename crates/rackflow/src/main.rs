mod backend;
mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rackflow")]
#[command(about = "Resolve rack resources, render formations and store app objects", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a logical resource to its physical id
    Resource {
        /// Logical resource id (e.g. Settings, Repository)
        logical_id: String,
        /// Resolve in the app's stack instead of the rack's
        #[arg(short, long)]
        app: Option<String>,
        /// Resolve in an explicitly named stack
        #[arg(short, long, conflicts_with = "app")]
        stack: Option<String>,
    },
    /// Print the container repository address of an app
    Repository {
        /// App name
        app: String,
    },
    /// Render a formation template as canonical JSON
    Render {
        /// Template name (e.g. app, rack)
        name: String,
        /// JSON data file, `-` for stdin
        #[arg(short, long)]
        data: Option<PathBuf>,
    },
    /// Read and write app objects
    Object {
        #[command(subcommand)]
        command: ObjectCommands,
    },
    /// Manage apps (local backend)
    App {
        #[command(subcommand)]
        command: AppCommands,
    },
    /// Manage stacks (local backend)
    Stack {
        #[command(subcommand)]
        command: StackCommands,
    },
    /// Assign an address to a host on an interface (local backend)
    Host {
        /// Network interface (e.g. eth0)
        iface: String,
        /// Subnet prefix (e.g. 10.42.0)
        subnet: String,
        /// Host name
        host: String,
    },
    /// Show version information
    Version,
}

#[derive(Subcommand)]
enum ObjectCommands {
    /// Write an object to stdout or a file
    Get {
        app: String,
        key: String,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Store an object from a file or stdin
    Put {
        app: String,
        key: String,
        /// Read from this file instead of stdin
        #[arg(short, long)]
        file: Option<PathBuf>,
        #[arg(long)]
        content_type: Option<String>,
    },
}

#[derive(Subcommand)]
enum AppCommands {
    /// Register an app
    Create { app: String },
    /// List registered apps
    List,
}

#[derive(Subcommand)]
enum StackCommands {
    /// Render a formation and record it as a stack
    Create {
        /// Stack name (`{rack}` or `{rack}-{app}`)
        stack: String,
        /// Formation template name
        template: String,
        /// JSON data file, `-` for stdin
        #[arg(short, long)]
        data: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    // Version needs no rack configuration
    if matches!(cli.command, Commands::Version) {
        println!("rackflow {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let backend = backend::Backend::from_env().await?;

    match cli.command {
        Commands::Resource {
            logical_id,
            app,
            stack,
        } => commands::resource::handle(&backend, &logical_id, app, stack).await,
        Commands::Repository { app } => commands::resource::repository(&backend, &app).await,
        Commands::Render { name, data } => commands::render::handle(&backend, &name, data).await,
        Commands::Object { command } => match command {
            ObjectCommands::Get { app, key, output } => {
                commands::object::get(&backend, &app, &key, output).await
            }
            ObjectCommands::Put {
                app,
                key,
                file,
                content_type,
            } => commands::object::put(&backend, &app, &key, file, content_type).await,
        },
        Commands::App { command } => match command {
            AppCommands::Create { app } => commands::app::create(&backend, &app).await,
            AppCommands::List => commands::app::list(&backend).await,
        },
        Commands::Stack { command } => match command {
            StackCommands::Create {
                stack,
                template,
                data,
            } => commands::stack::create(&backend, &stack, &template, data).await,
        },
        Commands::Host {
            iface,
            subnet,
            host,
        } => commands::host::handle(&backend, &iface, &subnet, &host).await,
        Commands::Version => unreachable!("Version is handled before config loading"),
    }
}
