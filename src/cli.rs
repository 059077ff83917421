use clap::{Args, Parser, Subcommand};

use frame_request::config::ConfigArgs;

#[derive(Parser)]
#[command(name = "frame-request")]
#[command(about = "Tick-driven HTTP requests on a cooperative scheduler")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Send requests and drive them to completion
    Fetch(FetchArgs),

    /// Print the effective configuration as YAML
    Config(ConfigArgs),
}

#[derive(Args, Clone)]
pub struct FetchArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// URLs to request; all are sent before the first tick
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// HTTP method (GET, POST, PUT, DELETE, HEAD)
    #[arg(short = 'X', long, default_value = "GET")]
    pub method: String,

    /// Request header, as `Name: value`
    #[arg(short = 'H', long = "header", value_name = "HEADER")]
    pub headers: Vec<String>,

    /// Request body for POST and PUT
    #[arg(short, long)]
    pub body: Option<String>,

    /// Content type of the body
    #[arg(long, default_value = "application/octet-stream")]
    pub content_type: String,

    /// Query parameter appended to every URL, as `key=value`
    #[arg(short, long = "query", value_name = "PAIR")]
    pub query: Vec<String>,

    /// Write response bodies to stdout
    #[arg(long)]
    pub print_body: bool,
}
