use clap::Parser;
use dotenv::dotenv;
use eyre::WrapErr;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use frame_request::{
    app_context::{AppBuilder, AppContext},
    config::{AppConfig, parse_header},
    request::{Method, RequestHandle, construct_uri_with_parameters},
};

use crate::cli::{Cli, Commands, FetchArgs};

mod cli;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Load environment variables from .env file
    dotenv().ok();

    // The file's log level applies unless the CLI gives one
    let config = match &cli.command {
        Commands::Fetch(args) => AppConfig::from_args(&args.config)?,
        Commands::Config(args) => AppConfig::from_args(args)?,
    };

    // Initialize tracing with environment filter using the effective log level
    let log_level = format!("frame_request={},info", config.log_level);
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level)),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Fetch(args) => run_fetch(args, config).await,
        Commands::Config(_) => config.to_yaml(std::io::stdout()),
    }
}

async fn run_fetch(args: FetchArgs, config: AppConfig) -> eyre::Result<()> {
    let context = AppBuilder::new().with_config(config).build()?;

    let method: Method = args.method.parse().map_err(|e: String| eyre::eyre!(e))?;
    let headers = args
        .headers
        .iter()
        .map(|raw| parse_header(raw))
        .collect::<eyre::Result<Vec<_>>>()?;
    let query = args
        .query
        .iter()
        .map(|raw| {
            raw.split_once('=')
                .ok_or_else(|| eyre::eyre!("query '{raw}' must look like 'key=value'"))
        })
        .collect::<eyre::Result<Vec<_>>>()?;

    for url in &args.urls {
        let uri = construct_uri_with_parameters(url, &query);
        let handle = build_request(&context, &args, method, uri)
            .set_headers(headers.iter().cloned());
        let sent = observe(handle, args.print_body)
            .send()
            .wrap_err_with(|| format!("Failed to send {url}"))?;
        tracing::info!(
            request_id = %sent.id(),
            correlation_id = %sent.correlation_id(),
            url = %url,
            "Queued"
        );
    }

    context.run_until_idle().await
}

fn build_request(
    context: &AppContext,
    args: &FetchArgs,
    method: Method,
    uri: String,
) -> RequestHandle {
    let body = args.body.clone().map(String::into_bytes);
    match (method, body) {
        (Method::Post, Some(body)) => context.manager.post_bytes(uri, body, &args.content_type),
        (Method::Put, Some(body)) => context
            .manager
            .put(uri, body)
            .set_header("Content-Type", args.content_type.as_str()),
        (method, body) => {
            if body.is_some() {
                tracing::warn!(method = %method, "Body ignored for this method");
            }
            context.manager.request(method, uri)
        }
    }
}

fn observe(handle: RequestHandle, print_body: bool) -> RequestHandle {
    let uri = handle.uri().to_string();
    let (up_uri, down_uri) = (uri.clone(), uri);
    handle
        .on_upload_progress(move |progress| {
            tracing::debug!(uri = %up_uri, progress = progress, "Upload progress");
        })
        .on_download_progress(move |progress| {
            tracing::debug!(uri = %down_uri, progress = progress, "Download progress");
        })
        .on_success(move |response| {
            tracing::info!(
                url = %response.url,
                status_code = ?response.status_code,
                bytes = response.bytes.len(),
                "Request succeeded"
            );
            if print_body {
                println!("{}", response.text());
            }
        })
        .on_error(|response| {
            tracing::warn!(
                url = %response.url,
                status_code = ?response.status_code,
                error = ?response.error,
                "Request failed with HTTP error"
            );
        })
        .on_network_error(|response| {
            tracing::error!(
                url = %response.url,
                error = ?response.error,
                "Request failed with network error"
            );
        })
}
