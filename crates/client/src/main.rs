use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use nostr_http_auth::{
    AuthError, Client, ClientConfig, Credentials, HttpMethod, RequestOptions, Response, token,
    transport::DEFAULT_TIMEOUT_SECS,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, ValueEnum)]
enum Method {
    Get,
    Post,
}

impl From<Method> for HttpMethod {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => HttpMethod::Get,
            Method::Post => HttpMethod::Post,
        }
    }
}

#[derive(Parser)]
struct Args {
    #[clap(long, env = "API_BASE_URL", default_value = "http://127.0.0.1:8080")]
    base_url: String,
    /// Hex or nsec secret key.
    #[clap(long, env = "NOSTR_SECRET_KEY", hide_env_values = true)]
    secret_key: Option<String>,
    #[clap(long, env = "API_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the public key for the configured secret key.
    Pubkey,
    /// Print an Authorization header value for a request.
    Sign {
        #[clap(long, value_enum, default_value = "get")]
        method: Method,
        #[clap(long)]
        url: String,
        /// JSON request body.
        #[clap(long)]
        body: Option<String>,
    },
    /// Authenticated GET against the base url.
    Get { path: String },
    /// Authenticated POST of a JSON body against the base url.
    Post { path: String, body: String },
    /// Decode and verify an Authorization header value or bare token.
    Inspect { value: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let Args {
        base_url,
        secret_key,
        timeout_secs,
        command,
    } = Args::parse();
    let secret_key = secret_key.as_deref();
    let config = ClientConfig {
        base_url,
        timeout: Duration::from_secs(timeout_secs),
    };

    match command {
        Command::Pubkey => {
            let credentials = credentials(secret_key)?;
            let public_key = credentials.public_key();
            println!("{}", public_key.to_hex());
            println!("{}", public_key.to_bech32()?);
        }
        Command::Sign { method, url, body } => {
            let credentials = credentials(secret_key)?;
            let body = body.map(|b| parse_body(&b)).transpose()?;
            let bytes = body.as_ref().map(serde_json::to_vec).transpose()?;
            let header = credentials.authorization(method.into(), &url, bytes.as_deref())?;
            println!("{header}");
        }
        Command::Get { path } => {
            let client = client(config, secret_key)?;
            let result = client.authenticated_get(&path, RequestOptions::new()).await;
            print_response(result)?;
        }
        Command::Post { path, body } => {
            let client = client(config, secret_key)?;
            let body = parse_body(&body)?;
            let result = client
                .authenticated_post(&path, &body, RequestOptions::new())
                .await;
            print_response(result)?;
        }
        Command::Inspect { value } => {
            let assertion = if value.trim_start().contains(' ') {
                token::parse_authorization(&value)?
            } else {
                token::decode(&value)?
            };
            println!("{}", serde_json::to_string_pretty(&assertion)?);
            match assertion.verify() {
                Ok(()) => tracing::info!(id = %assertion.id, "signature valid"),
                Err(e) => bail!("assertion does not verify: {e}"),
            }
        }
    }

    Ok(())
}

fn credentials(secret_key: Option<&str>) -> Result<Credentials> {
    let secret_key = secret_key.ok_or(AuthError::Key(nostr_http_auth::KeyError::Missing))?;
    Credentials::parse(secret_key).context("parsing secret key")
}

fn client(
    config: ClientConfig,
    secret_key: Option<&str>,
) -> Result<Client<nostr_http_auth::ReqwestTransport>> {
    let client = Client::from_config(config)?;
    Ok(match secret_key {
        Some(key) => client.with_credentials(credentials(Some(key))?),
        None => client,
    })
}

fn parse_body(body: &str) -> Result<serde_json::Value> {
    serde_json::from_str(body).context("request body is not valid JSON")
}

fn print_response(result: Result<Response, AuthError>) -> Result<()> {
    match result {
        Ok(response) => {
            tracing::info!(status = %response.status, "request completed");
            println!("{}", response.text());
            Ok(())
        }
        Err(AuthError::Server(error)) => {
            eprintln!("{}", error.kind);
            for line in error.message.lines() {
                eprintln!("  {line}");
            }
            bail!(
                "server error (code {:?}, status {:?})",
                error.code,
                error.status_code
            )
        }
        Err(e) => Err(e.into()),
    }
}
