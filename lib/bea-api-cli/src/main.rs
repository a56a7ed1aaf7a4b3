#![allow(missing_docs, clippy::print_stdout)]
use anyhow::{Context, Result, bail};
use http::Method;
use tracing::{debug, info, warn};

use bea_api_client::{Dispatcher, Payload, RequestOptions, WarnAndRethrow};

const USAGE: &str = "\
Usage: bea-api [OPTIONS] PATH

Dispatches one request to the backend API, at NX_API_HOST + PATH.

Options:
  --host ADDRESS          Base address, instead of NX_API_HOST
  -X, --method METHOD     HTTP method [default: GET]
  -H, --header NAME:VALUE Request header, can be repeated
  --json BODY             JSON request body
  --data BODY             Plain text request body
  -h, --help              Print this help
";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let args = AppArgs::parse(pico_args::Arguments::from_env()).context("parsing arguments")?;
    if args.help {
        print!("{USAGE}");
        return Ok(());
    }

    let payload = run(args).await?;
    match payload {
        Payload::Json(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        Payload::Text(text) => println!("{text}"),
    }

    info!("Bye!");
    Ok(())
}

async fn run(args: AppArgs) -> Result<Payload> {
    let builder = Dispatcher::builder().with_error_handler(WarnAndRethrow);
    let builder = match args.host.clone() {
        Some(host) => builder.with_base_address(host),
        None => builder
            .with_base_address_from_env()
            .context("resolving the base address")?,
    };
    let dispatcher = builder.build()?;
    debug!(?dispatcher, "dispatcher ready");

    let options = args.request_options()?;
    let payload = dispatcher
        .dispatch(&args.path, Some(options))
        .await
        .with_context(|| format!("dispatching {} {}", args.method, args.path))?;

    Ok(payload)
}

#[derive(Debug, Default)]
enum Body {
    #[default]
    Empty,
    Json(String),
    Text(String),
}

#[derive(Debug)]
struct AppArgs {
    help: bool,
    host: Option<String>,
    method: Method,
    headers: Vec<(String, String)>,
    body: Body,
    path: String,
}

impl AppArgs {
    fn parse(mut pargs: pico_args::Arguments) -> Result<Self> {
        if pargs.contains(["-h", "--help"]) {
            return Ok(Self {
                help: true,
                host: None,
                method: Method::GET,
                headers: vec![],
                body: Body::Empty,
                path: String::new(),
            });
        }

        let host = pargs
            .opt_value_from_str("--host")
            .context("parsing host argument")?;

        let method = pargs
            .opt_value_from_fn(["-X", "--method"], parse_method)
            .context("parsing method argument")?;

        let headers = pargs
            .values_from_fn(["-H", "--header"], parse_header)
            .context("parsing header arguments")?;

        let json: Option<String> = pargs
            .opt_value_from_str("--json")
            .context("parsing json argument")?;
        let data: Option<String> = pargs
            .opt_value_from_str("--data")
            .context("parsing data argument")?;
        let body = match (json, data) {
            (Some(_), Some(_)) => bail!("--json and --data cannot be used together"),
            (Some(json), None) => Body::Json(json),
            (None, Some(data)) => Body::Text(data),
            (None, None) => Body::Empty,
        };

        let path = pargs.free_from_str().context("parsing path argument")?;

        let remaining = pargs.finish();
        if !remaining.is_empty() {
            warn!(?remaining, "Warning: unused arguments left");
        }

        Ok(Self {
            help: false,
            host,
            method: method.unwrap_or(Method::GET),
            headers,
            body,
            path,
        })
    }

    fn request_options(&self) -> Result<RequestOptions> {
        let mut options = RequestOptions::new().with_method(self.method.clone());
        for (name, value) in &self.headers {
            options = options.with_header(name, value)?;
        }

        let options = match &self.body {
            Body::Empty => options,
            Body::Json(json) => {
                let value: serde_json::Value =
                    serde_json::from_str(json).context("--json body is not valid JSON")?;
                options.with_json(&value)?
            }
            Body::Text(text) => options.with_text(text.clone()),
        };

        Ok(options)
    }
}

fn parse_method(value: &str) -> Result<Method, http::method::InvalidMethod> {
    Method::from_bytes(value.to_ascii_uppercase().as_bytes())
}

fn parse_header(value: &str) -> Result<(String, String), String> {
    let Some((name, value)) = value.split_once(':') else {
        return Err(format!("expected NAME:VALUE, got '{value}'"));
    };
    Ok((name.trim().to_string(), value.trim().to_string()))
}
