mod cli;

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use xh_extract::{
  download, extractor,
  format::select_best,
  page,
  session::Session,
  Error, Result,
};

use crate::cli::Args;

#[tokio::main]
async fn main() -> ExitCode {
  let env_filter = EnvFilter::try_from_default_env()
    .unwrap_or_else(|_| EnvFilter::new("xh_extract=info"));

  tracing_subscriber::fmt()
    .with_env_filter(env_filter)
    .with_writer(std::io::stderr)
    .init();

  match run(Args::parse()).await {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      error!("{e}");
      ExitCode::FAILURE
    }
  }
}

async fn run(args: Args) -> Result<()> {
  let id = page::video_id(&args.url)?;
  info!("extracting {id}");

  let session = Session::new(args.session_config())?;
  let html = session.fetch_page(&args.url).await?;
  let metadata = page::inspect(&html)?;
  let info =
    extractor::extract(&args.url, &metadata, &session, args.concurrency)
      .await?;

  println!("{}", serde_json::to_string_pretty(&info)?);

  let best = select_best(&info.formats).ok_or(Error::NoFormats)?;
  info!("best format: {} ({})", best.format_id, best.url);

  if args.no_download {
    return Ok(());
  }

  let output = args
    .output
    .clone()
    .unwrap_or_else(|| download::default_output(&info.title));
  let cookie = session.cookie_header(&best.url);
  let headers = download::header_block(cookie.as_deref(), Some(&args.url));

  download::ffmpeg(&args.ffmpeg, &best.url, &output, &headers).await
}
