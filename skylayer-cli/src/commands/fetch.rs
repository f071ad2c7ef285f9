//! Fetch command - download one tile through the tile manager.

use std::path::PathBuf;
use std::time::Instant;

use tracing::info;

use skylayer::manager::Completion;
use skylayer::tile::{TileImage, TileRequest};

use crate::error::CliError;
use crate::runner::{runtime, CliRunner, GlobalOptions, NetworkManager};

/// Arguments for the fetch command.
pub struct FetchArgs {
    pub level: u8,
    pub pix: u64,
    pub allsky: bool,
    pub output: PathBuf,
}

/// Run the fetch command.
pub fn run(options: GlobalOptions, args: FetchArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(options)?;
    runner.log_startup("fetch");
    let source = runner.survey()?;

    let request = if args.allsky {
        TileRequest::allsky(args.pix)
    } else {
        TileRequest::tile(args.level, args.pix)
    };
    request.validate()?;
    if !args.allsky && args.level > source.max_level {
        return Err(CliError::Config(format!(
            "level {} is deeper than the survey maximum {}",
            args.level, source.max_level
        )));
    }

    println!("Fetching from {}", source.title);
    println!("  Level: {}", request.level());
    println!("  Pixel: {}{}", request.pix(), if args.allsky { " (all-sky cell)" } else { "" });

    let start = Instant::now();
    let tile = runtime()?.block_on(async {
        let mut manager = runner.create_manager(source).await?;
        fetch_tile(&mut manager, request).await
    })?;
    info!(elapsed_ms = start.elapsed().as_millis() as u64, "Tile fetched");
    println!("Fetched in {:.2}s", start.elapsed().as_secs_f64());

    runner.save_png(&args.output, &tile)
}

/// Request `request` until it is available or its download fails.
async fn fetch_tile(
    manager: &mut NetworkManager,
    request: TileRequest,
) -> Result<TileImage, CliError> {
    loop {
        if let Some(tile) = manager.request_tile(request, false)? {
            return Ok(tile.into_owned());
        }
        match manager.next_completion().await {
            Some(Completion::Failed { key, .. }) => {
                return Err(CliError::Download(format!("tile {} could not be retrieved", key)));
            }
            Some(_) => {}
            None => return Err(CliError::Download("downloader stopped".to_string())),
        }
    }
}
