// ABOUTME: gsound-play binary
// ABOUTME: Plays or caches one sound, optionally waiting for or cancelling it

use clap::Parser;
use gsound::cli::PlayArgs;
use gsound::{Cancellable, Context};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "gsound-play")]
#[command(author, version, about = "Play a system sound", long_about = None)]
struct Args {
    #[command(flatten)]
    play: PlayArgs,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();
    args.play.init_tracing();

    let attrs = args.play.build_attributes()?;
    let config = args.play.build_config()?;
    args.play.log_startup_info(&config, &attrs);

    let ctx = Context::builder().config(config).build()?;

    if args.play.cache {
        ctx.cache(&attrs)?;
        tracing::info!("Cached");
        return Ok(());
    }

    if !args.play.waits() {
        ctx.play_simple(&attrs, None)?;
        tracing::info!("Submitted");
        return Ok(());
    }

    let cancellable = Cancellable::new();
    let operation = ctx.play_full(&attrs, Some(&cancellable));

    let cancel_task = args.play.cancel_after_ms.map(|ms| {
        let cancellable = cancellable.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            tracing::info!("Cancelling after {} ms", ms);
            cancellable.cancel();
        })
    });

    let result = operation.await;
    if let Some(task) = cancel_task {
        task.abort();
    }

    match result {
        Ok(()) => {
            tracing::info!("Finished");
            Ok(())
        }
        Err(e) if e.is_canceled() => {
            tracing::info!("Cancelled");
            Ok(())
        }
        Err(e) => {
            tracing::error!("Playback failed: {}", e);
            Err(e.into())
        }
    }
}
