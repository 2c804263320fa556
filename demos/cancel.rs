// ABOUTME: Cancelling two sounds with one token
// ABOUTME: Runs against the null backend with simulated three second playback

use gsound::native::NullBackend;
use gsound::{attr, Attributes, Cancellable, Context};
use std::time::{Duration, Instant};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("gsound=debug"))
        .init();

    let ctx = Context::builder()
        .backend(NullBackend::new().with_playback_duration(Duration::from_secs(3)))
        .build()?;

    let cancellable = Cancellable::new();
    let bell = Attributes::from([(attr::EVENT_ID, "bell")]);
    let complete = Attributes::new()
        .with(attr::EVENT_ID, "complete")
        .with(attr::EVENT_DESCRIPTION, "Demo finished");

    ctx.play_simple(&bell, Some(&cancellable))?;
    let operation = ctx.play_full(&complete, Some(&cancellable));
    println!(
        "Playing two sounds under handle {}, cancelling in one second",
        cancellable.handle()
    );

    let started = Instant::now();
    let token = cancellable.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        token.cancel();
    });

    match operation.await {
        Err(e) if e.is_canceled() => {
            println!("Cancelled after {:.1}s: {}", started.elapsed().as_secs_f32(), e)
        }
        Err(e) => println!("Failed: {}", e),
        Ok(()) => println!("Finished before the cancellation arrived"),
    }
    Ok(())
}
