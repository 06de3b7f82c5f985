//! Render a page as a progressive HTML stream.

use anyhow::{Context as _, Result};
use futures::channel::mpsc;
use futures::StreamExt;
use suspense_sdk::prelude::*;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use user_stream::PageKind;

use super::RenderArgs;
use crate::context::Context;
use crate::output::format_bytes;

/// Chunks buffered between the page streamer and the writer.
const WRITE_BUFFER: usize = 16;

/// Run the render command.
pub async fn run(args: RenderArgs, ctx: &Context) -> Result<()> {
    let kind: PageKind = args.page.parse()?;
    let options = ctx.page_options(args.user, &args.fail, args.time_unit_ms);
    let policy = ctx.config.flush_policy()?;

    let coordinator = StreamingFetchCoordinator::new()?;
    let page = kind
        .build(&options)
        .with_context(|| format!("Failed to build page '{}'", kind))?
        .launch(&coordinator)?;
    ctx.output.debug(&format!(
        "Session {} started with {} section(s)",
        page.session.id(),
        page.session.section_ids().len()
    ));

    let (mut out, target): (Box<dyn AsyncWrite + Unpin + Send>, String) = match &args.out {
        Some(path) => {
            let path = ctx.resolve_path(path);
            let file = tokio::fs::File::create(&path)
                .await
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            (Box::new(file), path.display().to_string())
        }
        None => (Box::new(tokio::io::stdout()), "stdout".to_string()),
    };

    // Each chunk is written and flushed as soon as the streamer hands it over.
    let (tx, mut rx) = mpsc::channel::<Vec<u8>>(WRITE_BUFFER);
    let writer = tokio::spawn(async move {
        while let Some(chunk) = rx.next().await {
            out.write_all(&chunk).await?;
            out.flush().await?;
        }
        Ok::<_, std::io::Error>(())
    });

    let mut sink = StreamingSink::new(tx, TimingContext::new()).with_policy(policy);
    let report = page
        .streamer
        .stream(&page.session, &mut sink)
        .await
        .context("Failed to stream page")?;
    let bytes = sink.bytes_sent();
    drop(sink);

    writer
        .await
        .context("Writer task failed")?
        .with_context(|| format!("Failed to write to {}", target))?;

    if ctx.output.is_json() {
        eprintln!("{}", report.metrics.to_json_pretty());
    } else {
        eprintln!("\n{}", report.metrics.to_summary());
        ctx.output.success(&format!(
            "Streamed {} to {}",
            format_bytes(bytes as u64),
            target
        ));
    }

    Ok(())
}
