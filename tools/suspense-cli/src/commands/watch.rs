//! Watch a page's sections settle, with optional manual retries.

use std::collections::{HashMap, HashSet};

use anyhow::{Context as _, Result};
use dialoguer::Confirm;
use futures::StreamExt;
use indicatif::{MultiProgress, ProgressBar};
use serde::Serialize;
use suspense_sdk::prelude::*;
use user_stream::{PageData, PageKind};

use super::WatchArgs;
use crate::context::Context;
use crate::output::{format_duration, status_badge};

/// One transition, as printed with `--json`.
#[derive(Serialize)]
struct TransitionRecord<'a> {
    section: &'a str,
    status: SectionStatus,
    attempt: u32,
    elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

/// Run the watch command.
pub async fn run(args: WatchArgs, ctx: &Context) -> Result<()> {
    let kind: PageKind = args.page.parse()?;
    let options = ctx.page_options(args.user, &args.fail, args.time_unit_ms);

    let coordinator = StreamingFetchCoordinator::new()?;
    let page = kind
        .build(&options)
        .with_context(|| format!("Failed to build page '{}'", kind))?
        .launch(&coordinator)?;
    let session = page.session;

    ctx.output.header(&format!("Watching {} ({})", kind, session.id()));

    let multi = MultiProgress::new();
    let bars: HashMap<SectionId, ProgressBar> = session
        .section_ids()
        .into_iter()
        .map(|id| {
            let bar = ctx.output.section_spinner(&multi, id.as_str());
            (id, bar)
        })
        .collect();

    // Every launch settles exactly once, so a section leaves this set on
    // its transition and re-enters it on a retry.
    let mut unsettled: HashSet<SectionId> = bars.keys().cloned().collect();
    let mut transitions = session.transitions();
    while !unsettled.is_empty() {
        let Some(transition) = transitions.next().await else {
            break;
        };
        unsettled.remove(&transition.section);
        report(ctx, &bars, &transition);

        if transition.status() == SectionStatus::Failed && args.interactive {
            let prompt = format!("Retry section '{}'?", transition.section);
            let retry = multi.suspend(|| Confirm::new().with_prompt(prompt).default(true).interact())?;
            if retry {
                tracing::info!(section = %transition.section, "retrying section");
                session.retry(transition.section.clone())?;
                unsettled.insert(transition.section.clone());
                if let Some(bar) = bars.get(&transition.section) {
                    bar.reset();
                    bar.set_message(status_badge(SectionStatus::Pending));
                    bar.enable_steady_tick(std::time::Duration::from_millis(100));
                }
            }
        }
    }

    if ctx.output.is_json() {
        return Ok(());
    }

    let failed = session
        .statuses()
        .into_iter()
        .filter(|(_, status)| *status == SectionStatus::Failed)
        .count();
    if failed == 0 {
        ctx.output.success("All sections ready");
    } else {
        ctx.output
            .warn(&format!("{} section(s) failed; rerun with --interactive to retry", failed));
    }

    Ok(())
}

fn report(ctx: &Context, bars: &HashMap<SectionId, ProgressBar>, transition: &Transition<PageData>) {
    let error = match &transition.outcome {
        Outcome::Failed(err) => Some(err.message()),
        Outcome::Ready(_) => None,
    };

    if ctx.output.is_json() {
        ctx.output.json(&TransitionRecord {
            section: transition.section.as_str(),
            status: transition.status(),
            attempt: transition.attempt,
            elapsed_ms: transition.elapsed.as_millis() as u64,
            error,
        });
        return;
    }

    let mut msg = format!(
        "{} in {}",
        status_badge(transition.status()),
        format_duration(transition.elapsed)
    );
    if transition.attempt > 1 {
        msg.push_str(&format!(" (attempt {})", transition.attempt));
    }
    if let Some(error) = error {
        msg.push_str(&format!(": {}", error));
    }

    match bars.get(&transition.section) {
        Some(bar) => bar.finish_with_message(msg),
        None => ctx.output.kv(transition.section.as_str(), &msg),
    }
}
