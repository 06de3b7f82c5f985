//! List the demo pages.

use anyhow::Result;
use serde::Serialize;
use user_stream::PageKind;

use crate::context::Context;

#[derive(Serialize)]
struct PageInfo {
    name: &'static str,
    title: &'static str,
    description: &'static str,
    sections: &'static [&'static str],
}

/// Run the pages command.
pub async fn run(ctx: &Context) -> Result<()> {
    let pages: Vec<PageInfo> = PageKind::ALL
        .iter()
        .map(|kind| PageInfo {
            name: kind.name(),
            title: kind.title(),
            description: kind.description(),
            sections: kind.sections(),
        })
        .collect();

    if ctx.output.is_json() {
        ctx.output.json(&pages);
        return Ok(());
    }

    ctx.output.header("Pages");
    ctx.output.table_row(&["NAME", "SECTIONS", "DESCRIPTION"], &[16, 26, 0]);
    for page in &pages {
        let sections = page.sections.join(", ");
        ctx.output
            .table_row(&[page.name, sections.as_str(), page.description], &[16, 26, 0]);
    }

    Ok(())
}
