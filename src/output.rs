use std::io::{self, Write};

use serde::Serialize;

use crate::app::{BookmarksResult, DetailResult, LinkResult, ToggleResult};
use crate::listing::ListingView;

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Interactive,
    NonInteractive,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_listing(view: &ListingView) -> io::Result<()> {
        Self::print_json(view)
    }

    pub fn print_detail(result: &DetailResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_bookmarks(result: &BookmarksResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_toggle(result: &ToggleResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_link(result: &LinkResult) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

pub fn render_listing_text(view: &ListingView) -> String {
    let mut out = String::new();
    for record in &view.records {
        let marker = if view.bookmarked_ids.contains(&record.id) {
            '*'
        } else {
            ' '
        };
        out.push_str(&format!(
            "{marker} #{:<3} {} ({})\n",
            record.id, record.display_name, record.name
        ));
    }
    if view.is_loading {
        out.push_str("loading...\n");
    }
    if view.is_error {
        out.push_str("failed to load the catalog\n");
    }
    out.push_str(&format!("page {}/{}\n", view.page_number, view.total_pages));
    out
}
