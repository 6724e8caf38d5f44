//! Server-side HTML rendering of the catalog viewer

pub mod components;
pub mod links;

pub use links::ViewerLinks;

use crate::controller::CatalogView;
use crate::theme::StyleSheet;

const BASE_CSS: &str = r#"
body { margin: 0; font-family: system-ui, sans-serif; color: var(--text-primary); background: var(--surface-subtle); }
a { color: inherit; }
.layout { display: grid; grid-template-columns: 280px 1fr; min-height: 100vh; }
.sidebar { padding: 1.5rem; background: var(--surface); border-right: 1px solid var(--border-subtle); display: flex; flex-direction: column; gap: 1.5rem; }
.main { padding: 1.5rem 2rem; }
.search-bar label { display: flex; align-items: center; gap: 0.5rem; }
.search-bar input { flex: 1; padding: 0.5rem; border: 1px solid var(--border-subtle); border-radius: 8px; }
.tag-filter ul { list-style: none; padding: 0; margin: 0; }
.tag-filter a { text-decoration: none; display: flex; gap: 0.4rem; }
.tag-cloud-items { display: flex; flex-wrap: wrap; gap: 0.4rem; }
.tag-cloud-item { text-decoration: none; padding: 0.1rem 0.5rem; border-radius: 999px; background: var(--accent-muted); color: var(--accent-text); }
.tag-cloud-item.active { background: var(--accent); color: var(--surface); }
.tag-count { margin-left: 0.3rem; font-size: 0.7em; color: var(--text-muted); }
.content-header { display: flex; justify-content: space-between; align-items: center; }
.subtitle { color: var(--text-muted); }
.pill { padding: 0.25rem 0.75rem; border-radius: 999px; background: var(--accent-muted); color: var(--accent-text); box-shadow: var(--shadow-xs); }
.pill.error { background: var(--danger-muted); color: var(--danger-text); }
.video-grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(260px, 1fr)); gap: 1rem; }
.video-card { background: var(--surface); border-radius: 12px; padding: 1rem; box-shadow: var(--shadow-sm); }
.video-card video { width: 100%; border-radius: 8px; }
.tags { display: flex; flex-wrap: wrap; gap: 0.3rem; list-style: none; padding: 0; }
.missing-video { color: var(--text-muted); }
.pagination { display: flex; justify-content: center; align-items: center; gap: 1rem; margin: 1.5rem 0; }
.button[aria-disabled="true"] { opacity: 0.4; }
.modal-overlay { position: fixed; inset: 0; background: rgba(15, 23, 42, 0.4); display: flex; align-items: center; justify-content: center; }
.modal { background: var(--surface); border-radius: 12px; padding: 1.5rem; max-width: 720px; max-height: 80vh; overflow: auto; box-shadow: var(--shadow-lg); }
.modal header { display: flex; justify-content: space-between; }
.close { text-decoration: none; }
"#;

/// Escape text for HTML element content and quoted attribute values
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Render the whole viewer document for one view
pub fn render_page(view: &CatalogView, stylesheet: &StyleSheet) -> String {
    let links = ViewerLinks::new(&view.state);
    let page = view.page();
    let query = &view.query;
    let waiting = query.is_loading && page.is_none();

    let available_tags = page.map(|p| p.available_tags.as_slice()).unwrap_or_default();
    let items = page.map(|p| p.items.as_slice()).unwrap_or_default();
    let error = query.error_message();

    let sidebar = [
        components::search_bar(&view.state, query.is_fetching, &links),
        components::tag_filter(available_tags, &view.state, waiting, &links),
        components::tag_cloud(&view.top_tags, &view.state, &links),
    ]
    .concat();

    let main = [
        components::content_header(page.map(|p| p.total), query.is_fetching, error.as_deref()),
        components::video_grid(items, waiting, &links),
        components::pagination(view.state.page(), view.total_pages, &links),
        components::detail_modal(view.state.active_video(), &links),
    ]
    .concat();

    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>Video Catalog</title>\n<style>\n{}\n{}</style>\n</head>\n<body>\n\
         <div class=\"layout\">\n<aside class=\"sidebar\">\n{}</aside>\n<main class=\"main\">\n{}</main>\n</div>\n\
         </body>\n</html>\n",
        stylesheet.to_css(),
        BASE_CSS,
        sidebar,
        main
    )
}
