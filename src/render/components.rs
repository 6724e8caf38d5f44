//! Viewer building blocks rendered to HTML fragments

use catalog_core::{TagCount, VideoRecord};
use std::fmt::Write;

use super::escape_html;
use super::links::ViewerLinks;
use crate::view_state::ViewState;

/// Card for one record: summary, details link, media preview and tags
pub fn video_card(video: &VideoRecord, links: &ViewerLinks) -> String {
    let summary = escape_html(&video.summary);
    let mut html = String::from("<article class=\"video-card\">\n<header>\n");
    let _ = writeln!(html, "<h2>{}</h2>", summary);
    let _ = writeln!(
        html,
        "<a class=\"details-button\" href=\"{}\" aria-label=\"View details for {}\">View details</a>",
        escape_html(&links.open_video(&video.id)),
        summary
    );
    html.push_str("</header>\n");

    if video.media_url.is_empty() {
        html.push_str("<p class=\"missing-video\">Video preview unavailable.</p>\n");
    } else {
        let poster = video
            .poster_uri
            .as_deref()
            .map(|uri| format!(" poster=\"{}\"", escape_html(uri)))
            .unwrap_or_default();
        let _ = writeln!(
            html,
            "<video controls preload=\"metadata\" src=\"{}\"{}>Your browser does not support embedded videos.</video>",
            escape_html(&video.media_url),
            poster
        );
    }

    html.push_str("<footer>\n");
    html.push_str(&tag_list("tags", &video.tags));
    html.push_str("</footer>\n</article>\n");
    html
}

/// Grid of cards, or the loading / empty message
pub fn video_grid(videos: &[VideoRecord], is_loading: bool, links: &ViewerLinks) -> String {
    if is_loading {
        return "<div class=\"video-grid\">Loading videos…</div>\n".to_string();
    }

    if videos.is_empty() {
        return "<div class=\"video-grid\">No videos found. Try adjusting your filters.</div>\n"
            .to_string();
    }

    let mut html = String::from("<div class=\"video-grid\">\n");
    for video in videos {
        html.push_str(&video_card(video, links));
    }
    html.push_str("</div>\n");
    html
}

/// Search form; the selected tags ride along and the page resets to 1
pub fn search_bar(state: &ViewState, is_fetching: bool, links: &ViewerLinks) -> String {
    let mut html = String::from("<form class=\"search-bar\" method=\"get\" action=\"/\">\n");
    html.push_str("<label>\n<span class=\"search-label\">Search</span>\n");
    let _ = writeln!(
        html,
        "<input type=\"search\" name=\"search\" value=\"{}\" placeholder=\"Search summaries or tags\" aria-label=\"Search summaries or tags\">",
        escape_html(state.search())
    );
    if is_fetching {
        html.push_str("<span class=\"search-spinner\" aria-hidden=\"true\">⏳</span>\n");
    }
    html.push_str("</label>\n");
    if !state.selected_tags().is_empty() {
        let _ = writeln!(
            html,
            "<input type=\"hidden\" name=\"tags\" value=\"{}\">",
            escape_html(&links.tags_value())
        );
    }
    html.push_str("</form>\n");
    html
}

/// Checkbox-style list of every available tag
pub fn tag_filter(tags: &[String], state: &ViewState, is_loading: bool, links: &ViewerLinks) -> String {
    if is_loading {
        return "<div class=\"tag-filter\">Loading tags…</div>\n".to_string();
    }

    if tags.is_empty() {
        return "<div class=\"tag-filter\">No tags available.</div>\n".to_string();
    }

    let mut html = String::from("<div class=\"tag-filter\">\n<h3>Filter by tag</h3>\n<ul>\n");
    for tag in tags {
        let checked = state.is_selected(tag);
        let _ = writeln!(
            html,
            "<li><a role=\"checkbox\" aria-checked=\"{}\" aria-label=\"Filter by {}\" href=\"{}\"><span class=\"checkbox\">{}</span><span>{}</span></a></li>",
            checked,
            escape_html(tag),
            escape_html(&links.toggle_tag(tag)),
            if checked { "☑" } else { "☐" },
            escape_html(tag)
        );
    }
    html.push_str("</ul>\n</div>\n");
    html
}

/// Relative weight of a tag in the cloud, never below 0.6
pub fn tag_weight(count: u64, max_count: u64) -> f64 {
    let max = if max_count > 0 { max_count as f64 } else { 1.0 };
    (count as f64 / max).max(0.6)
}

/// Font size in rem for a cloud entry
pub fn tag_font_size(weight: f64) -> f64 {
    0.85 + weight * 0.6
}

/// Weighted cloud of the top tags; empty when there are none
pub fn tag_cloud(tag_counts: &[TagCount], state: &ViewState, links: &ViewerLinks) -> String {
    if tag_counts.is_empty() {
        return String::new();
    }

    let max_count = tag_counts.iter().map(|t| t.count).max().unwrap_or(1);
    let mut html = String::from(
        "<div class=\"tag-cloud\">\n<h3>Top Tags</h3>\n<div class=\"tag-cloud-items\" role=\"list\">\n",
    );

    for TagCount { tag, count } in tag_counts {
        let active = state.is_selected(tag);
        let size = tag_font_size(tag_weight(*count, max_count));
        let _ = writeln!(
            html,
            "<a role=\"listitem\" class=\"tag-cloud-item{}\" style=\"font-size: {:.2}rem\" aria-pressed=\"{}\" href=\"{}\">{}<span class=\"tag-count\">{}</span></a>",
            if active { " active" } else { "" },
            size,
            active,
            escape_html(&links.toggle_tag(tag)),
            escape_html(tag),
            count
        );
    }

    html.push_str("</div>\n</div>\n");
    html
}

/// Previous/next pager; nothing when everything fits on one page
pub fn pagination(current_page: u32, total_pages: u32, links: &ViewerLinks) -> String {
    if total_pages <= 1 {
        return String::new();
    }

    // only pages inside 1..=total_pages get a link
    let target = |page: Option<u32>| {
        page.filter(|page| (1..=total_pages).contains(page))
            .map(|page| links.page(page))
    };

    let mut html = String::from("<nav class=\"pagination\" aria-label=\"Pagination\">\n");
    html.push_str(&pager_button("Previous", target(current_page.checked_sub(1))));
    let _ = writeln!(
        html,
        "<span class=\"page-info\">Page {} of {}</span>",
        current_page, total_pages
    );
    html.push_str(&pager_button("Next", target(current_page.checked_add(1))));
    html.push_str("</nav>\n");
    html
}

fn pager_button(label: &str, href: Option<String>) -> String {
    match href {
        Some(href) => format!("<a class=\"button\" href=\"{}\">{}</a>\n", escape_html(&href), label),
        None => format!("<span class=\"button\" aria-disabled=\"true\">{}</span>\n", label),
    }
}

/// Detail overlay for the active record
pub fn detail_modal(video: Option<&VideoRecord>, links: &ViewerLinks) -> String {
    let Some(video) = video else {
        return String::new();
    };

    let mut html = String::from(
        "<div class=\"modal-overlay\" role=\"dialog\" aria-modal=\"true\" aria-label=\"Video details\">\n<div class=\"modal\">\n<header>\n<h2>Video details</h2>\n",
    );
    let _ = writeln!(
        html,
        "<a class=\"close\" href=\"{}\" aria-label=\"Close details\">✕</a>",
        escape_html(&links.close_detail())
    );
    html.push_str("</header>\n<section class=\"modal-content\">\n");
    let _ = writeln!(html, "<p class=\"summary\">{}</p>", escape_html(&video.summary));

    if let Some(transcript) = video.transcript.as_deref().filter(|t| !t.is_empty()) {
        let _ = writeln!(
            html,
            "<div class=\"transcript\">\n<h3>Transcript</h3>\n<p>{}</p>\n</div>",
            escape_html(transcript)
        );
    }

    html.push_str("<div class=\"metadata\">\n<div>\n<h3>Tags</h3>\n");
    html.push_str(&tag_list("", &video.tags));
    html.push_str("</div>\n");

    if let Some(created_at) = video.created_at.as_deref().filter(|c| !c.is_empty()) {
        let shown = video
            .published_at()
            .map(|at| at.format("%Y-%m-%d %H:%M UTC").to_string())
            .unwrap_or_else(|| created_at.to_string());
        let _ = writeln!(
            html,
            "<div>\n<h3>Published</h3>\n<time datetime=\"{}\">{}</time>\n</div>",
            escape_html(created_at),
            escape_html(&shown)
        );
    }

    html.push_str("</div>\n</section>\n</div>\n</div>\n");
    html
}

/// Title, record count and status pills
pub fn content_header(total: Option<u64>, is_fetching: bool, error: Option<&str>) -> String {
    let subtitle = match total {
        Some(total) => format!("Showing {} videos", total),
        None => "Loading video catalog…".to_string(),
    };

    let mut html = String::from("<div class=\"content-header\">\n<div>\n<h1>Video Catalog</h1>\n");
    let _ = writeln!(html, "<p class=\"subtitle\">{}</p>", subtitle);
    html.push_str("</div>\n<div class=\"status\">\n");
    if is_fetching {
        html.push_str("<span class=\"pill\">Refreshing…</span>\n");
    }
    if let Some(message) = error {
        let _ = writeln!(html, "<span class=\"pill error\">{}</span>", escape_html(message));
    }
    html.push_str("</div>\n</div>\n");
    html
}

fn tag_list(class: &str, tags: &[String]) -> String {
    let mut html = if class.is_empty() {
        String::from("<ul>\n")
    } else {
        format!("<ul class=\"{}\">\n", class)
    };
    for tag in tags {
        let _ = writeln!(html, "<li>{}</li>", escape_html(tag));
    }
    html.push_str("</ul>\n");
    html
}
