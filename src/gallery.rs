//! Gallery page rendering.
//!
//! The gallery has two pieces of state, held in [`GalleryState`]: the
//! selected section and the current [`SortSpec`]. Three render functions turn
//! `(sections, state)` into markup and are idempotent for a given input:
//!
//! - [`render_section_nav`]: one link per section with its item count
//! - [`render_sort_options`]: the current sort and the controls to change it
//! - [`render_grid`]: the selected section's items, sorted, one tile each
//!
//! State lives in the query string (`/?section=6&sort=title&order=desc`).
//! Every control is a link to the same page with the next state, so changing
//! the selection or sort is a fresh render of the whole page.
//!
//! ## Sorting
//!
//! Titles compare byte-wise and case-sensitive: `["B", "a", "C"]` ascending
//! is `["B", "C", "a"]`. There is no locale collation and no tie-break.
//!
//! The sort control also shows year arrows. They are rendered inert (no link)
//! and [`GalleryState::from_query`] ignores `sort=year`.

use crate::types::{Item, Section};
use maud::{DOCTYPE, Markup, html};
use serde::Deserialize;

/// Field the grid is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Title,
    Year,
}

impl SortField {
    pub fn as_str(self) -> &'static str {
        match self {
            SortField::Title => "title",
            SortField::Year => "year",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    fn describe(self) -> &'static str {
        match self {
            SortOrder::Asc => "ascending",
            SortOrder::Desc => "descending",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub field: SortField,
    pub order: SortOrder,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            field: SortField::Title,
            order: SortOrder::Asc,
        }
    }
}

/// Raw query parameters. Parsed leniently: anything unrecognised falls back
/// to the default.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GalleryQuery {
    pub section: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
}

/// Everything the render functions need besides the sections themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GalleryState {
    /// `None` only when there are no sections at all.
    pub selected: Option<u32>,
    pub sort: SortSpec,
}

impl GalleryState {
    /// First section selected, title ascending.
    pub fn initial(sections: &[Section]) -> Self {
        Self {
            selected: sections.first().map(|s| s.section_id),
            sort: SortSpec::default(),
        }
    }

    pub fn from_query(sections: &[Section], query: &GalleryQuery) -> Self {
        let mut state = Self::initial(sections);

        if let Some(id) = query.section.as_deref().and_then(|s| s.parse().ok()) {
            state.selected = Some(id);
        }

        // Only the title controls are live.
        if query.sort.as_deref() == Some(SortField::Title.as_str()) {
            state.sort = SortSpec {
                field: SortField::Title,
                order: query
                    .order
                    .as_deref()
                    .and_then(SortOrder::parse)
                    .unwrap_or(SortOrder::Asc),
            };
        }

        state
    }

    pub fn with_section(self, section_id: u32) -> Self {
        Self {
            selected: Some(section_id),
            ..self
        }
    }

    pub fn with_sort(self, sort: SortSpec) -> Self {
        Self { sort, ..self }
    }

    /// Link to the page rendered in this state.
    pub fn href(&self) -> String {
        let mut href = String::from("/?");
        if let Some(id) = self.selected {
            href.push_str(&format!("section={id}&"));
        }
        href.push_str(&format!(
            "sort={}&order={}",
            self.sort.field.as_str(),
            self.sort.order.as_str()
        ));
        href
    }
}

/// Order `items` by `spec`.
pub fn sort_items<'a>(items: &'a [Item], spec: SortSpec) -> Vec<&'a Item> {
    let mut sorted: Vec<&Item> = items.iter().collect();
    sorted.sort_by(|a, b| {
        let ordering = match spec.field {
            SortField::Title => a.title.cmp(&b.title),
            SortField::Year => a.year.cmp(&b.year),
        };
        match spec.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
    sorted
}

pub fn render_section_nav(sections: &[Section], state: &GalleryState) -> Markup {
    html! {
        @for (idx, section) in sections.iter().enumerate() {
            @if idx > 0 { " ○ " }
            @let is_selected = state.selected == Some(section.section_id);
            a href=(state.with_section(section.section_id).href())
                data-section-id=(section.section_id)
                class=[is_selected.then_some("selected")] {
                (section.section_title) " (" (section.items.len()) ")"
            }
        }
    }
}

pub fn render_sort_options(state: &GalleryState) -> Markup {
    let title_asc = state.with_sort(SortSpec {
        field: SortField::Title,
        order: SortOrder::Asc,
    });
    let title_desc = state.with_sort(SortSpec {
        field: SortField::Title,
        order: SortOrder::Desc,
    });

    html! {
        "Sorting by " (state.sort.field.as_str()) ", " (state.sort.order.describe()) ". "
        "Sort instead by: "
        "Title "
        a.sort href=(title_asc.href()) data-field="title" data-order="asc" { "⬆️" }
        " "
        a.sort href=(title_desc.href()) data-field="title" data-order="desc" { "⬇️" }
        " Year "
        span.sort.inert data-field="year" data-order="asc" { "⬆️" }
        " "
        span.sort.inert data-field="year" data-order="desc" { "⬇️" }
    }
}

/// The selected section's tiles. Empty when the selection matches no section.
pub fn render_grid(sections: &[Section], state: &GalleryState) -> Markup {
    let Some(section) = state
        .selected
        .and_then(|id| sections.iter().find(|s| s.section_id == id))
    else {
        return html! {};
    };

    html! {
        div id="media-list" class="gallery" {
            @for item in sort_items(&section.items, state.sort) {
                div.media-item {
                    img src=(item.image_200) alt=(item.title) loading="lazy";
                    h2 { (item.title) }
                    @if let Some(year) = item.year {
                        p { "(" (year) ")" }
                    }
                }
            }
        }
    }
}

/// The complete gallery document.
pub fn render_page(sections: &[Section], state: &GalleryState) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { "Library" }
                link rel="stylesheet" href="/style.css";
            }
            body {
                header {
                    nav #library-nav { (render_section_nav(sections, state)) }
                    div #sort-options { (render_sort_options(state)) }
                }
                main {
                    @if sections.is_empty() {
                        p.empty { "Library data not found." }
                    } @else {
                        (render_grid(sections, state))
                    }
                }
            }
        }
    }
}
