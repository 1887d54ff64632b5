use crate::domain::{ListingRecord, SearchCriteria};
use crate::templates::{criteria_summary, email_layout, listing_card};
use chrono::{DateTime, Utc};
use maud::{html, Markup};

pub fn report_page(
    title: &str,
    listings: &[ListingRecord],
    criteria: &SearchCriteria,
    generated_at: DateTime<Utc>,
) -> Markup {
    let content = html! {
        div class="header" {
            h2 { "Daily House Listings Report" }
            p { strong { "Date: " } (generated_at.format("%Y-%m-%d %H:%M:%S UTC")) }
            p { strong { "New Listings: " } (listings.len()) }
        }

        @if listings.is_empty() {
            p class="empty" { "No new matches since the last report." }
        } @else {
            @for listing in listings {
                (listing_card(listing))
            }
        }

        (criteria_summary(criteria))
    };

    email_layout(title, content)
}
