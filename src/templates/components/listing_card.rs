use crate::domain::ListingRecord;
use crate::templates::format::{baths, dollars, thousands};
use maud::{html, Markup};

pub fn listing_card(listing: &ListingRecord) -> Markup {
    html! {
        div class="listing" {
            div class="price" { (dollars(listing.price)) }
            div class="address" { (listing.address) }
            div class="details" {
                strong { "Details: " }
                (listing.bedrooms) " bed, "
                (baths(listing.bathrooms)) " bath, "
                (thousands(listing.sqft as u64)) " sqft, built "
                (listing.year_built)
                br;
                strong { "Type: " } (listing.property_type)
                " · "
                strong { "Source: " } (listing.source)
            }
            div class="url" {
                a href=(listing.url) target="_blank" { "View Listing" }
            }
        }
    }
}
