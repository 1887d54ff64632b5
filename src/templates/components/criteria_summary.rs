use crate::domain::SearchCriteria;
use crate::templates::format::{baths, dollars, sqft_range};
use maud::{html, Markup};

pub fn criteria_summary(criteria: &SearchCriteria) -> Markup {
    html! {
        div class="summary" {
            h3 { "Search Criteria" }
            ul {
                li {
                    strong { "Price Range: " }
                    (dollars(criteria.min_price)) " - " (dollars(criteria.max_price))
                }
                li {
                    strong { "Year Built: " }
                    (criteria.min_year_built) " - " (criteria.max_year_built)
                }
                li { strong { "Property Types: " } (criteria.property_types_label()) }
                li { strong { "Minimum Bedrooms: " } (criteria.min_bedrooms) }
                li { strong { "Minimum Bathrooms: " } (baths(criteria.min_bathrooms)) }
                li {
                    strong { "Square Feet: " }
                    (sqft_range(criteria.min_sqft, criteria.max_sqft))
                }
                li {
                    strong { "Zip Codes: " }
                    @if criteria.zip_codes.is_empty() {
                        "any"
                    } @else {
                        (criteria.zip_codes.iter().cloned().collect::<Vec<_>>().join(", "))
                    }
                }
            }
        }
    }
}
