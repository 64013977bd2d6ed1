use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::HarvestError;
use crate::listings::{NewJobListing, SENTINEL_LOCATION};

/// Ordered selectors for one field. The first selector whose first match has
/// non-empty text wins; later ones cover older markup still on the page.
#[derive(Debug, Clone)]
pub struct FieldStrategies {
    selectors: Vec<Selector>,
}

impl FieldStrategies {
    pub fn new(selectors: &[&str]) -> Result<Self, HarvestError> {
        let selectors = selectors
            .iter()
            .map(|s| parse_selector(s))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { selectors })
    }

    pub fn extract(&self, item: ElementRef<'_>) -> Option<String> {
        self.selectors.iter().find_map(|sel| {
            item.select(sel)
                .next()
                .map(element_text)
                .filter(|t| !t.is_empty())
        })
    }
}

/// Where everything lives on one listing site.
#[derive(Debug, Clone)]
pub struct SiteProfile {
    pub base_url: Url,
    pub source_site: String,
    /// Substring an anchor's `href` must contain to count as the detail link.
    pub detail_path_marker: String,
    pub list_items: Selector,
    pub anchors: Selector,
    pub title: FieldStrategies,
    pub company: FieldStrategies,
    pub location: FieldStrategies,
    pub salary_container: Selector,
    pub salary_entries: Selector,
}

impl SiteProfile {
    pub fn weworkremotely() -> Result<Self, HarvestError> {
        let base = "https://weworkremotely.com";
        Ok(Self {
            base_url: Url::parse(base).map_err(|e| HarvestError::InvalidUrl {
                url: base.to_string(),
                reason: e.to_string(),
            })?,
            source_site: "WeWorkRemotely".to_string(),
            detail_path_marker: "/remote-jobs/".to_string(),
            list_items: parse_selector("section#category-2 li")?,
            anchors: parse_selector("a[href]")?,
            title: FieldStrategies::new(&["h4.new-listing__header__title", "span.title"])?,
            company: FieldStrategies::new(&["p.new-listing__company-name", "span.company"])?,
            location: FieldStrategies::new(&[
                "p.new-listing__company-headquarters",
                "span.region",
            ])?,
            salary_container: parse_selector("div.new-listing__categories")?,
            salary_entries: parse_selector("p.new-listing__categories__category")?,
        })
    }

    /// Extract every usable listing from a category page, in document order.
    pub fn parse_listings(&self, html: &str) -> Vec<NewJobListing> {
        let document = Html::parse_document(html);
        let items: Vec<ElementRef<'_>> = document.select(&self.list_items).collect();
        tracing::info!(items = items.len(), "found job list items");

        items
            .into_iter()
            .filter_map(|item| self.parse_item(item))
            .collect()
    }

    fn parse_item(&self, item: ElementRef<'_>) -> Option<NewJobListing> {
        let path = self.find_detail_link(item)?;
        let job_url = match self.base_url.join(path) {
            Ok(url) => url.to_string(),
            Err(e) => {
                tracing::debug!(href = path, error = %e, "skipping item with unresolvable link");
                return None;
            }
        };

        let job_title = self.title.extract(item);
        let company_name = self.company.extract(item);
        let (Some(job_title), Some(company_name)) = (job_title, company_name) else {
            tracing::debug!(job_url = %job_url, "skipping item without title or company");
            return None;
        };

        let location = self
            .location
            .extract(item)
            .unwrap_or_else(|| SENTINEL_LOCATION.to_string());

        Some(NewJobListing {
            job_title,
            company_name,
            location,
            job_url,
            salary_info: self.find_salary(item),
            source_site: self.source_site.clone(),
        })
    }

    fn find_detail_link<'a>(&self, item: ElementRef<'a>) -> Option<&'a str> {
        item.select(&self.anchors)
            .filter_map(|a| a.value().attr("href"))
            .find(|href| href.contains(&self.detail_path_marker))
    }

    fn find_salary(&self, item: ElementRef<'_>) -> Option<String> {
        let container = item.select(&self.salary_container).next()?;
        container
            .select(&self.salary_entries)
            .map(|entry| entry.text().collect::<String>())
            .find(|text| looks_like_salary(text))
            .map(|text| text.trim().to_string())
    }
}

pub fn looks_like_salary(text: &str) -> bool {
    text.contains('$') || text.contains("USD")
}

fn parse_selector(selector: &str) -> Result<Selector, HarvestError> {
    Selector::parse(selector).map_err(|e| HarvestError::Selector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

/// Text nodes trimmed and joined with single spaces.
fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
