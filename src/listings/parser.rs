use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use url::Url;

use crate::entities::RawRecord;

fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap()
}

static CONTAINER: LazyLock<Selector> = LazyLock::new(|| selector("div.artopp"));
static HEADING: LazyLock<Selector> =
    LazyLock::new(|| selector("h3.b_categorical-heading.mod--artopps"));
static ALERT: LazyLock<Selector> =
    LazyLock::new(|| selector("p.b_ending-alert.mod--just-opened"));
static TITLE: LazyLock<Selector> = LazyLock::new(|| selector("h2"));
static DATE_UPDATED: LazyLock<Selector> = LazyLock::new(|| selector("p.b_date"));
static BODY: LazyLock<Selector> = LazyLock::new(|| selector("div.m_body-copy"));
static SUBMIT_LINK: LazyLock<Selector> = LazyLock::new(|| selector("a.b_submit.mod--next"));

/// Optional nested element. Every accessor yields a value, empty when the
/// element (or attribute) is absent.
#[derive(Clone, Copy)]
struct Lookup<'a>(Option<ElementRef<'a>>);

impl<'a> Lookup<'a> {
    fn first(scope: ElementRef<'a>, selector: &Selector) -> Self {
        Self(scope.select(selector).next())
    }

    fn text(self) -> String {
        self.0
            .map(|el| el.text().collect::<String>().trim().to_string())
            .unwrap_or_default()
    }

    fn attr(self, name: &str) -> String {
        self.0
            .and_then(|el| el.value().attr(name))
            .map(str::to_string)
            .unwrap_or_default()
    }
}

/// Parse every listing container on the page, in document order.
///
/// `base_url` resolves relative application links; values that do not join
/// cleanly are kept as written.
pub fn parse_listing(html: &str, base_url: Option<&Url>) -> Vec<RawRecord> {
    let document = Html::parse_document(html);

    document
        .select(&CONTAINER)
        .map(|container| {
            let href = Lookup::first(container, &SUBMIT_LINK).attr("href");
            RawRecord {
                location_tag: Lookup(Some(container)).attr("data-d"),
                status_tag: Lookup(Some(container)).attr("data-a"),
                heading: Lookup::first(container, &HEADING).text(),
                alert_badge: Lookup::first(container, &ALERT).text(),
                title: Lookup::first(container, &TITLE).text(),
                date_updated: Lookup::first(container, &DATE_UPDATED).text(),
                body: Lookup::first(container, &BODY).text(),
                application_url: resolve_link(&href, base_url),
            }
        })
        .collect()
}

fn resolve_link(href: &str, base_url: Option<&Url>) -> String {
    if href.is_empty() {
        return String::new();
    }
    match base_url.map(|base| base.join(href)) {
        Some(Ok(absolute)) => absolute.to_string(),
        _ => href.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"
        <html><body>
          <div class="artopp" data-d="london" data-a="open">
            <h3 class="b_categorical-heading mod--artopps">Residency</h3>
            <p class="b_ending-alert mod--just-opened">Just opened</p>
            <h2> Summer Studio Residency </h2>
            <p class="b_date">Updated 3 June 2025</p>
            <div class="m_body-copy"><p>Deadline 1 July.</p><p>No fee.</p></div>
            <a class="b_submit mod--next" href="/apply/summer">Apply</a>
          </div>
          <div class="artopp">
            <h2>Open Prize</h2>
          </div>
          <div class="other"><h2>Not a listing</h2></div>
        </body></html>
    "#;

    #[test]
    fn test_parses_every_container_in_order() {
        let records = parse_listing(LISTING, None);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "Summer Studio Residency");
        assert_eq!(records[1].title, "Open Prize");
    }

    #[test]
    fn test_extracts_all_attributes() {
        let base = Url::parse("https://www.artrabbit.com/artist-opportunities/").unwrap();
        let record = &parse_listing(LISTING, Some(&base))[0];

        assert_eq!(record.location_tag, "london");
        assert_eq!(record.status_tag, "open");
        assert_eq!(record.heading, "Residency");
        assert_eq!(record.alert_badge, "Just opened");
        assert_eq!(record.date_updated, "Updated 3 June 2025");
        assert_eq!(record.body, "Deadline 1 July.No fee.");
        assert_eq!(
            record.application_url,
            "https://www.artrabbit.com/apply/summer"
        );
    }

    #[test]
    fn test_missing_elements_default_to_empty() {
        let record = &parse_listing(LISTING, None)[1];
        assert_eq!(
            record,
            &RawRecord {
                title: "Open Prize".into(),
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_relative_link_without_base_is_kept() {
        let record = &parse_listing(LISTING, None)[0];
        assert_eq!(record.application_url, "/apply/summer");
    }

    #[test]
    fn test_link_without_href_is_empty() {
        let html = r#"<div class="artopp"><a class="b_submit mod--next">Apply</a></div>"#;
        let records = parse_listing(html, None);
        assert_eq!(records[0].application_url, "");
    }

    #[test]
    fn test_page_without_containers() {
        let html = "<html><body><p>No opportunities today</p></body></html>";
        assert!(parse_listing(html, None).is_empty());
    }

    #[cfg(feature = "fuzz")]
    mod fuzz {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_parse_never_panics(html in ".*") {
                let _ = parse_listing(&html, None);
            }

            #[test]
            fn test_wrapped_fragments_yield_one_record(body in "[a-zA-Z0-9 .,]{0,200}") {
                let html = format!(r#"<div class="artopp"><div class="m_body-copy">{body}</div></div>"#);
                let records = parse_listing(&html, None);
                prop_assert_eq!(records.len(), 1);
                prop_assert_eq!(records[0].body.as_str(), body.trim());
            }
        }
    }
}
