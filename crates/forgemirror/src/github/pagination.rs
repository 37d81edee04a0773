//! Link header parsing for paginated GitHub endpoints.
//!
//! GitHub reports pagination through the `Link` response header:
//! `<https://api.github.com/...&page=2>; rel="next", <...&page=5>; rel="last"`.
//! The sync cursor stores the next page number, so an interrupted run resumes
//! mid-collection instead of restarting from page one.

use url::Url;

/// Pagination extracted from a `Link` header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkPagination {
    /// The next page number, absent on the last page.
    pub next_page: Option<u32>,
    /// The last page number, when the host reports it.
    pub last_page: Option<u32>,
}

impl LinkPagination {
    /// Whether more pages remain.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.next_page.is_some()
    }
}

/// Parse a `Link` header into pagination info. Unknown `rel` values and
/// malformed segments are ignored.
#[must_use]
pub fn parse_link_header(link_header: &str) -> LinkPagination {
    let mut info = LinkPagination::default();

    for part in link_header.split(',') {
        let part = part.trim();

        let mut url = None;
        let mut rel = None;
        for segment in part.split(';') {
            let segment = segment.trim();
            if segment.starts_with('<') && segment.ends_with('>') {
                url = Some(&segment[1..segment.len() - 1]);
            } else if let Some(value) = segment.strip_prefix("rel=") {
                rel = Some(value.trim_matches('"'));
            }
        }

        if let (Some(url), Some(rel)) = (url, rel)
            && let Some(page) = page_param(url)
        {
            match rel {
                "next" => info.next_page = Some(page),
                "last" => info.last_page = Some(page),
                _ => {}
            }
        }
    }

    info
}

/// Extract the `page` query parameter from a URL.
fn page_param(raw: &str) -> Option<u32> {
    let url = Url::parse(raw).ok()?;
    url.query_pairs()
        .find(|(name, _)| name == "page")
        .and_then(|(_, value)| value.parse().ok())
}
