//! Length-aware pagination
//!
//! Listings are served newest first, a fixed number per page, wrapped in an
//! envelope carrying absolute navigation URLs and a window of numbered
//! links. Asking for a page past the last one is a 404.

use crate::error::{AppError, Result};
use actix_web::HttpRequest;
use serde::{Deserialize, Serialize};
use std::iter;
use std::num::IntErrorKind;

/// Pages listed on each side of the current one in `links`.
const ON_EACH_SIDE: u32 = 3;

/// `?page=N` query string. Anything unparsable or below 1 means page 1.
/// A number too large for `u32` is kept as `u32::MAX` so it lands past the
/// last page.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    pub fn page_number(&self) -> u32 {
        let Some(raw) = self.page.as_deref() else {
            return 1;
        };
        let page = match raw.trim().parse::<u32>() {
            Ok(n) => n,
            Err(e) if matches!(e.kind(), IntErrorKind::PosOverflow) => u32::MAX,
            Err(_) => 1,
        };
        page.max(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
        }
    }

    pub fn from_query(query: &PageQuery, per_page: u32) -> Self {
        Self::new(query.page_number(), per_page)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.per_page)
    }

    pub fn last_page(&self, total: i64) -> u32 {
        let per_page = i64::from(self.per_page);
        let pages = (total.max(0) + per_page - 1) / per_page;
        u32::try_from(pages.max(1)).unwrap_or(u32::MAX)
    }

    /// 404 when the requested page lies beyond the last one.
    pub fn ensure_within(&self, total: i64) -> Result<()> {
        if self.page > self.last_page(total) {
            return Err(AppError::NotFound(format!("page {} does not exist", self.page)));
        }
        Ok(())
    }
}

/// Absolute URL of the current path, without query string.
pub fn base_url(req: &HttpRequest) -> String {
    let info = req.connection_info();
    format!("{}://{}{}", info.scheme(), info.host(), req.path())
}

/// One entry of the `links` array: previous, numbered pages with `...` gaps,
/// then next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageLink {
    pub url: Option<String>,
    pub label: String,
    pub active: bool,
}

impl PageLink {
    fn gap() -> Self {
        Self {
            url: None,
            label: "...".to_string(),
            active: false,
        }
    }
}

/// Page numbers shown around `current`; `None` is a gap.
fn link_window(current: u32, last: u32) -> Vec<Option<u32>> {
    let pages = |from: u32, to: u32| (from..=to).map(Some);

    if last < ON_EACH_SIDE * 2 + 8 {
        return pages(1, last).collect();
    }

    let window = ON_EACH_SIDE + 4;
    if current <= window {
        pages(1, window + ON_EACH_SIDE)
            .chain(iter::once(None))
            .chain(pages(last - 1, last))
            .collect()
    } else if current > last - window {
        pages(1, 2)
            .chain(iter::once(None))
            .chain(pages(last + 1 - window - ON_EACH_SIDE, last))
            .collect()
    } else {
        pages(1, 2)
            .chain(iter::once(None))
            .chain(pages(current - ON_EACH_SIDE, current + ON_EACH_SIDE))
            .chain(iter::once(None))
            .chain(pages(last - 1, last))
            .collect()
    }
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub current_page: u32,
    pub data: Vec<T>,
    pub first_page_url: String,
    pub from: Option<i64>,
    pub last_page: u32,
    pub last_page_url: String,
    pub links: Vec<PageLink>,
    pub next_page_url: Option<String>,
    pub path: String,
    pub per_page: u32,
    pub prev_page_url: Option<String>,
    pub to: Option<i64>,
    pub total: i64,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, total: i64, request: PageRequest, path: String) -> Self {
        let last_page = request.last_page(total);
        let url = |page: u32| format!("{}?page={}", path, page);

        let (from, to) = if data.is_empty() {
            (None, None)
        } else {
            let from = request.offset() + 1;
            (Some(from), Some(from + data.len() as i64 - 1))
        };

        let first_page_url = url(1);
        let last_page_url = url(last_page);
        let next_page_url = (request.page < last_page).then(|| url(request.page + 1));
        let prev_page_url = (request.page > 1).then(|| url(request.page - 1));

        let numbered = link_window(request.page, last_page)
            .into_iter()
            .map(|slot| match slot {
                Some(page) => PageLink {
                    url: Some(url(page)),
                    label: page.to_string(),
                    active: page == request.page,
                },
                None => PageLink::gap(),
            });
        let links = iter::once(PageLink {
            url: prev_page_url.clone(),
            label: "&laquo; Previous".to_string(),
            active: false,
        })
        .chain(numbered)
        .chain(iter::once(PageLink {
            url: next_page_url.clone(),
            label: "Next &raquo;".to_string(),
            active: false,
        }))
        .collect();

        Self {
            current_page: request.page,
            first_page_url,
            from,
            last_page,
            last_page_url,
            links,
            next_page_url,
            prev_page_url,
            per_page: request.per_page,
            to,
            total,
            data,
            path,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            current_page: self.current_page,
            data: self.data.into_iter().map(f).collect(),
            first_page_url: self.first_page_url,
            from: self.from,
            last_page: self.last_page,
            last_page_url: self.last_page_url,
            links: self.links,
            next_page_url: self.next_page_url,
            path: self.path,
            per_page: self.per_page,
            prev_page_url: self.prev_page_url,
            to: self.to,
            total: self.total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PATH: &str = "http://localhost/api/posts";

    #[test]
    fn page_query_defaults_to_first_page() {
        let q = |p: &str| PageQuery {
            page: Some(p.to_string()),
        };
        assert_eq!(PageQuery::default().page_number(), 1);
        assert_eq!(q("0").page_number(), 1);
        assert_eq!(q("-3").page_number(), 1);
        assert_eq!(q("abc").page_number(), 1);
        assert_eq!(q("4").page_number(), 4);
        assert_eq!(q(" 7 ").page_number(), 7);
    }

    #[test]
    fn oversized_page_numbers_saturate() {
        let q = |p: &str| PageQuery {
            page: Some(p.to_string()),
        };
        assert_eq!(q("4294967295").page_number(), u32::MAX);
        assert_eq!(q("4294967296").page_number(), u32::MAX);
        assert_eq!(q("99999999999999999999999").page_number(), u32::MAX);
        assert_eq!(q("-99999999999999999999999").page_number(), 1);

        let request = PageRequest::from_query(&q("4294967296"), 10);
        assert!(matches!(
            request.ensure_within(1),
            Err(AppError::NotFound(_))
        ));
        assert_eq!(request.offset(), i64::from(u32::MAX - 1) * 10);
    }

    fn labels(links: &[PageLink]) -> Vec<&str> {
        links.iter().map(|l| l.label.as_str()).collect()
    }

    #[test]
    fn short_listings_link_every_page() {
        let page = Page::new(vec![11], 21, PageRequest::new(2, 10), PATH.into());
        assert_eq!(
            labels(&page.links),
            vec!["&laquo; Previous", "1", "2", "3", "Next &raquo;"]
        );
        assert_eq!(page.links[0].url, page.prev_page_url);
        assert_eq!(page.links[4].url, page.next_page_url);
        assert!(page.links[2].active);
        assert!(!page.links[1].active);
        assert_eq!(
            page.links[3].url.as_deref(),
            Some("http://localhost/api/posts?page=3")
        );

        let empty: Page<i64> = Page::new(vec![], 0, PageRequest::new(1, 10), PATH.into());
        assert_eq!(
            labels(&empty.links),
            vec!["&laquo; Previous", "1", "Next &raquo;"]
        );
        assert_eq!(empty.links[0].url, None);
        assert_eq!(empty.links[2].url, None);
    }

    #[test]
    fn long_listings_collapse_into_a_window() {
        let at = |current: u32| {
            link_window(current, 20)
                .into_iter()
                .map(|slot| slot.map_or("...".to_string(), |p| p.to_string()))
                .collect::<Vec<_>>()
                .join(" ")
        };

        assert_eq!(at(1), "1 2 3 4 5 6 7 8 9 10 ... 19 20");
        assert_eq!(at(7), "1 2 3 4 5 6 7 8 9 10 ... 19 20");
        assert_eq!(at(10), "1 2 ... 7 8 9 10 11 12 13 ... 19 20");
        assert_eq!(at(14), "1 2 ... 11 12 13 14 15 16 17 18 19 20");
        assert_eq!(at(20), "1 2 ... 11 12 13 14 15 16 17 18 19 20");
        assert_eq!(link_window(5, 13).len(), 13);
    }

    #[test]
    fn gaps_have_no_url() {
        let page: Page<i64> = Page::new(vec![], 200, PageRequest::new(10, 10), PATH.into());
        let gaps: Vec<_> = page.links.iter().filter(|l| l.label == "...").collect();
        assert_eq!(gaps.len(), 2);
        assert!(gaps.iter().all(|l| l.url.is_none() && !l.active));
        assert_eq!(page.links.iter().filter(|l| l.active).count(), 1);
    }

    #[test]
    fn last_page_is_at_least_one() {
        let req = PageRequest::new(1, 10);
        assert_eq!(req.last_page(0), 1);
        assert_eq!(req.last_page(10), 1);
        assert_eq!(req.last_page(11), 2);
        assert_eq!(req.last_page(25), 3);
    }

    #[test]
    fn offset_and_limit() {
        let req = PageRequest::new(3, 10);
        assert_eq!(req.offset(), 20);
        assert_eq!(req.limit(), 10);
    }

    #[test]
    fn past_the_end_is_not_found() {
        assert!(PageRequest::new(1, 10).ensure_within(0).is_ok());
        assert!(PageRequest::new(3, 10).ensure_within(25).is_ok());
        assert!(matches!(
            PageRequest::new(4, 10).ensure_within(25),
            Err(AppError::NotFound(_))
        ));
        assert!(PageRequest::new(2, 10).ensure_within(10).is_err());
    }

    #[test]
    fn middle_page_envelope() {
        let data: Vec<i64> = (11..=20).collect();
        let page = Page::new(data, 25, PageRequest::new(2, 10), PATH.to_string());

        assert_eq!(page.current_page, 2);
        assert_eq!(page.from, Some(11));
        assert_eq!(page.to, Some(20));
        assert_eq!(page.last_page, 3);
        assert_eq!(page.first_page_url, "http://localhost/api/posts?page=1");
        assert_eq!(page.last_page_url, "http://localhost/api/posts?page=3");
        assert_eq!(
            page.next_page_url.as_deref(),
            Some("http://localhost/api/posts?page=3")
        );
        assert_eq!(
            page.prev_page_url.as_deref(),
            Some("http://localhost/api/posts?page=1")
        );
    }

    #[test]
    fn last_partial_page_envelope() {
        let page = Page::new(vec![1, 2, 3, 4, 5], 25, PageRequest::new(3, 10), PATH.into());
        assert_eq!(page.from, Some(21));
        assert_eq!(page.to, Some(25));
        assert_eq!(page.next_page_url, None);
    }

    #[test]
    fn empty_envelope_serializes_nulls() {
        let page: Page<i64> = Page::new(vec![], 0, PageRequest::new(1, 10), PATH.into());
        let json = serde_json::to_value(&page).unwrap();

        assert_eq!(json["from"], serde_json::Value::Null);
        assert_eq!(json["to"], serde_json::Value::Null);
        assert_eq!(json["prev_page_url"], serde_json::Value::Null);
        assert_eq!(json["next_page_url"], serde_json::Value::Null);
        assert_eq!(json["last_page"], 1);
        assert_eq!(json["total"], 0);
        assert_eq!(json["per_page"], 10);
        assert_eq!(json["path"], PATH);
        assert_eq!(json["links"].as_array().unwrap().len(), 3);
        assert_eq!(json["links"][1]["active"], true);
        assert!(json["data"].as_array().unwrap().is_empty());
    }

    #[test]
    fn map_keeps_metadata() {
        let page = Page::new(vec![1, 2], 2, PageRequest::new(1, 10), PATH.into());
        let mapped = page.map(|n| n * 10);
        assert_eq!(mapped.data, vec![10, 20]);
        assert_eq!(mapped.total, 2);
        assert_eq!(mapped.to, Some(2));
        assert_eq!(mapped.links.len(), 3);
    }
}
