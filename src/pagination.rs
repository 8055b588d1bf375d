//! Page-number pagination for list endpoints.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub page_size: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

fn invalid_page() -> AppError {
    AppError::NotFound("Invalid page.".to_string())
}

impl PageRequest {
    /// A bad page number is a 404; a bad page size falls back to the default.
    pub fn from_query(query: &PageQuery) -> Result<Self, AppError> {
        let page = match query.page.as_deref().map(str::trim) {
            None | Some("") => 1,
            Some("last") => u32::MAX,
            Some(raw) => match raw.parse::<u32>() {
                Ok(n) if n >= 1 => n,
                _ => return Err(invalid_page()),
            },
        };

        let page_size = query
            .page_size
            .as_deref()
            .and_then(|raw| raw.trim().parse::<u32>().ok())
            .filter(|n| *n >= 1)
            .map(|n| n.min(MAX_PAGE_SIZE))
            .unwrap_or(DEFAULT_PAGE_SIZE);

        Ok(PageRequest { page, page_size })
    }

    /// Clamps `last` and rejects pages past the end. Page 1 always exists.
    pub fn resolve(self, count: i64) -> Result<Self, AppError> {
        let last_page = last_page(count, self.page_size);
        let page = if self.page == u32::MAX { last_page } else { self.page };
        if page > last_page {
            return Err(invalid_page());
        }
        Ok(PageRequest { page, ..self })
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.page_size)
    }
}

pub fn last_page(count: i64, page_size: u32) -> u32 {
    let size = i64::from(page_size.max(1));
    let pages = (count.max(0) + size - 1) / size;
    u32::try_from(pages.max(1)).unwrap_or(u32::MAX)
}

impl<T> Paginated<T> {
    /// Wraps one page of results and builds `next`/`previous` links on `path`.
    pub fn new(path: &str, request: PageRequest, count: i64, results: Vec<T>) -> Self {
        let last = last_page(count, request.page_size);
        let link = |page: u32| {
            let query = serde_urlencoded::to_string(vec![
                ("page", page.to_string()),
                ("page_size", request.page_size.to_string()),
            ])
            .unwrap_or_default();
            format!("{path}?{query}")
        };

        Paginated {
            count,
            next: (request.page < last).then(|| link(request.page + 1)),
            previous: (request.page > 1).then(|| link(request.page - 1)),
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<&str>, page_size: Option<&str>) -> PageQuery {
        PageQuery {
            page: page.map(str::to_string),
            page_size: page_size.map(str::to_string),
        }
    }

    #[test]
    fn defaults_to_first_page_of_ten() {
        let req = PageRequest::from_query(&PageQuery::default()).unwrap();
        assert_eq!(req, PageRequest { page: 1, page_size: 10 });
        assert_eq!(req.offset(), 0);
        assert_eq!(req.limit(), 10);
    }

    #[test]
    fn page_size_is_capped() {
        let req = PageRequest::from_query(&query(None, Some("500"))).unwrap();
        assert_eq!(req.page_size, MAX_PAGE_SIZE);
        let req = PageRequest::from_query(&query(None, Some("zero"))).unwrap();
        assert_eq!(req.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn garbage_page_is_not_found() {
        for raw in ["0", "-1", "two"] {
            let err = PageRequest::from_query(&query(Some(raw), None)).unwrap_err();
            assert!(matches!(err, AppError::NotFound(_)));
        }
    }

    #[test]
    fn empty_result_still_has_page_one() {
        let req = PageRequest::from_query(&query(Some("1"), None)).unwrap();
        assert!(req.resolve(0).is_ok());
        let req = PageRequest::from_query(&query(Some("2"), None)).unwrap();
        assert!(req.resolve(0).is_err());
    }

    #[test]
    fn last_resolves_to_final_page() {
        let req = PageRequest::from_query(&query(Some("last"), Some("10"))).unwrap();
        let req = req.resolve(25).unwrap();
        assert_eq!(req.page, 3);
        assert_eq!(req.offset(), 20);
    }

    #[test]
    fn links_point_both_ways() {
        let req = PageRequest { page: 2, page_size: 10 };
        let page = Paginated::new("/api/cinema/orders", req, 25, vec![(); 10]);
        assert_eq!(page.next.as_deref(), Some("/api/cinema/orders?page=3&page_size=10"));
        assert_eq!(page.previous.as_deref(), Some("/api/cinema/orders?page=1&page_size=10"));

        let req = PageRequest { page: 3, page_size: 10 };
        let page = Paginated::new("/api/cinema/orders", req, 25, vec![(); 5]);
        assert!(page.next.is_none());
    }
}
