//! Page-number pagination and the paginated GeoJSON envelope.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

use crate::error::GeoRestError;
use crate::params::QueryParams;

const INVALID_PAGE: &str = "Invalid page.";
const LAST_PAGE: &str = "last";

/// One page of a result set.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Number of items in the whole result set.
    pub count: usize,
    /// Link to the next page, if there is one.
    pub next: Option<String>,
    /// Link to the previous page, if there is one.
    pub previous: Option<String>,
    /// Items of this page.
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Converts the items of the page, keeping the links.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            count: self.count,
            next: self.next,
            previous: self.previous,
            results: self.results.into_iter().map(f).collect(),
        }
    }
}

/// Splits result sets into numbered pages selected with the `page` query parameter.
///
/// Pagination applies only when a page size is known: either configured with `page_size` or
/// requested through `page_size_query_param`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageNumberPagination {
    /// Default number of items per page.
    pub page_size: Option<usize>,
    /// Parameter selecting the page. Its value is a 1-based number or `last`.
    pub page_query_param: String,
    /// Parameter letting the client choose the page size.
    pub page_size_query_param: Option<String>,
    /// Upper bound for a client chosen page size.
    pub max_page_size: Option<usize>,
}

impl Default for PageNumberPagination {
    fn default() -> Self {
        Self {
            page_size: None,
            page_query_param: "page".into(),
            page_size_query_param: Some("page_size".into()),
            max_page_size: None,
        }
    }
}

impl PageNumberPagination {
    /// Pagination with no default page size.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default page size.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Sets the upper bound for client chosen page sizes.
    pub fn with_max_page_size(mut self, max_page_size: usize) -> Self {
        self.max_page_size = Some(max_page_size);
        self
    }

    /// Sets or disables the page size parameter.
    pub fn with_page_size_query_param(mut self, param: Option<String>) -> Self {
        self.page_size_query_param = param;
        self
    }

    /// Page size for the request. Invalid or zero client values fall back to the default.
    pub fn get_page_size(&self, params: &QueryParams) -> Option<usize> {
        let requested = self
            .page_size_query_param
            .as_deref()
            .and_then(|param| params.get_non_empty(param))
            .and_then(|value| value.trim().parse::<usize>().ok())
            .filter(|size| *size > 0);

        match (requested, self.max_page_size) {
            (Some(size), Some(max)) => Some(size.min(max)),
            (Some(size), None) => Some(size),
            (None, _) => self.page_size,
        }
    }

    /// Cuts the page requested by `params` out of `items`.
    ///
    /// `url` is the request URL without the query string; it is used to build the `next` and
    /// `previous` links. Returns `Ok(None)` if pagination does not apply to the request.
    pub fn paginate<'a, T>(
        &self,
        items: &'a [T],
        params: &QueryParams,
        url: &str,
    ) -> Result<Option<Page<&'a T>>, GeoRestError> {
        let Some(page_size) = self.get_page_size(params) else {
            return Ok(None);
        };

        let count = items.len();
        let num_pages = count.div_ceil(page_size).max(1);
        let page_number = match params.get_non_empty(&self.page_query_param) {
            None => 1,
            Some(LAST_PAGE) => num_pages,
            Some(value) => value
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| (1..=num_pages).contains(n))
                .ok_or_else(|| {
                    log::debug!("Page {value:?} requested, {num_pages} pages available");
                    GeoRestError::NotFound(INVALID_PAGE.into())
                })?,
        };

        let results = items
            .iter()
            .skip((page_number - 1) * page_size)
            .take(page_size)
            .collect();

        let next = (page_number < num_pages)
            .then(|| self.page_link(url, params, page_number + 1));
        let previous = (page_number > 1).then(|| self.page_link(url, params, page_number - 1));

        Ok(Some(Page {
            count,
            next,
            previous,
            results,
        }))
    }

    /// `{count, next, previous, results}` body.
    pub fn paginated_response(&self, page: Page<JsonValue>) -> JsonValue {
        json!({
            "count": page.count,
            "next": page.next,
            "previous": page.previous,
            "results": page.results,
        })
    }

    fn page_link(&self, url: &str, params: &QueryParams, page_number: usize) -> String {
        let mut params = params.clone();
        if page_number == 1 {
            params.remove(&self.page_query_param);
        } else {
            params.set(&self.page_query_param, page_number.to_string());
        }

        if params.is_empty() {
            url.to_string()
        } else {
            format!("{url}?{}", params.to_query_string())
        }
    }
}

/// Page-number pagination producing a `FeatureCollection` envelope:
/// `{type, count, next, previous, features}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeoJsonPagination {
    inner: PageNumberPagination,
}

impl GeoJsonPagination {
    /// Wraps page-number pagination settings.
    pub fn new(inner: PageNumberPagination) -> Self {
        Self { inner }
    }

    /// Underlying page-number settings.
    pub fn settings(&self) -> &PageNumberPagination {
        &self.inner
    }

    /// See [`PageNumberPagination::paginate`].
    pub fn paginate<'a, T>(
        &self,
        items: &'a [T],
        params: &QueryParams,
        url: &str,
    ) -> Result<Option<Page<&'a T>>, GeoRestError> {
        self.inner.paginate(items, params, url)
    }

    /// Builds the paginated `FeatureCollection` from a page of encoded features.
    pub fn paginated_response(&self, page: Page<JsonValue>) -> JsonValue {
        json!({
            "type": "FeatureCollection",
            "count": page.count,
            "next": page.next,
            "previous": page.previous,
            "features": page.results,
        })
    }
}
