use axum::http::Uri;
use serde::{Deserialize, Serialize};
use url::Url;

pub(crate) const DEFAULT_PAGE_SIZE: i64 = 6;
pub(crate) const MAX_PAGE_SIZE: i64 = 100;

/// `?page=&limit=` as sent by the client. Values below 1 fall back to the
/// defaults.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub(crate) struct PageParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageParams {
    pub(crate) fn page(self) -> i64 {
        self.page.filter(|page| *page >= 1).unwrap_or(1)
    }

    pub(crate) fn limit(self) -> i64 {
        self.limit
            .filter(|limit| *limit >= 1)
            .map_or(DEFAULT_PAGE_SIZE, |limit| limit.min(MAX_PAGE_SIZE))
    }

    pub(crate) fn offset(self) -> i64 {
        (self.page() - 1).saturating_mul(self.limit())
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct Page<T> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Links are built against `base_url` using the path and query of the
    /// request that produced this page.
    pub(crate) fn new(
        results: Vec<T>,
        count: i64,
        params: PageParams,
        base_url: &Url,
        uri: &Uri,
    ) -> Self {
        let page = params.page();
        let limit = params.limit();

        let has_next = page.saturating_mul(limit) < count;
        let has_previous = page > 1;

        Self {
            count,
            next: has_next.then(|| page_link(base_url, uri, page + 1)),
            previous: has_previous.then(|| page_link(base_url, uri, page - 1)),
            results,
        }
    }
}

/// The request URL with its `page` parameter swapped for `page`. The first
/// page is linked without a `page` parameter at all.
pub(crate) fn page_link(base_url: &Url, uri: &Uri, page: i64) -> String {
    let mut url = base_url.clone();
    url.set_path(uri.path());
    url.set_query(None);

    let kept: Vec<(String, String)> = uri
        .query()
        .map(|query| {
            url::form_urlencoded::parse(query.as_bytes())
                .filter(|(key, _)| key != "page")
                .map(|(key, value)| (key.into_owned(), value.into_owned()))
                .collect()
        })
        .unwrap_or_default();

    if !kept.is_empty() || page > 1 {
        let mut query = url.query_pairs_mut();
        for (key, value) in &kept {
            query.append_pair(key, value);
        }
        if page > 1 {
            query.append_pair("page", &page.to_string());
        }
    }

    url.into()
}

#[cfg(test)]
mod test {
    use super::*;

    fn base() -> Url {
        Url::parse("https://foodgram.example").unwrap()
    }

    #[test]
    fn defaults_and_clamping() {
        let params = PageParams::default();
        assert_eq!((params.page(), params.limit(), params.offset()), (1, 6, 0));

        let params = PageParams {
            page: Some(3),
            limit: Some(1000),
        };
        assert_eq!((params.page(), params.limit(), params.offset()), (3, 100, 200));

        let params = PageParams {
            page: Some(0),
            limit: Some(-4),
        };
        assert_eq!((params.page(), params.limit(), params.offset()), (1, 6, 0));
    }

    #[test]
    fn links_keep_other_filters() {
        let uri: Uri = "/api/recipes/?tags=lunch&page=2&tags=dinner&limit=2"
            .parse()
            .unwrap();

        assert_eq!(
            page_link(&base(), &uri, 3),
            "https://foodgram.example/api/recipes/?tags=lunch&tags=dinner&limit=2&page=3"
        );
        assert_eq!(
            page_link(&base(), &uri, 1),
            "https://foodgram.example/api/recipes/?tags=lunch&tags=dinner&limit=2"
        );
    }

    #[test]
    fn first_page_without_query_has_no_question_mark() {
        let uri: Uri = "/api/users/?page=2".parse().unwrap();

        assert_eq!(page_link(&base(), &uri, 1), "https://foodgram.example/api/users/");
    }

    #[test]
    fn page_neighbours() {
        let uri: Uri = "/api/users/?page=2&limit=2".parse().unwrap();
        let params = PageParams {
            page: Some(2),
            limit: Some(2),
        };

        let page = Page::new(vec!["c", "d"], 5, params, &base(), &uri);
        assert_eq!(
            page.next.as_deref(),
            Some("https://foodgram.example/api/users/?limit=2&page=3")
        );
        assert_eq!(
            page.previous.as_deref(),
            Some("https://foodgram.example/api/users/?limit=2")
        );

        let last = Page::new(
            vec!["e"],
            5,
            PageParams {
                page: Some(3),
                limit: Some(2),
            },
            &base(),
            &uri,
        );
        assert_eq!(last.next, None);
    }

    #[test]
    fn empty_listing_has_no_links() {
        let uri: Uri = "/api/recipes/".parse().unwrap();
        let page = Page::<()>::new(Vec::new(), 0, PageParams::default(), &base(), &uri);

        assert_eq!(page.next, None);
        assert_eq!(page.previous, None);
    }
}
