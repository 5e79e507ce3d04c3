//! Paginated lister
//!
//! Drains a paged listing endpoint into one in-memory collection. Listing
//! stops at the first page that reports itself empty; a short page does not
//! end it. Any page failure discards what was gathered so far.

use super::error::TeardownError;
use crate::api::ApiResult;
use orbit_common::{Page, Paging, ResourceKind};
use std::future::Future;
use tracing::debug;

/// Fetch every page of `kind` starting at page 1.
///
/// `fetch` is called with successive cursors until it returns an empty page.
///
/// # Errors
/// [`TeardownError::Listing`] naming the page that failed.
pub async fn list_all<T, F, Fut>(
    kind: ResourceKind,
    page_size: u32,
    mut fetch: F,
) -> Result<Vec<T>, TeardownError>
where
    F: FnMut(Paging) -> Fut,
    Fut: Future<Output = ApiResult<Page<T>>>,
{
    let mut items = Vec::new();
    let mut paging = Paging::first(page_size);

    loop {
        let page = fetch(paging)
            .await
            .map_err(|source| TeardownError::Listing {
                kind,
                page: paging.page_number,
                source,
            })?;

        if page.is_empty() {
            break;
        }

        debug!(
            kind = %kind,
            page = paging.page_number,
            count = page.items.len(),
            "Fetched page"
        );
        items.extend(page.items);
        paging.next();
    }

    debug!(kind = %kind, total = items.len(), "Listing complete");
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use std::sync::Mutex;

    /// Serve `pages` in order, then empty pages, recording each request
    fn paged(
        pages: Vec<Vec<u32>>,
        requests: &Mutex<Vec<Paging>>,
    ) -> impl FnMut(Paging) -> std::future::Ready<ApiResult<Page<u32>>> + '_ {
        move |paging| {
            requests.lock().unwrap().push(paging);
            let index = (paging.page_number - 1) as usize;
            let items = pages.get(index).cloned().unwrap_or_default();
            std::future::ready(Ok(Page::new(items, paging)))
        }
    }

    #[tokio::test]
    async fn test_collects_every_page_in_order() {
        let requests = Mutex::new(Vec::new());
        let pages = vec![vec![1, 2, 3], vec![4, 5, 6], vec![7]];

        let items = list_all(ResourceKind::Server, 3, paged(pages, &requests))
            .await
            .unwrap();

        assert_eq!(items, vec![1, 2, 3, 4, 5, 6, 7]);
        let requests = requests.into_inner().unwrap();
        assert_eq!(requests.len(), 4, "K pages plus the terminating empty page");
        assert!(requests.iter().all(|p| p.page_size == 3));
        assert_eq!(
            requests.iter().map(|p| p.page_number).collect::<Vec<_>>(),
            vec![1, 2, 3, 4]
        );
    }

    #[tokio::test]
    async fn test_short_page_does_not_end_listing() {
        let requests = Mutex::new(Vec::new());
        let pages = vec![vec![1], vec![2]];

        let items = list_all(ResourceKind::Vlan, 20, paged(pages, &requests))
            .await
            .unwrap();

        assert_eq!(items, vec![1, 2]);
        assert_eq!(requests.into_inner().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_empty_inventory() {
        let requests = Mutex::new(Vec::new());

        let items = list_all(ResourceKind::NatRule, 20, paged(Vec::new(), &requests))
            .await
            .unwrap();

        assert!(items.is_empty());
        assert_eq!(requests.into_inner().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_page_failure_aborts_listing() {
        let mut calls = 0;
        let result: Result<Vec<u32>, _> = list_all(ResourceKind::PublicIpBlock, 2, |paging| {
            calls += 1;
            std::future::ready(if paging.page_number == 2 {
                Err(ApiError::transport(anyhow::anyhow!("connection reset")))
            } else {
                Ok(Page::new(vec![1, 2], paging))
            })
        })
        .await;

        match result {
            Err(TeardownError::Listing { kind, page, .. }) => {
                assert_eq!(kind, ResourceKind::PublicIpBlock);
                assert_eq!(page, 2);
            }
            other => panic!("Expected listing error, got {other:?}"),
        }
        assert_eq!(calls, 2);
    }
}
