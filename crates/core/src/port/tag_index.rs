// Tag Index Port
// Abstraction over a paginated tag -> resource side index

use super::error::PlatformError;
use crate::domain::{ResourcePage, TagQuery};
use async_trait::async_trait;

/// Tag index capability
///
/// Returns one page per call; callers drive pagination with the
/// `next_token` of the previous page.
#[async_trait]
pub trait TagIndex: Send + Sync {
    /// Fetch one page of resources matching `query`
    ///
    /// # Arguments
    /// * `query` - Tag key, accepted values and resource type filters
    /// * `page_token` - Token from the previous page (None for the first page)
    async fn get_resources(
        &self,
        query: &TagQuery,
        page_token: Option<&str>,
    ) -> Result<ResourcePage, PlatformError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::domain::TaggedResource;
    use std::sync::Mutex;

    /// Paged tag index fake
    ///
    /// Serves a fixed list of pages; page `i` is requested with token
    /// `page-{i}`. Items are served as-is, without applying the query.
    pub struct PagedTagIndex {
        pages: Vec<Vec<TaggedResource>>,
        fail_on_page: Option<(usize, PlatformError)>,
        requested_tokens: Mutex<Vec<Option<String>>>,
    }

    impl PagedTagIndex {
        pub fn new(pages: Vec<Vec<TaggedResource>>) -> Self {
            Self {
                pages,
                fail_on_page: None,
                requested_tokens: Mutex::new(Vec::new()),
            }
        }

        /// A single empty page
        pub fn empty() -> Self {
            Self::new(vec![Vec::new()])
        }

        /// Fail when page `index` (zero-based) is requested
        pub fn failing_on(mut self, index: usize, error: PlatformError) -> Self {
            self.fail_on_page = Some((index, error));
            self
        }

        /// Tokens received so far, in call order
        pub fn requested_tokens(&self) -> Vec<Option<String>> {
            self.requested_tokens.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.requested_tokens.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl TagIndex for PagedTagIndex {
        async fn get_resources(
            &self,
            _query: &TagQuery,
            page_token: Option<&str>,
        ) -> Result<ResourcePage, PlatformError> {
            self.requested_tokens
                .lock()
                .unwrap()
                .push(page_token.map(str::to_string));

            let index = match page_token {
                None => 0,
                Some(token) => token
                    .strip_prefix("page-")
                    .and_then(|n| n.parse::<usize>().ok())
                    .ok_or_else(|| PlatformError::Rejected(format!("bad token: {}", token)))?,
            };

            if let Some((fail_index, error)) = &self.fail_on_page {
                if *fail_index == index {
                    return Err(error.clone());
                }
            }

            let items = self.pages.get(index).cloned().unwrap_or_default();
            let next_token = (index + 1 < self.pages.len()).then(|| format!("page-{}", index + 1));

            Ok(ResourcePage { items, next_token })
        }
    }

    /// Tag index that hands back the same token forever
    pub struct LoopingTagIndex;

    #[async_trait]
    impl TagIndex for LoopingTagIndex {
        async fn get_resources(
            &self,
            _query: &TagQuery,
            _page_token: Option<&str>,
        ) -> Result<ResourcePage, PlatformError> {
            Ok(ResourcePage {
                items: Vec::new(),
                next_token: Some("again".to_string()),
            })
        }
    }
}
