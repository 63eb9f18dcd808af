use async_trait::async_trait;
use serde::Serialize;

use crate::domain::error::DomainError;

/// Items per page, shared by every paginated view.
pub const PAGE_CAPACITY: u64 = 10;

/// A collection that can report its size and hand out a window of itself
/// without being loaded whole.
#[async_trait]
pub trait PageSource: Send + Sync {
    type Item: Send;

    async fn count(&self) -> Result<u64, DomainError>;
    async fn slice(&self, offset: u64, limit: u64) -> Result<Vec<Self::Item>, DomainError>;
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// The page actually served, after clamping.
    pub number: u64,
    pub num_pages: u64,
    pub count: u64,
    pub has_previous: bool,
    pub has_next: bool,
}

impl<T> Page<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    per_page: u64,
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(PAGE_CAPACITY)
    }
}

impl Paginator {
    pub fn new(per_page: u64) -> Self {
        Self {
            per_page: per_page.max(1),
        }
    }

    pub fn per_page(&self) -> u64 {
        self.per_page
    }

    /// An empty collection still has one (empty) page.
    pub fn num_pages(&self, count: u64) -> u64 {
        count.div_ceil(self.per_page).max(1)
    }

    /// Maps a raw `?page=` value onto a valid page number. Never fails:
    /// missing or garbage input gives page 1, anything below 1 gives page 1,
    /// anything past the end gives the last page.
    pub fn resolve(&self, raw: Option<&str>, count: u64) -> u64 {
        let last = self.num_pages(count);
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return 1;
        };

        match raw.parse::<i64>() {
            Ok(n) if n < 1 => 1,
            Ok(n) => (n as u64).min(last),
            // digits that overflow i64 are still "past the end"
            Err(_) if raw.trim_start_matches('+').bytes().all(|b| b.is_ascii_digit()) => last,
            Err(_) => 1,
        }
    }

    pub async fn paginate<S>(&self, source: &S, raw: Option<&str>) -> Result<Page<S::Item>, DomainError>
    where
        S: PageSource + ?Sized,
    {
        let count = source.count().await?;
        let num_pages = self.num_pages(count);
        let number = self.resolve(raw, count);

        let items = if count == 0 {
            Vec::new()
        } else {
            source.slice((number - 1) * self.per_page, self.per_page).await?
        };

        Ok(Page {
            items,
            number,
            num_pages,
            count,
            has_previous: number > 1,
            has_next: number < num_pages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Numbers(Vec<u32>);

    #[async_trait]
    impl PageSource for Numbers {
        type Item = u32;

        async fn count(&self) -> Result<u64, DomainError> {
            Ok(self.0.len() as u64)
        }

        async fn slice(&self, offset: u64, limit: u64) -> Result<Vec<u32>, DomainError> {
            Ok(self
                .0
                .iter()
                .skip(offset as usize)
                .take(limit as usize)
                .copied()
                .collect())
        }
    }

    fn numbers(n: u32) -> Numbers {
        Numbers((1..=n).collect())
    }

    #[actix_web::test]
    async fn page_count_and_last_page_size() {
        let paginator = Paginator::default();
        for total in [1u32, 9, 10, 11, 20, 23, 100] {
            let source = numbers(total);
            let expected_pages = (total as u64).div_ceil(PAGE_CAPACITY);
            let last = paginator
                .paginate(&source, Some(&expected_pages.to_string()))
                .await
                .unwrap();

            assert_eq!(last.num_pages, expected_pages, "total={total}");
            let remainder = total as u64 % PAGE_CAPACITY;
            let expected_len = if remainder == 0 { PAGE_CAPACITY } else { remainder };
            assert_eq!(last.len() as u64, expected_len, "total={total}");
            assert!(!last.has_next);
        }
    }

    #[actix_web::test]
    async fn twelve_items_split_ten_and_two() {
        let paginator = Paginator::default();
        let source = numbers(12);

        let first = paginator.paginate(&source, Some("1")).await.unwrap();
        assert_eq!(first.items, (1..=10).collect::<Vec<_>>());
        assert!(first.has_next);
        assert!(!first.has_previous);

        let second = paginator.paginate(&source, Some("2")).await.unwrap();
        assert_eq!(second.items, vec![11, 12]);
        assert!(second.has_previous);
        assert_eq!(source.0.len(), 12);
    }

    #[actix_web::test]
    async fn bad_page_numbers_are_clamped() {
        let paginator = Paginator::default();
        let source = numbers(25);

        for raw in [None, Some(""), Some("abc"), Some("2.5"), Some("0"), Some("-4")] {
            let page = paginator.paginate(&source, raw).await.unwrap();
            assert_eq!(page.number, 1, "raw={raw:?}");
        }
        for raw in ["4", "99", "99999999999999999999999"] {
            let page = paginator.paginate(&source, Some(raw)).await.unwrap();
            assert_eq!(page.number, 3, "raw={raw}");
            assert_eq!(page.len(), 5);
        }
    }

    #[actix_web::test]
    async fn empty_source_has_one_empty_page() {
        let page = Paginator::default()
            .paginate(&numbers(0), Some("3"))
            .await
            .unwrap();
        assert_eq!(page.number, 1);
        assert_eq!(page.num_pages, 1);
        assert!(page.is_empty());
        assert!(!page.has_next && !page.has_previous);
    }
}
