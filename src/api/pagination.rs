use serde::Serialize;

use crate::schemas::attempt::{PageLink, PageMeta};

pub(crate) const fn default_limit() -> i64 {
    100
}

#[derive(Debug, Serialize)]
pub(crate) struct PaginatedResponse<T> {
    pub(crate) items: Vec<T>,
    pub(crate) total_count: i64,
    pub(crate) skip: i64,
    pub(crate) limit: i64,
}

/// One page of a fixed question sequence. Pages are 1-indexed and the slice
/// bounds are half-open, so page p of size P covers `[(p-1)*P, p*P)`.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct QuestionPage {
    pub(crate) page: usize,
    pub(crate) page_size: usize,
    pub(crate) total: usize,
    pub(crate) total_pages: usize,
    pub(crate) start: usize,
    pub(crate) end: usize,
}

impl QuestionPage {
    /// Rejects out-of-range requests instead of clamping them: a page past
    /// the end is a caller bug, not a view of an empty page.
    pub(crate) fn build(total: usize, page: usize, page_size: usize) -> Result<Self, String> {
        if page_size == 0 {
            return Err("page_size must be positive".to_string());
        }
        let total_pages = total.div_ceil(page_size);
        if page < 1 || (total > 0 && page > total_pages) {
            return Err(format!("page must be between 1 and {}", total_pages.max(1)));
        }

        let start = (page - 1) * page_size;
        let end = (start + page_size).min(total);

        Ok(Self { page, page_size, total, total_pages, start, end })
    }

    pub(crate) fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub(crate) fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// Continuous question number for a 0-indexed position within the page.
    pub(crate) fn ordinal(&self, local_index: usize) -> usize {
        self.start + local_index + 1
    }

    pub(crate) fn meta(&self) -> PageMeta {
        PageMeta {
            page: self.page,
            page_size: self.page_size,
            total_questions: self.total,
            total_pages: self.total_pages,
            has_previous: self.has_previous(),
            has_next: self.has_next(),
            pages: (1..=self.total_pages)
                .map(|number| PageLink { number, current: number == self.page })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn five_questions_page_size_two_gives_three_pages() {
        let page = QuestionPage::build(5, 2, 2).expect("page");

        assert_eq!(page.total_pages, 3);
        assert_eq!((page.start, page.end), (2, 4));
        assert_eq!(page.ordinal(0), 3);
        assert_eq!(page.ordinal(1), 4);
        assert!(page.has_previous());
        assert!(page.has_next());
    }

    #[test]
    fn pages_partition_the_sequence_exactly_once() {
        let total = 23;
        let page_size = 5;
        let total_pages = QuestionPage::build(total, 1, page_size).expect("page").total_pages;

        let mut covered = Vec::new();
        for number in 1..=total_pages {
            let page = QuestionPage::build(total, number, page_size).expect("page");
            covered.extend(page.start..page.end);
        }

        assert_eq!(covered, (0..total).collect::<Vec<_>>());
    }

    #[test]
    fn ordinals_are_continuous_across_pages() {
        let mut last = 0;
        for number in 1..=3 {
            let page = QuestionPage::build(9, number, 3).expect("page");
            for local in 0..(page.end - page.start) {
                assert_eq!(page.ordinal(local), last + 1);
                last = page.ordinal(local);
            }
        }
        assert_eq!(last, 9);
    }

    #[test]
    fn last_page_may_be_short() {
        let page = QuestionPage::build(5, 3, 2).expect("page");
        assert_eq!((page.start, page.end), (4, 5));
        assert!(page.has_previous());
        assert!(!page.has_next());
    }

    #[test]
    fn out_of_range_pages_are_rejected() {
        assert!(QuestionPage::build(5, 0, 2).is_err());
        assert!(QuestionPage::build(5, 4, 2).is_err());
        assert!(QuestionPage::build(5, 2, 0).is_err());
    }

    #[test]
    fn empty_sequence_still_serves_page_one() {
        let page = QuestionPage::build(0, 1, 10).expect("page");
        assert_eq!(page.total_pages, 0);
        assert_eq!((page.start, page.end), (0, 0));
        assert!(!page.has_previous());
        assert!(!page.has_next());
    }

    #[test]
    fn meta_marks_the_current_page() {
        let meta = QuestionPage::build(5, 2, 2).expect("page").meta();
        let current: Vec<usize> =
            meta.pages.iter().filter(|p| p.current).map(|p| p.number).collect();
        assert_eq!(current, vec![2]);
        assert_eq!(meta.pages.len(), 3);
    }
}
