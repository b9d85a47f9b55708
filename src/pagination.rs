use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total_items: u64,
    pub total_pages: u64,
    pub current_page: u64,
    pub page_size: u64,
}

impl<T> PaginatedResponse<T> {
    /// Slice an already-filtered in-memory collection into one page.
    pub fn paginate(items: Vec<T>, page: u64, page_size: u64) -> Self {
        let total_items = items.len() as u64;
        let total_pages = if page_size == 0 {
            0
        } else {
            (total_items as f64 / page_size as f64).ceil() as u64
        };

        let offset = page.saturating_sub(1).saturating_mul(page_size) as usize;
        let data: Vec<T> = items
            .into_iter()
            .skip(offset)
            .take(page_size as usize)
            .collect();

        Self {
            data,
            total_items,
            total_pages,
            current_page: page,
            page_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paginate_slices_and_counts() {
        let items: Vec<u32> = (0..25).collect();

        let page = PaginatedResponse::paginate(items.clone(), 1, 10);
        assert_eq!(page.data, (0..10).collect::<Vec<u32>>());
        assert_eq!(page.total_items, 25);
        assert_eq!(page.total_pages, 3);

        let last = PaginatedResponse::paginate(items.clone(), 3, 10);
        assert_eq!(last.data, (20..25).collect::<Vec<u32>>());

        let past_end = PaginatedResponse::paginate(items, 5, 10);
        assert!(past_end.data.is_empty());
        assert_eq!(past_end.total_pages, 3);
    }
}
