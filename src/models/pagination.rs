use serde::Serialize;
use utoipa::ToSchema;

const DEFAULT_PER_PAGE: u64 = 20;
const MAX_PER_PAGE: u64 = 100;

#[derive(Debug, Clone, Copy)]
pub struct PaginationParams {
    pub page: u64,
    pub per_page: u64,
}

impl PaginationParams {
    pub fn new(page: Option<u32>, per_page: Option<u32>) -> Self {
        Self {
            page: page.map(u64::from).filter(|p| *p > 0).unwrap_or(1),
            per_page: per_page
                .map(u64::from)
                .filter(|p| *p > 0)
                .unwrap_or(DEFAULT_PER_PAGE)
                .min(MAX_PER_PAGE),
        }
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1) * self.per_page
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, params: PaginationParams, total: u64) -> Self {
        Self {
            items,
            page: params.page,
            per_page: params.per_page,
            total,
            total_pages: total.div_ceil(params.per_page),
        }
    }
}

pub type EventPage = PaginatedResponse<super::EventResponse>;
pub type MemberPage = PaginatedResponse<super::MemberResponse>;
pub type RegistrationPage = PaginatedResponse<super::RegistrationDetail>;
pub type PaymentPage = PaginatedResponse<super::PaymentResponse>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_and_counts_pages() {
        let params = PaginationParams::new(Some(0), Some(500));
        assert_eq!(params.page, 1);
        assert_eq!(params.per_page, MAX_PER_PAGE);

        let params = PaginationParams::new(Some(3), Some(10));
        assert_eq!(params.offset(), 20);
        let page = PaginatedResponse::new(vec![1, 2], params, 21);
        assert_eq!(page.total_pages, 3);
    }
}
