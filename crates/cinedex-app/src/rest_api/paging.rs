use cinedex_dal::{movie::MOVIE_SORT_COLUMNS, Filters, Order};
use garde::Validate;

use crate::error::ApiResult;

/// Raw query string of movie listing
#[derive(Debug, Clone, Default, Validate, serde::Deserialize)]
#[garde(allow_unvalidated)]
pub struct ListQuery {
    #[garde(length(max = 500))]
    title: Option<String>,
    #[garde(length(max = 1000))]
    genres: Option<String>,
    page: Option<u32>,
    page_size: Option<u32>,
    #[garde(length(max = 255))]
    sort: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MovieQuery {
    pub title: String,
    pub genres: Vec<String>,
    pub filters: Filters,
}

fn parse_genres(genres: Option<String>) -> Vec<String> {
    genres
        .map(|s| {
            s.split(',')
                .map(|g| g.trim())
                .filter(|g| !g.is_empty())
                .map(|g| g.to_string())
                .collect()
        })
        .unwrap_or_default()
}

impl ListQuery {
    pub fn into_movie_query(self, default_page_size: u32) -> ApiResult<MovieQuery> {
        self.validate()?;
        let sort = self
            .sort
            .map(|s| s.parse::<Order>())
            .transpose()?
            .unwrap_or_default();
        let filters = Filters::new(
            self.page.unwrap_or(1),
            self.page_size.unwrap_or(default_page_size),
            sort,
        );
        // reject early, before touching database
        filters.ordering(MOVIE_SORT_COLUMNS)?;

        Ok(MovieQuery {
            title: self.title.unwrap_or_default().trim().to_string(),
            genres: parse_genres(self.genres),
            filters,
        })
    }
}
