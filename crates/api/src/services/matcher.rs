//! Product resolution: (listing title, option title) → catalog product id.
//!
//! Titles are normalized (trimmed, whitespace-collapsed including NBSP,
//! lowercased) before lookup. Resolution is exact-then-substring; a total
//! miss registers the pair as an unmatched candidate, which is an explicit
//! part of the result rather than a hidden side effect. At most four
//! statements run per row and no lock is held beyond each statement.

use domain::models::MatchResult;
use domain::services::normalize;
use persistence::repositories::ProductMappingRepository;

#[derive(Clone)]
pub struct ProductMatcher {
    repo: ProductMappingRepository,
}

impl ProductMatcher {
    pub fn new(repo: ProductMappingRepository) -> Self {
        Self { repo }
    }

    /// Resolve one row's product. An empty listing title is an immediate
    /// miss with no candidate registration.
    pub async fn resolve(
        &self,
        channel_id: i64,
        listing_title: &str,
        option_title: &str,
    ) -> Result<MatchResult, sqlx::Error> {
        let listing = normalize::title(listing_title);
        if listing.is_empty() {
            return Ok(MatchResult::miss());
        }

        let option = normalize::title(option_title);

        if !option.is_empty() {
            if let Some(id) = self
                .repo
                .find_exact_with_option(channel_id, &listing, &option)
                .await?
            {
                return Ok(MatchResult::hit(id));
            }
            if let Some(id) = self
                .repo
                .find_substring(channel_id, &listing, Some(&option))
                .await?
            {
                return Ok(MatchResult::hit(id));
            }
            let candidate = self
                .repo
                .ensure_candidate(channel_id, &listing, Some(&option))
                .await?;
            if let Some(ref c) = candidate {
                tracing::info!(channel_id, candidate_id = c.id, listing = %c.listing_title, "registered unmatched candidate");
            }
            return Ok(MatchResult {
                product_id: None,
                candidate_registered: candidate.is_some(),
            });
        }

        if let Some(id) = self
            .repo
            .find_exact_without_option(channel_id, &listing)
            .await?
        {
            return Ok(MatchResult::hit(id));
        }
        if let Some(id) = self.repo.find_substring(channel_id, &listing, None).await? {
            return Ok(MatchResult::hit(id));
        }
        let candidate = self.repo.ensure_candidate(channel_id, &listing, None).await?;
        if let Some(ref c) = candidate {
            tracing::info!(channel_id, candidate_id = c.id, listing = %c.listing_title, "registered unmatched candidate");
        }
        Ok(MatchResult {
            product_id: None,
            candidate_registered: candidate.is_some(),
        })
    }
}
