//! Explore filter query
//!
//! Every constraint is an `EXISTS`, `IN` or scalar-subquery predicate on the
//! dataset row, so joins never fan out and each dataset appears once.
//!
//! Combination rules:
//! - query terms: every term must match somewhere (AND across terms, OR
//!   across fields within a term)
//! - tags: a dataset matching any requested tag qualifies
//! - filenames: matching files must number at least the requested names
//! - community: accepted member of a community matching any given name

use chrono::{Days, NaiveDate, NaiveTime};
use hub_common::text::contains_pattern;
use mediator::Request;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::features::datasets::types::{DatasetSummary, SummaryRow, SUMMARY_COLUMNS, SUMMARY_FROM};
use crate::features::explore::types::{ExploreFilter, ExploreQuery};

#[derive(Debug, thiserror::Error)]
pub enum ExploreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<Vec<DatasetSummary>, ExploreError>> for ExploreQuery {}

impl crate::cqrs::middleware::Query for ExploreQuery {}

#[tracing::instrument(skip(pool))]
pub async fn handle(pool: PgPool, query: ExploreQuery) -> Result<Vec<DatasetSummary>, ExploreError> {
    let filter = query.to_filter();
    let items = filter_datasets(&pool, &filter).await?;
    tracing::debug!(count = items.len(), "Explore filter applied");
    Ok(items)
}

pub async fn filter_datasets(
    pool: &PgPool,
    filter: &ExploreFilter,
) -> Result<Vec<DatasetSummary>, sqlx::Error> {
    let mut builder = build_filter_query(filter);
    let rows = builder.build_query_as::<SummaryRow>().fetch_all(pool).await?;
    Ok(rows.into_iter().map(DatasetSummary::from).collect())
}

const AUTHOR_MATCH: &str = "EXISTS (SELECT 1 FROM authors a WHERE a.dataset_metadata_id = m.id AND (";
const FILE_MATCH: &str = "EXISTS (SELECT 1 FROM dataset_files f \
     JOIN file_metadata fm ON fm.dataset_file_id = f.id WHERE f.dataset_id = d.id AND (";

/// `(col1 ILIKE p OR col2 ILIKE p ...)` with `pattern` bound once per column
fn push_any_ilike(builder: &mut QueryBuilder<'static, Postgres>, columns: &[&str], pattern: &str) {
    builder.push("(");
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            builder.push(" OR ");
        }
        builder.push(*column);
        builder.push(" ILIKE ");
        builder.push_bind(pattern.to_string());
    }
    builder.push(")");
}

fn push_author_match(builder: &mut QueryBuilder<'static, Postgres>, pattern: &str) {
    builder.push(AUTHOR_MATCH);
    push_any_ilike(builder, &["a.name", "a.affiliation", "a.orcid"], pattern);
    builder.push("))");
}

fn start_of_day(date: NaiveDate) -> chrono::DateTime<chrono::Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

pub fn build_filter_query(filter: &ExploreFilter) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT {} {} WHERE TRUE", SUMMARY_COLUMNS, SUMMARY_FROM));

    for term in &filter.terms {
        let pattern = contains_pattern(term);
        builder.push(" AND (");
        push_any_ilike(&mut builder, &["m.title", "m.description", "m.tags"], &pattern);
        builder.push(" OR ");
        push_author_match(&mut builder, &pattern);
        builder.push(" OR ");
        builder.push(FILE_MATCH);
        push_any_ilike(
            &mut builder,
            &["fm.filename", "fm.title", "fm.description", "fm.tags", "fm.publication_doi"],
            &pattern,
        );
        builder.push(")))");
    }

    if let Some(category) = filter.data_category {
        builder.push(" AND m.data_category = ");
        builder.push_bind(category.as_str());
    }

    if let Some(ref author) = filter.author {
        builder.push(" AND ");
        push_author_match(&mut builder, &contains_pattern(author));
    }

    if !filter.tags.is_empty() {
        builder.push(" AND (");
        for (i, tag) in filter.tags.iter().enumerate() {
            let pattern = contains_pattern(tag);
            if i > 0 {
                builder.push(" OR ");
            }
            builder.push("m.tags ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR ");
            builder.push(FILE_MATCH);
            builder.push("fm.tags ILIKE ");
            builder.push_bind(pattern);
            builder.push("))");
        }
        builder.push(")");
    }

    if !filter.filenames.is_empty() {
        builder.push(
            " AND d.id IN (SELECT f.dataset_id FROM dataset_files f \
             JOIN file_metadata fm ON fm.dataset_file_id = f.id WHERE (",
        );
        for (i, name) in filter.filenames.iter().enumerate() {
            if i > 0 {
                builder.push(" OR ");
            }
            builder.push("fm.filename ILIKE ");
            builder.push_bind(contains_pattern(name));
        }
        builder.push(") GROUP BY f.dataset_id HAVING COUNT(DISTINCT fm.id) >= ");
        builder.push_bind(filter.filenames.len() as i64);
        builder.push(")");
    }

    if !filter.communities.is_empty() {
        builder.push(
            " AND EXISTS (SELECT 1 FROM community_dataset_proposals p \
             JOIN communities c ON c.id = p.community_id \
             WHERE p.dataset_id = d.id AND p.status = 'accepted' AND (",
        );
        for (i, name) in filter.communities.iter().enumerate() {
            if i > 0 {
                builder.push(" OR ");
            }
            builder.push("c.name ILIKE ");
            builder.push_bind(contains_pattern(name));
        }
        builder.push("))");
    }

    if let Some(from) = filter.date_from {
        builder.push(" AND d.created_at >= ");
        builder.push_bind(start_of_day(from));
    }

    // Inclusive of the whole `date_to` day.
    if let Some(to) = filter.date_to.and_then(|d| d.checked_add_days(Days::new(1))) {
        builder.push(" AND d.created_at < ");
        builder.push_bind(start_of_day(to));
    }

    if let Some(min) = filter.min_downloads {
        builder.push(" AND (SELECT COUNT(*) FROM dataset_download_records r WHERE r.dataset_id = d.id) >= ");
        builder.push_bind(min);
    }

    if let Some(min) = filter.min_views {
        builder.push(" AND (SELECT COUNT(*) FROM dataset_view_records r WHERE r.dataset_id = d.id) >= ");
        builder.push_bind(min);
    }

    builder.push(filter.sorting.order_by());
    builder.push(" LIMIT ");
    builder.push_bind(filter.limit);
    builder.push(" OFFSET ");
    builder.push_bind(filter.offset);

    builder
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::explore::types::Sorting;
    use crate::features::shared::test_helpers::{titles, TestCommunity, TestDataset, TestUser};
    use chrono::{TimeZone, Utc};

    fn filter(query: ExploreQuery) -> ExploreFilter {
        query.to_filter()
    }

    #[test]
    fn test_empty_filter_has_no_predicates() {
        let builder = build_filter_query(&ExploreFilter::default());
        let sql = builder.sql();
        assert!(sql.contains("WHERE TRUE ORDER BY d.created_at DESC, d.id LIMIT $1 OFFSET $2"));
    }

    #[test]
    fn test_terms_are_anded() {
        let builder = build_filter_query(&filter(ExploreQuery {
            query: Some("steam sales".to_string()),
            ..Default::default()
        }));
        let sql = builder.sql();
        // One grouped predicate per term
        assert_eq!(sql.matches(" AND ((m.title ILIKE").count(), 2);
    }

    #[test]
    fn test_filenames_use_having_count() {
        let builder = build_filter_query(&filter(ExploreQuery {
            filenames: Some("a.csv,b.csv".into()),
            ..Default::default()
        }));
        assert!(builder.sql().contains("HAVING COUNT(DISTINCT fm.id) >= $3"));
    }

    #[test]
    fn test_sorting_order_clause() {
        let mut f = ExploreFilter::default();
        f.sorting = Sorting::Id;
        assert!(build_filter_query(&f).sql().contains(" ORDER BY d.id LIMIT"));
    }

    async fn seed_scenario(pool: &PgPool) -> sqlx::Result<()> {
        let owner = TestUser::new("owner@example.com").insert(pool).await?;
        TestDataset::new(&owner, "X")
            .with_author("Alice Wonderland")
            .with_tags("indie")
            .created_at(Utc.with_ymd_and_hms(2020, 1, 15, 12, 0, 0).unwrap())
            .with_views(3)
            .with_downloads(2)
            .with_file("a.csv")
            .with_file("b.csv")
            .insert(pool)
            .await?;
        TestDataset::new(&owner, "Y")
            .with_author("Bob Builder")
            .with_tags("rpg")
            .created_at(Utc.with_ymd_and_hms(2021, 6, 10, 12, 0, 0).unwrap())
            .with_file("a.csv")
            .insert(pool)
            .await?;
        Ok(())
    }

    async fn run(pool: &PgPool, query: ExploreQuery) -> Vec<String> {
        let items = filter_datasets(pool, &query.to_filter()).await.unwrap();
        titles(&items)
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore] // Requires database
    async fn test_author_and_counters(pool: PgPool) -> sqlx::Result<()> {
        seed_scenario(&pool).await?;

        let by_author = ExploreQuery {
            author: Some("Alice".to_string()),
            ..Default::default()
        };
        assert_eq!(run(&pool, by_author).await, vec!["X"]);

        let popular = ExploreQuery {
            min_views: Some(3),
            min_downloads: Some(2),
            ..Default::default()
        };
        assert_eq!(run(&pool, popular).await, vec!["X"]);

        let too_popular = ExploreQuery {
            min_views: Some(10),
            ..Default::default()
        };
        assert!(run(&pool, too_popular).await.is_empty());

        let zero = ExploreQuery {
            min_views: Some(0),
            ..Default::default()
        };
        assert_eq!(run(&pool, zero).await, vec!["Y", "X"]);
        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore] // Requires database
    async fn test_tags_union(pool: PgPool) -> sqlx::Result<()> {
        seed_scenario(&pool).await?;

        let both = ExploreQuery {
            tags: Some("indie,rpg".into()),
            sorting: Some("oldest".to_string()),
            ..Default::default()
        };
        assert_eq!(run(&pool, both).await, vec!["X", "Y"]);

        let indie = ExploreQuery {
            tags: Some("indie".into()),
            ..Default::default()
        };
        assert_eq!(run(&pool, indie).await, vec!["X"]);
        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore] // Requires database
    async fn test_filenames_require_all(pool: PgPool) -> sqlx::Result<()> {
        seed_scenario(&pool).await?;

        let both = ExploreQuery {
            filenames: Some("a.csv,b.csv".into()),
            ..Default::default()
        };
        assert_eq!(run(&pool, both).await, vec!["X"]);

        let one = ExploreQuery {
            filenames: Some("a.csv".into()),
            ..Default::default()
        };
        assert_eq!(run(&pool, one).await, vec!["Y", "X"]);
        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore] // Requires database
    async fn test_dates_and_terms(pool: PgPool) -> sqlx::Result<()> {
        seed_scenario(&pool).await?;

        let in_2020 = ExploreQuery {
            date_from: Some("2020-01-15".to_string()),
            date_to: Some("2020-01-15".to_string()),
            ..Default::default()
        };
        assert_eq!(run(&pool, in_2020).await, vec!["X"]);

        let terms = ExploreQuery {
            query: Some("Wonderland, indie!".to_string()),
            ..Default::default()
        };
        assert_eq!(run(&pool, terms).await, vec!["X"]);

        let wildcard = ExploreQuery {
            query: Some("%".to_string()),
            ..Default::default()
        };
        assert!(run(&pool, wildcard).await.is_empty());
        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore] // Requires database
    async fn test_community_filter_no_duplicates(pool: PgPool) -> sqlx::Result<()> {
        let owner = TestUser::new("owner@example.com").insert(&pool).await?;
        let dataset = TestDataset::new(&owner, "X")
            .with_author("Alice")
            .with_author("Alicia")
            .with_file("a.csv")
            .with_file("a2.csv")
            .insert(&pool)
            .await?;
        TestDataset::new(&owner, "Y").insert(&pool).await?;
        let community = TestCommunity::new(&owner, "Indie Games").insert(&pool).await?;
        community.accept(&pool, &dataset).await?;

        let query = ExploreQuery {
            community: Some("indie".into()),
            author: Some("ali".to_string()),
            filenames: Some("a".into()),
            ..Default::default()
        };
        assert_eq!(run(&pool, query).await, vec!["X"]);
        Ok(())
    }
}
