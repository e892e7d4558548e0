//! Record filtering, ordering and pagination shared by feedback and tickets.

use std::cmp::Reverse;

use crate::models::{Priority, Record, TicketStatus, Timestamp};
use crate::{Error, Result};

/// Text-bearing fields a keyword can match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchField {
    /// The record's message or query.
    Text,
    Category,
    AssignedTo,
    AdminNotes,
    Labels,
    Replies,
}

impl SearchField {
    pub const DEFAULT: [Self; 3] = [Self::Text, Self::Labels, Self::Replies];
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    CreatedAt,
    UpdatedAt,
}

impl SortKey {
    const fn of(self, record: &Record) -> Timestamp {
        match self {
            Self::CreatedAt => record.created_at,
            Self::UpdatedAt => record.updated_at,
        }
    }
}

/// Inclusive `created_at` bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<Timestamp>,
    pub to: Option<Timestamp>,
}

impl DateRange {
    #[must_use]
    pub fn contains(&self, at: Timestamp) -> bool {
        self.from.is_none_or(|from| at >= from) && self.to.is_none_or(|to| at <= to)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordQuery {
    /// Case-insensitive substring; empty matches everything.
    pub keyword: String,
    pub fields: Vec<SearchField>,
    pub category: Option<String>,
    pub status: Option<TicketStatus>,
    pub priority: Option<Priority>,
    /// Every label listed here must be on the record.
    pub labels: Vec<String>,
    pub created: DateRange,
    pub include_deleted: bool,
    pub sort_by: SortKey,
}

impl Default for RecordQuery {
    fn default() -> Self {
        Self {
            keyword: String::new(),
            fields: SearchField::DEFAULT.to_vec(),
            category: None,
            status: None,
            priority: None,
            labels: Vec::new(),
            created: DateRange::default(),
            include_deleted: false,
            sort_by: SortKey::default(),
        }
    }
}

impl RecordQuery {
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        if record.is_deleted() && !self.include_deleted {
            return false;
        }
        if self
            .category
            .as_deref()
            .is_some_and(|category| record.category != category)
        {
            return false;
        }
        if self.status.is_some() && record.status != self.status {
            return false;
        }
        if self
            .priority
            .is_some_and(|priority| record.priority != priority)
        {
            return false;
        }
        if !record.has_labels(&self.labels) {
            return false;
        }
        if !self.created.contains(record.created_at) {
            return false;
        }
        self.matches_keyword(record)
    }

    fn matches_keyword(&self, record: &Record) -> bool {
        let needle = self.keyword.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        let hit = |text: &str| text.to_lowercase().contains(&needle);

        self.fields.iter().any(|field| match field {
            SearchField::Text => hit(record.text()),
            SearchField::Category => hit(&record.category),
            SearchField::AssignedTo => hit(&record.assigned_to),
            SearchField::AdminNotes => hit(&record.admin_notes),
            SearchField::Labels => record.labels.iter().any(|label| hit(label)),
            SearchField::Replies => record.replies.iter().any(|reply| hit(&reply.message)),
        })
    }
}

/// Records matching `query`, newest first by the query's sort key.
#[must_use]
pub fn filter<'a>(records: &'a [Record], query: &RecordQuery) -> Vec<&'a Record> {
    let mut matched = records
        .iter()
        .filter(|record| query.matches(record))
        .collect::<Vec<_>>();
    // Stable: equal timestamps keep document order.
    matched.sort_by_key(|record| Reverse(query.sort_by.of(record)));
    matched
}

/// One page of a filtered, ordered sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
    pub has_more: bool,
}

/// Offset pagination: items `page * size .. page * size + size`.
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> Result<Page<T>> {
    if page_size == 0 {
        return Err(Error::InvalidInput("page size must be at least 1".to_string()));
    }

    let start = page.saturating_mul(page_size).min(items.len());
    let end = start.saturating_add(page_size).min(items.len());

    Ok(Page {
        items: items[start..end].to_vec(),
        page,
        page_size,
        total: items.len(),
        has_more: items.len() > end,
    })
}

/// Per-interaction display state owned by the front end: search, filters,
/// page cursor and whether the viewer is an admin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewContext {
    pub query: RecordQuery,
    pub page: usize,
    pub page_size: usize,
    pub admin: bool,
}

pub const DEFAULT_PAGE_SIZE: usize = 5;

impl Default for ViewContext {
    fn default() -> Self {
        Self {
            query: RecordQuery::default(),
            page: 0,
            page_size: DEFAULT_PAGE_SIZE,
            admin: false,
        }
    }
}

impl ViewContext {
    /// Filter, order and paginate. Completed tickets are hidden from the
    /// public view unless the query asks for that status explicitly.
    pub fn view(&self, records: &[Record]) -> Result<Page<Record>> {
        let hide_completed = !self.admin && self.query.status != Some(TicketStatus::Completed);
        let visible = filter(records, &self.query)
            .into_iter()
            .filter(|record| !(hide_completed && record.status == Some(TicketStatus::Completed)))
            .cloned()
            .collect::<Vec<_>>();
        paginate(&visible, self.page, self.page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CollectionKind, RecordId, Reply};
    use pretty_assertions::assert_eq;

    fn ts(value: &str) -> Timestamp {
        value.parse().unwrap()
    }

    fn ticket(id: u64, text: &str, created: &str) -> Record {
        Record::new(CollectionKind::Tickets, RecordId::new(id), text, ts(created))
    }

    fn ids(records: &[&Record]) -> Vec<u64> {
        records.iter().map(|record| record.id.get()).collect()
    }

    fn sample() -> Vec<Record> {
        let mut wifi = ticket(1, "WiFi down in Lab 3", "2024-05-01T08:00:00");
        wifi.labels = vec!["network".to_string(), "lab".to_string()];
        wifi.priority = Priority::High;
        wifi.category = "Infrastructure".to_string();

        let mut books = ticket(2, "Library closes too early", "2024-05-02T08:00:00");
        books.replies.push(Reply {
            message: "Extended hours during exams".to_string(),
            created_at: ts("2024-05-02T09:00:00"),
        });

        let mut projector = ticket(3, "Projector flickers", "2024-05-03T08:00:00");
        projector.labels = vec!["lab".to_string()];
        projector.status = Some(TicketStatus::Completed);

        let mut removed = ticket(4, "old wifi issue", "2024-05-04T08:00:00");
        removed.deleted_at = Some(ts("2024-05-05T00:00:00"));

        vec![wifi, books, projector, removed]
    }

    #[test]
    fn empty_keyword_matches_all_live_records_newest_first() {
        let records = sample();
        assert_eq!(ids(&filter(&records, &RecordQuery::default())), vec![3, 2, 1]);
    }

    #[test]
    fn keyword_is_case_insensitive_and_searches_replies_and_labels() {
        let records = sample();
        let by_text = RecordQuery {
            keyword: "wifi".to_string(),
            ..RecordQuery::default()
        };
        assert_eq!(ids(&filter(&records, &by_text)), vec![1]);

        let by_reply = RecordQuery {
            keyword: "EXAMS".to_string(),
            ..RecordQuery::default()
        };
        assert_eq!(ids(&filter(&records, &by_reply)), vec![2]);

        let by_label = RecordQuery {
            keyword: "netw".to_string(),
            ..RecordQuery::default()
        };
        assert_eq!(ids(&filter(&records, &by_label)), vec![1]);
    }

    #[test]
    fn keyword_only_searches_declared_fields() {
        let records = sample();
        let query = RecordQuery {
            keyword: "exams".to_string(),
            fields: vec![SearchField::Text],
            ..RecordQuery::default()
        };
        assert!(filter(&records, &query).is_empty());
    }

    #[test]
    fn equality_and_label_subset_filters() {
        let records = sample();
        let lab = RecordQuery {
            labels: vec!["lab".to_string()],
            ..RecordQuery::default()
        };
        assert_eq!(ids(&filter(&records, &lab)), vec![3, 1]);

        let lab_network_high = RecordQuery {
            labels: vec!["lab".to_string(), "network".to_string()],
            priority: Some(Priority::High),
            category: Some("Infrastructure".to_string()),
            ..RecordQuery::default()
        };
        assert_eq!(ids(&filter(&records, &lab_network_high)), vec![1]);

        let completed = RecordQuery {
            status: Some(TicketStatus::Completed),
            ..RecordQuery::default()
        };
        assert_eq!(ids(&filter(&records, &completed)), vec![3]);
    }

    #[test]
    fn date_range_is_inclusive() {
        let records = sample();
        let query = RecordQuery {
            created: DateRange {
                from: Some(ts("2024-05-01T08:00:00")),
                to: Some(ts("2024-05-02T08:00:00")),
            },
            ..RecordQuery::default()
        };
        assert_eq!(ids(&filter(&records, &query)), vec![2, 1]);
    }

    #[test]
    fn soft_deleted_records_need_explicit_inclusion() {
        let records = sample();
        let query = RecordQuery {
            keyword: "wifi".to_string(),
            include_deleted: true,
            ..RecordQuery::default()
        };
        assert_eq!(ids(&filter(&records, &query)), vec![4, 1]);
    }

    #[test]
    fn sort_by_updated_at() {
        let mut records = sample();
        records[0].updated_at = ts("2024-06-01T00:00:00");
        let query = RecordQuery {
            sort_by: SortKey::UpdatedAt,
            ..RecordQuery::default()
        };
        assert_eq!(ids(&filter(&records, &query)), vec![1, 3, 2]);
    }

    #[test]
    fn paginate_twelve_items_by_five() {
        let items = (1..=12).collect::<Vec<u32>>();

        let first = paginate(&items, 0, 5).unwrap();
        assert_eq!(first.items, vec![1, 2, 3, 4, 5]);
        assert!(first.has_more);

        let last = paginate(&items, 2, 5).unwrap();
        assert_eq!(last.items, vec![11, 12]);
        assert!(!last.has_more);
        assert_eq!(last.total, 12);

        let beyond = paginate(&items, 7, 5).unwrap();
        assert!(beyond.items.is_empty());
        assert!(!beyond.has_more);
    }

    #[test]
    fn paginate_rejects_zero_page_size() {
        assert!(paginate(&[1, 2, 3], 0, 0).is_err());
    }

    #[test]
    fn public_view_hides_completed_tickets() {
        let records = sample();
        let public = ViewContext::default().view(&records).unwrap();
        assert_eq!(
            public.items.iter().map(|r| r.id.get()).collect::<Vec<_>>(),
            vec![2, 1]
        );

        let admin = ViewContext {
            admin: true,
            ..ViewContext::default()
        };
        assert_eq!(admin.view(&records).unwrap().total, 3);
    }
}
