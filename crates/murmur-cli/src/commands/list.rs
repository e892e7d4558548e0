use murmur_core::models::{CollectionKind, Timestamp};
use murmur_core::search::{DateRange, RecordQuery, SearchField, ViewContext};
use murmur_core::services::Board;
use murmur_core::store::DocumentStore;

use crate::cli::ListArgs;
use crate::commands::common::{
    format_record_lines, parse_from_bound, parse_to_bound, record_to_list_item, RecordListItem,
};
use crate::error::CliError;

/// Translate list flags into the view the query engine runs.
pub fn view_context(args: &ListArgs, admin: bool) -> Result<ViewContext, CliError> {
    let page = args.page.checked_sub(1).ok_or(CliError::InvalidPage)?;
    if args.page_size == 0 {
        return Err(CliError::InvalidPageSize);
    }
    let fields = if args.fields.is_empty() {
        SearchField::DEFAULT.to_vec()
    } else {
        args.fields.iter().copied().map(SearchField::from).collect()
    };

    Ok(ViewContext {
        query: RecordQuery {
            keyword: args.search.clone().unwrap_or_default(),
            fields,
            category: args.category.clone(),
            status: args.status.map(Into::into),
            priority: args.priority.map(Into::into),
            labels: args.labels.clone(),
            created: DateRange {
                from: args.from.as_deref().map(parse_from_bound).transpose()?,
                to: args.to.as_deref().map(parse_to_bound).transpose()?,
            },
            include_deleted: args.include_deleted,
            sort_by: args.sort.into(),
        },
        page,
        page_size: args.page_size,
        admin,
    })
}

pub async fn run_list<S: DocumentStore>(
    board: &Board<S>,
    kind: CollectionKind,
    args: &ListArgs,
    admin: bool,
) -> Result<String, CliError> {
    let view = view_context(args, admin)?;
    let page = board.list(kind, &view).await?;
    let now = Timestamp::now();

    if args.json {
        let items = page
            .items
            .iter()
            .map(|record| record_to_list_item(record, now))
            .collect::<Vec<RecordListItem>>();
        return Ok(serde_json::to_string_pretty(&items)?);
    }

    if page.items.is_empty() {
        return Ok(format!("No {kind} found."));
    }

    let mut lines = format_record_lines(&page.items, now);
    let pages = page.total.div_ceil(page.page_size);
    let mut footer = format!("Page {} of {} ({} total)", page.page + 1, pages, page.total);
    if page.has_more {
        footer.push_str(&format!("; next: --page {}", page.page + 2));
    }
    lines.push(String::new());
    lines.push(footer);
    Ok(lines.join("\n"))
}
