//! Address codec: the shareable, persisted form of a [`QueryDescriptor`].
//!
//! An address is an `application/x-www-form-urlencoded` string. Only fields
//! that differ from their default are written, in a fixed key order, so
//! `encode(&decode(a))` is a normal form and encoding is idempotent.

use crate::error::QueryError;
use crate::query::FieldFilters;
use crate::query::PageSize;
use crate::query::QueryDescriptor;
use crate::query::QueryUpdate;
use crate::query::TextFilter;
use crate::query::normalize_text;
use leaddesk_protocol::FieldPatch;
use leaddesk_protocol::date::format_date;
use leaddesk_protocol::date::parse_date;
use std::str::FromStr;
use url::form_urlencoded;

pub const PAGE: &str = "page";
pub const LIMIT: &str = "limit";
pub const SEARCH: &str = "search";
pub const NAME: &str = "name";
pub const PHONE: &str = "phone";
pub const EMAIL: &str = "email";
pub const STATUS_ID: &str = "statusId";
pub const TAG_ID: &str = "tagId";
pub const ASSIGNED_TO: &str = "assignedTo";
pub const DATE_FROM: &str = "dateFrom";
pub const DATE_TO: &str = "dateTo";
pub const SORT_BY: &str = "sortBy";
pub const SORT_ORDER: &str = "sortOrder";
pub const SCOPE: &str = "scope";

/// Parses an address. Never fails: unknown keys and malformed values are
/// skipped and the affected fields keep their defaults. A leading `?` is
/// accepted and the last occurrence of a repeated key wins.
pub fn decode(address: &str) -> QueryDescriptor {
    let raw = address.trim();
    let raw = raw.strip_prefix('?').unwrap_or(raw);

    let mut query = QueryDescriptor::default();
    let mut search = None;
    let mut fields = FieldFilters::default();

    for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
        let Some(value) = normalize_text(Some(value.into_owned())) else {
            continue;
        };
        match key.as_ref() {
            PAGE => {
                if let Ok(page) = value.parse() {
                    query.page = page;
                }
            }
            LIMIT => {
                if let Ok(limit) = value.parse() {
                    query.page_size = PageSize::nearest(limit);
                }
            }
            SEARCH => search = Some(value),
            NAME => fields.name = Some(value),
            PHONE => fields.phone = Some(value),
            EMAIL => fields.email = Some(value),
            STATUS_ID => query.status_id = Some(value),
            TAG_ID => query.tag_id = Some(value),
            ASSIGNED_TO => query.assigned_to = Some(value),
            DATE_FROM => {
                if let Some(date) = parse_date(&value) {
                    query.dates.from = Some(date);
                }
            }
            DATE_TO => {
                if let Some(date) = parse_date(&value) {
                    query.dates.to = Some(date);
                }
            }
            SORT_BY => {
                if let Ok(key) = value.parse() {
                    query.sort.key = key;
                }
            }
            SORT_ORDER => {
                if let Ok(order) = value.parse() {
                    query.sort.order = order;
                }
            }
            SCOPE => {
                if let Ok(scope) = value.parse() {
                    query.scope = scope;
                }
            }
            _ => {}
        }
    }

    query.text = TextFilter::from_parts(search, fields);
    query
}

/// Serializes a descriptor, omitting every field that holds its default.
/// Text values are written in their normalized form.
pub fn encode(query: &QueryDescriptor) -> String {
    let query = &query.normalized();
    let defaults = QueryDescriptor::default();
    let mut out = form_urlencoded::Serializer::new(String::new());

    if query.page != defaults.page {
        out.append_pair(PAGE, &query.page.to_string());
    }
    let page_size = PageSize::nearest(query.page_size.get());
    if page_size != defaults.page_size {
        out.append_pair(LIMIT, &page_size.get().to_string());
    }
    match &query.text {
        TextFilter::Search(term) => {
            out.append_pair(SEARCH, term);
        }
        TextFilter::Fields(fields) => {
            append_opt(&mut out, NAME, fields.name.as_deref());
            append_opt(&mut out, PHONE, fields.phone.as_deref());
            append_opt(&mut out, EMAIL, fields.email.as_deref());
        }
    }
    append_opt(&mut out, STATUS_ID, query.status_id.as_deref());
    append_opt(&mut out, TAG_ID, query.tag_id.as_deref());
    append_opt(&mut out, ASSIGNED_TO, query.assigned_to.as_deref());
    if let Some(from) = query.dates.from {
        out.append_pair(DATE_FROM, &format_date(from));
    }
    if let Some(to) = query.dates.to {
        out.append_pair(DATE_TO, &format_date(to));
    }
    if query.sort.key != defaults.sort.key {
        out.append_pair(SORT_BY, query.sort.key.as_ref());
    }
    if query.sort.order != defaults.sort.order {
        out.append_pair(SORT_ORDER, query.sort.order.as_ref());
    }
    if query.scope != defaults.scope {
        out.append_pair(SCOPE, query.scope.as_ref());
    }
    out.finish()
}

/// Applies `update` to the view described by `address` and returns the new
/// address. Any change other than the page index lands on page 0.
pub fn merge(address: &str, update: &QueryUpdate) -> String {
    encode(&decode(address).apply(update))
}

/// Normal form of an address.
pub fn normalize(address: &str) -> String {
    encode(&decode(address))
}

fn append_opt(out: &mut form_urlencoded::Serializer<'_, String>, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        out.append_pair(key, value);
    }
}

impl QueryUpdate {
    /// Builds an update from address-style `key=value` pairs. An empty value
    /// clears a filter or restores a default. Unlike [`decode`], this is strict:
    /// it reports unknown keys and unparsable values.
    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self, QueryError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut update = Self::default();
        for (key, raw) in pairs {
            let value = raw.trim();
            let invalid = || QueryError::InvalidValue {
                key: key.to_string(),
                value: raw.to_string(),
            };
            match key {
                PAGE => update.page = Some(parse_or_default(value, invalid)?),
                LIMIT => {
                    update.page_size = Some(if value.is_empty() {
                        PageSize::default()
                    } else {
                        PageSize::nearest(value.parse().map_err(|_| invalid())?)
                    });
                }
                SEARCH => update.search = text_patch(value),
                NAME => update.name = text_patch(value),
                PHONE => update.phone = text_patch(value),
                EMAIL => update.email = text_patch(value),
                STATUS_ID => update.status_id = text_patch(value),
                TAG_ID => update.tag_id = text_patch(value),
                ASSIGNED_TO => update.assigned_to = text_patch(value),
                DATE_FROM => update.date_from = date_patch(value).ok_or_else(invalid)?,
                DATE_TO => update.date_to = date_patch(value).ok_or_else(invalid)?,
                SORT_BY => update.sort_by = Some(parse_or_default(value, invalid)?),
                SORT_ORDER => update.sort_order = Some(parse_or_default(value, invalid)?),
                SCOPE => update.scope = Some(parse_or_default(value, invalid)?),
                other => return Err(QueryError::UnknownKey(other.to_string())),
            }
        }
        Ok(update)
    }
}

fn text_patch(value: &str) -> FieldPatch<String> {
    if value.is_empty() {
        FieldPatch::Clear
    } else {
        FieldPatch::Set(value.to_string())
    }
}

fn date_patch(value: &str) -> Option<FieldPatch<time::Date>> {
    if value.is_empty() {
        Some(FieldPatch::Clear)
    } else {
        parse_date(value).map(FieldPatch::Set)
    }
}

fn parse_or_default<T>(value: &str, invalid: impl Fn() -> QueryError) -> Result<T, QueryError>
where
    T: FromStr + Default,
{
    if value.is_empty() {
        Ok(T::default())
    } else {
        value.parse().map_err(|_| invalid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leaddesk_protocol::Scope;
    use leaddesk_protocol::SortKey;
    use leaddesk_protocol::SortOrder;
    use pretty_assertions::assert_eq;
    use time::macros::date;

    fn busy_query() -> QueryDescriptor {
        QueryDescriptor::default().apply(&QueryUpdate {
            search: FieldPatch::Set("alice & bob".to_string()),
            status_id: FieldPatch::Set("s-1".to_string()),
            tag_id: FieldPatch::Set("t 2".to_string()),
            assigned_to: FieldPatch::Set("u-9".to_string()),
            date_from: FieldPatch::Set(date!(2024 - 01 - 01)),
            date_to: FieldPatch::Set(date!(2024 - 12 - 31)),
            sort_by: Some(SortKey::Name),
            sort_order: Some(SortOrder::Asc),
            page_size: Some(PageSize::new(50)),
            scope: Some(Scope::UnitWide),
            ..Default::default()
        })
    }

    #[test]
    fn default_descriptor_encodes_to_empty_address() {
        assert_eq!(encode(&QueryDescriptor::default()), "");
        assert_eq!(decode(""), QueryDescriptor::default());
        assert_eq!(decode("?"), QueryDescriptor::default());
    }

    #[test]
    fn round_trip_preserves_every_field() {
        let query = busy_query().with_page(4);
        let address = encode(&query);
        assert_eq!(
            address,
            "page=4&limit=50&search=alice+%26+bob&statusId=s-1&tagId=t+2&assignedTo=u-9\
             &dateFrom=2024-01-01&dateTo=2024-12-31&sortBy=name&sortOrder=asc&scope=unit-wide"
        );
        assert_eq!(decode(&address), query);
        assert_eq!(encode(&decode(&address)), address);
    }

    #[test]
    fn hand_built_descriptor_round_trips_through_normal_form() {
        let query = QueryDescriptor {
            text: TextFilter::Search(String::new()),
            status_id: Some(" x ".to_string()),
            assigned_to: Some(String::new()),
            ..Default::default()
        };
        let address = encode(&query);
        assert_eq!(address, "statusId=x");
        assert_eq!(decode(&address), query.normalized());
        assert_eq!(encode(&decode(&address)), address);

        let fields = QueryDescriptor {
            text: TextFilter::Fields(FieldFilters {
                name: Some(" Ann ".to_string()),
                phone: Some(String::new()),
                email: None,
            }),
            ..Default::default()
        };
        assert_eq!(encode(&fields), "name=Ann");
        assert_eq!(decode(&encode(&fields)), fields.normalized());
    }

    #[test]
    fn merge_field_filter_replaces_search() -> anyhow::Result<()> {
        let update = QueryUpdate::from_pairs([("name", "Ann")])?;
        assert_eq!(merge("page=2&search=bob", &update), "name=Ann");
        Ok(())
    }

    #[test]
    fn field_filters_round_trip_when_no_search() {
        let query = QueryDescriptor::default().apply(&QueryUpdate {
            name: FieldPatch::Set("Ann".to_string()),
            email: FieldPatch::Set("ann@example.com".to_string()),
            ..Default::default()
        });
        let address = encode(&query);
        assert_eq!(address, "name=Ann&email=ann%40example.com");
        assert_eq!(decode(&address), query);
    }

    #[test]
    fn decode_ignores_garbage() {
        let query = decode("?page=-1&limit=abc&sortBy=colour&scope=galaxy&dateFrom=2024-13-01&foo=bar&tagId=");
        assert_eq!(query, QueryDescriptor::default());
    }

    #[test]
    fn decode_drops_field_filters_when_search_is_present() {
        let query = decode("phone=555&search=carol");
        assert_eq!(query.text, TextFilter::Search("carol".to_string()));
        assert_eq!(encode(&query), "search=carol");
    }

    #[test]
    fn decode_clamps_limit_to_allowed_sizes() {
        assert_eq!(decode("limit=45").page_size.get(), 50);
        assert_eq!(normalize("limit=20"), "");
        assert_eq!(normalize("limit=999"), "limit=100");
    }

    #[test]
    fn decode_last_duplicate_wins() {
        assert_eq!(decode("statusId=a&statusId=b").status_id.as_deref(), Some("b"));
    }

    #[test]
    fn normalization_reorders_keys() {
        assert_eq!(normalize("scope=mine&page=2&sortOrder=desc"), "page=2&scope=mine");
    }

    #[test]
    fn merge_filter_change_drops_page() {
        let update = QueryUpdate {
            status_id: FieldPatch::Set("foo".to_string()),
            ..Default::default()
        };
        assert_eq!(merge("page=3&search=alice", &update), "search=alice&statusId=foo");
    }

    #[test]
    fn merge_page_change_keeps_filters() {
        assert_eq!(
            merge("search=alice&scope=mine", &QueryUpdate::page(2)),
            "page=2&search=alice&scope=mine"
        );
        assert_eq!(merge("page=2&search=alice", &QueryUpdate::page(0)), "search=alice");
    }

    #[test]
    fn merge_scope_change_drops_page() {
        assert_eq!(merge("page=7", &QueryUpdate::scope(Scope::Mine)), "scope=mine");
    }

    #[test]
    fn from_pairs_parses_address_keys() -> anyhow::Result<()> {
        let update = QueryUpdate::from_pairs([
            ("statusId", "won"),
            ("tagId", ""),
            ("dateTo", "2024-02-29"),
            ("sortBy", "updatedAt"),
            ("limit", "60"),
            ("scope", ""),
        ])?;
        assert_eq!(update.status_id, FieldPatch::Set("won".to_string()));
        assert_eq!(update.tag_id, FieldPatch::Clear);
        assert_eq!(update.date_to, FieldPatch::Set(date!(2024 - 02 - 29)));
        assert_eq!(update.sort_by, Some(SortKey::UpdatedAt));
        assert_eq!(update.page_size, Some(PageSize::new(50)));
        assert_eq!(update.scope, Some(Scope::Unassigned));
        Ok(())
    }

    #[test]
    fn from_pairs_rejects_unknown_keys_and_bad_values() {
        assert_eq!(
            QueryUpdate::from_pairs([("colour", "red")]),
            Err(QueryError::UnknownKey("colour".to_string()))
        );
        assert_eq!(
            QueryUpdate::from_pairs([("page", "two")]),
            Err(QueryError::InvalidValue {
                key: "page".to_string(),
                value: "two".to_string(),
            })
        );
        assert!(QueryUpdate::from_pairs([("dateFrom", "31/01/2024")]).is_err());
    }
}
