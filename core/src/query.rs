//! The query descriptor: every filter, sort, pagination, and scope field that
//! determines what the lead list shows.
//!
//! Descriptors are values. Every interaction produces a new descriptor through
//! [`QueryDescriptor::apply`]; nothing is edited in place, so a half-applied
//! change can never reach a fetch.

use leaddesk_protocol::FieldPatch;
use leaddesk_protocol::Scope;
use leaddesk_protocol::SortKey;
use leaddesk_protocol::SortOrder;
use leaddesk_protocol::StatusId;
use leaddesk_protocol::TagId;
use leaddesk_protocol::UserId;
use time::Date;

/// Page sizes an operator can pick from.
pub const PAGE_SIZES: [u32; 4] = [10, 20, 50, 100];
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// A page size that is always a member of [`PAGE_SIZES`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PageSize(u32);

impl PageSize {
    /// Keeps allowed sizes and falls back to the default for anything else.
    pub fn new(raw: u32) -> Self {
        if PAGE_SIZES.contains(&raw) {
            Self(raw)
        } else {
            Self::default()
        }
    }

    /// Clamps to the closest allowed size; ties go to the smaller one.
    pub fn nearest(raw: u32) -> Self {
        let size = PAGE_SIZES
            .iter()
            .copied()
            .min_by_key(|size| (size.abs_diff(raw), *size))
            .unwrap_or(DEFAULT_PAGE_SIZE);
        Self(size)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self(DEFAULT_PAGE_SIZE)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldFilters {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl FieldFilters {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.phone.is_none() && self.email.is_none()
    }
}

/// Free-text search and the discrete name/phone/email filters are mutually
/// exclusive: once a search term is present the field filters are dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TextFilter {
    Search(String),
    Fields(FieldFilters),
}

impl Default for TextFilter {
    fn default() -> Self {
        Self::Fields(FieldFilters::default())
    }
}

impl TextFilter {
    pub fn from_parts(search: Option<String>, fields: FieldFilters) -> Self {
        match search {
            Some(term) => Self::Search(term),
            None => Self::Fields(fields),
        }
    }

    pub fn search(&self) -> Option<&str> {
        match self {
            Self::Search(term) => Some(term),
            Self::Fields(_) => None,
        }
    }

    pub fn fields(&self) -> Option<&FieldFilters> {
        match self {
            Self::Search(_) => None,
            Self::Fields(fields) => Some(fields),
        }
    }
}

/// Inclusive creation-date range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<Date>,
    pub to: Option<Date>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Sort {
    pub key: SortKey,
    pub order: SortOrder,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryDescriptor {
    pub text: TextFilter,
    pub status_id: Option<StatusId>,
    pub tag_id: Option<TagId>,
    pub assigned_to: Option<UserId>,
    pub dates: DateRange,
    pub sort: Sort,
    /// Zero-based.
    pub page: u32,
    pub page_size: PageSize,
    pub scope: Scope,
}

impl QueryDescriptor {
    /// Offset of the first record of the current page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.page_size.get())
    }

    pub fn with_page(&self, page: u32) -> Self {
        Self {
            page,
            ..self.clone()
        }
    }

    /// True when both descriptors select the same result set in the same
    /// order, ignoring which page of it is shown.
    pub fn same_view(&self, other: &Self) -> bool {
        self.with_page(0) == other.with_page(0)
    }

    /// Last page index that still holds records for `total` results.
    pub fn last_page(&self, total: u64) -> u32 {
        let size = u64::from(self.page_size.get());
        let pages = total.div_ceil(size).max(1);
        u32::try_from(pages - 1).unwrap_or(u32::MAX)
    }

    /// Trims every text value and drops the blank ones, which is the form
    /// [`crate::address::decode`] produces.
    pub fn normalized(&self) -> Self {
        let (search, fields) = match &self.text {
            TextFilter::Search(term) => (Some(term.clone()), FieldFilters::default()),
            TextFilter::Fields(fields) => (None, fields.clone()),
        };
        let fields = FieldFilters {
            name: normalize_text(fields.name),
            phone: normalize_text(fields.phone),
            email: normalize_text(fields.email),
        };
        Self {
            text: TextFilter::from_parts(normalize_text(search), fields),
            status_id: normalize_text(self.status_id.clone()),
            tag_id: normalize_text(self.tag_id.clone()),
            assigned_to: normalize_text(self.assigned_to.clone()),
            ..self.clone()
        }
    }

    /// Produces the descriptor that results from `update`.
    ///
    /// Whenever anything besides the page index changes, the page index goes
    /// back to 0, even when the update names a page as well.
    pub fn apply(&self, update: &QueryUpdate) -> Self {
        let current_fields = self.text.fields().cloned().unwrap_or_default();
        // A new field filter replaces a standing search unless the same update
        // also sets the search term.
        let names_field = [&update.name, &update.phone, &update.email]
            .into_iter()
            .any(|patch| patch.as_set().is_some_and(|value| !value.trim().is_empty()));
        let current_search = if names_field && update.search.is_unchanged() {
            None
        } else {
            self.text.search().map(str::to_string)
        };
        let search = normalize_text(update.search.resolve(current_search));
        let fields = FieldFilters {
            name: normalize_text(update.name.resolve(current_fields.name)),
            phone: normalize_text(update.phone.resolve(current_fields.phone)),
            email: normalize_text(update.email.resolve(current_fields.email)),
        };

        let mut next = Self {
            text: TextFilter::from_parts(search, fields),
            status_id: normalize_text(update.status_id.resolve(self.status_id.clone())),
            tag_id: normalize_text(update.tag_id.resolve(self.tag_id.clone())),
            assigned_to: normalize_text(update.assigned_to.resolve(self.assigned_to.clone())),
            dates: DateRange {
                from: update.date_from.resolve(self.dates.from),
                to: update.date_to.resolve(self.dates.to),
            },
            sort: Sort {
                key: update.sort_by.unwrap_or(self.sort.key),
                order: update.sort_order.unwrap_or(self.sort.order),
            },
            page: self.page,
            page_size: update.page_size.unwrap_or(self.page_size),
            scope: update.scope.unwrap_or(self.scope),
        };

        next.page = if next.same_view(self) {
            update.page.unwrap_or(self.page)
        } else {
            0
        };
        next
    }
}

/// A partial change to a [`QueryDescriptor`]. Clearable filters use
/// [`FieldPatch`] so "leave as is" and "remove the filter" stay distinct.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryUpdate {
    pub search: FieldPatch<String>,
    pub name: FieldPatch<String>,
    pub phone: FieldPatch<String>,
    pub email: FieldPatch<String>,
    pub status_id: FieldPatch<StatusId>,
    pub tag_id: FieldPatch<TagId>,
    pub assigned_to: FieldPatch<UserId>,
    pub date_from: FieldPatch<Date>,
    pub date_to: FieldPatch<Date>,
    pub sort_by: Option<SortKey>,
    pub sort_order: Option<SortOrder>,
    pub page: Option<u32>,
    pub page_size: Option<PageSize>,
    pub scope: Option<Scope>,
}

impl QueryUpdate {
    pub fn page(page: u32) -> Self {
        Self {
            page: Some(page),
            ..Default::default()
        }
    }

    pub fn scope(scope: Scope) -> Self {
        Self {
            scope: Some(scope),
            ..Default::default()
        }
    }

    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search: FieldPatch::Set(term.into()),
            ..Default::default()
        }
    }
}

pub(crate) fn normalize_text(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}
