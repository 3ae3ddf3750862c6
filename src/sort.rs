//! Post-processing: stable multi-key sort and result slicing.
//!
//! Applied after matching, independent of caching and laziness. The sort is
//! stable, so records comparing equal keep their original relative order.
//! A custom comparator replaces the `order_by` key comparison entirely.

use std::cmp::Ordering;

use serde_json::Value;

use crate::options::{FilterOptions, SortDirection, SortKey};
use crate::value::{compare_for_sort, get_path};

pub(crate) fn sort_and_limit(records: &mut Vec<Value>, options: &FilterOptions) {
    if let Some(comparator) = &options.custom_comparator {
        records.sort_by(|a, b| comparator(a, b));
    } else if !options.order_by.is_empty() {
        records.sort_by(|a, b| {
            compare_records(a, b, &options.order_by, options.case_sensitive)
        });
    }

    if let Some(limit) = options.limit {
        records.truncate(limit);
    }
}

fn compare_records(a: &Value, b: &Value, keys: &[SortKey], case_sensitive: bool) -> Ordering {
    for key in keys {
        let ord = compare_for_sort(
            get_path(a, &key.field),
            get_path(b, &key.field),
            case_sensitive,
        );
        let ord = match key.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}
