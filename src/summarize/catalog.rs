use std::collections::HashMap;

use crate::models::{Category, Subcategory};

use super::report::GroupId;
use super::GroupBy;

/// The reportable groups of one summary, in display order, and the
/// subcategory-to-category lookup used to resolve transactions.
#[derive(Debug, Clone)]
pub struct GroupCatalog {
    group_by: GroupBy,
    groups: Vec<(GroupId, String)>,
    subcategory_to_category: HashMap<i64, i64>,
}

impl GroupCatalog {
    /// Keep the categories matching `is_expense` that are not excluded from
    /// reports, ordered by their display order, and the subcategories that
    /// belong to them, ordered by category and then as supplied.
    pub fn build(
        categories: &[Category],
        subcategories: &[Subcategory],
        is_expense: bool,
        group_by: GroupBy,
    ) -> Self {
        let mut included: Vec<&Category> = categories
            .iter()
            .filter(|c| c.is_expense == is_expense && !c.exclude_from_reports)
            .collect();
        included.sort_by_key(|c| c.order);

        let mut by_category: HashMap<i64, Vec<&Subcategory>> =
            included.iter().map(|c| (c.id, Vec::new())).collect();
        for s in subcategories {
            if let Some(found) = by_category.get_mut(&s.category_id) {
                found.push(s);
            }
        }

        let mut subcategory_groups = Vec::new();
        let mut subcategory_to_category = HashMap::new();
        for c in &included {
            for s in by_category.remove(&c.id).unwrap_or_default() {
                subcategory_groups.push((GroupId::Real(s.id), s.name.clone()));
                subcategory_to_category.insert(s.id, s.category_id);
            }
        }

        let groups = match group_by {
            GroupBy::Category => included
                .iter()
                .map(|c| (GroupId::Real(c.id), c.name.clone()))
                .collect(),
            GroupBy::Subcategory => subcategory_groups,
        };

        tracing::debug!(
            is_expense,
            ?group_by,
            groups = groups.len(),
            subcategories = subcategory_to_category.len(),
            "built group catalog"
        );

        Self {
            group_by,
            groups,
            subcategory_to_category,
        }
    }

    pub fn groups(&self) -> &[(GroupId, String)] {
        &self.groups
    }

    /// The group a subcategory reports under, or `None` if the subcategory
    /// belongs to a category that was filtered out (or does not exist).
    pub fn group_for_subcategory(&self, subcategory_id: i64) -> Option<GroupId> {
        let category_id = self.subcategory_to_category.get(&subcategory_id)?;
        Some(match self.group_by {
            GroupBy::Category => GroupId::Real(*category_id),
            GroupBy::Subcategory => GroupId::Real(subcategory_id),
        })
    }
}
