//! Merging list fields from a pulled issue into a local task.

use crate::model::task::Task;

/// List-valued task fields that merge by union.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListField {
    Tags,
    Annotations,
}

impl ListField {
    pub fn name(self) -> &'static str {
        match self {
            Self::Tags => "tags",
            Self::Annotations => "annotations",
        }
    }

    fn values(self, task: &Task) -> &Vec<String> {
        match self {
            Self::Tags => &task.tags,
            Self::Annotations => &task.annotations,
        }
    }

    fn values_mut(self, task: &mut Task) -> &mut Vec<String> {
        match self {
            Self::Tags => &mut task.tags,
            Self::Annotations => &mut task.annotations,
        }
    }
}

/// Appends the remote values of `field` that `local` lacks.
///
/// Local values keep their order and come first; remote values are appended in
/// remote order without duplicates. Returns how many values were added.
pub fn merge_left(field: ListField, local: &mut Task, remote: &Task) -> usize {
    let target = field.values_mut(local);
    let mut added = 0;
    for value in field.values(remote) {
        if !target.contains(value) {
            target.push(value.clone());
            added += 1;
        }
    }
    added
}
