//! Category membership, derived from the notes
//!
//! Membership is never stored on the categories. It is recomputed from scratch from each note's
//! `category_id` after every structural change.

use std::collections::BTreeMap;

use crate::notes::ALL;
use crate::notes::Category;
use crate::notes::Note;
use crate::notes::UNCATEGORIZED;

/// Note IDs by category ID
pub type Membership = BTreeMap<String, Vec<String>>;

/// Compute the member notes of every category
///
/// `all` is a view and gets no entry. A note pointing to a category that does not exist is
/// counted under `uncategorized`.
pub fn membership(notes: &[Note], categories: &[Category]) -> Membership {
    let mut membership: Membership = categories
        .iter()
        .filter(|category| category.id != ALL)
        .map(|category| (category.id.clone(), Vec::new()))
        .collect();

    for note in notes {
        let category_id = if membership.contains_key(&note.category_id) {
            note.category_id.as_str()
        } else {
            UNCATEGORIZED
        };

        let members = membership.entry(category_id.to_string()).or_default();
        if !members.contains(&note.id) {
            members.push(note.id.clone());
        }
    }

    membership
}
