//! Editing model: transactions, position mapping and edit metadata

mod clipboard;
mod mapping;
mod meta;
mod transaction;

pub use clipboard::{regenerate_ids, transform_copied, transform_pasted};
pub use mapping::{Mapping, StepMap};
pub use meta::{EditContext, EditMeta, Selection};
pub use transaction::{SplitShell, Step, Transaction};
