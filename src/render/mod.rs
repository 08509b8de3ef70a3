//! Render output: page-shell descriptors for the host's chrome

mod shell;

pub use shell::{page_shells, PageShell};
