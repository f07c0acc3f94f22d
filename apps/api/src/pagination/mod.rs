//! Keyset ("seek") pagination shared by every listing endpoint.
//!
//! Rows are ordered by `(timestamp DESC, id DESC)`. A page is fetched with
//! `limit + 1` rows so the presence of a next page is known without a second
//! query, and the total count runs concurrently over the same scope.

pub mod cursor;
pub mod keyset;
pub mod page;

pub use cursor::{Cursor, Keyed};
pub use keyset::{fetch_page, SeekKeys};
pub use page::{Page, PageParams};
