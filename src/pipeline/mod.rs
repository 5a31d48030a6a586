//! Pipeline stages for citation harvesting.
//!
//! Each submodule implements exactly one step, behind a narrow interface
//! where it touches the outside world, so the retry policy, the scanner and
//! record accumulation can be tested without network or files.
//!
//! ## Data Flow
//!
//! ```text
//! source ──▶ fetch ──▶ extract ──▶ scan ──▶ sink
//! (xlsx)    (reqwest)  (pdfium)   (regex)  (xlsx)
//! ```
//!
//! 1. [`source`]  — read the URL column of the input spreadsheet
//! 2. [`fetch`]   — GET each URL through a [`fetch::Transport`] with
//!    bounded retries; the only stage with network I/O
//! 3. [`extract`] — PDF bytes to concatenated page text via a
//!    [`extract::TextExtractor`]
//! 4. [`scan`]    — distinct `Title N, Section M` matches
//! 5. [`sink`]    — write the `(URL, citation)` table
//!
//! [`pace`] supplies the randomised throttle and backoff pauses.

pub mod extract;
pub mod fetch;
pub mod pace;
pub mod scan;
pub mod sink;
pub mod source;
