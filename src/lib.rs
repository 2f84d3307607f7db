//! mdlink: completion of Markdown wiki-style links and header anchors.
//!
//! This crate holds the completion logic behind the `mdlink` language
//! server. The editor asks for completions at a cursor position; the
//! completers look at the text before the cursor and answer with items.
//!
//! # Completers
//!
//! | Typed | Completes |
//! |-------|-----------|
//! | `[[` or `【【` | `[name](relative/path.md)` for every note of the workspace |
//! | `[[#` or `【【#` | `[Header](#header)` for every header of the current note |
//! | `[label](other.md#` | the anchor of a header of `other.md` |
//!
//! Filter texts carry a pinyin transliteration of Chinese titles, so that
//! `zhongwen` finds `中文`.
//!
//! # Architecture
//!
//! - [`completion`]: the completers and [`completion::get_completions`]
//! - [`commands`]: follow-up edits the editor runs after inserting an item
//! - [`headers`]: header extraction
//! - [`transliterate`]: pinyin conversion
//! - [`document`], [`workspace`]: the buffer and the files completions are built from
//! - [`config`]: settings
//! - [`logsink`]: diagnostic log lines
//!
//! ```ignore
//! use mdlink::completion::{get_completions, Context};
//!
//! let context = Context::new(&document, &workspace, &settings, &log);
//! let response = get_completions(context, position, Some("["))?;
//! ```

pub mod commands;
pub mod completion;
pub mod config;
pub mod document;
pub mod headers;
pub mod logsink;
pub mod transliterate;
pub mod workspace;

// Test utilities (only available in test builds)
#[cfg(test)]
pub mod test_utils;
