//! Configuration section definitions.
//!
//! Each module corresponds to a section in `pspreview.toml`:
//!
//! | Module    | TOML Section  | Purpose                            |
//! |-----------|---------------|------------------------------------|
//! | `convert` | `[convert]`   | ps2pdf / pdftocairo settings       |
//! | `notice`  | `[notice]`    | Startup what's-new notice          |
//! | `preview` | `[preview]`   | Live preview server                |

mod convert;
mod notice;
mod preview;

pub use convert::ConvertConfig;
pub use notice::NoticeConfig;
pub use preview::PreviewConfig;
