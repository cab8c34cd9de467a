//! Static array shapes for the `$matches` argument of `preg_match` and
//! `preg_match_all`.
//!
//! ```text
//! pattern type ──► pcre::parse_groups ──► matcher::classify ──► build ──► Type
//!  flags type  ──► flags::resolve ───────────────────────────────┘
//! ```
pub mod batch;
pub mod config;
pub mod error;
pub mod expr;
pub mod flags;
pub mod matcher;
pub mod path_de;
pub mod pcre;
pub mod trinary;
pub mod types;

use std::sync::Once;

pub use config::{Config, PhpVersion};
pub use error::{BatchError, ConfigError, PatternError, ShapeError};
pub use expr::{Expr, MapScope, Scope};
pub use flags::MatchFlags;
pub use matcher::{MatchMode, RegexShapeMatcher};
pub use pcre::{parse_groups, GroupTyping, ParsedPattern};
pub use trinary::Trinary;
pub use types::Type;

static TRACING_INIT: Once = Once::new();

/// Install a `tracing` subscriber filtered by `RUST_LOG`.
///
/// Does nothing when `RUST_LOG` is unset; safe to call more than once.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        if std::env::var_os("RUST_LOG").is_none() {
            return;
        }
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_level(true).with_writer(std::io::stderr))
            .with(EnvFilter::from_default_env())
            .init();
    });
}
