//! Data model shared by the parsers, the assembly engine and the renderers.
//!
//! Parsers produce [`PackageRecord`]s grouped in a [`PackageSet`]; the
//! assembler turns them into [`Component`]s keyed by their [`Purl`].
//!
//! ```
//! use depbom::model::{Ecosystem, PackageRecord, Purl, split_npm_name};
//!
//! let (group, name) = split_npm_name("@angular/core");
//! let record = PackageRecord::new(Ecosystem::Npm, name)
//!     .with_group(group)
//!     .with_version("17.0.0");
//! assert_eq!(Purl::for_record(&record).to_string(), "pkg:npm/@angular/core@17.0.0");
//! ```

mod component;
mod identifiers;
mod license;
mod metadata;
mod record;

pub use component::*;
pub use identifiers::*;
pub use license::*;
pub use metadata::*;
pub use record::*;
