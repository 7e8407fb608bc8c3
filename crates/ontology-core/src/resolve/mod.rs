//! Cross-file reference resolution.
//!
//! Each language gets one [`ReferenceIndex`], built from every parsed file
//! before any resolution. A [`Resolver`] then maps imports and call sites
//! of a file onto repository paths. Misses are expected and recorded as
//! `null` paths and external imports, never as errors.

mod imports;
mod index;
mod repo;
mod resolver;
mod types;

pub use imports::{resolve_import, TS_CANDIDATE_EXTENSIONS};
pub use index::{
    go_module_path, go_package_path, python_module, ClassEntry, GoModule, IndexBuilder,
    MethodSite, ReferenceIndex, TsPaths,
};
pub use repo::{base_name, extension, join_normalized, parent_dir, posix_path, relative_posix, RepoFiles};
pub use resolver::{CallScope, Resolver};
pub use types::normalize_type_name;
