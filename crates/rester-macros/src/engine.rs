//! The path generated code uses to reach the engine.
//!
//! Defaults to the facade's re-export, `::rester::engine`. Crates that depend
//! on `rester-core` directly override it with `crate = "rester_core"`.

use syn::meta::ParseNestedMeta;
use syn::{LitStr, Path, parse_quote};

pub fn default_path() -> Path {
    parse_quote!(::rester::engine)
}

/// Parses the value of a `crate = "..."` argument.
pub fn parse_crate_arg(meta: &ParseNestedMeta<'_>) -> syn::Result<Path> {
    let lit: LitStr = meta.value()?.parse()?;
    lit.parse()
}
