//! Interned types and their derived data (spec §3.3): the `Sigma` table
//! lives in `resolve::sigma` since it's shared with name resolution, but
//! every *structural* type a procedure body actually mentions is hash-
//! consed here, the same way `resolve::sigma::Sigma` hash-conses
//! declarations by path instead of recomputing them per use.

pub mod intern;
pub mod layout;
pub mod permission;
pub mod subtype;

pub use intern::{TyId, TyKind, TypeTable};
pub use layout::{compute_layout, DiscTy, Layout};
pub use permission::Validity;
pub use subtype::is_subtype;
