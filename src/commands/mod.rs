//! Command routing for cmdroute.
//!
//! A [`Dispatcher`] maps aliases to [`CommandMapping`]s and hands the rest of
//! a command line to the resolved [`CommandCallable`]. Dispatchers are
//! callables themselves, so command trees nest.

pub(crate) mod alias_table;
pub mod builtin;
pub mod callable;
pub mod disambiguator;
pub mod dispatcher;
pub mod mapping;
pub mod parameterized;
pub mod principal;
pub mod result;
#[cfg(test)]
mod testing;
pub mod tree;

pub use alias_table::AliasView;
pub use builtin::{register_builtins, PermissionStore};
pub use callable::{CommandCallable, TargetContext};
pub use disambiguator::{Disambiguator, ExactPrimaryDisambiguator, FirstMatchDisambiguator};
pub use dispatcher::{split_head, Dispatcher};
pub use mapping::CommandMapping;
pub use parameterized::{CommandBuilder, CommandExecutor, ParameterizedCommand};
pub use principal::{Principal, SimplePrincipal};
pub use result::CommandResult;
pub use tree::{render_tree, CommandNode, TreeEntry};
