//! Argument parsing: a cursor over the argument text, value parsers, modifier
//! chains around them, flags, and the per-invocation context that collects
//! the results.

pub mod context;
pub mod flag;
pub mod key;
pub mod modifier;
#[allow(clippy::module_inception)]
pub mod parameter;
pub mod parsers;
pub mod reader;
pub mod value;

pub use context::{Checkpoint, ParseContext};
pub use flag::{Flag, FlagBuilder, Flags, UnknownFlagBehavior};
pub use key::ParameterKey;
pub use modifier::{
    AllOfModifier, Chain, MapModifier, Modifier, ModifierChain, OnlyOneModifier,
    OptionalModifier, PermissionModifier, RepeatedModifier,
};
pub use parameter::{value, FirstOf, Parameter, Sequence, ValueParameter, ValueParameterBuilder};
pub use reader::{ArgumentReader, ReaderState};
pub use value::{from_fn, FnParser, ValueParser};
