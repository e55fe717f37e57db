//! Filter-list compilation pipeline.
//!
//! A raw line is classified by [`parse_line`], its pattern rewritten by
//! [`normalize_pattern`], its options reduced by [`map_resource_types`], and the
//! pieces assembled into a [`CompiledRule`] by [`compile`]. [`compile_list`] drives
//! the pipeline over a whole list with a shared [`RuleIdAllocator`].

mod allocator;
mod normalizer;
mod parser;
mod resource_types;
mod rule;

pub use allocator::{compile_list, CompiledList, RuleIdAllocator};
pub use normalizer::{normalize_pattern, split_options};
pub use parser::{parse_line, ParsedLine};
pub use resource_types::{map_resource_types, ResourceType};
pub use rule::{compile, CompiledRule, RuleAction};
