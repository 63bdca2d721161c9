//! # Blueprint Native Compiler
//!
//! Compiles declarative JSON screen descriptions into Jetpack-Compose-style
//! Kotlin source.
//!
//! ## Pipeline Invariants
//!
//! 1. **Stage Order**: styles resolve first, then attribute validation and
//!    binding analysis, then emission. Converters only ever see resolved
//!    attributes.
//! 2. **Advisory Validation**: schema and binding findings accumulate as
//!    warnings and never stop emission.
//! 3. **Structural Degradation**: a malformed node (list without a template,
//!    image without a source) emits an inert placeholder fragment; one bad
//!    node never fails a whole file. Malformed JSON is the only fatal error,
//!    raised before the pipeline starts.
//! 4. **Determinism**: the same document compiles to byte-identical output,
//!    including auto-generated constraint reference ids and the sorted
//!    import header.
//! 5. **Modifier Order**: layout attributes always emit in the fixed category
//!    order size → aspect ratio → clip → border → background → padding →
//!    alignment → click, never in JSON key order.

#[cfg(feature = "napi")]
use napi_derive::napi;

mod binding;
mod cache;
mod compile;
mod constraint;
mod discovery;
mod document;
mod emit;
mod modifier;
mod style;
mod validate;
mod widgets;

#[cfg(test)]
mod degradation_tests;

pub use binding::{
    analyze_tree, contains_binding_marker, infer_type, parse_binding, BindingExpression,
    BindingKind,
};
pub use cache::IncrementalCache;
pub use compile::{compile_document, compile_source, CompileOptions, CompileOutput, ThemeConfig};
pub use constraint::{build_graph, has_positioning, ConstraintReference};
pub use discovery::{compile_directory, find_layout_files, FileReport};
pub use document::{parse_document, ComponentNode, DataDeclaration, VariableScope};
pub use emit::{EmitContext, Emitter, Fragment};
pub use modifier::{build_chain, reconcile_columns, ModifierConfig};
pub use style::{resolve_styles, StyleTable};
pub use validate::{canonical_widget_type, validate_node, validate_tree, CompilerError};
pub use widgets::{ConverterRegistry, WidgetConverter};

// Node bridge entry points live next to the pipeline they wrap.
#[cfg(feature = "napi")]
pub use compile::{analyze_binding_native, compile_layout_native, validate_layout_native};

#[cfg(feature = "napi")]
#[napi]
pub fn compile_bridge() -> String {
    "Blueprint Native Bridge Connected".to_string()
}
