mod builder;
mod codegen;
mod context;
mod expander;
mod features;
mod node;
mod pipeline;
mod resources;
mod writer;
mod xml_utils;

pub use builder::SceneBuilder;
pub use codegen::{CodeGenerator, END_FEATURE, GENERATOR_NAME, OPTIONS_FEATURE};
pub use context::assign_status_contexts;
pub use expander::expand_feature_calls;
pub use features::{
    EmitContext, Feature, FeatureKind, FeatureRegistry, DEFAULT_MANAGER, FEATURE_DEFINITION_TAG,
};
pub use node::{CaseTest, CommandArgs, MessageStyle, NodeKind, SceneNode};
pub use pipeline::{CompileOptions, DialogueCompiler, HEADER_DATE_FORMAT};
pub use resources::{ResourceTable, RESOURCES_TAG};
pub use writer::{IndentedWriter, BASE_DEPTH, INDENT_UNIT};
