//! Text renderings shared by the emitters.
pub mod document_ast;
pub mod typescript;

pub use crate::render::typescript::RenderContext;
pub use crate::render::typescript::TypeScriptRenderer;
