/*!
Syntax layer of an Elm front-end

Source text is lexed and parsed into a lossless CST (a [`rowan`] tree of
tagged nodes and tokens). Typed AST nodes are lazy, zero-cost views casted
onto CST nodes. The [`syntax::factory`] module manufactures typed fragments
from text templates for tooling that needs to build syntax (renames,
quick-fixes) without a second node-construction API.
*/

pub mod syntax;
