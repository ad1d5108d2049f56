use std::io::Write;

use crate::codegen_js::generate_js;
use crate::error::{CompileError, CoreError};
use crate::lower::lower_references;
use crate::parser::parse;
use crate::typecheck::analyze;

/// Compile `source` to JavaScript and write it to `out`.
///
/// `path` only labels diagnostics. Stages run strictly in order and the
/// first failure is returned, located as `path:line:col`; nothing is
/// written to `out` in that case.
pub fn compile(path: &str, source: &str, out: &mut impl Write) -> Result<(), CompileError> {
    compile_unlabeled(source, out).map_err(|err| CompileError::new(path, err))
}

/// Like [`compile`], collecting the program into a string.
pub fn compile_to_string(path: &str, source: &str) -> Result<String, CompileError> {
    let mut out = Vec::new();
    compile(path, source, &mut out)?;
    String::from_utf8(out)
        .map_err(|err| CompileError::new(path, CoreError::generation(err.to_string())))
}

fn compile_unlabeled(source: &str, out: &mut impl Write) -> Result<(), CoreError> {
    let unit = parse(source)?;
    let mut module = analyze(&unit)?;
    lower_references(&mut module);
    generate_js(&module, out)
}
