//! Duplicate declarations, parameters and imports.

use rustc_hash::{FxHashMap, FxHashSet};

use qux_diagnostic::CompilerError;
use qux_ir::{Decl, DeclKind, Unit};

use crate::stage::Stage;

/// Rejects a unit that declares the same name twice in one namespace.
///
/// Constants, functions and type aliases are separate namespaces. Every
/// repeat is reported at its own position.
#[derive(Debug, Default)]
pub struct Duplicates;

impl Stage for Duplicates {
    fn name(&self) -> &'static str {
        "duplicates"
    }

    fn apply(&mut self, unit: Unit) -> Result<Unit, CompilerError> {
        let errors = find_duplicates(&unit);
        if errors.is_empty() {
            Ok(unit)
        } else {
            Err(CompilerError::list(errors))
        }
    }
}

fn find_duplicates(unit: &Unit) -> Vec<CompilerError> {
    let unit_name = unit.id.as_str();
    let mut errors = Vec::new();

    let mut aliases = FxHashSet::default();
    for import in &unit.imports {
        if !aliases.insert(import.alias()) {
            errors.push(CompilerError::at(
                format!("duplicate import `{}`", import.alias()),
                unit_name,
                import.pos,
            ));
        }
    }

    let mut seen: FxHashMap<DeclKind, FxHashSet<&str>> = FxHashMap::default();
    for decl in &unit.decls {
        if !seen.entry(decl.kind()).or_default().insert(decl.name()) {
            errors.push(CompilerError::at(
                format!("duplicate {} `{}`", decl.kind(), decl.name()),
                unit_name,
                decl.pos(),
            ));
        }
        if let Decl::Function(function) = decl {
            let mut params = FxHashSet::default();
            for param in &function.params {
                if !params.insert(param.name.as_str()) {
                    errors.push(CompilerError::at(
                        format!(
                            "duplicate parameter `{}` in function `{}`",
                            param.name, function.name
                        ),
                        unit_name,
                        param.pos,
                    ));
                }
            }
        }
    }
    errors
}
