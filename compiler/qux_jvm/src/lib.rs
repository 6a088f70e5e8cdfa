//! JVM back end for the Qux compiler.
//!
//! A [`Translator`] turns a fully checked [`Unit`] into the bytes of one
//! output artifact. [`ClassTranslator`] emits a class file per unit:
//!
//! - every constant becomes a `public static final` field carrying a
//!   `ConstantValue` attribute
//! - every function becomes a `public static` method
//! - a `main` taking nothing and returning `Void` also gets the
//!   `main(String[])` entry point the `java` launcher looks for
//!
//! Type aliases exist only for the checker and produce nothing.

mod class;
mod codegen;
mod error;

pub use class::{modified_utf8, MAGIC, MAJOR_VERSION};
pub use codegen::{descriptor, method_descriptor};
pub use error::TranslateError;

use qux_ir::{Literal, Type, Unit};

use class::{ClassFile, ACC_FINAL, ACC_PUBLIC, ACC_STATIC};

/// Produces the artifact for one unit.
pub trait Translator: Send + Sync {
    /// File extension of the artifacts, without the dot.
    fn extension(&self) -> &str;

    fn translate(&self, unit: &Unit) -> Result<Vec<u8>, TranslateError>;
}

/// Emits JVM class files (version 49, no stack map frames).
#[derive(Clone, Copy, Debug, Default)]
pub struct ClassTranslator;

impl Translator for ClassTranslator {
    fn extension(&self) -> &str {
        "class"
    }

    fn translate(&self, unit: &Unit) -> Result<Vec<u8>, TranslateError> {
        let owner = unit.id.internal_name();
        tracing::debug!(unit = %unit.id, class = %owner, "translating");
        let mut class = ClassFile::new(&owner, "java/lang/Object")?;
        class.set_source_file(&format!("{}.qux", unit.id.simple_name()))?;

        for constant in unit.consts() {
            let value = match constant.value.as_literal() {
                Some(Literal::Int(value)) => class.pool().long(*value)?,
                Some(Literal::Bool(value)) => class.pool().integer(i32::from(*value))?,
                Some(Literal::Str(value)) => class.pool().string(value)?,
                None => return Err(TranslateError::NonLiteralConstant(constant.name.clone())),
            };
            class.add_field(
                ACC_PUBLIC | ACC_STATIC | ACC_FINAL,
                &constant.name,
                descriptor(&constant.ty.ty)?,
                Some(value),
            )?;
        }

        let mut entry_point = false;
        for function in unit.functions() {
            let signature = codegen::signature_of(function);
            let body = codegen::method(&mut class, function)?;
            class.add_method(
                ACC_PUBLIC | ACC_STATIC,
                &function.name,
                &method_descriptor(&signature)?,
                body,
            )?;
            entry_point |= function.name == "main"
                && signature.params.is_empty()
                && signature.ret == Type::Void;
        }
        if entry_point {
            let body = codegen::main_bridge(&mut class, &owner)?;
            class.add_method(ACC_PUBLIC | ACC_STATIC, "main", "([Ljava/lang/String;)V", body)?;
        }

        class.to_bytes()
    }
}
