//! Class-file assembly.
//!
//! Version 49 (Java 5) class files are verified by type inference, so no
//! `StackMapTable` attributes are needed.

mod pool;

pub use pool::{modified_utf8, ConstantPool};

use crate::TranslateError;

pub const MAGIC: u32 = 0xCAFE_BABE;
pub const MAJOR_VERSION: u16 = 49;
pub const MINOR_VERSION: u16 = 0;

pub const ACC_PUBLIC: u16 = 0x0001;
pub const ACC_STATIC: u16 = 0x0008;
pub const ACC_FINAL: u16 = 0x0010;
pub const ACC_SUPER: u16 = 0x0020;

#[derive(Debug)]
struct Attribute {
    name: u16,
    data: Vec<u8>,
}

#[derive(Debug)]
struct Member {
    access: u16,
    name: u16,
    descriptor: u16,
    attributes: Vec<Attribute>,
}

/// Finished bytecode of one method.
#[derive(Debug)]
pub struct MethodBody {
    pub max_stack: u16,
    pub max_locals: u16,
    pub code: Vec<u8>,
}

/// A class file under construction.
#[derive(Debug)]
pub struct ClassFile {
    pool: ConstantPool,
    access: u16,
    this: u16,
    super_class: u16,
    fields: Vec<Member>,
    methods: Vec<Member>,
    attributes: Vec<Attribute>,
}

impl ClassFile {
    /// A `public final` class extending `super_name`.
    pub fn new(internal_name: &str, super_name: &str) -> Result<Self, TranslateError> {
        let mut pool = ConstantPool::new();
        let this = pool.class(internal_name)?;
        let super_class = pool.class(super_name)?;
        Ok(ClassFile {
            pool,
            access: ACC_PUBLIC | ACC_FINAL | ACC_SUPER,
            this,
            super_class,
            fields: Vec::new(),
            methods: Vec::new(),
            attributes: Vec::new(),
        })
    }

    pub fn pool(&mut self) -> &mut ConstantPool {
        &mut self.pool
    }

    /// Add a field, with a `ConstantValue` attribute if `value` is a pool
    /// index.
    pub fn add_field(
        &mut self,
        access: u16,
        name: &str,
        descriptor: &str,
        value: Option<u16>,
    ) -> Result<(), TranslateError> {
        let mut attributes = Vec::new();
        if let Some(value) = value {
            attributes.push(Attribute {
                name: self.pool.utf8("ConstantValue")?,
                data: value.to_be_bytes().to_vec(),
            });
        }
        let member = Member {
            access,
            name: self.pool.utf8(name)?,
            descriptor: self.pool.utf8(descriptor)?,
            attributes,
        };
        self.fields.push(member);
        Ok(())
    }

    /// Add a method with a `Code` attribute.
    pub fn add_method(
        &mut self,
        access: u16,
        name: &str,
        descriptor: &str,
        body: MethodBody,
    ) -> Result<(), TranslateError> {
        let code_length =
            u32::try_from(body.code.len()).map_err(|_| TranslateError::CodeTooLarge(name.into()))?;
        let mut data = Vec::with_capacity(body.code.len() + 12);
        data.extend_from_slice(&body.max_stack.to_be_bytes());
        data.extend_from_slice(&body.max_locals.to_be_bytes());
        data.extend_from_slice(&code_length.to_be_bytes());
        data.extend_from_slice(&body.code);
        // No exception table, no attributes.
        data.extend_from_slice(&[0, 0, 0, 0]);
        let member = Member {
            access,
            name: self.pool.utf8(name)?,
            descriptor: self.pool.utf8(descriptor)?,
            attributes: vec![Attribute {
                name: self.pool.utf8("Code")?,
                data,
            }],
        };
        self.methods.push(member);
        Ok(())
    }

    /// Record the source file name.
    pub fn set_source_file(&mut self, file_name: &str) -> Result<(), TranslateError> {
        let name = self.pool.utf8("SourceFile")?;
        let value = self.pool.utf8(file_name)?;
        self.attributes.push(Attribute {
            name,
            data: value.to_be_bytes().to_vec(),
        });
        Ok(())
    }

    /// Serialize the class.
    pub fn to_bytes(&self) -> Result<Vec<u8>, TranslateError> {
        let mut out = Vec::new();
        out.extend_from_slice(&MAGIC.to_be_bytes());
        out.extend_from_slice(&MINOR_VERSION.to_be_bytes());
        out.extend_from_slice(&MAJOR_VERSION.to_be_bytes());
        self.pool.write(&mut out);
        out.extend_from_slice(&self.access.to_be_bytes());
        out.extend_from_slice(&self.this.to_be_bytes());
        out.extend_from_slice(&self.super_class.to_be_bytes());
        // No interfaces.
        out.extend_from_slice(&0u16.to_be_bytes());
        write_members(&mut out, &self.fields)?;
        write_members(&mut out, &self.methods)?;
        write_attributes(&mut out, &self.attributes)?;
        Ok(out)
    }
}

fn count(n: usize) -> Result<[u8; 2], TranslateError> {
    u16::try_from(n)
        .map(u16::to_be_bytes)
        .map_err(|_| TranslateError::PoolOverflow)
}

fn write_members(out: &mut Vec<u8>, members: &[Member]) -> Result<(), TranslateError> {
    out.extend_from_slice(&count(members.len())?);
    for member in members {
        out.extend_from_slice(&member.access.to_be_bytes());
        out.extend_from_slice(&member.name.to_be_bytes());
        out.extend_from_slice(&member.descriptor.to_be_bytes());
        write_attributes(out, &member.attributes)?;
    }
    Ok(())
}

fn write_attributes(out: &mut Vec<u8>, attributes: &[Attribute]) -> Result<(), TranslateError> {
    out.extend_from_slice(&count(attributes.len())?);
    for attribute in attributes {
        let length =
            u32::try_from(attribute.data.len()).map_err(|_| TranslateError::PoolOverflow)?;
        out.extend_from_slice(&attribute.name.to_be_bytes());
        out.extend_from_slice(&length.to_be_bytes());
        out.extend_from_slice(&attribute.data);
    }
    Ok(())
}
