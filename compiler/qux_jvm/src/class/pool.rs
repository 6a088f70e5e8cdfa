//! The class-file constant pool.
//!
//! Entries are deduplicated, so asking for the same constant twice returns
//! the same index. Indices start at 1; a `long` entry takes two slots.

use rustc_hash::FxHashMap;

use crate::TranslateError;

const TAG_UTF8: u8 = 1;
const TAG_INTEGER: u8 = 3;
const TAG_LONG: u8 = 5;
const TAG_CLASS: u8 = 7;
const TAG_STRING: u8 = 8;
const TAG_FIELDREF: u8 = 9;
const TAG_METHODREF: u8 = 10;
const TAG_NAME_AND_TYPE: u8 = 12;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum Entry {
    Utf8(String),
    Integer(i32),
    Long(i64),
    Class(u16),
    String(u16),
    Fieldref(u16, u16),
    Methodref(u16, u16),
    NameAndType(u16, u16),
}

impl Entry {
    fn slots(&self) -> u16 {
        match self {
            Entry::Long(_) => 2,
            _ => 1,
        }
    }
}

#[derive(Debug, Default)]
pub struct ConstantPool {
    entries: Vec<Entry>,
    index: FxHashMap<Entry, u16>,
    /// Index the next entry will get, minus one.
    used: u16,
}

impl ConstantPool {
    pub fn new() -> Self {
        Self::default()
    }

    fn add(&mut self, entry: Entry) -> Result<u16, TranslateError> {
        if let Some(&index) = self.index.get(&entry) {
            return Ok(index);
        }
        let index = self.used + 1;
        // The pool count is `used + 1` and must fit in a u16.
        self.used = self
            .used
            .checked_add(entry.slots())
            .filter(|&used| used < u16::MAX)
            .ok_or(TranslateError::PoolOverflow)?;
        self.index.insert(entry.clone(), index);
        self.entries.push(entry);
        Ok(index)
    }

    pub fn utf8(&mut self, text: &str) -> Result<u16, TranslateError> {
        if modified_utf8(text).len() > usize::from(u16::MAX) {
            return Err(TranslateError::PoolOverflow);
        }
        self.add(Entry::Utf8(text.to_string()))
    }

    pub fn integer(&mut self, value: i32) -> Result<u16, TranslateError> {
        self.add(Entry::Integer(value))
    }

    pub fn long(&mut self, value: i64) -> Result<u16, TranslateError> {
        self.add(Entry::Long(value))
    }

    /// A class by internal name (`a/b/C`).
    pub fn class(&mut self, internal_name: &str) -> Result<u16, TranslateError> {
        let name = self.utf8(internal_name)?;
        self.add(Entry::Class(name))
    }

    pub fn string(&mut self, value: &str) -> Result<u16, TranslateError> {
        let utf8 = self.utf8(value)?;
        self.add(Entry::String(utf8))
    }

    fn name_and_type(&mut self, name: &str, descriptor: &str) -> Result<u16, TranslateError> {
        let name = self.utf8(name)?;
        let descriptor = self.utf8(descriptor)?;
        self.add(Entry::NameAndType(name, descriptor))
    }

    pub fn field(
        &mut self,
        owner: &str,
        name: &str,
        descriptor: &str,
    ) -> Result<u16, TranslateError> {
        let class = self.class(owner)?;
        let nat = self.name_and_type(name, descriptor)?;
        self.add(Entry::Fieldref(class, nat))
    }

    pub fn method(
        &mut self,
        owner: &str,
        name: &str,
        descriptor: &str,
    ) -> Result<u16, TranslateError> {
        let class = self.class(owner)?;
        let nat = self.name_and_type(name, descriptor)?;
        self.add(Entry::Methodref(class, nat))
    }

    /// `constant_pool_count` followed by the entries.
    pub fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&(self.used + 1).to_be_bytes());
        for entry in &self.entries {
            match entry {
                Entry::Utf8(text) => {
                    let bytes = modified_utf8(text);
                    out.push(TAG_UTF8);
                    // Length checked in `utf8`.
                    out.extend_from_slice(&u16::try_from(bytes.len()).unwrap_or(u16::MAX).to_be_bytes());
                    out.extend_from_slice(&bytes);
                }
                Entry::Integer(value) => {
                    out.push(TAG_INTEGER);
                    out.extend_from_slice(&value.to_be_bytes());
                }
                Entry::Long(value) => {
                    out.push(TAG_LONG);
                    out.extend_from_slice(&value.to_be_bytes());
                }
                Entry::Class(name) => {
                    out.push(TAG_CLASS);
                    out.extend_from_slice(&name.to_be_bytes());
                }
                Entry::String(utf8) => {
                    out.push(TAG_STRING);
                    out.extend_from_slice(&utf8.to_be_bytes());
                }
                Entry::Fieldref(class, nat) | Entry::Methodref(class, nat) => {
                    let tag = if matches!(entry, Entry::Fieldref(..)) {
                        TAG_FIELDREF
                    } else {
                        TAG_METHODREF
                    };
                    out.push(tag);
                    out.extend_from_slice(&class.to_be_bytes());
                    out.extend_from_slice(&nat.to_be_bytes());
                }
                Entry::NameAndType(name, descriptor) => {
                    out.push(TAG_NAME_AND_TYPE);
                    out.extend_from_slice(&name.to_be_bytes());
                    out.extend_from_slice(&descriptor.to_be_bytes());
                }
            }
        }
    }
}

/// The JVM's "modified UTF-8": NUL takes two bytes and characters outside
/// the basic plane are written as a surrogate pair, three bytes each.
pub fn modified_utf8(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for unit in text.encode_utf16() {
        match unit {
            0x0001..=0x007F => out.push(unit as u8),
            0x0000 | 0x0080..=0x07FF => {
                out.push(0xC0 | (unit >> 6) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
            _ => {
                out.push(0xE0 | (unit >> 12) as u8);
                out.push(0x80 | ((unit >> 6) & 0x3F) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
        }
    }
    out
}
