//! Bytecode buffer with labels and operand-stack accounting.

use crate::TranslateError;

/// Opcodes used by the translator.
pub mod op {
    pub const ICONST_0: u8 = 0x03;
    pub const ICONST_1: u8 = 0x04;
    pub const LCONST_0: u8 = 0x09;
    pub const LCONST_1: u8 = 0x0a;
    pub const LDC: u8 = 0x12;
    pub const LDC_W: u8 = 0x13;
    pub const LDC2_W: u8 = 0x14;
    pub const ILOAD: u8 = 0x15;
    pub const LLOAD: u8 = 0x16;
    pub const ALOAD: u8 = 0x19;
    pub const ISTORE: u8 = 0x36;
    pub const LSTORE: u8 = 0x37;
    pub const ASTORE: u8 = 0x3a;
    pub const POP: u8 = 0x57;
    pub const POP2: u8 = 0x58;
    pub const LADD: u8 = 0x61;
    pub const LSUB: u8 = 0x65;
    pub const LMUL: u8 = 0x69;
    pub const LDIV: u8 = 0x6d;
    pub const LNEG: u8 = 0x75;
    pub const IXOR: u8 = 0x82;
    pub const LCMP: u8 = 0x94;
    pub const IFEQ: u8 = 0x99;
    pub const IFNE: u8 = 0x9a;
    pub const IFLT: u8 = 0x9b;
    pub const IFGE: u8 = 0x9c;
    pub const IFGT: u8 = 0x9d;
    pub const IFLE: u8 = 0x9e;
    pub const IF_ICMPEQ: u8 = 0x9f;
    pub const IF_ICMPNE: u8 = 0xa0;
    pub const GOTO: u8 = 0xa7;
    pub const IRETURN: u8 = 0xac;
    pub const LRETURN: u8 = 0xad;
    pub const ARETURN: u8 = 0xb0;
    pub const RETURN: u8 = 0xb1;
    pub const GETSTATIC: u8 = 0xb2;
    pub const INVOKEVIRTUAL: u8 = 0xb6;
    pub const INVOKESTATIC: u8 = 0xb8;
    pub const WIDE: u8 = 0xc4;
}

/// A branch target, bound once with [`Code::bind`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Label(usize);

#[derive(Debug, Default)]
struct LabelState {
    offset: Option<usize>,
    /// Operand-stack depth on arrival.
    depth: Option<i32>,
}

/// A branch whose offset is written once its label is bound.
#[derive(Debug)]
struct Fixup {
    /// Offset of the branch opcode.
    at: usize,
    label: Label,
}

/// The code of one method under construction.
#[derive(Debug)]
pub struct Code {
    method: String,
    bytes: Vec<u8>,
    labels: Vec<LabelState>,
    fixups: Vec<Fixup>,
    depth: i32,
    max_depth: i32,
}

impl Code {
    pub fn new(method: impl Into<String>) -> Self {
        Code {
            method: method.into(),
            bytes: Vec::new(),
            labels: Vec::new(),
            fixups: Vec::new(),
            depth: 0,
            max_depth: 0,
        }
    }

    /// Record the net stack effect of the last instruction.
    pub fn stack(&mut self, delta: i32) {
        self.depth += delta;
        self.max_depth = self.max_depth.max(self.depth);
    }

    /// Emit an instruction without operands.
    pub fn op(&mut self, opcode: u8, delta: i32) {
        self.bytes.push(opcode);
        self.stack(delta);
    }

    /// Emit an instruction with a two-byte operand.
    pub fn op_u16(&mut self, opcode: u8, operand: u16, delta: i32) {
        self.bytes.push(opcode);
        self.bytes.extend_from_slice(&operand.to_be_bytes());
        self.stack(delta);
    }

    /// Emit a local-variable load or store, widening past slot 255.
    pub fn local(&mut self, opcode: u8, slot: u16, delta: i32) {
        match u8::try_from(slot) {
            Ok(slot) => self.bytes.extend_from_slice(&[opcode, slot]),
            Err(_) => {
                self.bytes.extend_from_slice(&[op::WIDE, opcode]);
                self.bytes.extend_from_slice(&slot.to_be_bytes());
            }
        }
        self.stack(delta);
    }

    /// Load a constant-pool entry of one slot.
    pub fn ldc(&mut self, index: u16) {
        match u8::try_from(index) {
            Ok(index) => {
                self.bytes.extend_from_slice(&[op::LDC, index]);
                self.stack(1);
            }
            Err(_) => self.op_u16(op::LDC_W, index, 1),
        }
    }

    pub fn label(&mut self) -> Label {
        self.labels.push(LabelState::default());
        Label(self.labels.len() - 1)
    }

    /// Emit a branch to `label`; `delta` is the branch's own stack effect.
    pub fn branch(&mut self, opcode: u8, label: Label, delta: i32) {
        self.fixups.push(Fixup {
            at: self.bytes.len(),
            label,
        });
        self.bytes.extend_from_slice(&[opcode, 0, 0]);
        self.stack(delta);
        self.labels[label.0].depth = Some(self.depth);
    }

    /// Place `label` at the current offset.
    ///
    /// Code right after an unconditional jump is only reachable through a
    /// branch, so the stack depth is taken from the branches seen so far.
    pub fn bind(&mut self, label: Label) {
        let state = &mut self.labels[label.0];
        state.offset = Some(self.bytes.len());
        if let Some(depth) = state.depth {
            self.depth = depth;
        }
    }

    /// Current stack depth.
    #[cfg(test)]
    pub fn depth(&self) -> i32 {
        self.depth
    }

    /// Resolve branches and return `(max_stack, bytes)`.
    pub fn finish(mut self) -> Result<(u16, Vec<u8>), TranslateError> {
        if self.bytes.len() >= usize::from(u16::MAX) {
            return Err(TranslateError::CodeTooLarge(self.method));
        }
        for fixup in &self.fixups {
            let target = self.labels[fixup.label.0]
                .offset
                .ok_or_else(|| TranslateError::BranchOverflow(self.method.clone()))?;
            let target = i64::try_from(target).unwrap_or(i64::MAX);
            let at = i64::try_from(fixup.at).unwrap_or(i64::MAX);
            let offset = i16::try_from(target - at)
                .map_err(|_| TranslateError::BranchOverflow(self.method.clone()))?;
            self.bytes[fixup.at + 1..fixup.at + 3].copy_from_slice(&offset.to_be_bytes());
        }
        let max_stack = u16::try_from(self.max_depth).unwrap_or(u16::MAX);
        Ok((max_stack, self.bytes))
    }
}
