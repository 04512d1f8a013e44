//! Per-stream decode state: the current address, the in-flight `IT` block,
//! the scratch arena operand text is assembled in, and the most recent
//! result.
//!
//! A `Session` is driven strictly sequentially; instruction order matters
//! because each Thumb decode consumes one slot of any active `IT` block.
//! Independent sessions share nothing and may live on different threads.

use alloc::string::String;
use core::fmt;
use core::fmt::Write;

use crate::arm;
use crate::inst::{AddrMode, ConditionCode, Instruction, Opcode, Operand, Reg};
use crate::thumb;

bitflags! {
    /// Architecture-variant options selected at session construction.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct Flags: u32 {
        /// Restrict Thumb decoding to the original 16-bit instruction set;
        /// the 32-bit Thumb-2 prefixes then decode as undefined halfwords.
        const THUMB_ONLY = 1 << 0;
    }
}

/// The caller-contract failure class: the stream entry points could not pull
/// a complete instruction out of the supplied bytes. Distinct from undefined
/// encodings, which decode to placeholder text and are not errors.
#[derive(Debug, PartialEq, Eq)]
pub enum DecodeError {
    ExhaustedInput,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DecodeError::ExhaustedInput => write!(f, "exhausted input"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DecodeError {}

/// The condition queue installed by an `IT` instruction.
///
/// The queue holds the condition for every slot of the block, the first
/// instruction's included. Each Thumb decode takes the next entry; the block
/// is discarded once the last one is gone.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ItBlock {
    conditions: [ConditionCode; 4],
    len: u8,
    pos: u8,
}

impl ItBlock {
    fn new(firstcond: u8, mask: u8) -> ItBlock {
        let base = ConditionCode::build(firstcond);
        let mut conditions = [base; 4];
        let lead = mask.trailing_zeros() as u8;
        let mut slot = 1;
        let mut i = 3u8;
        while i > lead {
            let same = ((mask >> i) & 1) == (firstcond & 1);
            conditions[slot] = if same { base } else { base.negated() };
            slot += 1;
            i -= 1;
        }
        ItBlock {
            conditions,
            len: 4 - lead,
            pos: 0,
        }
    }

    fn advance(&mut self) -> ConditionCode {
        let cond = self.conditions[self.pos as usize];
        self.pos += 1;
        cond
    }

    fn exhausted(&self) -> bool {
        self.pos >= self.len
    }

    /// Slots not yet consumed.
    pub fn remaining(&self) -> u8 {
        self.len - self.pos
    }

    /// The queued conditions, first slot first.
    pub fn conditions(&self) -> &[ConditionCode] {
        &self.conditions[..self.len as usize]
    }
}

/// Decode state for one instruction stream.
pub struct Session<'a> {
    flags: Flags,
    address: u32,
    it_state: Option<ItBlock>,
    scratch: String,
    text: String,
    length: u8,
    sink: Option<&'a dyn Fn(&str)>,
}

impl<'a> Session<'a> {
    pub fn new(flags: Flags) -> Session<'a> {
        Session {
            flags,
            address: 0,
            it_state: None,
            scratch: String::new(),
            text: String::new(),
            length: 0,
            sink: None,
        }
    }

    /// Sets the address the next instruction will be decoded at. Targets of
    /// PC-relative instructions resolve against this; it is never advanced
    /// by decoding itself.
    pub fn set_address(&mut self, address: u32) {
        self.address = address;
    }

    pub fn address(&self) -> u32 {
        self.address
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// Installs a callback for supplementary annotation lines (resolved
    /// literal-pool addresses). Never required for the primary text; the
    /// callback must not re-enter this session.
    pub fn set_sink(&mut self, sink: &'a dyn Fn(&str)) {
        self.sink = Some(sink);
    }

    pub fn clear_sink(&mut self) {
        self.sink = None;
    }

    /// The text of the most recent decode.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Bytes consumed by the most recent decode: 4 for ARM, 2 or 4 for
    /// Thumb.
    pub fn len(&self) -> usize {
        self.length as usize
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// The active `IT` block, if one is in flight.
    pub fn it_block(&self) -> Option<&ItBlock> {
        self.it_state.as_ref()
    }

    /// Empties the operand-assembly arena and returns its memory. Safe at
    /// any point between decodes; does not touch the address or `IT` state.
    pub fn clear_scratch(&mut self) {
        self.scratch = String::new();
    }

    /// Consumes the session, releasing everything it owns. Rust's ownership
    /// makes use-after-teardown unrepresentable rather than a runtime error.
    pub fn teardown(self) {}

    pub(crate) fn resolve(&self, bias: u32, displacement: i32) -> u32 {
        self.address
            .wrapping_add(bias)
            .wrapping_add(displacement as u32)
    }

    /// Decodes one 32-bit ARM-mode word. Always consumes four bytes;
    /// patterns with no defined decoding render as `undefined`.
    pub fn decode_arm(&mut self, word: u32) {
        let inst = arm::decode(self, word);
        self.length = 4;
        self.finish(&inst, false);
    }

    /// Decodes one Thumb instruction. `halfword2` is ignored unless
    /// `halfword` carries one of the 32-bit Thumb-2 prefixes, which is
    /// decided before any other field is looked at.
    pub fn decode_thumb(&mut self, halfword: u16, halfword2: u16) {
        let (mut inst, length) = thumb::decode(self, halfword, halfword2);
        self.length = length;
        if let Opcode::IT(firstcond, mask) = inst.opcode {
            // a fresh IT while a block is active is architecturally
            // unpredictable; the old queue is simply replaced
            self.it_state = Some(ItBlock::new(firstcond, mask));
        } else if let Some(block) = self.it_state.as_mut() {
            inst.condition = block.advance();
            if block.exhausted() {
                self.it_state = None;
            }
        }
        self.finish(&inst, true);
    }

    /// Reads one little-endian ARM word from `bytes` and decodes it,
    /// returning the consumed length.
    pub fn decode_arm_bytes(&mut self, bytes: &[u8]) -> Result<usize, DecodeError> {
        if bytes.len() < 4 {
            return Err(DecodeError::ExhaustedInput);
        }
        let word = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        self.decode_arm(word);
        Ok(4)
    }

    /// Reads one Thumb instruction (one or two little-endian halfwords) from
    /// `bytes` and decodes it, returning the consumed length. A 32-bit
    /// prefix with no second halfword available is a caller error, not an
    /// undefined encoding.
    pub fn decode_thumb_bytes(&mut self, bytes: &[u8]) -> Result<usize, DecodeError> {
        if bytes.len() < 2 {
            return Err(DecodeError::ExhaustedInput);
        }
        let halfword = u16::from_le_bytes([bytes[0], bytes[1]]);
        if thumb::is_wide(halfword) && !self.flags.contains(Flags::THUMB_ONLY) {
            if bytes.len() < 4 {
                return Err(DecodeError::ExhaustedInput);
            }
            let halfword2 = u16::from_le_bytes([bytes[2], bytes[3]]);
            self.decode_thumb(halfword, halfword2);
            return Ok(4);
        }
        self.decode_thumb(halfword, 0);
        Ok(2)
    }

    fn finish(&mut self, inst: &Instruction, thumb_mode: bool) {
        inst.render(&mut self.text, &mut self.scratch);
        self.annotate(inst, thumb_mode);
    }

    /// Reports the resolved address of a PC-relative literal load through
    /// the sink, when one is installed.
    fn annotate(&mut self, inst: &Instruction, thumb_mode: bool) {
        let sink = match self.sink {
            Some(sink) => sink,
            None => return,
        };
        match inst.opcode {
            Opcode::LDR
            | Opcode::LDRB
            | Opcode::LDRH
            | Opcode::LDRSB
            | Opcode::LDRSH
            | Opcode::LDRD => {}
            _ => return,
        }
        for operand in inst.operands.iter() {
            if let Operand::MemImm {
                base,
                offset,
                mode: AddrMode::Offset,
            } = operand
            {
                if *base == Reg::PC {
                    let pc = if thumb_mode {
                        self.address.wrapping_add(4) & !3
                    } else {
                        self.address.wrapping_add(8)
                    };
                    let target = pc.wrapping_add(*offset as u32);
                    self.scratch.clear();
                    let _ = write!(self.scratch, "literal address {:07x}", target);
                    sink(&self.scratch);
                }
            }
        }
    }
}
