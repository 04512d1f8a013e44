//! Decoders for the ARM and Thumb/Thumb-2 instruction sets, rendering one
//! instruction at a time into canonical mnemonic/operand text.
//!
//! Decoding happens through a [`Session`], which owns the cross-instruction
//! state a disassembly stream needs: the current instruction address (the PC
//! basis for branch and literal targets) and the active `IT` block, if any.
//! The host drives the session one instruction word at a time and reads the
//! rendered text and consumed length back out of it.

#![no_std]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

#[cfg(feature = "use-serde")]
#[macro_use]
extern crate serde_derive;
#[cfg(feature = "use-serde")]
extern crate serde;
extern crate bitvec;
#[macro_use]
extern crate bitflags;

pub mod inst;
pub mod session;

mod arm;
mod thumb;

pub use inst::{
    AddrMode, CReg, ConditionCode, Instruction, Opcode, Operand, Reg, ShiftAmount, ShiftStyle,
};
pub use session::{DecodeError, Flags, ItBlock, Session};
