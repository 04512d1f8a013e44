//! The Thumb/Thumb-2 decoder.
//!
//! The 16/32-bit length split is decided from the top five bits of the first
//! halfword before anything else is extracted; the three prefixes `0b11101`,
//! `0b11110` and `0b11111` start a 32-bit instruction, everything below is a
//! 16-bit one. Conditional execution never comes from the encodings
//! themselves (the conditional-branch class aside) but from the session's
//! `IT` state; the only visible consequence inside a block is that the
//! 16-bit data-processing encodings stop setting flags, so their `s` suffix
//! is dropped here.

use bitvec::prelude::*;

use crate::arm::{self, ops};
use crate::inst::{
    AddrMode, ConditionCode, Instruction, Opcode, Operand, Reg, ShiftAmount, ShiftStyle,
};
use crate::session::{Flags, Session};

/// Whether `halfword` is the first half of a 32-bit Thumb-2 instruction.
pub fn is_wide(halfword: u16) -> bool {
    (halfword >> 11) >= 0b11101
}

fn reg(n: u32) -> Operand {
    Operand::Reg(Reg::from_u8((n & 0xf) as u8))
}

fn set_undefined16(inst: &mut Instruction, hw: u16) {
    inst.condition = ConditionCode::AL;
    inst.opcode = Opcode::UNDEFINED;
    inst.s = false;
    inst.operands = ops(&[Operand::RawImm {
        value: hw as u32,
        digits: 4,
    }]);
}

fn set_undefined32(inst: &mut Instruction, hw1: u16, hw2: u16) {
    inst.condition = ConditionCode::AL;
    inst.opcode = Opcode::UNDEFINED;
    inst.s = false;
    inst.operands = ops(&[Operand::RawImm {
        value: ((hw1 as u32) << 16) | hw2 as u32,
        digits: 8,
    }]);
}

fn sext(value: u32, bits: u32) -> i32 {
    ((value << (32 - bits)) as i32) >> (32 - bits)
}

fn shifted_register(rm: Reg, ty: u8, imm5: u8) -> Operand {
    let style = ShiftStyle::from_bits(ty);
    match (style, imm5) {
        (ShiftStyle::LSL, 0) => Operand::Reg(rm),
        (ShiftStyle::ROR, 0) => Operand::RegShift {
            rm,
            style: ShiftStyle::RRX,
            amount: ShiftAmount::Imm(0),
        },
        (ShiftStyle::LSR, 0) | (ShiftStyle::ASR, 0) => Operand::RegShift {
            rm,
            style,
            amount: ShiftAmount::Imm(32),
        },
        (style, imm5) => Operand::RegShift {
            rm,
            style,
            amount: ShiftAmount::Imm(imm5),
        },
    }
}

/// `ThumbExpandImm`: the modified-immediate constant of the 32-bit
/// data-processing encodings.
fn thumb_expand_imm(imm12: u32) -> u32 {
    if imm12 & 0xc00 == 0 {
        let imm8 = imm12 & 0xff;
        match (imm12 >> 8) & 0b11 {
            0b00 => imm8,
            0b01 => (imm8 << 16) | imm8,
            0b10 => (imm8 << 24) | (imm8 << 8),
            _ => (imm8 << 24) | (imm8 << 16) | (imm8 << 8) | imm8,
        }
    } else {
        let unrotated = 0x80 | (imm12 & 0x7f);
        unrotated.rotate_right((imm12 >> 7) & 0x1f)
    }
}

pub(crate) fn decode(sess: &Session, hw1: u16, hw2: u16) -> (Instruction, u8) {
    let mut inst = Instruction::default();
    if is_wide(hw1) {
        if sess.flags().contains(Flags::THUMB_ONLY) {
            set_undefined16(&mut inst, hw1);
            return (inst, 2);
        }
        decode32(sess, hw1, hw2, &mut inst);
        (inst, 4)
    } else {
        decode16(sess, hw1, &mut inst);
        (inst, 2)
    }
}

fn decode16(sess: &Session, hw: u16, inst: &mut Instruction) {
    let in_it = sess.it_block().is_some();
    let word = hw as u32;
    let rd = word & 0b111;
    let rn3 = (word >> 3) & 0b111;
    let imm8 = word & 0xff;
    match word >> 11 {
        0b00000 | 0b00001 | 0b00010 => {
            let imm5 = ((word >> 6) & 0x1f) as u8;
            let style = ShiftStyle::from_bits((word >> 11) as u8);
            inst.s = !in_it;
            if let (ShiftStyle::LSL, 0) = (style, imm5) {
                inst.opcode = Opcode::MOV;
                inst.operands = ops(&[reg(rd), reg(rn3)]);
                return;
            }
            inst.opcode = match style {
                ShiftStyle::LSL => Opcode::LSL,
                ShiftStyle::LSR => Opcode::LSR,
                _ => Opcode::ASR,
            };
            let amount = match (style, imm5) {
                (ShiftStyle::LSR, 0) | (ShiftStyle::ASR, 0) => 32,
                _ => imm5,
            };
            inst.operands = ops(&[reg(rd), reg(rn3), Operand::Imm(amount as u32)]);
        }
        0b00011 => {
            let third = if word & 0x0400 != 0 {
                Operand::Imm((word >> 6) & 0b111)
            } else {
                reg((word >> 6) & 0b111)
            };
            inst.opcode = if word & 0x0200 != 0 {
                Opcode::SUB
            } else {
                Opcode::ADD
            };
            inst.s = !in_it;
            inst.operands = ops(&[reg(rd), reg(rn3), third]);
        }
        0b00100 => {
            inst.opcode = Opcode::MOV;
            inst.s = !in_it;
            inst.operands = ops(&[reg((word >> 8) & 0b111), Operand::Imm(imm8)]);
        }
        0b00101 => {
            inst.opcode = Opcode::CMP;
            inst.operands = ops(&[reg((word >> 8) & 0b111), Operand::Imm(imm8)]);
        }
        0b00110 | 0b00111 => {
            inst.opcode = if word & 0x0800 != 0 {
                Opcode::SUB
            } else {
                Opcode::ADD
            };
            inst.s = !in_it;
            inst.operands = ops(&[reg((word >> 8) & 0b111), Operand::Imm(imm8)]);
        }
        0b01000 => {
            if word & 0x0400 == 0 {
                decode16_dp(word, in_it, inst);
            } else {
                decode16_special(word, inst);
            }
        }
        0b01001 => {
            inst.opcode = Opcode::LDR;
            inst.operands = ops(&[
                reg((word >> 8) & 0b111),
                Operand::MemImm {
                    base: Reg::PC,
                    offset: (imm8 * 4) as i32,
                    mode: AddrMode::Offset,
                },
            ]);
        }
        0b01010 | 0b01011 => {
            inst.opcode = match (word >> 9) & 0b111 {
                0b000 => Opcode::STR,
                0b001 => Opcode::STRH,
                0b010 => Opcode::STRB,
                0b011 => Opcode::LDRSB,
                0b100 => Opcode::LDR,
                0b101 => Opcode::LDRH,
                0b110 => Opcode::LDRB,
                _ => Opcode::LDRSH,
            };
            inst.operands = ops(&[
                reg(rd),
                Operand::MemReg {
                    base: Reg::from_u8(rn3 as u8),
                    index: Reg::from_u8(((word >> 6) & 0b111) as u8),
                    shift: None,
                    sub: false,
                    mode: AddrMode::Offset,
                },
            ]);
        }
        0b01100 | 0b01101 | 0b01110 | 0b01111 | 0b10000 | 0b10001 => {
            let (opcode, scale) = match word >> 11 {
                0b01100 => (Opcode::STR, 2),
                0b01101 => (Opcode::LDR, 2),
                0b01110 => (Opcode::STRB, 0),
                0b01111 => (Opcode::LDRB, 0),
                0b10000 => (Opcode::STRH, 1),
                _ => (Opcode::LDRH, 1),
            };
            inst.opcode = opcode;
            inst.operands = ops(&[
                reg(rd),
                Operand::MemImm {
                    base: Reg::from_u8(rn3 as u8),
                    offset: (((word >> 6) & 0x1f) << scale) as i32,
                    mode: AddrMode::Offset,
                },
            ]);
        }
        0b10010 | 0b10011 => {
            inst.opcode = if word & 0x0800 != 0 {
                Opcode::LDR
            } else {
                Opcode::STR
            };
            inst.operands = ops(&[
                reg((word >> 8) & 0b111),
                Operand::MemImm {
                    base: Reg::SP,
                    offset: (imm8 * 4) as i32,
                    mode: AddrMode::Offset,
                },
            ]);
        }
        0b10100 => {
            let target = (sess.resolve(4, 0) & !3).wrapping_add(imm8 * 4);
            inst.opcode = Opcode::ADR;
            inst.operands = ops(&[reg((word >> 8) & 0b111), Operand::Target(target)]);
        }
        0b10101 => {
            inst.opcode = Opcode::ADD;
            inst.operands = ops(&[
                reg((word >> 8) & 0b111),
                Operand::Reg(Reg::SP),
                Operand::Imm(imm8 * 4),
            ]);
        }
        0b10110 | 0b10111 => decode16_misc(sess, word, inst),
        0b11000 => {
            inst.opcode = Opcode::STM(true, false);
            inst.operands = ops(&[
                Operand::RegWback(Reg::from_u8(((word >> 8) & 0b111) as u8)),
                Operand::RegList(imm8 as u16),
            ]);
        }
        0b11001 => {
            let rn = (word >> 8) & 0b111;
            inst.opcode = Opcode::LDM(true, false);
            let base = if imm8 & (1 << rn) == 0 {
                Operand::RegWback(Reg::from_u8(rn as u8))
            } else {
                reg(rn)
            };
            inst.operands = ops(&[base, Operand::RegList(imm8 as u16)]);
        }
        0b11010 | 0b11011 => {
            let cond = (word >> 8) & 0xf;
            match cond {
                0b1110 => set_undefined16(inst, hw),
                0b1111 => {
                    inst.opcode = Opcode::SVC;
                    inst.operands = ops(&[Operand::Imm(imm8)]);
                }
                _ => {
                    inst.condition = ConditionCode::build(cond as u8);
                    inst.opcode = Opcode::B;
                    inst.operands = ops(&[Operand::Target(
                        sess.resolve(4, sext(imm8, 8) << 1),
                    )]);
                }
            }
        }
        0b11100 => {
            inst.opcode = Opcode::B;
            inst.operands = ops(&[Operand::Target(
                sess.resolve(4, sext(word & 0x7ff, 11) << 1),
            )]);
        }
        _ => unreachable!(),
    }
}

fn decode16_dp(word: u32, in_it: bool, inst: &mut Instruction) {
    let rd = word & 0b111;
    let rm = (word >> 3) & 0b111;
    let two = ops(&[reg(rd), reg(rm)]);
    let (opcode, s, operands) = match (word >> 6) & 0xf {
        0b0000 => (Opcode::AND, true, two),
        0b0001 => (Opcode::EOR, true, two),
        0b0010 => (Opcode::LSL, true, two),
        0b0011 => (Opcode::LSR, true, two),
        0b0100 => (Opcode::ASR, true, two),
        0b0101 => (Opcode::ADC, true, two),
        0b0110 => (Opcode::SBC, true, two),
        0b0111 => (Opcode::ROR, true, two),
        0b1000 => (Opcode::TST, false, two),
        0b1001 => (Opcode::RSB, true, ops(&[reg(rd), reg(rm), Operand::Imm(0)])),
        0b1010 => (Opcode::CMP, false, two),
        0b1011 => (Opcode::CMN, false, two),
        0b1100 => (Opcode::ORR, true, two),
        0b1101 => (Opcode::MUL, true, two),
        0b1110 => (Opcode::BIC, true, two),
        _ => (Opcode::MVN, true, two),
    };
    inst.opcode = opcode;
    inst.s = s && !in_it;
    inst.operands = operands;
}

fn decode16_special(word: u32, inst: &mut Instruction) {
    let rm = (word >> 3) & 0xf;
    if (word >> 8) & 0b11 == 0b11 {
        inst.opcode = if word & 0x80 == 0 {
            Opcode::BX
        } else {
            Opcode::BLX
        };
        inst.operands = ops(&[reg(rm)]);
        return;
    }
    let rd = (word & 0b111) | ((word >> 4) & 0b1000);
    inst.opcode = match (word >> 8) & 0b11 {
        0b00 => Opcode::ADD,
        0b01 => Opcode::CMP,
        _ => Opcode::MOV,
    };
    inst.operands = ops(&[reg(rd), reg(rm)]);
}

fn decode16_misc(sess: &Session, word: u32, inst: &mut Instruction) {
    let hw = word as u16;
    let rd = word & 0b111;
    let rm = (word >> 3) & 0b111;
    if word & 0xff80 == 0xb000 || word & 0xff80 == 0xb080 {
        inst.opcode = if word & 0x80 != 0 {
            Opcode::SUB
        } else {
            Opcode::ADD
        };
        inst.operands = ops(&[Operand::Reg(Reg::SP), Operand::Imm((word & 0x7f) * 4)]);
    } else if word & 0xff00 == 0xb200 {
        inst.opcode = match (word >> 6) & 0b11 {
            0b00 => Opcode::SXTH,
            0b01 => Opcode::SXTB,
            0b10 => Opcode::UXTH,
            _ => Opcode::UXTB,
        };
        inst.operands = ops(&[reg(rd), reg(rm)]);
    } else if word & 0xf500 == 0xb100 {
        inst.opcode = if word & 0x0800 != 0 {
            Opcode::CBNZ
        } else {
            Opcode::CBZ
        };
        let offset = ((((word >> 9) & 1) << 6) | (((word >> 3) & 0x1f) << 1)) as i32;
        inst.operands = ops(&[reg(rd), Operand::Target(sess.resolve(4, offset))]);
    } else if word & 0xfe00 == 0xb400 {
        inst.opcode = Opcode::PUSH;
        inst.operands = ops(&[Operand::RegList(
            ((word & 0xff) | ((word & 0x100) << 6)) as u16,
        )]);
    } else if word & 0xfe00 == 0xbc00 {
        inst.opcode = Opcode::POP;
        inst.operands = ops(&[Operand::RegList(
            ((word & 0xff) | ((word & 0x100) << 7)) as u16,
        )]);
    } else if word & 0xff00 == 0xba00 {
        inst.opcode = match (word >> 6) & 0b11 {
            0b00 => Opcode::REV,
            0b01 => Opcode::REV16,
            0b11 => Opcode::REVSH,
            _ => return set_undefined16(inst, hw),
        };
        inst.operands = ops(&[reg(rd), reg(rm)]);
    } else if word & 0xffe8 == 0xb660 {
        static IFLAGS: [&str; 8] = ["", "f", "i", "if", "a", "af", "ai", "aif"];
        inst.opcode = Opcode::CPS(word & 0x10 == 0);
        inst.operands = ops(&[Operand::Lit(IFLAGS[(word & 0b111) as usize])]);
    } else if word & 0xff00 == 0xbe00 {
        inst.opcode = Opcode::BKPT;
        inst.operands = ops(&[Operand::Imm(word & 0xff)]);
    } else if word & 0xff00 == 0xbf00 {
        let firstcond = ((word >> 4) & 0xf) as u8;
        let mask = (word & 0xf) as u8;
        if mask == 0 {
            inst.opcode = match firstcond {
                0 => Opcode::NOP,
                1 => Opcode::YIELD,
                2 => Opcode::WFE,
                3 => Opcode::WFI,
                4 => Opcode::SEV,
                _ => return set_undefined16(inst, hw),
            };
        } else if firstcond == 0b1111 || (firstcond == 0b1110 && mask != 0b1000) {
            set_undefined16(inst, hw);
        } else {
            inst.opcode = Opcode::IT(firstcond, mask);
            inst.operands = ops(&[Operand::Cond(ConditionCode::build(firstcond))]);
        }
    } else {
        set_undefined16(inst, hw);
    }
}

fn decode32(sess: &Session, hw1: u16, hw2: u16, inst: &mut Instruction) {
    let mut upper = bitarr![Lsb0, u16; 0u16; 16];
    upper[0..16].store(hw1);

    // `A6.3 32-bit Thumb instruction encoding`
    match upper[11..13].load::<u8>() {
        0b01 => {
            if !upper[10] {
                if !upper[9] {
                    if upper[6] {
                        decode32_dual(hw1, hw2, inst);
                    } else {
                        decode32_multiple(hw1, hw2, inst);
                    }
                } else {
                    decode32_dp_shifted(hw1, hw2, inst);
                }
            } else {
                decode32_coproc(hw1, hw2, inst);
            }
        }
        0b10 => {
            if hw2 & 0x8000 == 0 {
                if hw1 & 0x0200 == 0 {
                    decode32_dp_modified_imm(hw1, hw2, inst);
                } else {
                    decode32_dp_plain_imm(sess, hw1, hw2, inst);
                }
            } else {
                decode32_branch_misc(sess, hw1, hw2, inst);
            }
        }
        0b11 => {
            if !upper[10] {
                if !upper[9] {
                    decode32_ldst_single(hw1, hw2, inst);
                } else if !upper[8] {
                    decode32_dp_reg(hw1, hw2, inst);
                } else {
                    decode32_multiply(hw1, hw2, inst);
                }
            } else {
                decode32_coproc(hw1, hw2, inst);
            }
        }
        _ => unreachable!(),
    }
}

fn decode32_multiple(hw1: u16, hw2: u16, inst: &mut Instruction) {
    let w = hw1 & 0x20 != 0;
    let l = hw1 & 0x10 != 0;
    let rn = (hw1 & 0xf) as u32;
    let list = Operand::RegList(hw2);
    match (hw1 >> 7) & 0b11 {
        0b01 => {
            if l && w && rn == 13 {
                inst.opcode = Opcode::POP;
                inst.operands = ops(&[list]);
                return;
            }
            inst.opcode = if l {
                Opcode::LDM(true, false)
            } else {
                Opcode::STM(true, false)
            };
        }
        0b10 => {
            if !l && w && rn == 13 {
                inst.opcode = Opcode::PUSH;
                inst.operands = ops(&[list]);
                return;
            }
            inst.opcode = if l {
                Opcode::LDM(false, true)
            } else {
                Opcode::STM(false, true)
            };
        }
        _ => return set_undefined32(inst, hw1, hw2),
    }
    let base = if w {
        Operand::RegWback(Reg::from_u8(rn as u8))
    } else {
        reg(rn)
    };
    inst.operands = ops(&[base, list]);
}

fn decode32_dual(hw1: u16, hw2: u16, inst: &mut Instruction) {
    let p = hw1 & 0x100 != 0;
    let u = hw1 & 0x80 != 0;
    let w = hw1 & 0x20 != 0;
    let l = hw1 & 0x10 != 0;
    let rn = Reg::from_u8((hw1 & 0xf) as u8);
    let rt = ((hw2 >> 12) & 0xf) as u32;
    let rd2 = ((hw2 >> 8) & 0xf) as u32;
    let imm8 = (hw2 & 0xff) as u32;
    if !p && !w {
        // exclusive access and table branch
        if !u {
            let mem = Operand::MemImm {
                base: rn,
                offset: (imm8 * 4) as i32,
                mode: AddrMode::Offset,
            };
            if l {
                inst.opcode = Opcode::LDREX;
                inst.operands = ops(&[reg(rt), mem]);
            } else {
                inst.opcode = Opcode::STREX;
                inst.operands = ops(&[reg(rd2), reg(rt), mem]);
            }
            return;
        }
        let deref = Operand::RegDeref(rn);
        match (l, (hw2 >> 4) & 0xf) {
            (true, 0b0000) => {
                inst.opcode = Opcode::TBB;
                inst.operands = ops(&[Operand::MemReg {
                    base: rn,
                    index: Reg::from_u8((hw2 & 0xf) as u8),
                    shift: None,
                    sub: false,
                    mode: AddrMode::Offset,
                }]);
            }
            (true, 0b0001) => {
                inst.opcode = Opcode::TBH;
                inst.operands = ops(&[Operand::MemReg {
                    base: rn,
                    index: Reg::from_u8((hw2 & 0xf) as u8),
                    shift: Some((ShiftStyle::LSL, 1)),
                    sub: false,
                    mode: AddrMode::Offset,
                }]);
            }
            (true, 0b0100) => {
                inst.opcode = Opcode::LDREXB;
                inst.operands = ops(&[reg(rt), deref]);
            }
            (true, 0b0101) => {
                inst.opcode = Opcode::LDREXH;
                inst.operands = ops(&[reg(rt), deref]);
            }
            (true, 0b0111) => {
                inst.opcode = Opcode::LDREXD;
                inst.operands = ops(&[reg(rt), reg(rd2), deref]);
            }
            (false, 0b0100) => {
                inst.opcode = Opcode::STREXB;
                inst.operands = ops(&[reg((hw2 & 0xf) as u32), reg(rt), deref]);
            }
            (false, 0b0101) => {
                inst.opcode = Opcode::STREXH;
                inst.operands = ops(&[reg((hw2 & 0xf) as u32), reg(rt), deref]);
            }
            (false, 0b0111) => {
                inst.opcode = Opcode::STREXD;
                inst.operands = ops(&[reg((hw2 & 0xf) as u32), reg(rt), reg(rd2), deref]);
            }
            _ => set_undefined32(inst, hw1, hw2),
        }
        return;
    }
    let imm = (imm8 * 4) as i32;
    let mode = if !p {
        AddrMode::PostIndex
    } else if w {
        AddrMode::PreIndex
    } else {
        AddrMode::Offset
    };
    inst.opcode = if l { Opcode::LDRD } else { Opcode::STRD };
    inst.operands = ops(&[
        reg(rt),
        reg(rd2),
        Operand::MemImm {
            base: rn,
            offset: if u { imm } else { -imm },
            mode,
        },
    ]);
}

fn decode32_dp_shifted(hw1: u16, hw2: u16, inst: &mut Instruction) {
    let op = ((hw1 >> 5) & 0xf) as u8;
    let s = hw1 & 0x10 != 0;
    let rn = (hw1 & 0xf) as u32;
    let rd = ((hw2 >> 8) & 0xf) as u32;
    let rm = Reg::from_u8((hw2 & 0xf) as u8);
    let ty = ((hw2 >> 4) & 0b11) as u8;
    let imm5 = ((((hw2 >> 12) & 0b111) << 2) | ((hw2 >> 6) & 0b11)) as u8;
    let shifted = shifted_register(rm, ty, imm5);
    dp_common(op, s, rn, rd, rm, shifted, ty, imm5, inst, hw1, hw2);
}

fn decode32_dp_modified_imm(hw1: u16, hw2: u16, inst: &mut Instruction) {
    let op = ((hw1 >> 5) & 0xf) as u8;
    let s = hw1 & 0x10 != 0;
    let rn = (hw1 & 0xf) as u32;
    let rd = ((hw2 >> 8) & 0xf) as u32;
    let imm12 =
        (((hw1 as u32) & 0x400) << 1) | (((hw2 as u32) >> 4) & 0x700) | ((hw2 as u32) & 0xff);
    let value = Operand::Imm(thumb_expand_imm(imm12));
    // the immediate forms share the shifted-register opcode table; there is
    // no pkh row and no shift fields here
    dp_common(op, s, rn, rd, Reg::from_u8(0), value, 0xff, 0, inst, hw1, hw2);
}

#[allow(clippy::too_many_arguments)]
fn dp_common(
    op: u8,
    s: bool,
    rn: u32,
    rd: u32,
    rm: Reg,
    operand: Operand,
    ty: u8,
    imm5: u8,
    inst: &mut Instruction,
    hw1: u16,
    hw2: u16,
) {
    match op {
        0b0000 => {
            if rd == 15 && s {
                inst.opcode = Opcode::TST;
                inst.operands = ops(&[reg(rn), operand]);
            } else {
                inst.opcode = Opcode::AND;
                inst.s = s;
                inst.operands = ops(&[reg(rd), reg(rn), operand]);
            }
        }
        0b0001 => {
            inst.opcode = Opcode::BIC;
            inst.s = s;
            inst.operands = ops(&[reg(rd), reg(rn), operand]);
        }
        0b0010 => {
            if rn == 15 {
                inst.s = s;
                if let Operand::RegShift { rm, style, amount } = operand {
                    inst.opcode = match style {
                        ShiftStyle::LSL => Opcode::LSL,
                        ShiftStyle::LSR => Opcode::LSR,
                        ShiftStyle::ASR => Opcode::ASR,
                        ShiftStyle::ROR => Opcode::ROR,
                        ShiftStyle::RRX => Opcode::RRX,
                    };
                    inst.operands = match (style, amount) {
                        (ShiftStyle::RRX, _) => ops(&[reg(rd), Operand::Reg(rm)]),
                        (_, ShiftAmount::Imm(imm)) => {
                            ops(&[reg(rd), Operand::Reg(rm), Operand::Imm(imm as u32)])
                        }
                        (_, ShiftAmount::Reg(rs)) => {
                            ops(&[reg(rd), Operand::Reg(rm), Operand::Reg(rs)])
                        }
                    };
                    return;
                }
                inst.opcode = Opcode::MOV;
                inst.operands = ops(&[reg(rd), operand]);
            } else {
                inst.opcode = Opcode::ORR;
                inst.s = s;
                inst.operands = ops(&[reg(rd), reg(rn), operand]);
            }
        }
        0b0011 => {
            if rn == 15 {
                inst.opcode = Opcode::MVN;
                inst.s = s;
                inst.operands = ops(&[reg(rd), operand]);
            } else {
                inst.opcode = Opcode::ORN;
                inst.s = s;
                inst.operands = ops(&[reg(rd), reg(rn), operand]);
            }
        }
        0b0100 => {
            if rd == 15 && s {
                inst.opcode = Opcode::TEQ;
                inst.operands = ops(&[reg(rn), operand]);
            } else {
                inst.opcode = Opcode::EOR;
                inst.s = s;
                inst.operands = ops(&[reg(rd), reg(rn), operand]);
            }
        }
        0b0110 => {
            // pkhbt/pkhtb live in the shifted-register table only
            if s || ty == 0xff {
                return set_undefined32(inst, hw1, hw2);
            }
            match ty {
                0b00 => {
                    inst.opcode = Opcode::PKHBT;
                    let packed = if imm5 == 0 {
                        Operand::Reg(rm)
                    } else {
                        Operand::RegShift {
                            rm,
                            style: ShiftStyle::LSL,
                            amount: ShiftAmount::Imm(imm5),
                        }
                    };
                    inst.operands = ops(&[reg(rd), reg(rn), packed]);
                }
                0b10 => {
                    inst.opcode = Opcode::PKHTB;
                    inst.operands = ops(&[
                        reg(rd),
                        reg(rn),
                        Operand::RegShift {
                            rm,
                            style: ShiftStyle::ASR,
                            amount: ShiftAmount::Imm(if imm5 == 0 { 32 } else { imm5 }),
                        },
                    ]);
                }
                _ => set_undefined32(inst, hw1, hw2),
            }
        }
        0b1000 => {
            if rd == 15 && s {
                inst.opcode = Opcode::CMN;
                inst.operands = ops(&[reg(rn), operand]);
            } else {
                inst.opcode = Opcode::ADD;
                inst.s = s;
                inst.operands = ops(&[reg(rd), reg(rn), operand]);
            }
        }
        0b1010 => {
            inst.opcode = Opcode::ADC;
            inst.s = s;
            inst.operands = ops(&[reg(rd), reg(rn), operand]);
        }
        0b1011 => {
            inst.opcode = Opcode::SBC;
            inst.s = s;
            inst.operands = ops(&[reg(rd), reg(rn), operand]);
        }
        0b1101 => {
            if rd == 15 && s {
                inst.opcode = Opcode::CMP;
                inst.operands = ops(&[reg(rn), operand]);
            } else {
                inst.opcode = Opcode::SUB;
                inst.s = s;
                inst.operands = ops(&[reg(rd), reg(rn), operand]);
            }
        }
        0b1110 => {
            inst.opcode = Opcode::RSB;
            inst.s = s;
            inst.operands = ops(&[reg(rd), reg(rn), operand]);
        }
        _ => set_undefined32(inst, hw1, hw2),
    }
}

fn decode32_dp_plain_imm(sess: &Session, hw1: u16, hw2: u16, inst: &mut Instruction) {
    let rn = (hw1 & 0xf) as u32;
    let rd = ((hw2 >> 8) & 0xf) as u32;
    let imm12 =
        (((hw1 as u32) & 0x400) << 1) | (((hw2 as u32) >> 4) & 0x700) | ((hw2 as u32) & 0xff);
    match hw1 & 0xfbf0 {
        0xf240 | 0xf2c0 => {
            let imm16 = ((hw1 as u32 & 0xf) << 12) | imm12;
            inst.opcode = if hw1 & 0xfbf0 == 0xf240 {
                Opcode::MOVW
            } else {
                Opcode::MOVT
            };
            inst.operands = ops(&[reg(rd), Operand::Imm(imm16)]);
            return;
        }
        0xf200 | 0xf2a0 => {
            let sub = hw1 & 0xfbf0 == 0xf2a0;
            if rn == 15 {
                let displacement = if sub { -(imm12 as i32) } else { imm12 as i32 };
                let target = (sess.resolve(4, 0) & !3).wrapping_add(displacement as u32);
                inst.opcode = Opcode::ADR;
                inst.operands = ops(&[reg(rd), Operand::Target(target)]);
                return;
            }
            inst.opcode = if sub { Opcode::SUBW } else { Opcode::ADDW };
            inst.operands = ops(&[reg(rd), reg(rn), Operand::Imm(imm12)]);
            return;
        }
        _ => {}
    }
    let imm5 = ((((hw2 >> 12) & 0b111) << 2) | ((hw2 >> 6) & 0b11)) as u8;
    match hw1 & 0xffd0 {
        0xf300 | 0xf380 => {
            let unsigned = hw1 & 0xffd0 == 0xf380;
            let sat = (hw2 & 0x1f) as u32;
            let reg_rn = Reg::from_u8(rn as u8);
            let shifted = if hw1 & 0x20 != 0 {
                Operand::RegShift {
                    rm: reg_rn,
                    style: ShiftStyle::ASR,
                    amount: ShiftAmount::Imm(if imm5 == 0 { 32 } else { imm5 }),
                }
            } else if imm5 != 0 {
                Operand::RegShift {
                    rm: reg_rn,
                    style: ShiftStyle::LSL,
                    amount: ShiftAmount::Imm(imm5),
                }
            } else {
                Operand::Reg(reg_rn)
            };
            inst.opcode = if unsigned { Opcode::USAT } else { Opcode::SSAT };
            inst.operands = ops(&[
                reg(rd),
                Operand::Imm(if unsigned { sat } else { sat + 1 }),
                shifted,
            ]);
            return;
        }
        _ => {}
    }
    match hw1 & 0xfff0 {
        0xf340 | 0xf3c0 => {
            inst.opcode = if hw1 & 0xfff0 == 0xf3c0 {
                Opcode::UBFX
            } else {
                Opcode::SBFX
            };
            inst.operands = ops(&[
                reg(rd),
                reg(rn),
                Operand::Imm(imm5 as u32),
                Operand::Imm((hw2 & 0x1f) as u32 + 1),
            ]);
        }
        0xf360 => {
            let msb = (hw2 & 0x1f) as u32;
            let lsb = imm5 as u32;
            if msb < lsb {
                return set_undefined32(inst, hw1, hw2);
            }
            let width = Operand::Imm(msb - lsb + 1);
            if rn == 15 {
                inst.opcode = Opcode::BFC;
                inst.operands = ops(&[reg(rd), Operand::Imm(lsb), width]);
            } else {
                inst.opcode = Opcode::BFI;
                inst.operands = ops(&[reg(rd), reg(rn), Operand::Imm(lsb), width]);
            }
        }
        _ => set_undefined32(inst, hw1, hw2),
    }
}

/// `S:I1:I2:imm10:imm11`, assembled and scaled; shared by `bl` and the wide
/// unconditional branch.
fn branch_t4_offset(hw1: u16, hw2: u16) -> i32 {
    let s = ((hw1 >> 10) & 1) as u32;
    let j1 = ((hw2 >> 13) & 1) as u32;
    let j2 = ((hw2 >> 11) & 1) as u32;
    let i1 = !(j1 ^ s) & 1;
    let i2 = !(j2 ^ s) & 1;
    let raw = (s << 24)
        | (i1 << 23)
        | (i2 << 22)
        | (((hw1 & 0x3ff) as u32) << 12)
        | (((hw2 & 0x7ff) as u32) << 1);
    ((raw << 7) as i32) >> 7
}

fn branch_t3_offset(hw1: u16, hw2: u16) -> i32 {
    let s = ((hw1 >> 10) & 1) as u32;
    let j2 = ((hw2 >> 11) & 1) as u32;
    let j1 = ((hw2 >> 13) & 1) as u32;
    let raw = (s << 20)
        | (j2 << 19)
        | (j1 << 18)
        | (((hw1 & 0x3f) as u32) << 12)
        | (((hw2 & 0x7ff) as u32) << 1);
    ((raw << 11) as i32) >> 11
}

fn decode32_branch_misc(sess: &Session, hw1: u16, hw2: u16, inst: &mut Instruction) {
    match hw2 & 0x5000 {
        0x5000 => {
            inst.opcode = Opcode::BL;
            inst.operands = ops(&[Operand::Target(sess.resolve(4, branch_t4_offset(hw1, hw2)))]);
        }
        0x4000 => {
            // the target of blx is arm code, word-aligned
            let offset = branch_t4_offset(hw1, hw2 & !1);
            inst.opcode = Opcode::BLX;
            inst.operands = ops(&[Operand::Target(sess.resolve(4, offset) & !3)]);
        }
        0x1000 => {
            inst.opcode = Opcode::B;
            inst.operands = ops(&[Operand::Target(sess.resolve(4, branch_t4_offset(hw1, hw2)))]);
        }
        _ => {
            let cond = ((hw1 >> 6) & 0xf) as u8;
            if cond < 0b1110 {
                inst.condition = ConditionCode::build(cond);
                inst.opcode = Opcode::B;
                inst.operands =
                    ops(&[Operand::Target(sess.resolve(4, branch_t3_offset(hw1, hw2)))]);
                return;
            }
            match hw1 & 0xfff0 {
                0xf380 => {
                    inst.opcode = Opcode::MSR;
                    inst.operands = ops(&[
                        Operand::SysReg((hw2 & 0xff) as u8),
                        reg((hw1 & 0xf) as u32),
                    ]);
                }
                0xf3e0 => {
                    inst.opcode = Opcode::MRS;
                    inst.operands = ops(&[
                        reg(((hw2 >> 8) & 0xf) as u32),
                        Operand::SysReg((hw2 & 0xff) as u8),
                    ]);
                }
                0xf3a0 => {
                    inst.opcode = match hw2 & 0xff {
                        0 => Opcode::NOP,
                        1 => Opcode::YIELD,
                        2 => Opcode::WFE,
                        3 => Opcode::WFI,
                        4 => Opcode::SEV,
                        _ => return set_undefined32(inst, hw1, hw2),
                    };
                }
                0xf3b0 => {
                    inst.opcode = match (hw2 >> 4) & 0xf {
                        0b0010 => Opcode::CLREX,
                        0b0100 => Opcode::DSB,
                        0b0101 => Opcode::DMB,
                        0b0110 => Opcode::ISB,
                        _ => return set_undefined32(inst, hw1, hw2),
                    };
                }
                _ => set_undefined32(inst, hw1, hw2),
            }
        }
    }
}

fn decode32_ldst_single(hw1: u16, hw2: u16, inst: &mut Instruction) {
    let signed = hw1 & 0x100 != 0;
    let size = (hw1 >> 5) & 0b11;
    let l = hw1 & 0x10 != 0;
    let rn = (hw1 & 0xf) as u32;
    let rt = ((hw2 >> 12) & 0xf) as u32;
    if size == 0b11 || (signed && !l) {
        return set_undefined32(inst, hw1, hw2);
    }
    if l && rn == 15 {
        // pc-relative literal
        let imm = (hw2 & 0xfff) as i32;
        let offset = if hw1 & 0x80 != 0 { imm } else { -imm };
        let mem = Operand::MemImm {
            base: Reg::PC,
            offset,
            mode: AddrMode::Offset,
        };
        return finish_single(l, signed, size, rt, mem, inst, hw1, hw2);
    }
    if hw1 & 0x80 != 0 {
        let mem = Operand::MemImm {
            base: Reg::from_u8(rn as u8),
            offset: (hw2 & 0xfff) as i32,
            mode: AddrMode::Offset,
        };
        return finish_single(l, signed, size, rt, mem, inst, hw1, hw2);
    }
    if hw2 & 0x800 != 0 {
        let imm8 = (hw2 & 0xff) as i32;
        let puw = (hw2 >> 8) & 0b111;
        if puw == 0b110 {
            // unprivileged access
            inst.opcode = match (l, signed, size) {
                (true, false, 0b00) => Opcode::LDRBT,
                (true, false, 0b01) => Opcode::LDRHT,
                (true, false, _) => Opcode::LDRT,
                (true, true, 0b00) => Opcode::LDRSBT,
                (true, true, _) => Opcode::LDRSHT,
                (false, _, 0b00) => Opcode::STRBT,
                (false, _, 0b01) => Opcode::STRHT,
                (false, _, _) => Opcode::STRT,
            };
            inst.operands = ops(&[
                reg(rt),
                Operand::MemImm {
                    base: Reg::from_u8(rn as u8),
                    offset: imm8,
                    mode: AddrMode::Offset,
                },
            ]);
            return;
        }
        let (mode, offset) = match puw {
            0b100 => (AddrMode::Offset, -imm8),
            0b101 => (AddrMode::PreIndex, -imm8),
            0b111 => (AddrMode::PreIndex, imm8),
            0b001 => (AddrMode::PostIndex, -imm8),
            0b011 => (AddrMode::PostIndex, imm8),
            _ => return set_undefined32(inst, hw1, hw2),
        };
        let mem = Operand::MemImm {
            base: Reg::from_u8(rn as u8),
            offset,
            mode,
        };
        return finish_single(l, signed, size, rt, mem, inst, hw1, hw2);
    }
    if hw2 & 0x7c0 == 0 {
        let imm2 = ((hw2 >> 4) & 0b11) as u8;
        let mem = Operand::MemReg {
            base: Reg::from_u8(rn as u8),
            index: Reg::from_u8((hw2 & 0xf) as u8),
            shift: if imm2 == 0 {
                None
            } else {
                Some((ShiftStyle::LSL, imm2))
            },
            sub: false,
            mode: AddrMode::Offset,
        };
        return finish_single(l, signed, size, rt, mem, inst, hw1, hw2);
    }
    set_undefined32(inst, hw1, hw2);
}

fn finish_single(
    l: bool,
    signed: bool,
    size: u16,
    rt: u32,
    mem: Operand,
    inst: &mut Instruction,
    hw1: u16,
    hw2: u16,
) {
    if l && rt == 15 && size != 0b10 {
        // byte and halfword loads into pc are preload hints
        inst.opcode = if signed { Opcode::PLI } else { Opcode::PLD };
        inst.operands = ops(&[mem]);
        return;
    }
    inst.opcode = match (l, signed, size) {
        (false, _, 0b00) => Opcode::STRB,
        (false, _, 0b01) => Opcode::STRH,
        (false, _, _) => Opcode::STR,
        (true, false, 0b00) => Opcode::LDRB,
        (true, false, 0b01) => Opcode::LDRH,
        (true, false, _) => Opcode::LDR,
        (true, true, 0b00) => Opcode::LDRSB,
        (true, true, 0b01) => Opcode::LDRSH,
        _ => return set_undefined32(inst, hw1, hw2),
    };
    inst.operands = ops(&[reg(rt), mem]);
}

fn decode32_dp_reg(hw1: u16, hw2: u16, inst: &mut Instruction) {
    if hw2 & 0xf000 != 0xf000 {
        return set_undefined32(inst, hw1, hw2);
    }
    let rn = (hw1 & 0xf) as u32;
    let rd = ((hw2 >> 8) & 0xf) as u32;
    let rm = (hw2 & 0xf) as u32;
    if hw1 & 0x80 == 0 {
        if hw2 & 0x80 == 0 {
            // register-controlled shift
            if hw2 & 0x70 != 0 {
                return set_undefined32(inst, hw1, hw2);
            }
            inst.opcode = match (hw1 >> 5) & 0b11 {
                0b00 => Opcode::LSL,
                0b01 => Opcode::LSR,
                0b10 => Opcode::ASR,
                _ => Opcode::ROR,
            };
            inst.s = hw1 & 0x10 != 0;
            inst.operands = ops(&[reg(rd), reg(rn), reg(rm)]);
            return;
        }
        // byte/halfword extension
        let pair = match (hw1 >> 4) & 0b111 {
            0b000 => (Opcode::SXTH, Opcode::SXTAH),
            0b001 => (Opcode::UXTH, Opcode::UXTAH),
            0b100 => (Opcode::SXTB, Opcode::SXTAB),
            0b101 => (Opcode::UXTB, Opcode::UXTAB),
            _ => return set_undefined32(inst, hw1, hw2),
        };
        let rotation = (((hw2 >> 4) & 0b11) * 8) as u8;
        let extended = if rotation == 0 {
            reg(rm)
        } else {
            Operand::RegShift {
                rm: Reg::from_u8(rm as u8),
                style: ShiftStyle::ROR,
                amount: ShiftAmount::Imm(rotation),
            }
        };
        if rn == 15 {
            inst.opcode = pair.0;
            inst.operands = ops(&[reg(rd), extended]);
        } else {
            inst.opcode = pair.1;
            inst.operands = ops(&[reg(rd), reg(rn), extended]);
        }
        return;
    }
    match ((hw1 >> 4) & 0b111, (hw2 >> 4) & 0xf) {
        (0b000, 0b1000) => {
            inst.opcode = Opcode::QADD;
            inst.operands = ops(&[reg(rd), reg(rm), reg(rn)]);
        }
        (0b000, 0b1001) => {
            inst.opcode = Opcode::QDADD;
            inst.operands = ops(&[reg(rd), reg(rm), reg(rn)]);
        }
        (0b000, 0b1010) => {
            inst.opcode = Opcode::QSUB;
            inst.operands = ops(&[reg(rd), reg(rm), reg(rn)]);
        }
        (0b000, 0b1011) => {
            inst.opcode = Opcode::QDSUB;
            inst.operands = ops(&[reg(rd), reg(rm), reg(rn)]);
        }
        (0b001, 0b1000) => {
            inst.opcode = Opcode::REV;
            inst.operands = ops(&[reg(rd), reg(rm)]);
        }
        (0b001, 0b1001) => {
            inst.opcode = Opcode::REV16;
            inst.operands = ops(&[reg(rd), reg(rm)]);
        }
        (0b001, 0b1010) => {
            inst.opcode = Opcode::RBIT;
            inst.operands = ops(&[reg(rd), reg(rm)]);
        }
        (0b001, 0b1011) => {
            inst.opcode = Opcode::REVSH;
            inst.operands = ops(&[reg(rd), reg(rm)]);
        }
        (0b010, 0b1000) => {
            inst.opcode = Opcode::SEL;
            inst.operands = ops(&[reg(rd), reg(rn), reg(rm)]);
        }
        (0b011, 0b1000) => {
            inst.opcode = Opcode::CLZ;
            inst.operands = ops(&[reg(rd), reg(rm)]);
        }
        _ => set_undefined32(inst, hw1, hw2),
    }
}

fn decode32_multiply(hw1: u16, hw2: u16, inst: &mut Instruction) {
    let op1 = (hw1 >> 4) & 0b111;
    let op2 = (hw2 >> 4) & 0xf;
    let rn = (hw1 & 0xf) as u32;
    let ra = ((hw2 >> 12) & 0xf) as u32;
    let rd = ((hw2 >> 8) & 0xf) as u32;
    let rm = (hw2 & 0xf) as u32;
    if hw1 & 0x80 == 0 {
        match (op1, op2) {
            (0b000, 0b0000) => {
                if ra == 15 {
                    inst.opcode = Opcode::MUL;
                    inst.operands = ops(&[reg(rd), reg(rn), reg(rm)]);
                } else {
                    inst.opcode = Opcode::MLA;
                    inst.operands = ops(&[reg(rd), reg(rn), reg(rm), reg(ra)]);
                }
            }
            (0b000, 0b0001) => {
                inst.opcode = Opcode::MLS;
                inst.operands = ops(&[reg(rd), reg(rn), reg(rm), reg(ra)]);
            }
            (0b001, _) if op2 & 0b1100 == 0 => {
                let n_high = op2 & 0b10 != 0;
                let m_high = op2 & 0b01 != 0;
                if ra == 15 {
                    inst.opcode = Opcode::SMUL(n_high, m_high);
                    inst.operands = ops(&[reg(rd), reg(rn), reg(rm)]);
                } else {
                    inst.opcode = Opcode::SMLA(n_high, m_high);
                    inst.operands = ops(&[reg(rd), reg(rn), reg(rm), reg(ra)]);
                }
            }
            (0b011, _) if op2 & 0b1110 == 0 => {
                let m_high = op2 & 0b01 != 0;
                if ra == 15 {
                    inst.opcode = Opcode::SMULW(m_high);
                    inst.operands = ops(&[reg(rd), reg(rn), reg(rm)]);
                } else {
                    inst.opcode = Opcode::SMLAW(m_high);
                    inst.operands = ops(&[reg(rd), reg(rn), reg(rm), reg(ra)]);
                }
            }
            _ => set_undefined32(inst, hw1, hw2),
        }
        return;
    }
    match (op1, op2) {
        (0b000, 0b0000) => {
            inst.opcode = Opcode::SMULL;
            inst.operands = ops(&[reg(ra), reg(rd), reg(rn), reg(rm)]);
        }
        (0b001, 0b1111) => {
            inst.opcode = Opcode::SDIV;
            inst.operands = ops(&[reg(rd), reg(rn), reg(rm)]);
        }
        (0b010, 0b0000) => {
            inst.opcode = Opcode::UMULL;
            inst.operands = ops(&[reg(ra), reg(rd), reg(rn), reg(rm)]);
        }
        (0b011, 0b1111) => {
            inst.opcode = Opcode::UDIV;
            inst.operands = ops(&[reg(rd), reg(rn), reg(rm)]);
        }
        (0b100, 0b0000) => {
            inst.opcode = Opcode::SMLAL;
            inst.operands = ops(&[reg(ra), reg(rd), reg(rn), reg(rm)]);
        }
        (0b100, _) if op2 & 0b1100 == 0b1000 => {
            inst.opcode = Opcode::SMLAL_halfword(op2 & 0b10 != 0, op2 & 0b01 != 0);
            inst.operands = ops(&[reg(ra), reg(rd), reg(rn), reg(rm)]);
        }
        (0b110, 0b0000) => {
            inst.opcode = Opcode::UMLAL;
            inst.operands = ops(&[reg(ra), reg(rd), reg(rn), reg(rm)]);
        }
        (0b110, 0b0110) => {
            inst.opcode = Opcode::UMAAL;
            inst.operands = ops(&[reg(ra), reg(rd), reg(rn), reg(rm)]);
        }
        _ => set_undefined32(inst, hw1, hw2),
    }
}

fn decode32_coproc(hw1: u16, hw2: u16, inst: &mut Instruction) {
    // the coprocessor field layout matches arm mode, so the templates are
    // shared; the unrelated advanced-simd space stays undefined
    if hw1 & 0xf000 != 0xe000 {
        return set_undefined32(inst, hw1, hw2);
    }
    let word = ((hw1 as u32) << 16) | hw2 as u32;
    if (hw1 >> 9) & 1 == 0 {
        arm::decode_coproc_ldst(word, inst);
    } else if hw1 & 0x0100 == 0 {
        arm::decode_coproc(word, inst);
    } else {
        set_undefined32(inst, hw1, hw2);
    }
}
