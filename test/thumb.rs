use armdis::{ConditionCode, DecodeError, Flags, Session};

fn test_display(session: &mut Session, hw: u16, hw2: u16, length: usize, expected: &'static str) {
    session.decode_thumb(hw, hw2);
    assert!(
        session.len() == length && session.text() == expected,
        "display error for {:04x} {:04x}:\n displayed: {:?} (length {})\n expected: {:?} (length {})\n",
        hw,
        hw2,
        session.text(),
        session.len(),
        expected,
        length
    );
}

#[test]
fn test_decode_thumb() {
    let mut s = Session::new(Flags::empty());
    test_display(&mut s, 0xe001, 0, 2, "b       0000006");
    s.set_address(0x0002);
    test_display(&mut s, 0xd33a, 0, 2, "bcc     000007a");
    s.set_address(0x0004);
    test_display(&mut s, 0xd048, 0, 2, "beq     0000098");
    s.set_address(0x0800049c);
    test_display(&mut s, 0xe7ea, 0, 2, "b       8000474");
    s.set_address(0x0800052e);
    test_display(&mut s, 0xf7ff, 0xfed1, 4, "bl      80002d4");
    s.set_address(0x08000424);
    test_display(&mut s, 0xdbfa, 0, 2, "blt     800041c");
    test_display(&mut s, 0x4770, 0, 2, "bx      lr");
    test_display(&mut s, 0xaf00, 0, 2, "add     r7, sp, #0");
    test_display(&mut s, 0x3304, 0, 2, "adds    r3, #4");
    test_display(&mut s, 0xf107, 0x0308, 4, "add     r3, r7, #8");
    test_display(&mut s, 0x4013, 0, 2, "ands    r3, r2");
    s.set_address(0x0800158a);
    test_display(&mut s, 0xb12c, 0, 2, "cbz     r4, 8001598");
    test_display(&mut s, 0xb92c, 0, 2, "cbnz    r4, 8001598");
    test_display(&mut s, 0xfab2, 0xf282, 4, "clz     r2, r2");
    test_display(&mut s, 0x2a00, 0, 2, "cmp     r2, #0");
    test_display(&mut s, 0xf5b4, 0x6faf, 4, "cmp     r4, #1400");
    test_display(&mut s, 0x407c, 0, 2, "eors    r4, r7");
    test_display(&mut s, 0x4b09, 0, 2, "ldr     r3, [pc, #36]");
    test_display(&mut s, 0x687a, 0, 2, "ldr     r2, [r7, #4]");
    test_display(&mut s, 0xf852, 0x3023, 4, "ldr     r3, [r2, r3, lsl #2]");
    test_display(&mut s, 0xf85f, 0x1ef0, 4, "ldr     r1, [pc, #-3824]");
    test_display(&mut s, 0x5cd1, 0, 2, "ldrb    r1, [r2, r3]");
    test_display(&mut s, 0x880b, 0, 2, "ldrh    r3, [r1, #0]");
    test_display(&mut s, 0xf852, 0x1eff, 4, "ldrt    r1, [r2, #255]");
    test_display(&mut s, 0x0783, 0, 2, "lsls    r3, r0, #30");
    test_display(&mut s, 0x079d, 0, 2, "lsls    r5, r3, #30");
    test_display(&mut s, 0xfa01, 0xf202, 4, "lsl     r2, r1, r2");
    test_display(&mut s, 0x2208, 0, 2, "movs    r2, #8");
    test_display(&mut s, 0x46bd, 0, 2, "mov     sp, r7");
    test_display(&mut s, 0xf44f, 0x5200, 4, "mov     r2, #8192");
    test_display(&mut s, 0xf644, 0x631f, 4, "movw    r3, #19999");
    test_display(&mut s, 0xf3ef, 0x8311, 4, "mrs     r3, BASEPRI");
    test_display(&mut s, 0xf381, 0x8811, 4, "msr     BASEPRI, r1");
    test_display(&mut s, 0x4353, 0, 2, "muls    r3, r2");
    test_display(&mut s, 0xbf00, 0, 2, "nop");
    test_display(&mut s, 0xea41, 0x0300, 4, "orr     r3, r1, r0");
    test_display(&mut s, 0xf892, 0x1fab, 4, "ldrb    r1, [r2, #4011]");
    test_display(&mut s, 0xf892, 0xffab, 4, "pld     [r2, #4011]");
    test_display(&mut s, 0xbd30, 0, 2, "pop     {r4, r5, pc}");
    test_display(&mut s, 0xbd80, 0, 2, "pop     {r7, pc}");
    test_display(&mut s, 0xb530, 0, 2, "push    {r4, r5, lr}");
    test_display(&mut s, 0xb580, 0, 2, "push    {r7, lr}");
    test_display(&mut s, 0xb4ff, 0, 2, "push    {r0-r7}");
    test_display(&mut s, 0xb5ff, 0, 2, "push    {r0-r7, lr}");
    test_display(&mut s, 0x6078, 0, 2, "str     r0, [r7, #4]");
    test_display(&mut s, 0x60bb, 0, 2, "str     r3, [r7, #8]");
    test_display(&mut s, 0xf8c3, 0x20f0, 4, "str     r2, [r3, #240]");
    test_display(&mut s, 0x9300, 0, 2, "str     r3, [sp, #0]");
    test_display(&mut s, 0x70fb, 0, 2, "strb    r3, [r7, #3]");
    test_display(&mut s, 0x8003, 0, 2, "strh    r3, [r0, #0]");
    test_display(&mut s, 0xe942, 0x5504, 4, "strd    r5, r5, [r2, #-16]");
    test_display(&mut s, 0xe942, 0x5502, 4, "strd    r5, r5, [r2, #-8]");
    test_display(&mut s, 0xb084, 0, 2, "sub     sp, #16");
    test_display(&mut s, 0x1e54, 0, 2, "subs    r4, r2, #1");
    test_display(&mut s, 0x3c01, 0, 2, "subs    r4, #1");
    test_display(&mut s, 0x1ad3, 0, 2, "subs    r3, r2, r3");
    test_display(&mut s, 0xdf01, 0, 2, "svc     #1");
    test_display(&mut s, 0xb2ca, 0, 2, "uxtb    r2, r1");
    test_display(&mut s, 0xb299, 0, 2, "uxth    r1, r3");
}

#[test]
fn test_it_blocks() {
    let mut s = Session::new(Flags::empty());
    test_display(&mut s, 0xbf1c, 0, 2, "itt     ne");
    test_display(&mut s, 0xfa22, 0xf20c, 4, "lsrne   r2, r2, ip");
    test_display(&mut s, 0x4313, 0, 2, "orrne   r3, r2");
    test_display(&mut s, 0xbf04, 0, 2, "itt     eq");
    test_display(&mut s, 0xf851, 0x3b04, 4, "ldreq   r3, [r1], #4");
    test_display(&mut s, 0x3004, 0, 2, "addeq   r0, #4");
    // the block is spent; the flag-setting form is back
    test_display(&mut s, 0x4313, 0, 2, "orrs    r3, r2");
}

#[test]
fn test_it_queue_contents() {
    let mut s = Session::new(Flags::empty());
    s.decode_thumb(0xbf1c, 0);
    {
        let block = s.it_block().expect("itt installs a block");
        assert_eq!(block.remaining(), 2);
        assert_eq!(
            block.conditions(),
            &[ConditionCode::NE, ConditionCode::NE][..]
        );
    }
    s.decode_thumb(0x4313, 0);
    assert_eq!(s.it_block().map(|block| block.remaining()), Some(1));
    s.decode_thumb(0x4313, 0);
    assert!(s.it_block().is_none());
}

#[test]
fn test_it_then_else() {
    let mut s = Session::new(Flags::empty());
    test_display(&mut s, 0xbf0c, 0, 2, "ite     eq");
    test_display(&mut s, 0x3001, 0, 2, "addeq   r0, #1");
    test_display(&mut s, 0x3001, 0, 2, "addne   r0, #1");
    test_display(&mut s, 0xbfe8, 0, 2, "it      al");
    test_display(&mut s, 0x3001, 0, 2, "add     r0, #1");
}

#[test]
fn test_it_overwrite() {
    // a fresh it while a block is active replaces the queue
    let mut s = Session::new(Flags::empty());
    s.decode_thumb(0xbf1c, 0);
    s.decode_thumb(0xbf04, 0);
    let block = s.it_block().expect("the replacement block is active");
    assert_eq!(block.remaining(), 2);
    assert_eq!(
        block.conditions(),
        &[ConditionCode::EQ, ConditionCode::EQ][..]
    );
}

#[test]
fn test_idempotent_redecode() {
    // the session address is only changed by set_address, so replaying the
    // same word gives the same text
    let mut s = Session::new(Flags::empty());
    s.decode_thumb(0xe001, 0);
    let first = s.text().to_string();
    s.decode_thumb(0xe001, 0);
    assert_eq!(s.text(), first);
    assert_eq!(s.text(), "b       0000006");
}

#[test]
fn test_address_changes_target_only() {
    let mut s = Session::new(Flags::empty());
    s.decode_thumb(0xe7ea, 0);
    assert_eq!(s.text(), "b       ffffffd8");
    s.set_address(0x0800049c);
    s.decode_thumb(0xe7ea, 0);
    assert_eq!(s.text(), "b       8000474");
}

#[test]
fn test_length_from_first_halfword() {
    let mut s = Session::new(Flags::empty());
    s.decode_thumb(0xf7ff, 0x0000);
    assert_eq!(s.len(), 4);
    s.decode_thumb(0xe001, 0xffff);
    assert_eq!(s.len(), 2);
}

#[test]
fn test_undefined_patterns() {
    let mut s = Session::new(Flags::empty());
    // permanently undefined 16-bit encoding
    test_display(&mut s, 0xde00, 0, 2, "undefined 0xde00");
    // unallocated 32-bit pattern
    test_display(&mut s, 0xf3e1, 0x0000, 4, "undefined 0xf3e10000");
}

#[test]
fn test_thumb_only_flag() {
    let mut s = Session::new(Flags::THUMB_ONLY);
    test_display(&mut s, 0xf7ff, 0xfed1, 2, "undefined 0xf7ff");
}

#[test]
fn test_byte_stream() {
    let mut s = Session::new(Flags::empty());
    assert_eq!(s.decode_thumb_bytes(&[0x01, 0xe0]), Ok(2));
    assert_eq!(s.text(), "b       0000006");
    assert_eq!(
        s.decode_thumb_bytes(&[0xff, 0xf7]),
        Err(DecodeError::ExhaustedInput)
    );
    assert_eq!(s.decode_thumb_bytes(&[]), Err(DecodeError::ExhaustedInput));
    s.set_address(0x0800052e);
    assert_eq!(s.decode_thumb_bytes(&[0xff, 0xf7, 0xd1, 0xfe]), Ok(4));
    assert_eq!(s.text(), "bl      80002d4");
}

#[test]
fn test_clear_scratch_mid_stream() {
    let mut s = Session::new(Flags::empty());
    s.decode_thumb(0xbf1c, 0);
    s.clear_scratch();
    test_display(&mut s, 0xfa22, 0xf20c, 4, "lsrne   r2, r2, ip");
}

#[test]
fn test_literal_pool_sink() {
    use std::cell::RefCell;

    let lines: RefCell<Vec<String>> = RefCell::new(Vec::new());
    let sink = |line: &str| lines.borrow_mut().push(line.to_string());
    let mut s = Session::new(Flags::empty());
    s.set_sink(&sink);
    s.decode_thumb(0x4b09, 0);
    assert_eq!(s.text(), "ldr     r3, [pc, #36]");
    assert_eq!(lines.borrow().as_slice(), &["literal address 0000028"]);
}
