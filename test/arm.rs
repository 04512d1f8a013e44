use armdis::{DecodeError, Flags, Session};

fn test_display(session: &mut Session, word: u32, expected: &'static str) {
    session.decode_arm(word);
    assert!(
        session.len() == 4 && session.text() == expected,
        "display error for {:08x}:\n displayed: {:?}\n expected: {:?}\n",
        word,
        session.text(),
        expected
    );
}

#[test]
fn test_decode_arm() {
    let mut s = Session::new(Flags::empty());
    test_display(&mut s, 0xe0a13082, "adc     r3, r1, r2, lsl #1");
    test_display(&mut s, 0xe59f00f0, "ldr     r0, [pc, #240]");
    test_display(&mut s, 0xe2400024, "sub     r0, r0, #36");
    test_display(&mut s, 0xe321f0db, "msr     CPSR_c, #219");
    test_display(&mut s, 0xe1a0d000, "mov     sp, r0");
    test_display(&mut s, 0xe2400004, "sub     r0, r0, #4");
    test_display(&mut s, 0xe1a0b001, "mov     fp, r1");
    test_display(&mut s, 0xe59f108c, "ldr     r1, [pc, #140]");
    test_display(&mut s, 0xe1510003, "cmp     r1, r3");
    test_display(&mut s, 0x34910004, "ldrcc   r0, [r1], #4");
    test_display(&mut s, 0x30244000, "eorcc   r4, r4, r0");
    s.set_address(0x00a8);
    test_display(&mut s, 0x3afffffb, "bcc     000009c");
    test_display(&mut s, 0xe12fff12, "bx      r2");
    test_display(&mut s, 0x0000049c, "muleq   r0, ip, r4");
    test_display(&mut s, 0x3fffcfff, "svccc   0x00ffcfff");
    test_display(&mut s, 0xe92d0030, "push    {r4, r5}");
    test_display(&mut s, 0xe8bd0030, "pop     {r4, r5}");
    test_display(&mut s, 0xe1a03083, "lsl     r3, r3, #1");
    test_display(&mut s, 0xe7d01003, "ldrb    r1, [r0, r3]");
    test_display(&mut s, 0xe1d210b8, "ldrh    r1, [r2, #8]");
    test_display(&mut s, 0xe0c20293, "smull   r0, r2, r3, r2");
    test_display(&mut s, 0xe10f0000, "mrs     r0, CPSR");
    test_display(&mut s, 0x9e6495a3, "cdpls   5, 6, cr9, cr4, cr3, {5}");
    test_display(&mut s, 0x0edb8832, "mrceq   8, 6, r8, cr11, cr2, {1}");
    test_display(&mut s, 0xbe0b1010, "mcrlt   0, 0, r1, cr11, cr0, {0}");
    test_display(&mut s, 0x1db71064, "ldcne   0, cr1, [r7, #400]!");
    test_display(&mut s, 0xf5d3f000, "pld     [r3, #0]");
    test_display(&mut s, 0xe1413094, "swpb    r3, r4, [r1]");
    test_display(&mut s, 0xe6842351, "pkhtb   r2, r4, r1, asr #6");
    test_display(&mut s, 0xe6e141d2, "usat    r4, #1, r2, asr #3");
}

#[test]
fn test_decode_arm_more() {
    let mut s = Session::new(Flags::empty());
    test_display(&mut s, 0xe320f000, "nop");
    test_display(&mut s, 0xe3013004, "movw    r3, #4100");
    test_display(&mut s, 0xe16f1f12, "clz     r1, r2");
    test_display(&mut s, 0xe8900003, "ldmia   r0, {r0, r1}");
    test_display(&mut s, 0xe92a0003, "stmdb   r10!, {r0, r1}");
    test_display(&mut s, 0xe8bd83fc, "pop     {r2-r9, pc}");
    test_display(&mut s, 0xe1013092, "swp     r3, r2, [r1]");
    test_display(&mut s, 0xe1820f91, "strex   r0, r1, [r2]");
    test_display(&mut s, 0xe1d100f2, "ldrsh   r0, [r1, #2]");
    test_display(&mut s, 0xe5a10004, "str     r0, [r1, #4]!");
    test_display(&mut s, 0xe51f0004, "ldr     r0, [pc, #-4]");
    s.set_address(0);
    test_display(&mut s, 0xeb000001, "bl      000000c");
}

#[test]
fn test_undefined_never_condition() {
    // the reserved 0b1111 condition space outside its defined members
    // still reports a definite four-byte length
    let mut s = Session::new(Flags::empty());
    test_display(&mut s, 0xf0000000, "undefined 0xf0000000");
    assert_eq!(s.len(), 4);
}

#[test]
fn test_address_changes_target_only() {
    let mut s = Session::new(Flags::empty());
    s.decode_arm(0x3afffffb);
    assert_eq!(s.text(), "bcc     fffffff4");
    s.set_address(0x00a8);
    s.decode_arm(0x3afffffb);
    assert_eq!(s.text(), "bcc     000009c");
}

#[test]
fn test_byte_stream() {
    let mut s = Session::new(Flags::empty());
    assert_eq!(s.decode_arm_bytes(&[0x01, 0x00, 0x00, 0xeb]), Ok(4));
    assert_eq!(s.text(), "bl      000000c");
    assert_eq!(
        s.decode_arm_bytes(&[0x01, 0x00, 0x00]),
        Err(DecodeError::ExhaustedInput)
    );
}

#[test]
fn test_literal_pool_sink() {
    use std::cell::RefCell;

    let lines: RefCell<Vec<String>> = RefCell::new(Vec::new());
    let sink = |line: &str| lines.borrow_mut().push(line.to_string());
    let mut s = Session::new(Flags::empty());
    s.set_sink(&sink);
    s.set_address(0x0001bf1c);
    s.decode_arm(0xe59f3014);
    assert_eq!(s.text(), "ldr     r3, [pc, #20]");
    assert_eq!(lines.borrow().as_slice(), &["literal address 001bf38"]);
}
