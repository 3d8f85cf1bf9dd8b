// Tests for the GC header protocol
use crate::*;

#[test]
fn test_fresh_header_is_white() {
    let header = GcHeader::new(32);
    assert!(!header.is_marked());
    assert!(!header.is_fixed());
    assert!(!header.is_const());
    assert!(header.is_collectable());
    assert_eq!(header.size, 32);
}

#[test]
fn test_mark_is_idempotent() {
    let mut header = GcHeader::new(16);
    header.mark();
    header.mark();
    assert!(header.is_marked());
    header.clear_mark();
    assert!(!header.is_marked());
    header.clear_mark();
    assert!(!header.is_marked());
}

#[test]
fn test_fixed_header_is_not_collectable() {
    let mut header = GcHeader::new(16);
    header.set_fixed();
    assert!(header.is_fixed());
    assert!(!header.is_collectable());
    header.mark();
    header.clear_mark();
    assert!(header.is_fixed());
}

#[test]
fn test_const_strings_ignore_mark_and_fix() {
    let mut vm = super::manual_gc_vm();
    let s = vm.new_str("return").unwrap();
    assert!(vm.is_const(s));

    vm.mark(s);
    assert!(!vm.is_marked(s));
    vm.fix(s);
    assert!(!vm.is_fixed(s));
    assert_eq!(vm.header(s), GcHeader::CONST);
}

#[test]
fn test_mark_through_runtime() {
    let mut vm = super::manual_gc_vm();
    let s = vm.new_str("marked").unwrap();
    assert!(!vm.is_marked(s));
    vm.mark(s);
    assert!(vm.is_marked(s));

    // the sweep resets survivors for the next cycle
    vm.sweep();
    assert!(vm.is_alive(s));
    assert!(!vm.is_marked(s));
}

#[test]
fn test_header_size_accounts_payload() {
    let mut vm = super::manual_gc_vm();
    let short = vm.new_str("sized").unwrap();
    let long = vm.new_long_string(&[7u8; 200]).unwrap();
    assert_eq!(vm.header(short).size, GcString::alloc_size(5));
    assert_eq!(vm.header(long).size, GcString::alloc_size(200));
}

#[test]
fn test_extra_tag() {
    let mut vm = super::manual_gc_vm();
    let s = vm.new_str("tagged").unwrap();
    assert_eq!(vm.extra(s), 0);
    vm.set_extra(s, 42);
    assert_eq!(vm.extra(s), 42);

    // the tag lives on the canonical object
    let again = vm.new_str("tagged").unwrap();
    assert_eq!(vm.extra(again), 42);
}
