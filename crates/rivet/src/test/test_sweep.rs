// Tests for sweep integration and the collection driver
use super::manual_gc_vm;
use crate::*;

#[test]
fn test_sweep_keeps_exactly_marked_strings() {
    let mut vm = manual_gc_vm();
    let handles: Vec<StringRef> = (0..10)
        .map(|i| vm.new_str(&format!("s{i}")).unwrap())
        .collect();
    assert_eq!(vm.string_count(), 10);

    for s in handles.iter().step_by(2) {
        vm.mark(*s);
    }
    let freed = vm.sweep();

    assert_eq!(freed, 5);
    assert_eq!(vm.string_count(), 5);
    for (i, s) in handles.iter().enumerate() {
        assert_eq!(vm.is_alive(*s), i % 2 == 0, "s{i}");
    }
    // survivors are still the canonical entries
    assert_eq!(vm.new_str("s4").unwrap(), handles[4]);
    assert_eq!(vm.string_count(), 5);
}

#[test]
fn test_sweep_clears_marks() {
    let mut vm = manual_gc_vm();
    let s = vm.new_str("once").unwrap();
    vm.mark(s);
    vm.sweep();
    assert!(vm.is_alive(s));

    // not marked again, so the next cycle frees it
    assert_eq!(vm.sweep(), 1);
    assert!(!vm.is_alive(s));
}

#[test]
fn test_fixed_strings_survive_unmarked() {
    let mut option = VmOption::default();
    option.string_table.use_const_strtab = false;
    option.gc_auto = false;
    let mut vm = RivetVM::new(option).unwrap();

    let pinned = vm.new_str("pinned").unwrap();
    vm.fix(pinned);
    let loose = vm.new_str("loose").unwrap();

    for _ in 0..3 {
        vm.sweep();
    }
    assert!(vm.is_alive(pinned));
    assert!(!vm.is_alive(loose));
    assert!(!vm.is_marked(pinned));
    for s in vm.const_strings().iter() {
        assert!(vm.is_alive(s));
    }
    // three bootstrap names plus "pinned"
    assert_eq!(vm.string_count(), 4);
}

#[test]
fn test_sweep_frees_unreachable_long_strings() {
    let mut vm = manual_gc_vm();
    let kept = vm.new_str(&"k".repeat(100)).unwrap();
    let dropped = vm.new_str(&"d".repeat(100)).unwrap();
    vm.push(RivetValue::string(kept));

    let freed = vm.full_gc();
    assert_eq!(freed, 1);
    assert!(vm.is_alive(kept));
    assert!(!vm.is_alive(dropped));
    assert_eq!(vm.long_string_count(), 1);
}

#[test]
fn test_const_strings_are_never_swept() {
    let mut vm = manual_gc_vm();
    let kw = vm.new_str("class").unwrap();
    assert!(kw.is_const());
    vm.full_gc();
    vm.full_gc();
    assert!(vm.is_alive(kw));
    assert_eq!(vm.raw_bytes(kw), b"class");
}

#[test]
fn test_shrink_halves_down_to_floor() {
    super::init_tracing();
    let mut vm = manual_gc_vm();
    let handles: Vec<StringRef> = (0..200)
        .map(|i| vm.new_str(&format!("n{i}")).unwrap())
        .collect();
    assert_eq!(vm.string_table_size(), 64);

    let survivors = &handles[..3];
    let mut sizes = Vec::new();
    for _ in 0..5 {
        for s in survivors {
            vm.mark(*s);
        }
        vm.sweep();
        sizes.push(vm.string_table_size());
    }

    // one halving per sweep, never below the floor
    assert_eq!(sizes, vec![32, 16, 8, 8, 8]);
    assert_eq!(vm.string_count(), 3);
    for (i, s) in survivors.iter().enumerate() {
        assert_eq!(vm.new_str(&format!("n{i}")).unwrap(), *s);
    }
}

#[test]
fn test_no_shrink_at_quarter_load() {
    let mut vm = manual_gc_vm();
    let handles: Vec<StringRef> = (0..40)
        .map(|i| vm.new_str(&format!("q{i}")).unwrap())
        .collect();
    assert_eq!(vm.string_table_size(), 16);

    // 4 live entries in 16 buckets is exactly a quarter
    for s in &handles[..4] {
        vm.mark(*s);
    }
    vm.sweep();
    assert_eq!(vm.string_table_size(), 16);

    for s in &handles[..3] {
        vm.mark(*s);
    }
    vm.sweep();
    assert_eq!(vm.string_table_size(), 8);
}

#[test]
fn test_stack_roots_survive_full_gc() {
    let mut vm = manual_gc_vm();
    let a = vm.new_str("rooted").unwrap();
    let b = vm.new_str("unrooted").unwrap();
    vm.push(RivetValue::string(a));
    vm.push(RivetValue::integer(1));

    vm.full_gc();
    assert!(vm.is_alive(a));
    assert!(!vm.is_alive(b));

    vm.truncate_stack(0);
    vm.full_gc();
    assert!(!vm.is_alive(a));
    assert_eq!(vm.gc_stats().collection_count, 2);
    assert_eq!(vm.gc_stats().objects_collected, 2);
}

#[test]
fn test_automatic_collection_keeps_fresh_string() {
    let option = VmOption {
        gc_pause_bytes: 1,
        ..VmOption::default()
    };
    let mut vm = RivetVM::new(option).unwrap();

    let a = vm.new_str("first").unwrap();
    vm.push(RivetValue::string(a));
    let b = vm.new_str("second").unwrap();
    assert!(vm.is_alive(a));
    assert!(vm.is_alive(b));

    // b was never rooted, so the next checkpoint reclaims it
    let c = vm.new_str("third").unwrap();
    assert!(vm.is_alive(a));
    assert!(vm.is_alive(c));
    assert!(!vm.is_alive(b));
    assert!(vm.gc_stats().collection_count >= 3);
}

#[test]
fn test_stopped_gc_defers_collection() {
    let option = VmOption {
        gc_pause_bytes: 1,
        ..VmOption::default()
    };
    let mut vm = RivetVM::new(option).unwrap();
    vm.stop_gc();
    let a = vm.new_str("a1").unwrap();
    let b = vm.new_str("b1").unwrap();
    assert!(vm.is_alive(a) && vm.is_alive(b));
    assert_eq!(vm.gc_stats().collection_count, 0);

    vm.restart_gc();
    assert!(vm.check_gc());
    assert!(!vm.is_alive(a));
    assert!(!vm.is_alive(b));
}

#[test]
fn test_freed_handle_stays_dead_after_slot_reuse() {
    let mut vm = manual_gc_vm();
    let stale = vm.new_str("gone").unwrap();
    vm.sweep();
    let fresh = vm.new_str("other").unwrap();

    assert!(!vm.is_alive(stale));
    assert!(vm.is_alive(fresh));
    assert_ne!(stale, fresh);
    assert!(!vm.equals(stale, fresh));
    assert!(!vm.equals(fresh, stale));
    assert_eq!(vm.raw_bytes(fresh), b"other");

    // mark and fix through a stale handle leave the new occupant alone
    vm.mark(stale);
    vm.fix(stale);
    assert!(!vm.is_marked(fresh));
    assert!(!vm.is_fixed(fresh));
}

#[test]
fn test_freed_long_handle_stays_dead_after_slot_reuse() {
    let mut vm = manual_gc_vm();
    let text = "z".repeat(100);
    let stale = vm.new_str(&text).unwrap();
    vm.sweep();
    let fresh = vm.new_str(&text).unwrap();

    assert!(!vm.is_alive(stale));
    assert!(!vm.equals(stale, fresh));
    assert!(vm.long_string_bytes_mut(stale).is_none());
    assert_eq!(vm.long_string_count(), 1);
}

#[test]
#[should_panic(expected = "does not refer to a live string")]
fn test_reading_freed_handle_panics() {
    let mut vm = manual_gc_vm();
    let stale = vm.new_str("gone").unwrap();
    vm.sweep();
    vm.new_str("other").unwrap();
    vm.raw_bytes(stale);
}

#[test]
fn test_fixed_entries_keep_no_mark() {
    let mut vm = manual_gc_vm();
    let pinned = vm.new_str("pinned").unwrap();
    vm.fix(pinned);
    vm.mark(pinned);
    assert!(!vm.is_marked(pinned));

    vm.sweep();
    vm.sweep();
    assert!(vm.is_alive(pinned));
    assert!(!vm.is_marked(pinned));

    // marked before pinning
    let late = vm.new_str("late").unwrap();
    vm.mark(late);
    vm.fix(late);
    assert!(!vm.is_marked(late));
    assert!(vm.is_fixed(late));
}

#[test]
fn test_checkpoint_on_pinned_name_leaves_it_unmarked() {
    let mut option = VmOption {
        gc_pause_bytes: 1,
        ..VmOption::default()
    };
    option.string_table.use_const_strtab = false;
    let mut vm = RivetVM::new(option).unwrap();

    // spend the budget without collecting, so the next checkpoint runs a cycle
    vm.stop_gc();
    vm.new_str("pressure").unwrap();
    vm.restart_gc();

    let deinit = vm.new_str("deinit").unwrap();
    assert_eq!(deinit, vm.const_strings().str_deinit);
    assert_eq!(vm.gc_stats().collection_count, 1);
    assert!(vm.is_fixed(deinit));
    assert!(!vm.is_marked(deinit));
}
