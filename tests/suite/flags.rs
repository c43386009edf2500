use multiobjective_ga::errors::CoreError;
use multiobjective_ga::flags::{AtomicFlags, FlagManager};

#[test]
fn flag_word_sets_clears_and_tests() {
    let flags = AtomicFlags::default();
    flags.set(0b0101);
    assert!(flags.is_set_any(0b0001));
    assert!(flags.is_set_all(0b0101));
    assert!(!flags.is_set_all(0b0111));

    flags.clear(0b0001);
    assert!(!flags.is_set_any(0b0001));
    assert_eq!(flags.bits(), 0b0100);

    flags.reset();
    assert_eq!(flags.bits(), 0);
}

#[test]
fn flag_manager_hands_out_distinct_bits() {
    let mut manager = FlagManager::default();
    let first = manager.acquire().unwrap();
    let second = manager.acquire().unwrap();
    assert_eq!(first & second, 0);
    assert_eq!(first, 0b1);
    assert_eq!(second, 0b10);

    manager.release(first);
    assert_eq!(manager.acquire().unwrap(), first);
}

#[test]
fn flag_manager_skips_reserved_bits_and_exhausts() {
    let mut manager = FlagManager::with_reserved(u32::MAX ^ 0b11);
    assert_eq!(manager.free_count(), 2);
    manager.acquire().unwrap();
    manager.acquire().unwrap();
    assert!(matches!(
        manager.acquire().unwrap_err(),
        CoreError::Exhausted(_)
    ));
}
