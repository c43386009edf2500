use multiobjective_ga::errors::CoreError;
use multiobjective_ga::tags::{
    MergePolicy, NoBuffers, PartialIndexLists, SeriesTag, SingleBuffer, SizableTag,
    SizableTagPolicy, SizableTagUpdate, TagBuffer, TagBufferSink, TagGetter, TagManager,
    TypedTagPolicy,
};

struct TwoBuffers<'a>(&'a mut TagBuffer, &'a mut TagBuffer);

impl TagBufferSink for TwoBuffers<'_> {
    fn for_each_buffer(&mut self, f: &mut dyn FnMut(&mut TagBuffer)) {
        f(self.0);
        f(self.1);
    }
}

#[test]
fn slot_indices_stay_stable_while_live() {
    let mut manager = TagManager::new();
    let mut sink = NoBuffers;
    let slot_a = manager
        .add_tag(10, Box::new(TypedTagPolicy::<i64>::default()), &mut sink, true)
        .unwrap();
    let slot_b = manager
        .add_tag(11, Box::new(TypedTagPolicy::<i64>::default()), &mut sink, true)
        .unwrap();
    let slot_c = manager
        .add_tag(12, Box::new(TypedTagPolicy::<i64>::default()), &mut sink, true)
        .unwrap();

    manager.remove_tag(11, &mut sink);
    assert_eq!(manager.slot_of(10).unwrap(), slot_a);
    assert_eq!(manager.slot_of(12).unwrap(), slot_c);

    // the freed index is available again for a later add
    let slot_d = manager
        .add_tag(13, Box::new(TypedTagPolicy::<i64>::default()), &mut sink, true)
        .unwrap();
    assert_eq!(slot_d, slot_b);
    assert_eq!(manager.slot_of(10).unwrap(), slot_a);
}

#[test]
fn strict_add_rejects_duplicates() {
    let mut manager = TagManager::new();
    let mut sink = NoBuffers;
    let slot = manager
        .add_tag(5, Box::new(TypedTagPolicy::<i64>::default()), &mut sink, true)
        .unwrap();
    assert_eq!(
        manager
            .add_tag(5, Box::new(TypedTagPolicy::<i64>::default()), &mut sink, true)
            .unwrap_err(),
        CoreError::AlreadyExists("tag id already registered")
    );
    // non-strict add is idempotent
    assert_eq!(
        manager
            .add_tag(5, Box::new(TypedTagPolicy::<i64>::default()), &mut sink, false)
            .unwrap(),
        slot
    );
}

#[test]
fn replace_reuses_the_slot_with_the_new_policy() {
    let mut manager = TagManager::new();
    let mut buffer = TagBuffer::default();
    let slot = manager
        .add_tag(
            1,
            Box::new(SizableTagPolicy::<SeriesTag>::new(2)),
            &mut SingleBuffer(&mut buffer),
            true,
        )
        .unwrap();
    let getter = TagGetter::<SeriesTag>::new(1, &manager).unwrap();
    assert_eq!(getter.get(&buffer).len(), 2);

    let replaced = manager
        .replace_tag(
            1,
            Box::new(SizableTagPolicy::<SeriesTag>::new(5)),
            &mut SingleBuffer(&mut buffer),
        )
        .unwrap();
    assert_eq!(replaced, slot);
    assert_eq!(getter.get(&buffer).len(), 5);
}

#[test]
fn update_is_idempotent_when_nothing_changes() {
    let mut manager = TagManager::new();
    let mut buffer = TagBuffer::default();
    manager
        .add_tag(
            1,
            Box::new(SizableTagPolicy::<SeriesTag>::new(3)),
            &mut SingleBuffer(&mut buffer),
            true,
        )
        .unwrap();
    let getter = TagGetter::<SeriesTag>::new(1, &manager).unwrap();
    getter.get_mut(&mut buffer).0.copy_from_slice(&[1.0, 2.0, 3.0]);

    // same size: the update must not touch the buffer
    manager
        .update_tag(
            1,
            &SizableTagUpdate::<SeriesTag>::new(3, MergePolicy::Sum),
            &mut SingleBuffer(&mut buffer),
        )
        .unwrap();
    assert_eq!(getter.get(&buffer).0, vec![1.0, 2.0, 3.0]);

    manager
        .update_tag(
            1,
            &SizableTagUpdate::<SeriesTag>::new(2, MergePolicy::Sum),
            &mut SingleBuffer(&mut buffer),
        )
        .unwrap();
    // the trimmed tail folds into the last retained slot
    assert_eq!(getter.get(&buffer).0, vec![1.0, 5.0]);
}

#[test]
fn partial_lists_concat_on_shrink() {
    let mut lists = PartialIndexLists::default();
    lists.resize(3, MergePolicy::Ignore);
    lists.push(0, 1);
    lists.push(1, 2);
    lists.push(2, 3);
    assert_eq!(lists.total_len(), 3);

    lists.resize(2, MergePolicy::Concat);
    assert_eq!(lists.shard_count(), 2);
    assert_eq!(lists.total_len(), 3);
    assert_eq!(*lists.shard(1).lock().unwrap(), vec![2, 3]);

    lists.resize(1, MergePolicy::Ignore);
    assert_eq!(lists.total_len(), 1);
}

#[test]
fn change_id_relabels_and_detects_collisions() {
    let mut manager = TagManager::new();
    let mut sink = NoBuffers;
    let slot = manager
        .add_tag(1, Box::new(TypedTagPolicy::<i64>::default()), &mut sink, true)
        .unwrap();
    manager
        .add_tag(2, Box::new(TypedTagPolicy::<i64>::default()), &mut sink, true)
        .unwrap();

    assert_eq!(
        manager.change_tag_id(1, 2).unwrap_err(),
        CoreError::AlreadyExists("tag id already registered")
    );
    assert!(matches!(
        manager.change_tag_id(9, 4).unwrap_err(),
        CoreError::NotFound(_)
    ));

    manager.change_tag_id(1, 3).unwrap();
    assert!(!manager.contains(1));
    assert_eq!(manager.slot_of(3).unwrap(), slot);
}

#[test]
fn missing_tag_is_not_found() {
    let manager = TagManager::new();
    assert_eq!(
        manager.slot_of(42).unwrap_err(),
        CoreError::NotFound("no tag with this id")
    );
}

#[test]
fn all_attached_buffers_share_the_layout() {
    let mut manager = TagManager::new();
    let mut first = TagBuffer::default();
    let mut second = TagBuffer::default();
    manager
        .add_tag(
            1,
            Box::new(TypedTagPolicy::<i64>::default()),
            &mut TwoBuffers(&mut first, &mut second),
            true,
        )
        .unwrap();
    manager
        .add_tag(
            2,
            Box::new(SizableTagPolicy::<SeriesTag>::new(4)),
            &mut TwoBuffers(&mut first, &mut second),
            true,
        )
        .unwrap();

    assert_eq!(first.len(), second.len());
    let series = TagGetter::<SeriesTag>::new(2, &manager).unwrap();
    assert_eq!(series.get(&first).len(), 4);
    assert_eq!(series.get(&second).len(), 4);
}

#[test]
fn buffers_shrink_when_trailing_slots_free_up() {
    let mut manager = TagManager::new();
    let mut buffer = TagBuffer::default();
    let mut slots = Vec::new();
    for id in 0..8 {
        slots.push(
            manager
                .add_tag(
                    id,
                    Box::new(TypedTagPolicy::<i64>::default()),
                    &mut SingleBuffer(&mut buffer),
                    true,
                )
                .unwrap(),
        );
    }
    let full_capacity = manager.capacity();
    assert!(full_capacity >= 8);

    for id in (2..8).rev() {
        manager.remove_tag(id, &mut SingleBuffer(&mut buffer));
    }
    assert!(manager.capacity() < full_capacity);
    assert_eq!(buffer.len(), manager.capacity());
    // the surviving tags kept their slots
    assert_eq!(manager.slot_of(0).unwrap(), slots[0]);
    assert_eq!(manager.slot_of(1).unwrap(), slots[1]);
}
