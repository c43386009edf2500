//! Named per-object attachments with stable positional slots.
//!
//! A [TagManager] maps caller-owned integer ids to slot indices inside the
//! [TagBuffer] every attached object carries. Algorithms register the state
//! they need (counters, lists, coordinate vectors) without the stored object
//! type knowing about them. Slot indices stay stable for as long as the id
//! is live; every structural change is broadcast uniformly to all attached
//! buffers through a [TagBufferSink], so buffers never disagree on layout.
use crate::errors::{CoreError, Result};
use rustc_hash::FxHashMap;
use std::any::Any;
use std::fmt::Debug;
use std::marker::PhantomData;

/// A value stored in a tag slot. Blanket-implemented for every eligible
/// type; access goes through `Any` downcasts via [TagGetter].
pub trait Tag: Send + Sync + Debug {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any + Send + Sync + Debug> Tag for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Lifecycle policy of one tag: how a fresh slot value is created for each
/// attached buffer.
pub trait TagPolicy: Send + Sync + Debug {
    fn create(&self) -> Box<dyn Tag>;
    fn clone_policy(&self) -> Box<dyn TagPolicy>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Policy that creates default-constructed values of a fixed type.
pub struct TypedTagPolicy<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> Default for TypedTagPolicy<T> {
    fn default() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Debug for TypedTagPolicy<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypedTagPolicy").finish()
    }
}

impl<T: Any + Send + Sync + Debug + Default> TagPolicy for TypedTagPolicy<T> {
    fn create(&self) -> Box<dyn Tag> {
        Box::new(T::default())
    }

    fn clone_policy(&self) -> Box<dyn TagPolicy> {
        Box::new(Self::default())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// How the trimmed tail of a shrinking sizable tag folds back into the
/// retained prefix.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MergePolicy {
    /// Drop trimmed entries.
    Ignore,
    /// Add trimmed entries onto the last retained entry.
    Sum,
    /// Append trimmed list contents to the last retained list.
    Concat,
}

/// A tag whose payload is itself a sequence with a policy-controlled length.
pub trait SizableTag: Send + Sync + Debug {
    fn len(&self) -> usize;
    fn resize(&mut self, new_len: usize, merge: MergePolicy);

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Policy for sizable tags; remembers the length new slot values get.
pub struct SizableTagPolicy<T> {
    pub len: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> SizableTagPolicy<T> {
    pub fn new(len: usize) -> Self {
        Self {
            len,
            _marker: PhantomData,
        }
    }
}

impl<T> Debug for SizableTagPolicy<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SizableTagPolicy").field("len", &self.len).finish()
    }
}

impl<T: Any + SizableTag + Default> TagPolicy for SizableTagPolicy<T> {
    fn create(&self) -> Box<dyn Tag> {
        let mut value = T::default();
        value.resize(self.len, MergePolicy::Ignore);
        Box::new(value)
    }

    fn clone_policy(&self) -> Box<dyn TagPolicy> {
        Box::new(Self::new(self.len))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// In-place mutation of a live tag across all attached buffers.
pub trait TagUpdate: Debug {
    /// Whether the update would change anything, judged against the tag's
    /// current policy. When `false` the whole update is a no-op, which makes
    /// repeated application idempotent.
    fn is_required(&self, policy: &dyn TagPolicy) -> bool;
    fn apply_to_policy(&self, policy: &mut dyn TagPolicy);
    fn apply(&self, tag: &mut dyn Tag);
}

/// Resizes a sizable tag in every buffer and records the new length in the
/// policy so future buffers are created at the right size.
pub struct SizableTagUpdate<T> {
    pub len: usize,
    pub merge: MergePolicy,
    _marker: PhantomData<fn() -> T>,
}

impl<T> SizableTagUpdate<T> {
    pub fn new(len: usize, merge: MergePolicy) -> Self {
        Self {
            len,
            merge,
            _marker: PhantomData,
        }
    }
}

impl<T> Debug for SizableTagUpdate<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SizableTagUpdate").field("len", &self.len).finish()
    }
}

impl<T: Any + SizableTag + Default> TagUpdate for SizableTagUpdate<T> {
    fn is_required(&self, policy: &dyn TagPolicy) -> bool {
        policy
            .as_any()
            .downcast_ref::<SizableTagPolicy<T>>()
            .map_or(false, |p| p.len != self.len)
    }

    fn apply_to_policy(&self, policy: &mut dyn TagPolicy) {
        if let Some(p) = policy.as_any_mut().downcast_mut::<SizableTagPolicy<T>>() {
            p.len = self.len;
        }
    }

    fn apply(&self, tag: &mut dyn Tag) {
        if let Some(value) = tag.as_any_mut().downcast_mut::<T>() {
            value.resize(self.len, self.merge);
        }
    }
}

/// Positional tag storage carried by each attached object.
#[derive(Debug, Default)]
pub struct TagBuffer {
    slots: Vec<Option<Box<dyn Tag>>>,
}

impl TagBuffer {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, slot: usize) -> Option<&dyn Tag> {
        self.slots.get(slot).and_then(|s| s.as_deref())
    }

    pub fn get_mut(&mut self, slot: usize) -> Option<&mut (dyn Tag + 'static)> {
        self.slots.get_mut(slot).and_then(|s| s.as_deref_mut())
    }

    fn set_len(&mut self, len: usize) {
        self.slots.resize_with(len, || None);
    }

    fn set_slot(&mut self, slot: usize, tag: Option<Box<dyn Tag>>) {
        if slot >= self.slots.len() {
            self.set_len(slot + 1);
        }
        self.slots[slot] = tag;
    }
}

/// Receiver for structural tag changes; the owning collection walks every
/// attached buffer so they all observe the identical slot layout.
pub trait TagBufferSink {
    fn for_each_buffer(&mut self, f: &mut dyn FnMut(&mut TagBuffer));
}

/// Sink over no buffers, for managers whose collection is currently empty.
#[derive(Debug, Default)]
pub struct NoBuffers;

impl TagBufferSink for NoBuffers {
    fn for_each_buffer(&mut self, _f: &mut dyn FnMut(&mut TagBuffer)) {}
}

/// Sink over a single buffer (e.g. the population's own tag buffer).
pub struct SingleBuffer<'a>(pub &'a mut TagBuffer);

impl TagBufferSink for SingleBuffer<'_> {
    fn for_each_buffer(&mut self, f: &mut dyn FnMut(&mut TagBuffer)) {
        f(self.0);
    }
}

/// Allocates stable slot indices for tag ids and keeps every attached
/// buffer's layout in sync.
#[derive(Debug, Default)]
pub struct TagManager {
    indices: FxHashMap<i32, usize>,
    policies: FxHashMap<i32, Box<dyn TagPolicy>>,
    free: Vec<usize>,
    capacity: usize,
}

impl TagManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn tag_count(&self) -> usize {
        self.indices.len()
    }

    /// Slot index of a live tag id.
    pub fn slot_of(&self, id: i32) -> Result<usize> {
        self.indices
            .get(&id)
            .copied()
            .ok_or(CoreError::NotFound("no tag with this id"))
    }

    pub fn contains(&self, id: i32) -> bool {
        self.indices.contains_key(&id)
    }

    /// Registers a tag and creates its slot in every attached buffer.
    /// With `strict` a duplicate id fails with `AlreadyExists`; otherwise
    /// the call is idempotent and returns the existing slot.
    pub fn add_tag(
        &mut self,
        id: i32,
        policy: Box<dyn TagPolicy>,
        sink: &mut dyn TagBufferSink,
        strict: bool,
    ) -> Result<usize> {
        if let Some(&slot) = self.indices.get(&id) {
            if strict {
                return Err(CoreError::AlreadyExists("tag id already registered"));
            }
            return Ok(slot);
        }

        if self.free.is_empty() {
            let grown = (self.capacity * 2).max(4);
            self.change_capacity(grown, sink);
        }
        let slot = self.free.pop().expect("free slot after growth");

        sink.for_each_buffer(&mut |buffer| buffer.set_slot(slot, Some(policy.create())));
        self.indices.insert(id, slot);
        self.policies.insert(id, policy);
        Ok(slot)
    }

    /// Unregisters a tag, clears its slot everywhere and frees the index
    /// for reuse. Returns `false` when the id was not registered.
    pub fn remove_tag(&mut self, id: i32, sink: &mut dyn TagBufferSink) -> bool {
        let Some(slot) = self.indices.remove(&id) else {
            return false;
        };
        self.policies.remove(&id);
        self.free.push(slot);
        sink.for_each_buffer(&mut |buffer| buffer.set_slot(slot, None));
        self.shrink(sink);
        true
    }

    /// Recreates a tag under a new policy, reusing its slot index. Missing
    /// ids fall back to a plain add.
    pub fn replace_tag(
        &mut self,
        id: i32,
        policy: Box<dyn TagPolicy>,
        sink: &mut dyn TagBufferSink,
    ) -> Result<usize> {
        let Some(&slot) = self.indices.get(&id) else {
            return self.add_tag(id, policy, sink, false);
        };
        sink.for_each_buffer(&mut |buffer| buffer.set_slot(slot, Some(policy.create())));
        self.policies.insert(id, policy);
        Ok(slot)
    }

    /// Applies `update` to the tag's policy and to its slot in every
    /// buffer, but only when the update reports an actual change.
    pub fn update_tag(
        &mut self,
        id: i32,
        update: &dyn TagUpdate,
        sink: &mut dyn TagBufferSink,
    ) -> Result<()> {
        let slot = self.slot_of(id)?;
        let policy = self.policies.get_mut(&id).expect("policy for live tag");
        if !update.is_required(policy.as_mut()) {
            return Ok(());
        }
        update.apply_to_policy(policy.as_mut());
        sink.for_each_buffer(&mut |buffer| {
            if let Some(tag) = buffer.get_mut(slot) {
                update.apply(tag);
            }
        });
        Ok(())
    }

    /// Relabels a live tag. Fails with `AlreadyExists` when the new id is
    /// taken and with `NotFound` when the old one is not registered.
    pub fn change_tag_id(&mut self, current_id: i32, new_id: i32) -> Result<()> {
        if current_id == new_id {
            return Ok(());
        }
        if self.indices.contains_key(&new_id) {
            return Err(CoreError::AlreadyExists("tag id already registered"));
        }
        let slot = self
            .indices
            .remove(&current_id)
            .ok_or(CoreError::NotFound("no tag with this id"))?;
        let policy = self.policies.remove(&current_id).expect("policy for live tag");
        self.indices.insert(new_id, slot);
        self.policies.insert(new_id, policy);
        Ok(())
    }

    /// Builds a fresh buffer matching the current layout, for objects newly
    /// attached to the collection.
    pub fn init_buffer(&self, buffer: &mut TagBuffer) {
        buffer.set_len(self.capacity);
        for slot in 0..self.capacity {
            buffer.slots[slot] = None;
        }
        for (id, &slot) in &self.indices {
            let policy = &self.policies[id];
            buffer.slots[slot] = Some(policy.create());
        }
    }

    fn change_capacity(&mut self, new_capacity: usize, sink: &mut dyn TagBufferSink) {
        if new_capacity > self.capacity {
            self.free.extend(self.capacity..new_capacity);
        } else {
            self.free.retain(|&slot| slot < new_capacity);
        }
        self.capacity = new_capacity;
        sink.for_each_buffer(&mut |buffer| buffer.set_len(new_capacity));
    }

    /// Drops the trailing run of free slots once at least a quarter of the
    /// capacity is unused.
    fn shrink(&mut self, sink: &mut dyn TagBufferSink) {
        if self.capacity == 0 || self.free.len() * 4 < self.capacity {
            return;
        }
        let mut keep = self.capacity;
        while keep > 0 && self.free.contains(&(keep - 1)) {
            keep -= 1;
        }
        if keep < self.capacity {
            log::trace!(
                "tag buffer shrink: capacity {} -> {}",
                self.capacity,
                keep
            );
            self.change_capacity(keep, sink);
        }
    }
}

/// A sequence of numeric slots, resizable through [SizableTagUpdate]. On a
/// shrink with [MergePolicy::Sum] the trimmed tail is added onto the last
/// retained slot; other policies drop it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesTag(pub Vec<f64>);

impl SizableTag for SeriesTag {
    fn len(&self) -> usize {
        self.0.len()
    }

    fn resize(&mut self, new_len: usize, merge: MergePolicy) {
        if new_len < self.0.len() && new_len > 0 && merge == MergePolicy::Sum {
            let folded: f64 = self.0[new_len..].iter().sum();
            self.0[new_len - 1] += folded;
        }
        self.0.resize(new_len, 0.0);
    }
}

/// A logical index list sharded per branch: each branch appends to its own
/// partition without contention, readers iterate all partitions. Shrinking
/// with [MergePolicy::Concat] (or [MergePolicy::Sum]) folds the trimmed
/// partitions into the last retained one.
#[derive(Debug, Default)]
pub struct PartialIndexLists {
    shards: Vec<std::sync::Mutex<Vec<usize>>>,
}

impl PartialIndexLists {
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    pub fn shard(&self, branch: usize) -> &std::sync::Mutex<Vec<usize>> {
        &self.shards[branch]
    }

    /// Appends to the branch's own partition.
    pub fn push(&self, branch: usize, value: usize) {
        self.shards[branch]
            .lock()
            .expect("partial list shard lock")
            .push(value);
    }

    /// Total entries across all partitions.
    pub fn total_len(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| shard.lock().expect("partial list shard lock").len())
            .sum()
    }
}

impl SizableTag for PartialIndexLists {
    fn len(&self) -> usize {
        self.shards.len()
    }

    fn resize(&mut self, new_len: usize, merge: MergePolicy) {
        if new_len < self.shards.len() && new_len > 0 && merge != MergePolicy::Ignore {
            let mut folded = Vec::new();
            for shard in &mut self.shards[new_len..] {
                folded.append(shard.get_mut().expect("partial list shard lock"));
            }
            self.shards[new_len - 1]
                .get_mut()
                .expect("partial list shard lock")
                .extend(folded);
        }
        self.shards
            .resize_with(new_len, || std::sync::Mutex::new(Vec::new()));
    }
}

/// Typed accessor bound to one tag's slot index. Cheap to copy around hot
/// loops; the slot stays valid while the tag id is live.
pub struct TagGetter<T> {
    slot: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Copy for TagGetter<T> {}

impl<T> Clone for TagGetter<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Debug for TagGetter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TagGetter").field("slot", &self.slot).finish()
    }
}

impl<T: Any + Send + Sync> TagGetter<T> {
    pub fn new(id: i32, manager: &TagManager) -> Result<Self> {
        Ok(Self {
            slot: manager.slot_of(id)?,
            _marker: PhantomData,
        })
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Reads the tag value out of a buffer. The slot must hold a value of
    /// the getter's type.
    pub fn get<'a>(&self, buffer: &'a TagBuffer) -> &'a T {
        self.try_get(buffer).expect("tag slot empty or of unexpected type")
    }

    pub fn try_get<'a>(&self, buffer: &'a TagBuffer) -> Option<&'a T> {
        buffer.get(self.slot).and_then(|tag| tag.as_any().downcast_ref())
    }

    pub fn get_mut<'a>(&self, buffer: &'a mut TagBuffer) -> &'a mut T {
        buffer
            .get_mut(self.slot)
            .and_then(|tag| tag.as_any_mut().downcast_mut())
            .expect("tag slot empty or of unexpected type")
    }
}
