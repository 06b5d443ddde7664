//! Fixed-capacity block ring shared by one producer and one consumer.
//!
//! Slots are plain [`PlanBlock`]s in `UnsafeCell`s. Ownership of a slot is
//! decided by the index cursors alone:
//!
//! - the slot at `head` belongs to the producer, which fills it and then
//!   publishes it with a release store of `head`;
//! - slots in `[tail, head)` are readable by both sides; only their atomic
//!   speed and distance cells change after publication;
//! - the consumer frees the slot at `tail` with a release store of `tail`.
//!
//! The reserved system-motion slot follows the same pattern with a single
//! `system_held` flag in place of the two cursors.

#![allow(unsafe_code)]

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::block::PlanBlock;
use super::BLOCK_BUFFER_SIZE;

/// Returns the index of the next block in the ring buffer.
#[inline]
pub const fn next_block_index(block_index: usize) -> usize {
    let next = block_index + 1;
    if next == BLOCK_BUFFER_SIZE {
        0
    } else {
        next
    }
}

/// Returns the index of the previous block in the ring buffer.
#[inline]
pub const fn prev_block_index(block_index: usize) -> usize {
    if block_index == 0 {
        BLOCK_BUFFER_SIZE - 1
    } else {
        block_index - 1
    }
}

/// Number of slots from `from` forward to `to`.
#[inline]
const fn distance(from: usize, to: usize) -> usize {
    (to + BLOCK_BUFFER_SIZE - from) % BLOCK_BUFFER_SIZE
}

struct Slot(UnsafeCell<PlanBlock>);

impl Slot {
    const fn new() -> Self {
        Self(UnsafeCell::new(PlanBlock::empty()))
    }
}

/// Storage visible to both sides.
struct Shared {
    slots: [Slot; BLOCK_BUFFER_SIZE],
    system_slot: Slot,
    system_held: AtomicBool,
    head: AtomicUsize,
    tail: AtomicUsize,
    plan_updated: AtomicBool,
}

// SAFETY: every non-atomic access to a slot follows the ownership rules in
// the module docs, which `ProducerRing` and `ConsumerRing` enforce. Only one
// of each exists at a time because both borrow the `BlockBuffer` mutably.
unsafe impl Sync for Shared {}

/// Cursors only the producer reads or writes.
#[derive(Debug, Clone, Copy)]
struct Cursor {
    next_head: usize,
    planned: usize,
}

/// Owner of the block ring.
pub(crate) struct BlockBuffer {
    shared: Shared,
    cursor: Cursor,
}

impl BlockBuffer {
    pub(crate) const fn new() -> Self {
        const EMPTY: Slot = Slot::new();
        Self {
            shared: Shared {
                slots: [EMPTY; BLOCK_BUFFER_SIZE],
                system_slot: Slot::new(),
                system_held: AtomicBool::new(false),
                head: AtomicUsize::new(0),
                tail: AtomicUsize::new(0),
                plan_updated: AtomicBool::new(false),
            },
            cursor: Cursor {
                next_head: 1,
                planned: 0,
            },
        }
    }

    /// Empty the ring. Exclusive access means no handle is alive.
    pub(crate) fn reset(&mut self) {
        *self.shared.head.get_mut() = 0;
        *self.shared.tail.get_mut() = 0;
        *self.shared.system_held.get_mut() = false;
        *self.shared.plan_updated.get_mut() = false;
        self.cursor = Cursor {
            next_head: 1,
            planned: 0,
        };
    }

    pub(crate) fn split(&mut self) -> (ProducerRing<'_>, ConsumerRing<'_>) {
        let BlockBuffer { shared, cursor } = self;
        let shared: &Shared = shared;
        (ProducerRing { shared, cursor }, ConsumerRing { shared })
    }
}

/// Producer view: writes the head slot and the system slot, owns
/// `next_head` and `planned`.
pub(crate) struct ProducerRing<'a> {
    shared: &'a Shared,
    cursor: &'a mut Cursor,
}

impl ProducerRing<'_> {
    #[inline]
    pub(crate) fn head(&self) -> usize {
        // Only this side stores `head`.
        self.shared.head.load(Ordering::Relaxed)
    }

    /// Acquire pairs with the consumer's release in `discard`, so a freed
    /// slot is no longer being read once it shows up as free here.
    #[inline]
    pub(crate) fn tail(&self) -> usize {
        self.shared.tail.load(Ordering::Acquire)
    }

    #[inline]
    pub(crate) fn is_full(&self) -> bool {
        self.tail() == self.cursor.next_head
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.tail() == self.head()
    }

    pub(crate) fn available(&self) -> usize {
        available(self.head(), self.tail())
    }

    /// First block not yet known to be optimal.
    ///
    /// The consumer never writes this cursor. When it discards the block at
    /// `planned`, the stored value falls behind `tail`; reads here move it
    /// up to `tail` so it always lies in `[tail, head]`. `push` stores the
    /// reconciled value before advancing `head`.
    pub(crate) fn planned(&self) -> usize {
        let tail = self.tail();
        let head = self.head();
        if distance(tail, self.cursor.planned) > distance(tail, head) {
            tail
        } else {
            self.cursor.planned
        }
    }

    /// Move `planned` forward to `index`, which must lie in
    /// `[planned, head]`.
    pub(crate) fn advance_planned_to(&mut self, index: usize) {
        let planned = self.planned();
        debug_assert!(
            distance(planned, index) <= distance(planned, self.head()),
            "planned may only advance towards head"
        );
        self.cursor.planned = index;
    }

    /// Drop the optimal prefix so the next recalculation starts at `tail`.
    pub(crate) fn invalidate_planned(&mut self) {
        self.cursor.planned = self.tail();
    }

    /// A queued block, or any other slot the producer has written.
    ///
    /// Indices from the same `head()`/`tail()` reads stay valid for the
    /// duration of the borrow: the consumer never writes slot contents
    /// other than atomic cells, and slot writes need `&mut self`.
    #[inline]
    pub(crate) fn block(&self, index: usize) -> &PlanBlock {
        // SAFETY: the only non-atomic writer of any slot is this producer,
        // through `&mut self` methods, so no write can overlap this borrow.
        unsafe { &*self.shared.slots[index].0.get() }
    }

    /// Fill the head slot and make it visible to the consumer.
    ///
    /// Returns `false` and leaves everything untouched if the ring is full.
    pub(crate) fn push(&mut self, block: PlanBlock) -> bool {
        if self.is_full() {
            return false;
        }
        // Pin a stale `planned` to `tail` while `head` still tells them
        // apart. Once `head` wraps onto the stale index it reads as live.
        self.cursor.planned = self.planned();
        let head = self.head();
        // SAFETY: the head slot is outside `[tail, head)`, so the consumer
        // holds no reference into it, and `&mut self` excludes producer
        // borrows. The acquire load of `tail` in `is_full` ordered the
        // consumer's last reads of this slot before this write.
        unsafe {
            *self.shared.slots[head].0.get() = block;
        }
        let next_head = self.cursor.next_head;
        self.shared.head.store(next_head, Ordering::Release);
        self.cursor.next_head = next_block_index(next_head);
        true
    }

    /// Fill the reserved system-motion slot.
    ///
    /// Returns `false` if the consumer still holds the previous system
    /// block.
    pub(crate) fn push_system(&mut self, block: PlanBlock) -> bool {
        if self.shared.system_held.load(Ordering::Acquire) {
            return false;
        }
        // SAFETY: the consumer only reads the system slot while
        // `system_held` is set, and cleared it with release ordering after
        // its last read.
        unsafe {
            *self.shared.system_slot.0.get() = block;
        }
        self.shared.system_held.store(true, Ordering::Release);
        true
    }

    #[inline]
    pub(crate) fn system_held(&self) -> bool {
        self.shared.system_held.load(Ordering::Acquire)
    }

    /// Tell the consumer the executing block's exit speed changed.
    #[inline]
    pub(crate) fn notify_plan_updated(&self) {
        self.shared.plan_updated.store(true, Ordering::Release);
    }
}

/// Consumer view: reads `[tail, head)` and the system slot, owns `tail`.
pub(crate) struct ConsumerRing<'a> {
    shared: &'a Shared,
}

impl ConsumerRing<'_> {
    /// Acquire pairs with the producer's release in `push`.
    #[inline]
    pub(crate) fn head(&self) -> usize {
        self.shared.head.load(Ordering::Acquire)
    }

    #[inline]
    pub(crate) fn tail(&self) -> usize {
        // Only this side stores `tail`.
        self.shared.tail.load(Ordering::Relaxed)
    }

    pub(crate) fn available(&self) -> usize {
        available(self.head(), self.tail())
    }

    /// The block at `tail`, or `None` if the ring is empty.
    pub(crate) fn current(&self) -> Option<&PlanBlock> {
        let tail = self.tail();
        if tail == self.head() {
            return None;
        }
        Some(self.queued(tail))
    }

    /// The block after `tail`, or `None` if there is none.
    pub(crate) fn after_current(&self) -> Option<&PlanBlock> {
        let tail = self.tail();
        let head = self.head();
        if tail == head {
            return None;
        }
        let next = next_block_index(tail);
        if next == head {
            return None;
        }
        Some(self.queued(next))
    }

    fn queued(&self, index: usize) -> &PlanBlock {
        // SAFETY: callers pass an index in `[tail, head)`. The producer only
        // writes the slot at `head`, and `tail` cannot move while `&self`
        // is borrowed because `discard` takes `&mut self`.
        unsafe { &*self.shared.slots[index].0.get() }
    }

    /// Free the block at `tail`. No-op if the ring is empty.
    pub(crate) fn discard(&mut self) -> bool {
        let tail = self.tail();
        if tail == self.head() {
            return false;
        }
        self.shared.tail.store(next_block_index(tail), Ordering::Release);
        true
    }

    pub(crate) fn system(&self) -> Option<&PlanBlock> {
        if !self.shared.system_held.load(Ordering::Acquire) {
            return None;
        }
        // SAFETY: the producer does not write the system slot while
        // `system_held` is set, and clearing it needs `&mut self`.
        Some(unsafe { &*self.shared.system_slot.0.get() })
    }

    pub(crate) fn release_system(&mut self) {
        self.shared.system_held.store(false, Ordering::Release);
    }

    /// Load-then-store rather than swap: thumbv6m has no atomic RMW. A
    /// notification landing in between is folded into this one, since the
    /// caller reads the speeds after clearing the flag.
    pub(crate) fn take_plan_updated(&mut self) -> bool {
        if !self.shared.plan_updated.load(Ordering::Acquire) {
            return false;
        }
        self.shared.plan_updated.store(false, Ordering::Relaxed);
        true
    }
}

#[inline]
fn available(head: usize, tail: usize) -> usize {
    if head >= tail {
        (BLOCK_BUFFER_SIZE - 1) - (head - tail)
    } else {
        tail - head - 1
    }
}
