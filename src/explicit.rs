//! The explicit allocator variant.
//!
//! Free blocks are tracked in a doubly linked list threaded through the
//! first two words of each free block's payload (see [`crate::freelist`]),
//! so allocation never has to scan allocated blocks, and freeing coalesces
//! eagerly with the right neighbor.

use crate::block::{Header, MAX_REQUEST, W, split_block};
use crate::freelist::FreeList;
use crate::region::Region;
use std::ptr;

/// Minimum payload size: two words, enough to hold `prev` and `next` link
/// pointers while free.
pub const PMIN: usize = 16;
/// Minimum full block size (header + [`PMIN`]).
pub const BMIN: usize = W + PMIN;

/// A heap allocator backed by an explicit free list, with forward-only
/// coalescing on free and in-place growth on reallocate.
pub struct ExplicitHeap<'a> {
  region: Region<'a>,
  free_list: FreeList,
}

impl<'a> ExplicitHeap<'a> {
  /// Initializes the allocator over `region`: the whole buffer becomes one
  /// free block, and its payload becomes the sole free-list node. Returns
  /// `None` if `region` is too small to hold even one block.
  pub fn init(region: &'a mut [u8]) -> Option<Self> {
    if region.len() < BMIN {
      return None;
    }
    let mut region = Region::new(region);
    region.start_header().set(region.size() - W, false);
    region.charge(W);

    let mut free_list = FreeList::new();
    unsafe { free_list.add_front(region.start_header().payload_addr()) };

    Some(ExplicitHeap { region, free_list })
  }

  /// Returns a payload address with at least `max(PMIN, round_up(requested_size, W))`
  /// usable bytes, or a null pointer if the request cannot be serviced.
  ///
  /// # Safety
  /// The returned pointer aliases into the region passed to [`Self::init`];
  /// the caller must not read or write past the granted size and must not
  /// let it outlive the region.
  pub unsafe fn allocate(&mut self, requested_size: usize) -> *mut u8 {
    if requested_size == 0 {
      return ptr::null_mut();
    }
    let need = Region::need_for(requested_size, PMIN);
    if need > MAX_REQUEST {
      return ptr::null_mut();
    }
    if !self.region.fits(need) {
      eprintln!("OUT OF MEMORY; CANNOT SERVICE REQUEST");
      return ptr::null_mut();
    }
    let Some(header) = (unsafe { self.free_list.find_first(need) }) else {
      return ptr::null_mut();
    };
    unsafe { self.free_list.detach(header.payload_addr()) };

    let avail = header.payload_size();
    let (charge_size, new_free) = split_block(&mut self.region, header, avail, need, BMIN);
    if let Some(new_header) = new_free {
      unsafe { self.free_list.add_front(new_header.payload_addr()) };
    }
    header.set(charge_size, true);
    self.region.charge(charge_size);
    header.payload_addr()
  }

  /// `payload == None` (i.e. a null pointer) is a no-op. Otherwise the
  /// block is returned to the free list and eagerly coalesced with its
  /// right neighbor, so no two address-adjacent blocks are ever both free
  /// once this call returns.
  ///
  /// # Safety
  /// `payload` must be a null pointer or a pointer previously returned by
  /// [`Self::allocate`]/[`Self::reallocate`] on this heap, not already freed.
  pub unsafe fn free(&mut self, payload: *mut u8) {
    if payload.is_null() {
      return;
    }
    let header = Header::of_payload(payload);
    let size = header.payload_size();
    unsafe { self.free_list.add_front(payload) };
    header.set(size, false);
    self.coalesce_forward(header);
    self.region.release(size);
  }

  /// Attempts to grow or shrink `payload` in place by first coalescing
  /// forward; relocates via a fresh allocation if that still isn't enough
  /// room.
  ///
  /// # Safety
  /// `payload` must be a null pointer or a pointer previously returned by
  /// [`Self::allocate`]/[`Self::reallocate`] on this heap, not already freed.
  pub unsafe fn reallocate(&mut self, payload: *mut u8, new_size: usize) -> *mut u8 {
    if payload.is_null() {
      return unsafe { self.allocate(new_size) };
    }
    let need = Region::need_for(new_size, PMIN);
    if new_size == 0 || need > MAX_REQUEST {
      return ptr::null_mut();
    }
    if !self.region.fits(need) {
      eprintln!("OUT OF MEMORY; CANNOT SERVICE REQUEST");
      return ptr::null_mut();
    }

    let old_header = Header::of_payload(payload);
    let old_payload_before = old_header.payload_size();
    self.coalesce_forward(old_header);
    let after = old_header.payload_size();

    if need <= after {
      let copy_len = old_payload_before.min(new_size);
      unsafe { ptr::copy(payload, payload, copy_len) };

      let (charge_size, new_free) = split_block(&mut self.region, old_header, after, need, BMIN);
      if let Some(new_header) = new_free {
        unsafe { self.free_list.add_front(new_header.payload_addr()) };
      }
      old_header.set(charge_size, true);

      let delta = charge_size as isize - old_payload_before as isize;
      if delta >= 0 {
        self.region.charge(delta as usize);
      } else {
        self.region.release((-delta) as usize);
      }
      payload
    } else {
      let new_ptr = unsafe { self.allocate(new_size) };
      if new_ptr.is_null() {
        return ptr::null_mut();
      }
      // Copy the smaller of the old and new sizes, not `new_size`, so we
      // never read past the old payload's valid range.
      let copy_len = old_payload_before.min(new_size);
      unsafe { ptr::copy_nonoverlapping(payload, new_ptr, copy_len) };
      unsafe { self.free(payload) };
      new_ptr
    }
  }

  /// Merges `header`'s block with as many free right neighbors as are
  /// adjacent, detaching each from the free list and reclaiming its header
  /// charge. `header` itself keeps its current allocation status; only its
  /// encoded size grows.
  fn coalesce_forward(&mut self, header: Header) {
    let was_allocated = !header.is_free();
    let mut absorbed = 0usize;
    let mut cursor = header.next(&self.region);
    while let Some(neighbor) = cursor {
      if !neighbor.is_free() {
        break;
      }
      absorbed += W + neighbor.payload_size();
      unsafe { self.free_list.detach(neighbor.payload_addr()) };
      self.region.release(W);
      cursor = neighbor.next(&self.region);
    }
    if absorbed > 0 {
      header.set(header.payload_size() + absorbed, was_allocated);
    }
  }

  /// Returns `self.region.nused()`, mostly useful from tests.
  pub fn used(&self) -> usize {
    self.region.nused()
  }

  /// Read-only consistency check: tiling/alignment soundness, every
  /// free-list entry is actually free, and the free-list traversal agrees
  /// with the address-order traversal on which blocks are free.
  pub fn validate(&self) -> bool {
    let mut free_list_size = 0usize;
    for header in unsafe { self.free_list.iter() } {
      if !header.is_free() {
        eprintln!("validate: free list holds an allocated block at {:#x}", header.addr());
        return false;
      }
      free_list_size += 1;
    }

    let mut cursor = Some(self.region.start_header());
    let mut footprint = 0usize;
    let mut free_blocks_by_address = 0usize;
    while let Some(header) = cursor {
      let size = header.payload_size();
      if size % W != 0 {
        eprintln!("validate: payload size {size} is not W-aligned");
        return false;
      }
      if size < PMIN {
        eprintln!("validate: payload size {size} is below the minimum of {PMIN}");
        return false;
      }
      if header.addr() < self.region.start_addr() || header.addr() >= self.region.end_addr() {
        eprintln!("validate: header at {:#x} is outside the region", header.addr());
        return false;
      }
      if header.is_free() {
        free_blocks_by_address += 1;
      }
      footprint += W + size;
      cursor = header.next(&self.region);
    }

    if footprint > self.region.size() {
      eprintln!("validate: block footprints ({footprint}) exceed region size ({})", self.region.size());
      return false;
    }
    if free_blocks_by_address != free_list_size {
      eprintln!(
        "validate: {free_blocks_by_address} free blocks by address but {free_list_size} in the free list"
      );
      return false;
    }
    if self.region.nused() > self.region.size() {
      eprintln!("validate: nused ({}) exceeds region size ({})", self.region.nused(), self.region.size());
      return false;
    }
    true
  }

  /// Prints a one-line-per-block table, plus the free-list head, showing
  /// the current region state.
  pub fn dump(&self) {
    let mut cursor = Some(self.region.start_header());
    let mut index = 0usize;
    while let Some(header) = cursor {
      index += 1;
      let status = if header.is_free() { 'F' } else { 'A' };
      println!(
        "{index:>4} {:p} {status} (8 + {})",
        header.0,
        header.payload_size()
      );
      cursor = header.next(&self.region);
    }
    println!("free list head: {:?}", self.free_list.head());
  }
}
