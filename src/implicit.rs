//! The implicit allocator variant.
//!
//! Free blocks are discovered by linear traversal of every block in address
//! order — there is no auxiliary index, so this variant carries no state
//! beyond the [`Region`] itself.

use crate::block::{Header, MAX_REQUEST, W, split_block};
use crate::region::Region;
use std::ptr;

/// Minimum payload size: one word, just enough to hold nothing extra since
/// free blocks in this variant never need to store link pointers.
pub const PMIN: usize = W;
/// Minimum full block size (header + [`PMIN`]).
pub const BMIN: usize = W + PMIN;

/// A heap allocator that finds free blocks by walking the region in
/// address order on every allocation.
pub struct ImplicitHeap<'a> {
  region: Region<'a>,
}

impl<'a> ImplicitHeap<'a> {
  /// Initializes the allocator over `region`, installing a single free
  /// block spanning the whole buffer. Returns `None` if `region` is too
  /// small to hold even one block.
  pub fn init(region: &'a mut [u8]) -> Option<Self> {
    if region.len() < BMIN {
      return None;
    }
    let mut region = Region::new(region);
    region.start_header().set(region.size() - W, false);
    region.charge(W);
    Some(ImplicitHeap { region })
  }

  fn find_first_fit(&self, need: usize) -> Option<Header> {
    let mut cursor = Some(self.region.start_header());
    while let Some(header) = cursor {
      if header.is_free() && header.payload_size() >= need {
        return Some(header);
      }
      cursor = header.next(&self.region);
    }
    None
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
    let Some(header) = self.find_first_fit(need) else {
      return ptr::null_mut();
    };

    let avail = header.payload_size();
    let (charge_size, _new_free) = split_block(&mut self.region, header, avail, need, BMIN);
    header.set(charge_size, true);
    self.region.charge(charge_size);
    header.payload_addr()
  }

  /// `payload == None` (i.e. a null pointer) is a no-op.
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
    header.set(size, false);
    self.region.release(size);
  }

  /// Always relocates: allocates a fresh block, copies
  /// `min(old_payload_size, new_size)` bytes, and frees the old block.
  ///
  /// # Safety
  /// `payload` must be a null pointer or a pointer previously returned by
  /// [`Self::allocate`]/[`Self::reallocate`] on this heap, not already freed.
  pub unsafe fn reallocate(&mut self, payload: *mut u8, new_size: usize) -> *mut u8 {
    if payload.is_null() {
      return unsafe { self.allocate(new_size) };
    }
    let new_ptr = unsafe { self.allocate(new_size) };
    if new_ptr.is_null() {
      return ptr::null_mut();
    }
    let old_header = Header::of_payload(payload);
    let copy_len = old_header.payload_size().min(new_size);
    unsafe { ptr::copy_nonoverlapping(payload, new_ptr, copy_len) };
    unsafe { self.free(payload) };
    new_ptr
  }

  /// Returns `self.region.nused()`, mostly useful from tests.
  pub fn used(&self) -> usize {
    self.region.nused()
  }

  /// Read-only consistency check: every header is `W`-aligned and inside
  /// the region, and total footprint never exceeds the region size.
  pub fn validate(&self) -> bool {
    let mut cursor = Some(self.region.start_header());
    let mut footprint = 0usize;
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
      footprint += W + size;
      cursor = header.next(&self.region);
    }
    if footprint > self.region.size() {
      eprintln!("validate: block footprints ({footprint}) exceed region size ({})", self.region.size());
      return false;
    }
    if self.region.nused() > self.region.size() {
      eprintln!("validate: nused ({}) exceeds region size ({})", self.region.nused(), self.region.size());
      return false;
    }
    true
  }

  /// Prints a one-line-per-block table of the region's current state.
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
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn init_rejects_undersized_region() {
    let mut buf = [0u8; 4];
    assert!(ImplicitHeap::init(&mut buf).is_none());
  }

  #[test]
  fn init_resets_state_to_one_free_block() {
    let mut buf = [0u8; 128];
    let heap = ImplicitHeap::init(&mut buf).unwrap();
    assert!(heap.validate());
    assert_eq!(heap.used(), W);
  }

  // S1 — split on first allocate.
  #[test]
  fn split_on_first_allocate() {
    let mut buf = [0u8; 128];
    let base = buf.as_mut_ptr() as usize;
    let mut heap = ImplicitHeap::init(&mut buf).unwrap();

    let p = unsafe { heap.allocate(32) };
    assert!(!p.is_null());
    assert_eq!(p as usize, base + 8);

    let header_a = Header::of_payload(p);
    assert!(!header_a.is_free());
    assert_eq!(header_a.payload_size(), 32);

    // header at base + 40 should encode the 80-byte free remainder.
    let header_b = Header(unsafe { (base as *mut u8).add(40) });
    assert!(header_b.is_free());
    assert_eq!(header_b.payload_size(), 80);

    assert_eq!(heap.used(), 48);
  }

  #[test]
  fn allocate_zero_returns_null() {
    let mut buf = [0u8; 64];
    let mut heap = ImplicitHeap::init(&mut buf).unwrap();
    assert!(unsafe { heap.allocate(0) }.is_null());
  }

  #[test]
  fn out_of_memory_returns_null_and_preserves_state() {
    let mut buf = [0u8; 64];
    let mut heap = ImplicitHeap::init(&mut buf).unwrap();
    let used_before = heap.used();
    assert!(unsafe { heap.allocate(1_000_000) }.is_null());
    assert_eq!(heap.used(), used_before);
    assert!(heap.validate());
  }

  #[test]
  fn free_then_reallocate_same_size_reuses_region() {
    let mut buf = [0u8; 128];
    let mut heap = ImplicitHeap::init(&mut buf).unwrap();
    let a = unsafe { heap.allocate(32) };
    unsafe { ptr::write_bytes(a, 0xAB, 32) };
    unsafe { heap.free(a) };
    assert!(heap.validate());

    let b = unsafe { heap.allocate(32) };
    assert!(!b.is_null());
    assert!(heap.validate());
  }

  #[test]
  fn null_free_is_a_no_op() {
    let mut buf = [0u8; 64];
    let mut heap = ImplicitHeap::init(&mut buf).unwrap();
    let used_before = heap.used();
    unsafe { heap.free(ptr::null_mut()) };
    assert_eq!(heap.used(), used_before);
    assert!(heap.validate());
  }

  // S6 — null/zero semantics.
  #[test]
  fn reallocate_none_equals_allocate() {
    let mut buf = [0u8; 64];
    let mut heap = ImplicitHeap::init(&mut buf).unwrap();
    let p = unsafe { heap.reallocate(ptr::null_mut(), 24) };
    assert!(!p.is_null());
    assert_eq!(Header::of_payload(p).payload_size(), 24);
  }

  #[test]
  fn reallocate_preserves_content_on_grow_and_shrink() {
    let mut buf = [0u8; 256];
    let mut heap = ImplicitHeap::init(&mut buf).unwrap();
    let p = unsafe { heap.allocate(16) };
    unsafe {
      for i in 0..16u8 {
        p.add(i as usize).write(i);
      }
    }
    let grown = unsafe { heap.reallocate(p, 64) };
    assert!(!grown.is_null());
    unsafe {
      for i in 0..16u8 {
        assert_eq!(grown.add(i as usize).read(), i);
      }
    }

    let shrunk = unsafe { heap.reallocate(grown, 8) };
    assert!(!shrunk.is_null());
    unsafe {
      for i in 0..8u8 {
        assert_eq!(shrunk.add(i as usize).read(), i);
      }
    }
  }

  #[test]
  fn randomized_workload_keeps_heap_valid() {
    let mut buf = [0u8; 4096];
    let buf_len = buf.len();
    let mut heap = ImplicitHeap::init(&mut buf).unwrap();
    let mut live: Vec<*mut u8> = Vec::new();
    let mut state: u64 = 0x9E3779B97F4A7C15;

    let mut next = || {
      state ^= state << 13;
      state ^= state >> 7;
      state ^= state << 17;
      state
    };

    for _ in 0..500 {
      match next() % 3 {
        0 => {
          let size = 1 + (next() % 200) as usize;
          let p = unsafe { heap.allocate(size) };
          if !p.is_null() {
            live.push(p);
          }
        }
        1 if !live.is_empty() => {
          let idx = (next() % live.len() as u64) as usize;
          let p = live.swap_remove(idx);
          unsafe { heap.free(p) };
        }
        2 if !live.is_empty() => {
          let idx = (next() % live.len() as u64) as usize;
          let size = 1 + (next() % 200) as usize;
          let p = unsafe { heap.reallocate(live[idx], size) };
          if !p.is_null() {
            live[idx] = p;
          }
        }
        _ => {}
      }
      assert!(heap.validate());
      assert!(heap.used() <= buf_len);
    }
  }
}
